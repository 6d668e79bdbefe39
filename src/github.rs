use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, LINK};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::error::{IssuesError, Result};
use crate::forge::IssueFetcher;
use crate::types::{Credential, Issue, Page, RepositorySpec};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const PER_PAGE: u32 = 20;
const UNKNOWN_ERROR: &str = "Unknown error";

pub struct GitHub {
    client: Client,
    api_base: String,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

/// Error payload GitHub returns alongside non-2xx statuses.
#[derive(Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

impl GitHub {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| IssuesError::Transport(e.to_string()))?;

        Ok(Self::with_client(client, &config.api_base))
    }

    pub fn with_client(client: Client, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn first_page_url(&self, spec: &RepositorySpec) -> String {
        format!(
            "{}/repos/{}/{}/issues?state=open&per_page={}",
            self.api_base,
            urlencoding::encode(&spec.owner),
            urlencoding::encode(&spec.name),
            PER_PAGE
        )
    }
}

#[async_trait]
impl IssueFetcher for GitHub {
    async fn fetch_page(
        &self,
        spec: &RepositorySpec,
        credential: Option<&Credential>,
        continuation: Option<&str>,
    ) -> Result<Page> {
        if spec.owner.is_empty() || spec.name.is_empty() {
            return Err(IssuesError::Validation);
        }

        let url = match continuation {
            Some(next) => next.to_string(),
            None => self.first_page_url(spec),
        };
        debug!(repo = %spec, %url, "fetching issues page");

        let mut request = self.client.get(&url).header(ACCEPT, GITHUB_MEDIA_TYPE);
        if let Some(token) = credential.filter(|c| !c.is_empty()) {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token.expose()));
        }

        let response = request.send().await?;
        let status = response.status();
        let next_page = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_url);
        let body = response.bytes().await?;

        let page = page_from_response(status, next_page, &body)?;
        debug!(
            repo = %spec,
            count = page.issues.len(),
            has_next = page.next_page.is_some(),
            "issues page received"
        );
        Ok(page)
    }
}

/// Turn a completed HTTP exchange into a [`Page`] or a typed error.
fn page_from_response(
    status: StatusCode,
    next_page: Option<String>,
    body: &[u8],
) -> Result<Page> {
    if !status.is_success() {
        let err = remote_error(status, body);
        debug!(%status, "GitHub rejected issues request");
        return Err(err);
    }

    let issues: Vec<Issue> =
        serde_json::from_slice(body).map_err(|e| IssuesError::Parse(e.to_string()))?;

    Ok(Page { issues, next_page })
}

fn remote_error(status: StatusCode, body: &[u8]) -> IssuesError {
    let message = serde_json::from_slice::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string());

    IssuesError::Remote {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        message,
    }
}

/// Extract the `rel="next"` target from a `Link` header value such as
/// `<https://api/x?page=2>; rel="next", <https://api/x?page=9>; rel="last"`.
pub fn next_page_url(header: &str) -> Option<String> {
    link_entries(header)
        .into_iter()
        .filter_map(parse_link_entry)
        .find(|(_, rel)| *rel == "next")
        .map(|(url, _)| url.to_string())
}

/// Split on commas that are not inside `<...>`.
fn link_entries(header: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_url = false;
    let mut start = 0;

    for (i, c) in header.char_indices() {
        match c {
            '<' => in_url = true,
            '>' => in_url = false,
            ',' if !in_url => {
                entries.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&header[start..]);
    entries
}

fn parse_link_entry(entry: &str) -> Option<(&str, &str)> {
    let rest = entry.trim().strip_prefix('<')?;
    let (url, params) = rest.split_once('>')?;
    if url.is_empty() {
        return None;
    }

    let rel = params.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        (key.trim() == "rel").then(|| value.trim().trim_matches('"'))
    })?;

    Some((url, rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    const ISSUE_JSON: &str = r#"[{
        "id": 11,
        "number": 1,
        "title": "First",
        "html_url": "https://github.com/o/r/issues/1",
        "user": {"login": "alice", "html_url": "https://github.com/alice"},
        "created_at": "2024-05-01T10:00:00Z",
        "labels": [],
        "state": "open"
    }]"#;

    /// Answer exactly one request with a canned response and hand back the
    /// raw request text.
    async fn serve_once(
        status_line: &'static str,
        headers: Vec<(&'static str, String)>,
        body: String,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let mut response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n",
                status_line,
                body.len()
            );
            for (name, value) in headers {
                response.push_str(&format!("{}: {}\r\n", name, value));
            }
            response.push_str("\r\n");
            response.push_str(&body);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn client_for(base: &str) -> GitHub {
        let client = Client::builder().no_proxy().build().unwrap();
        GitHub::with_client(client, base)
    }

    fn spec() -> RepositorySpec {
        RepositorySpec {
            owner: "o".to_string(),
            name: "r".to_string(),
        }
    }

    #[test]
    fn next_link_extracted_among_others() {
        let header = r#"<https://api.github.com/repositories/1/issues?page=2>; rel="next", <https://api.github.com/repositories/1/issues?page=5>; rel="last""#;
        assert_eq!(
            next_page_url(header),
            Some("https://api.github.com/repositories/1/issues?page=2".to_string())
        );
    }

    #[test]
    fn next_link_not_first_entry() {
        let header = r#"<https://x/?page=1>; rel="prev", <https://x/?page=3>; rel="next""#;
        assert_eq!(next_page_url(header), Some("https://x/?page=3".to_string()));
    }

    #[test]
    fn no_next_relation_means_last_page() {
        let header = r#"<https://x/?page=1>; rel="first", <https://x/?page=4>; rel="prev""#;
        assert_eq!(next_page_url(header), None);
        assert_eq!(next_page_url(""), None);
    }

    #[test]
    fn next_relation_is_case_sensitive() {
        assert_eq!(next_page_url(r#"<https://x/?page=2>; rel="Next""#), None);
        assert_eq!(next_page_url(r#"<https://x/?page=2>; rel="nextish""#), None);
    }

    #[test]
    fn comma_inside_url_does_not_split_entry() {
        let header = r#"<https://x/?labels=a,b&page=2>; rel="next""#;
        assert_eq!(
            next_page_url(header),
            Some("https://x/?labels=a,b&page=2".to_string())
        );
    }

    #[test]
    fn error_body_message_is_used() {
        let err = remote_error(StatusCode::NOT_FOUND, br#"{"message": "Not Found"}"#);
        assert_eq!(err.to_string(), "GitHub API Error: 404 Not Found - Not Found");
    }

    #[test]
    fn error_body_without_message_falls_back() {
        let bodies: [&[u8]; 3] = [br#"{"documentation_url": "x"}"#, b"not json", b""];
        for body in bodies {
            match remote_error(StatusCode::INTERNAL_SERVER_ERROR, body) {
                IssuesError::Remote {
                    status, message, ..
                } => {
                    assert_eq!(status, 500);
                    assert_eq!(message, "Unknown error");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        let body = br#"[{"id": 1, "number": 2, "title": "no url"}]"#;
        let err = page_from_response(StatusCode::OK, None, body).unwrap_err();
        assert!(matches!(err, IssuesError::Parse(_)));
    }

    #[tokio::test]
    async fn first_page_request_shape() {
        let (base, server) = serve_once(
            "200 OK",
            vec![(
                "link",
                r#"<https://api.github.com/repositories/9/issues?page=2>; rel="next""#
                    .to_string(),
            )],
            ISSUE_JSON.to_string(),
        )
        .await;

        let github = client_for(&base);
        let cred = Credential::new("tok123");
        let page = github.fetch_page(&spec(), Some(&cred), None).await.unwrap();

        assert_eq!(page.issues.len(), 1);
        assert_eq!(page.issues[0].author.login, "alice");
        assert_eq!(
            page.next_page.as_deref(),
            Some("https://api.github.com/repositories/9/issues?page=2")
        );

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /repos/o/r/issues?state=open&per_page=20 "));
        assert!(request.contains("accept: application/vnd.github.v3+json"));
        assert!(request.contains("authorization: bearer tok123"));
    }

    #[tokio::test]
    async fn continuation_used_verbatim_without_auth() {
        let (base, server) = serve_once("200 OK", vec![], "[]".to_string()).await;
        let github = client_for("https://unused.invalid");

        let next = format!("{}/repositories/9/issues?page=2&per_page=20&state=open", base);
        let page = github.fetch_page(&spec(), None, Some(&next)).await.unwrap();
        assert!(page.issues.is_empty());
        assert_eq!(page.next_page, None);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /repositories/9/issues?page=2&per_page=20&state=open "));
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn blank_credential_sends_no_authorization() {
        let (base, server) = serve_once("200 OK", vec![], "[]".to_string()).await;
        let github = client_for(&base);
        let cred = Credential::new("");
        github.fetch_page(&spec(), Some(&cred), None).await.unwrap();

        let request = server.await.unwrap().to_lowercase();
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn non_success_status_becomes_remote_error() {
        let (base, _server) = serve_once(
            "403 Forbidden",
            vec![("content-type", "application/json".to_string())],
            r#"{"message": "API rate limit exceeded"}"#.to_string(),
        )
        .await;

        let err = client_for(&base)
            .fetch_page(&spec(), None, None)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "GitHub API Error: 403 Forbidden - API rate limit exceeded"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{}", addr))
            .fetch_page(&spec(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, IssuesError::Transport(_)), "{err:?}");
    }

    #[tokio::test]
    async fn empty_spec_rejected_before_network() {
        let github = client_for("http://127.0.0.1:9");
        let bad = RepositorySpec {
            owner: String::new(),
            name: "r".to_string(),
        };
        let err = github.fetch_page(&bad, None, None).await.unwrap_err();
        assert!(matches!(err, IssuesError::Validation));
    }
}
