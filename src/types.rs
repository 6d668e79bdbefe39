use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IssuesError, Result};

/// `owner/name` pair identifying the repository being browsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySpec {
    pub owner: String,
    pub name: String,
}

impl RepositorySpec {
    /// Split `owner/name` on its single separator. Anything other than
    /// exactly two non-empty parts is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut parts = raw.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(IssuesError::Validation),
        }
    }
}

impl fmt::Display for RepositorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Access token held in memory for the current session only.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// GitHub Issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    #[serde(rename = "html_url")]
    pub url: String,
    #[serde(rename = "user")]
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub labels: Vec<Label>,
    pub state: IssueState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub login: String,
    #[serde(rename = "html_url")]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(rename = "color")]
    pub color_hex: String,
}

impl Label {
    /// Parse the `rrggbb` colour GitHub sends (a leading `#` is tolerated).
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        let hex = self.color_hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some((channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueState::Open => write!(f, "Open"),
            IssueState::Closed => write!(f, "Closed"),
        }
    }
}

/// One page of results. `next_page` is the opaque URL of the following
/// page; `None` means the listing is exhausted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub issues: Vec<Issue>,
    pub next_page: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_owner_and_name() {
        let spec = RepositorySpec::parse("rust-lang/rust").unwrap();
        assert_eq!(spec.owner, "rust-lang");
        assert_eq!(spec.name, "rust");
        assert_eq!(spec.to_string(), "rust-lang/rust");
    }

    #[test]
    fn parse_rejects_malformed_input() {
        for raw in ["", "foo", "a/b/c", "/repo", "owner/", "/"] {
            assert!(
                matches!(RepositorySpec::parse(raw), Err(IssuesError::Validation)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn credential_debug_is_redacted() {
        let cred = Credential::new("ghp_secret");
        assert!(!format!("{:?}", cred).contains("ghp_secret"));
        assert_eq!(cred.expose(), "ghp_secret");
    }

    #[test]
    fn blank_credential_is_empty() {
        assert!(Credential::new("").is_empty());
        assert!(Credential::new("  ").is_empty());
        assert!(!Credential::new("t").is_empty());
    }

    #[test]
    fn label_rgb_parses_hex() {
        let label = Label {
            name: "bug".to_string(),
            color_hex: "d73a4a".to_string(),
        };
        assert_eq!(label.rgb(), Some((0xd7, 0x3a, 0x4a)));
    }

    #[test]
    fn label_rgb_rejects_bad_hex() {
        for hex in ["", "fff", "zzzzzz", "12345678", "ééé"] {
            let label = Label {
                name: "x".to_string(),
                color_hex: hex.to_string(),
            };
            assert_eq!(label.rgb(), None, "{hex:?}");
        }
    }

    #[test]
    fn issue_deserializes_from_api_shape() {
        let json = r#"{
            "id": 1,
            "number": 42,
            "title": "Crash on start",
            "html_url": "https://github.com/o/r/issues/42",
            "user": {"login": "octocat", "html_url": "https://github.com/octocat", "id": 9},
            "created_at": "2024-01-02T03:04:05Z",
            "labels": [{"name": "bug", "color": "d73a4a", "id": 7}],
            "state": "open",
            "comments": 3
        }"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.number, 42);
        assert_eq!(issue.author.login, "octocat");
        assert_eq!(issue.labels[0].color_hex, "d73a4a");
        assert_eq!(issue.state, IssueState::Open);
    }
}
