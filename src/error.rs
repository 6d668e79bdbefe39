use thiserror::Error;

pub const INVALID_REPO_MESSAGE: &str = "Please enter a valid repository in the format owner/repo";

#[derive(Error, Debug)]
pub enum IssuesError {
    #[error("{}", INVALID_REPO_MESSAGE)]
    Validation,

    #[error("GitHub API Error: {status} {status_text} - {message}")]
    Remote {
        status: u16,
        status_text: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for IssuesError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IssuesError::Parse(err.to_string())
        } else {
            IssuesError::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, IssuesError>;
