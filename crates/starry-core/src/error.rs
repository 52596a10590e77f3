/// Errors surfaced by the console core.
///
/// Every variant ends up as an operator notification; none of them is fatal
/// to the process.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Missing credential, or the backend answered 401/403
    #[error("Not authenticated{}", status_suffix(.status))]
    Auth { status: Option<u16> },

    #[error("{status} {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    /// Malformed push-channel payload
    #[error("Malformed push payload: {message}")]
    Parse { message: String },

    /// Locally entered input rejected before any request was sent
    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("No guild selected")]
    GuildMissing,
}

impl ConsoleError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ConsoleError::Auth { .. })
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ConsoleError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn decode(err: impl std::fmt::Display) -> Self {
        ConsoleError::Decode {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ConsoleError::decode(err)
        } else {
            ConsoleError::Transport {
                message: err.to_string(),
            }
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
