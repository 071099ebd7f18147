use thiserror::Error;

pub type PackMgrResult<T> = Result<T, PackMgrError>;

/// Maximum number of characters of a response body kept in a [`PackMgrError::Transport`].
pub const BODY_EXCERPT_LIMIT: usize = 4096;

/// HTTP statuses the package manager uses while it is still busy with a previous job.
pub const STILL_PROCESSING_STATUSES: [u16; 3] = [408, 425, 429];

#[derive(Error, Debug)]
pub enum PackMgrError {
    /// The connection itself failed (refused, reset, timed out).
    #[error("HTTP call to {url} failed: {message}")]
    Network { url: String, message: String },

    /// The server answered, but with a failure status.
    #[error("HTTP call to {url} failed with status {status}{}", body_suffix(.body))]
    Transport {
        url: String,
        status: u16,
        body: String,
    },

    /// The vendor install sequence rejected the package.
    #[error("{0}")]
    Install(String),

    /// A response body could not be parsed.
    #[error("Error parsing {context}: {message}")]
    Parse { context: String, message: String },

    #[error("Unpack error: {0}")]
    Unpack(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path error: {0}")]
    Path(String),

    #[error("Credential error: {0}")]
    Credential(String),
}

fn body_suffix(body: &str) -> String {
    if body.trim().is_empty() {
        String::new()
    } else {
        format!("\n{}", body)
    }
}

impl PackMgrError {
    /// Build a transport error, keeping at most [`BODY_EXCERPT_LIMIT`] characters of the body.
    pub fn transport(url: impl Into<String>, status: u16, body: &str) -> Self {
        let body = match body.char_indices().nth(BODY_EXCERPT_LIMIT) {
            Some((idx, _)) => format!("{}...", &body[..idx]),
            None => body.to_string(),
        };
        PackMgrError::Transport {
            url: url.into(),
            status,
            body,
        }
    }

    pub fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        PackMgrError::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// HTTP status attached to the error, if the server responded at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PackMgrError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the transport layer may try the same call again.
    ///
    /// Authentication failures and other 4xx responses are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            PackMgrError::Network { .. } => true,
            PackMgrError::Transport { status, .. } => {
                *status >= 500 || STILL_PROCESSING_STATUSES.contains(status)
            }
            _ => false,
        }
    }
}

impl From<reqwest::Error> for PackMgrError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        let mut message = err.to_string();
        if err.is_timeout() {
            message.push_str(" (consider increasing http_socket_timeout_sec)");
        }
        PackMgrError::Network { url, message }
    }
}
