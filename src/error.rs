use thiserror::Error;

/// Errors surfaced by the Valet interpreter.
///
/// Nothing is retried or swallowed: every failure reaches the caller as one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection, timeout or body read failure in the HTTP layer.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("request for {resource} failed with HTTP {status}")]
    Http { status: u16, resource: String },

    /// A name was not present in the cached catalog list.
    #[error("{kind} '{name}' is not listed by Valet; check the spelling and try again")]
    NotFound { kind: &'static str, name: String },

    /// The body could not be read as the declared format.
    #[error("malformed {format} response: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    /// Invalid format string, identifier or query parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// True for a 404 from the API or a name missing from the catalog.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::Http { status: 404, .. })
    }

    pub(crate) fn parse(format: &'static str, message: impl Into<String>) -> Self {
        Error::Parse {
            format,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
