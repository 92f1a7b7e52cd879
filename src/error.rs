use reqwest::StatusCode;
use thiserror::Error;

/// Boxed error produced by a [`Transport`](crate::melissa::transport::Transport) implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by [`AddressClient`](crate::melissa::AddressClient) calls.
#[derive(Debug, Error)]
pub enum WebsmartError {
    /// The batch holds more records than the service accepts in one request.
    #[error("too many records in batch: {count} (limit is {limit})")]
    TooManyRecords { count: usize, limit: usize },
    /// The batch holds no record at all.
    #[error("batch contains no records")]
    EmptyBatch,
    /// The request could not be completed.
    #[error("could not connect to service at [{url}]: {failure}")]
    Connection {
        url: String,
        #[source]
        failure: ConnectionFailure,
    },
    /// The service answered with something that is not well-formed XML.
    #[error("malformed response from service: {reason}")]
    MalformedResponse {
        reason: String,
        /// Raw body as received, kept for diagnosis.
        body: String,
    },
    /// Building the XML payload failed.
    #[error("failed to encode request payload: {0}")]
    Encode(String),
    /// The underlying HTTP client could not be set up.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl WebsmartError {
    pub(crate) fn connection(url: impl ToString, failure: ConnectionFailure) -> Self {
        Self::Connection {
            url: url.to_string(),
            failure,
        }
    }

    pub(crate) fn malformed(reason: impl ToString, body: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.to_string(),
            body: body.into(),
        }
    }

    /// Raw response body attached to the error, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::MalformedResponse { body, .. } => Some(body),
            Self::Connection {
                failure: ConnectionFailure::Status { body, .. },
                ..
            } => Some(body),
            _ => None,
        }
    }
}

/// Why an exchange with the service did not produce a usable body.
#[derive(Debug, Error)]
pub enum ConnectionFailure {
    /// DNS, refused connection, timeout and the like.
    #[error("transport error: {0}")]
    Transport(#[source] BoxError),
    /// The service answered with a non-success status.
    #[error("unexpected status {status}")]
    Status { status: StatusCode, body: String },
    /// The service answered with an empty body.
    #[error("empty response body")]
    EmptyBody,
}

impl From<reqwest::Error> for ConnectionFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// Errors encountered while loading [`ClientConfig`](crate::config::ClientConfig) from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("invalid value for environment variable {key}: {value}")]
    InvalidValue { key: String, value: String },
    /// An endpoint is not a valid absolute URL.
    #[error("invalid endpoint url [{url}]: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
