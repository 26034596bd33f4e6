//! Intake error taxonomy.
//!
//! | Kind        | Raised by        | HTTP          |
//! |-------------|------------------|---------------|
//! | Structural  | parser           | 404/405/415   |
//! | Validation  | parser           | 400           |
//! | Operational | consumer nack    | 503           |
//! | Behavioural | consumer nack    | 409           |
//! | Shutdown    | adapter teardown | 503           |

use axum::http::StatusCode;
use shared_types::HexError;

/// Field names as reported in validation diagnostics.
pub mod fields {
    pub const DEV_ADDR: &str = "devAddr";
    pub const APP_ID: &str = "app_id";
    pub const APP_URL: &str = "app_url";
    pub const NWKS_KEY: &str = "nwks_key";
}

/// Request does not target the registration route at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    /// Anything but `PUT`
    #[error("method {0} not allowed, expected PUT")]
    MethodNotAllowed(String),

    /// Path is not `/end-devices/{devAddr}`
    #[error("no route for path {0}")]
    NotFound(String),

    /// Missing or non-JSON content type
    #[error("unsupported content type {0:?}, expected application/json")]
    UnsupportedMediaType(Option<String>),
}

impl StructuralError {
    /// HTTP status the intake answers with.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }
}

/// Request targets the route but carries an unusable payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed JSON body: {0}")]
    MalformedBody(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must be a string")]
    NotAString(&'static str),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),

    #[error("field `{field}` is not valid hex: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: HexError,
    },
}

impl ValidationError {
    /// The offending field, if the error is attributable to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MalformedBody(_) => None,
            Self::MissingField(field)
            | Self::NotAString(field)
            | Self::EmptyField(field)
            | Self::InvalidHex { field, .. } => Some(field),
        }
    }
}

/// Result of a failed parse. Structural errors always win over validation
/// errors for the same request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ParseError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Structural(e) => e.status(),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Why the consumer refused a registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NackReason {
    /// Downstream (routing layer, storage, ...) unavailable.
    #[error("downstream unavailable: {0}")]
    Operational(String),

    /// Registration refused by business logic.
    #[error("registration refused: {0}")]
    Behavioural(String),
}

impl NackReason {
    pub fn operational(message: impl Into<String>) -> Self {
        Self::Operational(message.into())
    }

    pub fn behavioural(message: impl Into<String>) -> Self {
        Self::Behavioural(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Operational(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Behavioural(_) => StatusCode::CONFLICT,
        }
    }

    /// Short kind name used in response bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Operational(_) => "operational",
            Self::Behavioural(_) => "behavioural",
        }
    }
}

/// Misuse of an [`AckHandle`](crate::adapters::handoff::AckHandle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AckError {
    /// `ack` or `nack` was already called on this handle.
    #[error("acknowledgement already signalled")]
    AlreadySignalled,

    /// The HTTP side stopped waiting (client gone, ack timeout, shutdown).
    #[error("HTTP responder no longer waiting")]
    ResponderGone,
}

/// Adapter-level errors (not HTTP, consumer facing).
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The intake is shutting down or has shut down.
    #[error("intake shut down")]
    Shutdown,

    /// Configuration rejected by `IntakeConfig::validate`.
    #[error("configuration error: {0}")]
    Config(#[from] crate::domain::config::ConfigError),

    /// Socket bind / accept failure.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server task panicked or was aborted.
    #[error("server task failed: {0}")]
    Server(String),
}
