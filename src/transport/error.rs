//! Error types for the factory and the transports

use thiserror::Error;

/// Errors raised while turning a spec into a transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    /// The spec (or its options) has the wrong shape
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The type identifier names no registered transport
    #[error("Transport type \"{0}\" does not exist or does not implement the transport capability")]
    Domain(String),
}

impl FactoryError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        FactoryError::InvalidArgument(msg.into())
    }

    pub fn domain(type_name: impl Into<String>) -> Self {
        FactoryError::Domain(type_name.into())
    }
}

/// Errors raised while delivering a message
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("Line too long (max {max} characters)")]
    LineTooLong { max: usize },

    #[error("Path too long (max {max} characters)")]
    PathTooLong { max: usize },

    #[error("Too many recipients (max {max})")]
    TooManyRecipients { max: usize },

    #[error("Domain name too long (max {max} characters)")]
    DomainTooLong { max: usize },

    #[error("User name too long (max {max} characters)")]
    UserTooLong { max: usize },

    #[error("Server rejected command with {code}: {message}")]
    Rejected { code: String, message: String },

    #[error("Malformed server reply: {0}")]
    MalformedReply(String),

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("sendmail exited with {status}: {stderr}")]
    Sendmail { status: String, stderr: String },
}

impl TransportError {
    /// Whether the remote side is still in a usable state after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TransportError::Rejected { .. })
    }
}

/// Size limits as defined in RFC 821
pub struct SmtpLimits;

impl SmtpLimits {
    /// Maximum length of a user name
    pub const USER_MAX_LENGTH: usize = 64;

    /// Maximum length of a domain name
    pub const DOMAIN_MAX_LENGTH: usize = 64;

    /// Maximum length of a path (reverse-path or forward-path)
    pub const PATH_MAX_LENGTH: usize = 256;

    /// Maximum length of a command line including CRLF
    pub const COMMAND_LINE_MAX_LENGTH: usize = 512;

    /// Maximum length of a text line including CRLF
    pub const TEXT_LINE_MAX_LENGTH: usize = 1000;

    /// Maximum number of recipients per message
    pub const MAX_RECIPIENTS: usize = 100;
}
