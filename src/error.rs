use thiserror::Error;

/// Everything that can go wrong between the prompt box and the saved image.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Please enter a prompt")]
    EmptyPrompt,

    #[error("The request took too long to complete. Please try again with standard quality or a simpler prompt.")]
    Timeout,

    /// The endpoint answered but reported a failure.
    #[error("{message}")]
    Service {
        status: Option<u16>,
        message: String,
        retryable: bool,
    },

    #[error("No response from server. Please try again.")]
    NetworkUnreachable(String),

    #[error("Malformed server response: {0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Client(String),

    #[error("Failed to download image. Please try again.")]
    Download(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("A generation request is already in progress")]
    Busy,

    #[error("Generation cancelled")]
    Cancelled,
}

impl GenerationError {
    /// Transient failures signalled by the server (503 or an explicit retry flag).
    pub fn is_retryable(&self) -> bool {
        matches!(self, GenerationError::Service { retryable: true, .. })
    }

    /// Short machine-friendly name, used in structured log context.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::EmptyPrompt => "empty_prompt",
            GenerationError::Timeout => "timeout",
            GenerationError::Service {
                retryable: true, ..
            } => "transient_service",
            GenerationError::Service { .. } => "service",
            GenerationError::NetworkUnreachable(_) => "network_unreachable",
            GenerationError::MalformedResponse(_) => "malformed_response",
            GenerationError::Client(_) => "client",
            GenerationError::Download(_) => "download",
            GenerationError::Config(_) => "config",
            GenerationError::Busy => "busy",
            GenerationError::Cancelled => "cancelled",
        }
    }

    /// Underlying detail that is logged but not shown to the user.
    pub fn detail(&self) -> Option<&str> {
        match self {
            GenerationError::NetworkUnreachable(detail) | GenerationError::Download(detail) => {
                Some(detail)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
