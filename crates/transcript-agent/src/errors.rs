/// Errors raised while talking to the upstream agent CLI.
///
/// These never cross the normalizer's outer boundary as raw faults: the
/// query task converts every one of them into a single `Error` chunk
/// followed by the terminal `Done`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Spawning the process or reading its stream failed.
    #[error("transport error: {message}")]
    Transport { message: String },
    /// Upstream emitted a line the decoder could not understand.
    #[error("protocol error: {message}")]
    Protocol { message: String },
}

impl TransportError {
    /// Creates a transport-level error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a protocol-level error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Returns the human-readable message for this error.
    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message } | Self::Protocol { message } => message,
        }
    }
}

/// Service-level failures surfaced to the transcript as `Error` chunks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// The agent CLI executable could not be located; terminal for the query.
    #[error("agent CLI not found; install it or set its path in the config")]
    CliNotFound,
    /// Invalid service configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Failure propagated from the transport layer.
    #[error(transparent)]
    Transport(TransportError),
}

impl From<TransportError> for AgentError {
    fn from(value: TransportError) -> Self {
        AgentError::Transport(value)
    }
}
