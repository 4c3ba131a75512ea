// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation

/// Why an inbound frame was refused with a NAK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Checksum byte did not match the sum of the length and message bytes.
    BadChecksum,
    /// Non-hex characters on the wire, or a zero length byte.
    Malformed,
}

impl RejectReason {
    pub fn description(&self) -> &'static str {
        match self {
            Self::BadChecksum => "invalid checksum",
            Self::Malformed => "malformed frame",
        }
    }
}

/// All errors that can occur in the concord-bridge library.
#[derive(Debug, thiserror::Error)]
pub enum ConcordError {
    #[error("Failed to open serial device {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Payload too long: {len} bytes (max 254)")]
    PayloadTooLong { len: usize },

    #[error("Outbound queue full")]
    QueueFull,

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Serial link lost after {errors} consecutive I/O errors")]
    LinkLost { errors: u32 },

    #[error("I/O task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl ConcordError {
    /// Whether this error ended the session with the panel.
    pub fn is_link_failure(&self) -> bool {
        matches!(
            self,
            ConcordError::Open { .. } | ConcordError::LinkLost { .. } | ConcordError::TaskFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ConcordError>;
