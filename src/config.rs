// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation

use std::sync::Arc;
use std::time::Duration;

use crate::constants::DEFAULT_QUEUE_CAPACITY;
use crate::tokens::TokenTable;

/// Configuration for talking to a Concord panel over a serial link.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Serial device path (default: /dev/ttyUSB0)
    pub device: String,
    /// Read poll timeout; also the inter-byte gap limit within a frame (default: 125ms)
    pub read_timeout: Duration,
    /// Capacity of the outbound frame queue (default: 10)
    pub outbound_capacity: usize,
    /// Capacity of the event channel (default: 10)
    pub event_capacity: usize,
    /// Consecutive I/O errors tolerated before the link is declared lost (default: 10)
    pub max_consecutive_io_errors: u32,
    /// Token table used to render zone names and touchpad text
    pub tokens: Arc<TokenTable>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            read_timeout: Duration::from_millis(125),
            outbound_capacity: DEFAULT_QUEUE_CAPACITY,
            event_capacity: DEFAULT_QUEUE_CAPACITY,
            max_consecutive_io_errors: 10,
            tokens: Arc::new(TokenTable::default()),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.config.device = device.into();
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout = Duration::from_millis(ms);
        self
    }

    /// Capacity of the outbound queue. Zero is raised to one.
    pub fn outbound_capacity(mut self, capacity: usize) -> Self {
        self.config.outbound_capacity = capacity.max(1);
        self
    }

    /// Capacity of the event channel. Zero is raised to one.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity.max(1);
        self
    }

    pub fn max_consecutive_io_errors(mut self, errors: u32) -> Self {
        self.config.max_consecutive_io_errors = errors.max(1);
        self
    }

    pub fn tokens(mut self, tokens: TokenTable) -> Self {
        self.config.tokens = Arc::new(tokens);
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
