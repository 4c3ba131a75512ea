// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the concord serial library
//
//! # concord-bridge
//!
//! Talks to Interlogix/GE Concord and Advent alarm panels over the serial
//! automation module (SuperBus 2000 interface), tracks zone state and
//! reports changes as events.
//!
//! On startup the client asks the panel for its equipment list, records one
//! zone per `ZoneData` frame, and once the list is complete requests live
//! status updates. Every valid frame is acknowledged; corrupted frames are
//! refused so the panel retransmits them.
//!
//! ## Quick Start
//!
//! ```no_run
//! use concord_bridge::{ClientConfig, ConcordClient, PanelEvent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::builder().device("/dev/ttyUSB0").build();
//!     let mut client = ConcordClient::open(config)?;
//!
//!     let mut events = client.take_events().expect("events already taken");
//!     tokio::spawn(async move {
//!         while let Some(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     tokio::signal::ctrl_c().await?;
//!     client.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod event;
pub mod homeassistant;
pub mod sequencer;
pub mod session;
pub mod tokens;
pub mod transport;

// Re-exports for convenience
pub use client::ConcordClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use constants::PanelType;
pub use devices::identity::PanelIdentity;
pub use devices::zone::{Zone, ZoneKind, ZoneStatusFlags};
pub use error::{ConcordError, Result};
pub use event::{EventReceiver, PanelEvent};
pub use session::SessionState;
pub use tokens::{TokenTable, decode_tokens};
