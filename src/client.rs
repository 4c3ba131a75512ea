// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the Concord client API

use std::sync::{Arc, OnceLock};

use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::constants::Request;
use crate::devices::identity::PanelIdentity;
use crate::devices::zone::{Zone, ZoneRegistry};
use crate::error::Result;
use crate::event::{EventReceiver, event_channel};
use crate::sequencer::{OutboundHandle, OutboundQueue};
use crate::session::{IoLoop, SessionState};
use crate::transport::{Link, serial};

/// Handle to a Concord panel attached over the automation module's serial port.
///
/// # Example
///
/// ```no_run
/// use concord_bridge::{ClientConfig, ConcordClient, PanelEvent};
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ClientConfig::builder().device("/dev/ttyUSB0").build();
///     let mut client = ConcordClient::open(config)?;
///
///     let mut events = client.take_events().expect("events already taken");
///     while let Some(event) = events.recv().await {
///         if let PanelEvent::ZoneUpdated { zone, .. } = event {
///             println!("Zone {} ({}) status={}", zone.id, zone.name, zone.status);
///         }
///     }
///
///     client.close().await?;
///     Ok(())
/// }
/// ```
pub struct ConcordClient {
    registry: Arc<RwLock<ZoneRegistry>>,
    identity: Arc<OnceLock<PanelIdentity>>,
    state: watch::Receiver<SessionState>,
    outbound: OutboundHandle,
    events: Option<EventReceiver>,
    shutdown_tx: watch::Sender<bool>,
    io_handle: Option<JoinHandle<Result<()>>>,
}

impl ConcordClient {
    /// Open the configured serial device and start the I/O loop.
    ///
    /// Must be called from within a tokio runtime. The equipment-list request
    /// is queued before the device is opened.
    pub fn open(config: ClientConfig) -> Result<Self> {
        let queue = OutboundQueue::new(config.outbound_capacity);
        queue.seed()?;
        let port = serial::open(&config.device)?;
        Ok(Self::start(config, queue, port))
    }

    /// Start the I/O loop on an already open link.
    pub fn from_stream<S: Link>(stream: S, config: ClientConfig) -> Result<Self> {
        let queue = OutboundQueue::new(config.outbound_capacity);
        queue.seed()?;
        Ok(Self::start(config, queue, stream))
    }

    fn start<S: Link>(config: ClientConfig, queue: OutboundQueue, stream: S) -> Self {
        let (event_tx, event_rx) = event_channel(config.event_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let outbound = queue.handle();

        let io_loop = IoLoop::new(&config, queue, event_tx, shutdown_rx);
        let registry = io_loop.registry();
        let identity = io_loop.identity();
        let state = io_loop.watch_state();

        let io_handle = tokio::spawn(io_loop.run(stream));
        debug!("I/O loop started");

        Self {
            registry,
            identity,
            state,
            outbound,
            events: Some(event_rx),
            shutdown_tx,
            io_handle: Some(io_handle),
        }
    }

    /// Take the event receiver. Returns `None` after the first call.
    ///
    /// The channel is bounded: frame processing waits while it is full.
    pub fn take_events(&mut self) -> Option<EventReceiver> {
        self.events.take()
    }

    /// Get a snapshot of all zones, in no particular order.
    pub async fn zones(&self) -> Vec<Zone> {
        self.registry.read().await.zones()
    }

    /// Get a specific zone by panel zone number.
    pub async fn zone(&self, id: u32) -> Option<Zone> {
        self.registry.read().await.get(id).cloned()
    }

    /// Panel identity, once the panel has reported it.
    pub fn panel_identity(&self) -> Option<PanelIdentity> {
        self.identity.get().cloned()
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Receiver notified on every session state change.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Ask the panel to resend its equipment list.
    pub async fn request_equipment_list(&self) -> Result<()> {
        self.outbound.request(Request::EquipmentList).await
    }

    /// Ask the panel to resend live status for every zone.
    pub async fn request_dynamic_refresh(&self) -> Result<()> {
        self.outbound.request(Request::DynamicDataRefresh).await
    }

    /// Stop the I/O loop and wait for it to finish.
    ///
    /// Returns the error that ended the loop, if it stopped on its own.
    pub async fn close(mut self) -> Result<()> {
        info!("Closing panel link");
        self.shutdown_tx.send_replace(true);
        match self.io_handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }
}

impl Drop for ConcordClient {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
        if let Some(h) = self.io_handle.take() {
            h.abort();
        }
    }
}
