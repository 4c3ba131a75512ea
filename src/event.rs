// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation

use crate::devices::identity::PanelIdentity;
use crate::devices::zone::Zone;

/// All events that can be emitted by the I/O loop.
///
/// Events are delivered in the order their frames were validated.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// Panel identity is now available
    PanelDefined(PanelIdentity),
    /// Zone registered from the equipment list
    ZoneDefined(Zone),
    /// Zone status changed
    ZoneUpdated { zone: Zone, previous_status: u8 },
}

impl PanelEvent {
    /// The zone carried by this event, if any.
    pub fn zone(&self) -> Option<&Zone> {
        match self {
            Self::ZoneDefined(zone) | Self::ZoneUpdated { zone, .. } => Some(zone),
            Self::PanelDefined(_) => None,
        }
    }
}

/// Type alias for the bounded event sender.
pub type EventSender = tokio::sync::mpsc::Sender<PanelEvent>;

/// Type alias for the bounded event receiver.
pub type EventReceiver = tokio::sync::mpsc::Receiver<PanelEvent>;

/// Create a new event channel with the given capacity.
///
/// The sender waits for capacity when the channel is full, so a slow
/// consumer stalls frame processing instead of losing events.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::channel(capacity)
}
