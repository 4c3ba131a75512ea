// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation of the zone registry

use std::collections::HashMap;

use bitflags::bitflags;
use chrono::{DateTime, Utc};

use crate::constants::UNNAMED_ZONE;

bitflags! {
    /// View of the raw zone status byte.
    ///
    /// The core treats the status byte as opaque; these names follow the
    /// Concord automation documentation. Unknown bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ZoneStatusFlags: u8 {
        const TRIPPED  = 0b0000_0001;
        const FAULTED  = 0b0000_0010;
        const ALARM    = 0b0000_0100;
        const TROUBLE  = 0b0000_1000;
        const BYPASSED = 0b0001_0000;
    }
}

/// How the zone is wired to the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneKind {
    Hardwired,
    Wireless,
    Touchpad,
    Other(u8),
}

impl ZoneKind {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Hardwired,
            1 => Self::Wireless,
            2 => Self::Touchpad,
            other => Self::Other(other),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Hardwired => "Hardwired",
            Self::Wireless => "Wireless",
            Self::Touchpad => "Touchpad",
            Self::Other(_) => "Other",
        }
    }
}

/// A single monitored panel input.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: u32,
    pub name: String,
    /// Raw status byte; non-zero means the zone is active.
    pub status: u8,
    pub last_update: DateTime<Utc>,
    pub partition: u8,
    pub area: u8,
    pub group: u8,
    pub kind: ZoneKind,
}

impl Zone {
    pub fn new(id: u32, name: impl Into<String>, status: u8) -> Self {
        let name = name.into();
        Self {
            id,
            name: if name.is_empty() { UNNAMED_ZONE.to_string() } else { name },
            status,
            last_update: Utc::now(),
            partition: 0,
            area: 0,
            group: 0,
            kind: ZoneKind::Hardwired,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status != 0
    }

    pub fn flags(&self) -> ZoneStatusFlags {
        ZoneStatusFlags::from_bits_retain(self.status)
    }

    pub fn is_unnamed(&self) -> bool {
        self.name == UNNAMED_ZONE
    }
}

/// Zone id → zone map owned by the I/O loop.
///
/// Only the I/O loop mutates the registry. Everyone else works on clones.
#[derive(Debug, Default, Clone)]
pub struct ZoneRegistry {
    zones: HashMap<u32, Zone>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a zone with a fresh entity and return a copy.
    pub fn define_zone(&mut self, id: u32, name: impl Into<String>, status: u8) -> Zone {
        self.define(Zone::new(id, name, status))
    }

    /// Insert (or replace) a fully populated zone, stamping `last_update`.
    pub fn define(&mut self, mut zone: Zone) -> Zone {
        zone.last_update = Utc::now();
        self.zones.insert(zone.id, zone.clone());
        zone
    }

    /// Update the status of a known zone.
    ///
    /// Returns the updated zone and its previous status, or `None` (registry
    /// untouched) if the zone was never defined.
    pub fn update_status(&mut self, id: u32, status: u8) -> Option<(Zone, u8)> {
        let zone = self.zones.get_mut(&id)?;
        let previous = zone.status;
        zone.status = status;
        zone.last_update = Utc::now();
        Some((zone.clone(), previous))
    }

    pub fn get(&self, id: u32) -> Option<&Zone> {
        self.zones.get(&id)
    }

    /// Snapshot of every zone. Order is unspecified.
    pub fn zones(&self) -> Vec<Zone> {
        self.zones.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}
