// MIT License - Copyright (c) 2026 Peter Wright
// Rust translation

/// Start of message marker.
pub const SOM: u8 = 0x0A;
/// Positive acknowledgement, written after every valid frame.
pub const ACK: u8 = 0x06;
/// Negative acknowledgement, written after a frame that fails validation.
pub const NAK: u8 = 0x15;

/// Default capacity of the outbound and event queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Name used for zones whose `ZoneData` frame carries no text.
pub const UNNAMED_ZONE: &str = "<unnamed>";

/// Commands received from the panel (first byte of a decoded payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    PanelType,
    ZoneData,
    PartitionData,
    BusDeviceData,
    BusCapabilityData,
    OutputData,
    EquipmentListDone,
    UserData,
    ScheduleData,
    EventData,
    LightAttach,
    ZoneStatus,
    ZoneStatusEx,
}

impl Command {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x01 => Some(Self::PanelType),
            0x03 => Some(Self::ZoneData),
            0x04 => Some(Self::PartitionData),
            0x05 => Some(Self::BusDeviceData),
            0x06 => Some(Self::BusCapabilityData),
            0x07 => Some(Self::OutputData),
            0x08 => Some(Self::EquipmentListDone),
            0x09 => Some(Self::UserData),
            0x0A => Some(Self::ScheduleData),
            0x0B => Some(Self::EventData),
            0x0C => Some(Self::LightAttach),
            0x21 => Some(Self::ZoneStatus),
            0x22 => Some(Self::ZoneStatusEx),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::PanelType => 0x01,
            Self::ZoneData => 0x03,
            Self::PartitionData => 0x04,
            Self::BusDeviceData => 0x05,
            Self::BusCapabilityData => 0x06,
            Self::OutputData => 0x07,
            Self::EquipmentListDone => 0x08,
            Self::UserData => 0x09,
            Self::ScheduleData => 0x0A,
            Self::EventData => 0x0B,
            Self::LightAttach => 0x0C,
            Self::ZoneStatus => 0x21,
            Self::ZoneStatusEx => 0x22,
        }
    }

    /// Minimum decoded payload length (command byte included) the dispatcher
    /// needs before it can interpret the frame.
    pub fn min_len(&self) -> usize {
        match self {
            Self::PanelType => 10,
            Self::ZoneData => 8,
            Self::ZoneStatus => 6,
            Self::ZoneStatusEx => 2,
            _ => 1,
        }
    }
}

/// Sub-commands carried in the second byte of a `ZoneStatusEx` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneStatusSubCommand {
    SirenSynchronize,
    TouchpadDisplay,
}

impl ZoneStatusSubCommand {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0x05 => Some(Self::SirenSynchronize),
            0x09 => Some(Self::TouchpadDisplay),
            _ => None,
        }
    }
}

/// Requests sent to the panel (command byte of an outbound message).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Request {
    /// Ask the panel to stream its full equipment list.
    EquipmentList,
    /// Ask the panel to start sending live status updates.
    DynamicDataRefresh,
}

impl Request {
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::EquipmentList => 0x02,
            Self::DynamicDataRefresh => 0x20,
        }
    }
}

/// Panel model codes reported by the `PanelType` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelType {
    Concord,
    ConcordExpress,
    ConcordExpress4,
    ConcordEuro,
    AdventCommercialFire250,
    AdventHomeNavigator132,
    AdventCommercialBurg250,
    AdventHomeNavigator250,
    AdventCommercialBurg500,
    AdventCommercialFire500,
    AdventCommercialFire132,
    AdventCommercialBurg132,
    Unknown(u8),
}

impl PanelType {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0x14 => Self::Concord,
            0x0B => Self::ConcordExpress,
            0x1E => Self::ConcordExpress4,
            0x0E => Self::ConcordEuro,
            0x0D => Self::AdventCommercialFire250,
            0x0F => Self::AdventHomeNavigator132,
            0x10 => Self::AdventCommercialBurg250,
            0x11 => Self::AdventHomeNavigator250,
            0x15 => Self::AdventCommercialBurg500,
            0x16 => Self::AdventCommercialFire500,
            0x17 => Self::AdventCommercialFire132,
            0x18 => Self::AdventCommercialBurg132,
            other => Self::Unknown(other),
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Concord => 0x14,
            Self::ConcordExpress => 0x0B,
            Self::ConcordExpress4 => 0x1E,
            Self::ConcordEuro => 0x0E,
            Self::AdventCommercialFire250 => 0x0D,
            Self::AdventHomeNavigator132 => 0x0F,
            Self::AdventCommercialBurg250 => 0x10,
            Self::AdventHomeNavigator250 => 0x11,
            Self::AdventCommercialBurg500 => 0x15,
            Self::AdventCommercialFire500 => 0x16,
            Self::AdventCommercialFire132 => 0x17,
            Self::AdventCommercialBurg132 => 0x18,
            Self::Unknown(v) => *v,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Concord => "Concord",
            Self::ConcordExpress => "Concord Express",
            Self::ConcordExpress4 => "Concord Express 4",
            Self::ConcordEuro => "Concord Euro",
            Self::AdventCommercialFire250 => "Advent Commercial Fire 250",
            Self::AdventHomeNavigator132 => "Advent Home Navigator 132",
            Self::AdventCommercialBurg250 => "Advent Commercial Burg 250",
            Self::AdventHomeNavigator250 => "Advent Home Navigator 250",
            Self::AdventCommercialBurg500 => "Advent Commercial Burg 500",
            Self::AdventCommercialFire500 => "Advent Commercial Fire 500",
            Self::AdventCommercialFire132 => "Advent Commercial Fire 132",
            Self::AdventCommercialBurg132 => "Advent Commercial Burg 132",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Concord-family panels encode hardware and software revisions
    /// differently from the Advent family.
    pub fn is_concord(&self) -> bool {
        matches!(
            self,
            Self::Concord | Self::ConcordExpress | Self::ConcordExpress4 | Self::ConcordEuro
        )
    }
}

impl std::fmt::Display for PanelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(v) => write!(f, "Unknown (0x{v:02X})"),
            other => f.write_str(other.name()),
        }
    }
}
