//! What the box is currently showing, decoded from its `CurrentURI`

use std::fmt;

const BROADCAST_PREFIX: &str = "xsi://";
const PVR_PREFIX: &str = "file://pvr/";

/// Source currently playing on the box
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaInfo {
    /// A live channel, `xsi://<hex>`
    Broadcast {
        channel_hex_id: String,
        channel_id: u32,
    },
    /// A recording, `file://pvr/<hex>`
    Pvr { pvr_hex_id: String, pvr_id: u32 },
    /// Anything this crate does not understand, kept verbatim
    Unknown { uri: String },
}

impl MediaInfo {
    /// Classify a `CurrentURI` value
    pub fn from_uri(uri: &str) -> Self {
        if let Some(hex) = uri.strip_prefix(BROADCAST_PREFIX) {
            if let Ok(channel_id) = u32::from_str_radix(hex, 16) {
                return MediaInfo::Broadcast {
                    channel_hex_id: hex.to_string(),
                    channel_id,
                };
            }
        } else if let Some(hex) = uri.strip_prefix(PVR_PREFIX) {
            if let Ok(pvr_id) = u32::from_str_radix(hex, 16) {
                return MediaInfo::Pvr {
                    pvr_hex_id: hex.to_string(),
                    pvr_id,
                };
            }
        }

        MediaInfo::Unknown {
            uri: uri.to_string(),
        }
    }

    /// Decimal channel id, when a live channel is showing
    pub fn channel_id(&self) -> Option<u32> {
        match self {
            MediaInfo::Broadcast { channel_id, .. } => Some(*channel_id),
            _ => None,
        }
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaInfo::Broadcast { channel_id, channel_hex_id } => {
                write!(f, "channel {} ({})", channel_id, channel_hex_id)
            }
            MediaInfo::Pvr { pvr_id, pvr_hex_id } => {
                write!(f, "recording {} ({})", pvr_id, pvr_hex_id)
            }
            MediaInfo::Unknown { uri } => write!(f, "unknown source {}", uri),
        }
    }
}
