//! SkyPlay service operations
//!
//! Playback control and channel changes. Every action addresses transport
//! instance 0, the only one the box exposes.

mod get_media_info;
mod pause;
mod play;
mod set_av_transport_uri;

pub use get_media_info::{GetMediaInfoOperation, GetMediaInfoRequest};
pub use pause::{PauseOperation, PauseRequest};
pub use play::{PlayOperation, PlayRequest};
pub use set_av_transport_uri::{SetAVTransportURIOperation, SetAVTransportURIRequest};

/// Transport instance every action addresses
pub const INSTANCE_ID: u32 = 0;
