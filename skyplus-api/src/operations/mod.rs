//! Box operations organized by service
//!
//! Every action the box accepts lives here, grouped under the UPnP service
//! it belongs to.

pub mod sky_play;

pub use sky_play::{
    GetMediaInfoOperation, PauseOperation, PlayOperation, SetAVTransportURIOperation,
};
