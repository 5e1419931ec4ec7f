//! SetAVTransportURI operation for the SkyPlay service
//!
//! Tunes the box to a channel given by its hexadecimal id.

use soap_client::ActionResponse;

use super::INSTANCE_ID;
use crate::{ApiError, Service, SkyOperation};

/// SetAVTransportURI operation
pub struct SetAVTransportURIOperation;

/// Request for SetAVTransportURI operation
#[derive(Debug, Clone)]
pub struct SetAVTransportURIRequest {
    pub instance_id: u32,
    /// Channel id in hex, as it appears after `xsi://`
    pub channel_hex_id: String,
}

impl SetAVTransportURIRequest {
    pub fn channel(channel_hex_id: impl Into<String>) -> Self {
        Self {
            instance_id: INSTANCE_ID,
            channel_hex_id: channel_hex_id.into(),
        }
    }
}

impl SkyOperation for SetAVTransportURIOperation {
    type Request = SetAVTransportURIRequest;
    type Response = ();

    const SERVICE: Service = Service::SkyPlay;
    const ACTION: &'static str = "SetAVTransportURI";

    fn parameters(request: &Self::Request) -> Vec<(&'static str, String)> {
        vec![
            ("InstanceID", request.instance_id.to_string()),
            ("CurrentURI", format!("xsi://{}", request.channel_hex_id)),
            ("CurrentURIMetaData", "NOT_IMPLEMENTED".to_string()),
        ]
    }

    fn parse_response(_response: &ActionResponse) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}
