//! GetMediaInfo operation for the SkyPlay service

use soap_client::ActionResponse;

use super::INSTANCE_ID;
use crate::{ApiError, MediaInfo, Service, SkyOperation};

/// GetMediaInfo operation
pub struct GetMediaInfoOperation;

/// Request for GetMediaInfo operation
#[derive(Debug, Clone)]
pub struct GetMediaInfoRequest {
    pub instance_id: u32,
}

impl Default for GetMediaInfoRequest {
    fn default() -> Self {
        Self {
            instance_id: INSTANCE_ID,
        }
    }
}

impl SkyOperation for GetMediaInfoOperation {
    type Request = GetMediaInfoRequest;
    type Response = MediaInfo;

    const SERVICE: Service = Service::SkyPlay;
    const ACTION: &'static str = "GetMediaInfo";

    fn parameters(request: &Self::Request) -> Vec<(&'static str, String)> {
        vec![("InstanceID", request.instance_id.to_string())]
    }

    fn parse_response(response: &ActionResponse) -> Result<Self::Response, ApiError> {
        let uri = response
            .field("CurrentURI")
            .ok_or_else(|| ApiError::ParseError("Missing CurrentURI element".to_string()))?;

        Ok(MediaInfo::from_uri(uri))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reply(fields: serde_json::Value) -> ActionResponse {
        ActionResponse::new("GetMediaInfo", json!({ "u:GetMediaInfoResponse": fields }))
    }

    #[test]
    fn test_get_media_info_parameters() {
        let params = GetMediaInfoOperation::parameters(&GetMediaInfoRequest::default());
        assert_eq!(params, vec![("InstanceID", "0".to_string())]);
    }

    #[test]
    fn test_get_media_info_broadcast() {
        let response = reply(json!({
            "NrTracks": "1",
            "CurrentURI": "xsi://7D1",
            "CurrentURIMetaData": "NOT_IMPLEMENTED"
        }));

        let info = GetMediaInfoOperation::parse_response(&response).unwrap();
        assert_eq!(info.channel_id(), Some(2001));
    }

    #[test]
    fn test_get_media_info_missing_uri() {
        let response = reply(json!({ "NrTracks": "1" }));

        let result = GetMediaInfoOperation::parse_response(&response);
        if let Err(ApiError::ParseError(msg)) = result {
            assert!(msg.contains("Missing CurrentURI element"));
        } else {
            panic!("Expected ParseError");
        }
    }

    #[test]
    fn test_get_media_info_missing_response_element() {
        let response = ActionResponse::new("GetMediaInfo", json!({}));
        assert!(matches!(
            GetMediaInfoOperation::parse_response(&response),
            Err(ApiError::ParseError(_))
        ));
    }
}
