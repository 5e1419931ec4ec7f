//! Play operation for the SkyPlay service

use soap_client::ActionResponse;

use super::INSTANCE_ID;
use crate::{ApiError, Service, SkyOperation};

/// Play operation
pub struct PlayOperation;

/// Request for play operation
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub instance_id: u32,
    pub speed: u32,
}

impl Default for PlayRequest {
    fn default() -> Self {
        Self {
            instance_id: INSTANCE_ID,
            speed: 1,
        }
    }
}

impl SkyOperation for PlayOperation {
    type Request = PlayRequest;
    type Response = ();

    const SERVICE: Service = Service::SkyPlay;
    const ACTION: &'static str = "Play";

    fn parameters(request: &Self::Request) -> Vec<(&'static str, String)> {
        vec![
            ("InstanceID", request.instance_id.to_string()),
            ("Speed", request.speed.to_string()),
        ]
    }

    fn parse_response(_response: &ActionResponse) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_parameters() {
        let params = PlayOperation::parameters(&PlayRequest::default());
        assert_eq!(
            params,
            vec![("InstanceID", "0".to_string()), ("Speed", "1".to_string())]
        );
    }

    #[test]
    fn test_play_action_request() {
        let request = PlayOperation::action_request(&PlayRequest::default());
        assert_eq!(request.action, "Play");
        assert_eq!(request.service_uri, "urn:schemas-nds-com:service:SkyPlay:2");
        assert_eq!(request.params.len(), 2);
    }
}
