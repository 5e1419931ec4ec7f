//! Pause operation for the SkyPlay service

use soap_client::ActionResponse;

use super::INSTANCE_ID;
use crate::{ApiError, Service, SkyOperation};

/// Pause operation
pub struct PauseOperation;

/// Request for pause operation
#[derive(Debug, Clone)]
pub struct PauseRequest {
    pub instance_id: u32,
}

impl Default for PauseRequest {
    fn default() -> Self {
        Self {
            instance_id: INSTANCE_ID,
        }
    }
}

impl SkyOperation for PauseOperation {
    type Request = PauseRequest;
    type Response = ();

    const SERVICE: Service = Service::SkyPlay;
    const ACTION: &'static str = "Pause";

    fn parameters(request: &Self::Request) -> Vec<(&'static str, String)> {
        vec![("InstanceID", request.instance_id.to_string())]
    }

    fn parse_response(_response: &ActionResponse) -> Result<Self::Response, ApiError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_parameters() {
        let params = PauseOperation::parameters(&PauseRequest::default());
        assert_eq!(params, vec![("InstanceID", "0".to_string())]);
    }
}
