use soap_client::{ActionRequest, ActionResponse};

use crate::error::ApiError;
use crate::service::Service;

/// Base trait for all box operations
///
/// Each operation names its service and action, turns a typed request into
/// the ordered parameter list the box expects, and extracts a typed response
/// from the decoded reply.
pub trait SkyOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// The UPnP service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Ordered `(name, value)` arguments for the action
    fn parameters(request: &Self::Request) -> Vec<(&'static str, String)>;

    /// Extract the typed response from the decoded reply
    fn parse_response(response: &ActionResponse) -> Result<Self::Response, ApiError>;

    /// The full action request for `request`
    fn action_request(request: &Self::Request) -> ActionRequest {
        Self::parameters(request).into_iter().fold(
            ActionRequest::new(Self::ACTION, Self::SERVICE.info().service_uri),
            |action, (name, value)| action.param(name, value),
        )
    }
}
