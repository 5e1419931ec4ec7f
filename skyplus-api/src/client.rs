use soap_client::{DeviceEndpoint, SoapClient};
use std::time::Duration;

use crate::{Result, SkyOperation};

/// A client for executing operations against one box
///
/// This client bridges the stateless operation definitions and actual
/// network requests. It uses the soap-client crate for the SOAP exchange
/// and maps its errors into [`crate::ApiError`].
#[derive(Debug, Clone)]
pub struct SkyClient {
    soap_client: SoapClient,
    endpoint: DeviceEndpoint,
}

impl SkyClient {
    /// Create a client for `endpoint` whose requests give up after `timeout`
    pub fn new(endpoint: DeviceEndpoint, timeout: Duration) -> Self {
        Self::with_soap_client(endpoint, SoapClient::with_timeout(timeout))
    }

    /// Create a client around an existing SOAP client
    pub fn with_soap_client(endpoint: DeviceEndpoint, soap_client: SoapClient) -> Self {
        Self {
            soap_client,
            endpoint,
        }
    }

    /// Execute an operation against the box
    ///
    /// Builds the action for `request`, sends it to the service's control
    /// path (or the endpoint's path override) and parses the reply.
    ///
    /// # Example
    /// ```rust,ignore
    /// use skyplus_api::operations::sky_play::{PlayOperation, PlayRequest};
    ///
    /// client.execute::<PlayOperation>(&PlayRequest::default()).await?;
    /// ```
    pub async fn execute<Op: SkyOperation>(&self, request: &Op::Request) -> Result<Op::Response> {
        let action = Op::action_request(request);
        let response = self
            .soap_client
            .call(&self.endpoint, Op::SERVICE.info().endpoint, &action)
            .await?;

        Op::parse_response(&response)
    }
}
