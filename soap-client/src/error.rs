//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The device did not answer within the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// XML parsing error
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// SOAP fault returned by the device
    #[error("SOAP fault: error code {0}")]
    Fault(u16),
}

impl From<reqwest::Error> for SoapError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            SoapError::Timeout(error.to_string())
        } else {
            SoapError::Network(error.to_string())
        }
    }
}
