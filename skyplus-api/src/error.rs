use soap_client::SoapError;
use thiserror::Error;

/// High-level API errors for set-top box operations
///
/// This enum provides domain-specific error types that abstract away the underlying
/// SOAP and HTTP details and provide meaningful error information for the
/// failure scenarios of controlling the box and reading programme data.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network communication error
    ///
    /// Connection refused, DNS failure, unreachable box or metadata service.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The box or a metadata service did not answer in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Response parsing error
    ///
    /// Malformed XML or JSON, or a well-formed reply missing a field the
    /// operation needs.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// SOAP fault returned by the box
    #[error("SOAP fault: error code {0}")]
    SoapFault(u16),

    /// Subscription operation failed
    ///
    /// A renewal was rejected, or the callback listener could not start.
    #[error("Subscription error: {0}")]
    SubscriptionError(String),

    /// One or more parts of a channel listing could not be fetched
    #[error("Listing incomplete: {}", format_failures(.failures))]
    Listing {
        /// `(part, reason)` for every part that failed
        failures: Vec<(u8, String)>,
    },

    /// Device-level failure such as discovery finding nothing usable
    #[error("Device error: {0}")]
    DeviceError(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

fn format_failures(failures: &[(u8, String)]) -> String {
    failures
        .iter()
        .map(|(part, reason)| format!("part {}: {}", part, reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Type alias for results that can return an ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// Convert from SoapError to ApiError
impl From<SoapError> for ApiError {
    fn from(error: SoapError) -> Self {
        match error {
            SoapError::Network(msg) => ApiError::NetworkError(msg),
            SoapError::Timeout(msg) => ApiError::Timeout(msg),
            SoapError::Parse(msg) => ApiError::ParseError(msg),
            SoapError::Fault(code) => ApiError::SoapFault(code),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ApiError::Timeout(error.to_string())
        } else if error.is_decode() {
            ApiError::ParseError(error.to_string())
        } else {
            ApiError::NetworkError(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(error: serde_json::Error) -> Self {
        ApiError::ParseError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soap_error_conversion() {
        let api_error: ApiError = SoapError::Network("connection refused".to_string()).into();
        assert!(matches!(api_error, ApiError::NetworkError(_)));

        let api_error: ApiError = SoapError::Timeout("10s".to_string()).into();
        assert!(matches!(api_error, ApiError::Timeout(_)));

        let api_error: ApiError = SoapError::Parse("invalid XML".to_string()).into();
        assert!(matches!(api_error, ApiError::ParseError(_)));

        let api_error: ApiError = SoapError::Fault(718).into();
        assert!(matches!(api_error, ApiError::SoapFault(718)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let api_error: ApiError = json_error.into();
        assert!(matches!(api_error, ApiError::ParseError(_)));
    }

    #[test]
    fn test_error_display() {
        let network_err = ApiError::NetworkError("connection failed".to_string());
        assert_eq!(format!("{}", network_err), "Network error: connection failed");

        let soap_fault = ApiError::SoapFault(500);
        assert_eq!(format!("{}", soap_fault), "SOAP fault: error code 500");

        let listing = ApiError::Listing {
            failures: vec![(1, "timed out".to_string()), (3, "HTTP 503".to_string())],
        };
        assert_eq!(
            format!("{}", listing),
            "Listing incomplete: part 1: timed out; part 3: HTTP 503"
        );
    }
}
