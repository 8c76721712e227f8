//! HTTP error mapping for the chat completions adapter

use super::protocol::ErrorResponse;
use mdt_application::ports::llm_gateway::GatewayError;
use reqwest::StatusCode;

/// Map a non-success HTTP response to a gateway error.
///
/// The provider's `{"error": {"message": ...}}` body is preferred over the
/// raw text when present.
pub fn map_http_error(status: StatusCode, body: &str, model: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorResponse>(body)
        .map(|wrapper| wrapper.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GatewayError::Unauthorized(message),
        StatusCode::NOT_FOUND => GatewayError::ModelNotAvailable(format!("{}: {}", model, message)),
        StatusCode::TOO_MANY_REQUESTS => GatewayError::RateLimited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => GatewayError::Timeout,
        _ => GatewayError::RequestFailed(format!("HTTP {}: {}", status.as_u16(), message)),
    }
}

/// Map a transport-level failure (no response received).
pub fn map_transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else if err.is_connect() {
        GatewayError::ConnectionError(err.to_string())
    } else if err.is_decode() {
        GatewayError::InvalidResponse(err.to_string())
    } else {
        GatewayError::RequestFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_uses_provider_message() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        match map_http_error(StatusCode::UNAUTHORIZED, body, "gpt-5.1") {
            GatewayError::Unauthorized(message) => assert_eq!(message, "Incorrect API key provided"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_names_model() {
        let err = map_http_error(StatusCode::NOT_FOUND, "no such model", "grok-4");
        assert!(matches!(err, GatewayError::ModelNotAvailable(ref m) if m == "grok-4: no such model"));
    }

    #[test]
    fn test_rate_limit_and_timeout() {
        assert!(matches!(
            map_http_error(StatusCode::TOO_MANY_REQUESTS, "slow down", "m"),
            GatewayError::RateLimited(_)
        ));
        assert!(matches!(
            map_http_error(StatusCode::GATEWAY_TIMEOUT, "", "m"),
            GatewayError::Timeout
        ));
    }

    #[test]
    fn test_other_status_keeps_code() {
        let err = map_http_error(StatusCode::BAD_GATEWAY, "upstream down\n", "m");
        assert_eq!(err.to_string(), "Request failed: HTTP 502: upstream down");
    }
}
