use reqwest::StatusCode;
use thiserror::Error;

use rewriter_core::CompletionError;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid adapter configuration: {0}")]
    InvalidConfig(String),
    #[error("unexpected http status {status}: {message}")]
    HttpStatus { status: StatusCode, message: String },
    #[error("API returned an empty response")]
    EmptyResponse,
}

impl AdapterError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            AdapterError::HttpStatus { status, .. } if *status == StatusCode::TOO_MANY_REQUESTS
        )
    }
}

/// 429 is a rate limit; any other API or transport failure is a service
/// error; a response we cannot read is unexpected.
impl From<AdapterError> for CompletionError {
    fn from(error: AdapterError) -> Self {
        if error.is_rate_limit() {
            return CompletionError::RateLimited;
        }
        match error {
            AdapterError::HttpStatus { message, .. } => CompletionError::Service(message),
            AdapterError::Http(err) => CompletionError::Service(err.to_string()),
            AdapterError::InvalidConfig(message) => CompletionError::Service(message),
            err @ (AdapterError::Json(_) | AdapterError::EmptyResponse) => {
                CompletionError::Other(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes_to_completion_errors() {
        let limited = AdapterError::HttpStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".into(),
        };
        assert_eq!(CompletionError::from(limited), CompletionError::RateLimited);

        let denied = AdapterError::HttpStatus {
            status: StatusCode::UNAUTHORIZED,
            message: "Incorrect API key provided".into(),
        };
        assert_eq!(
            CompletionError::from(denied),
            CompletionError::Service("Incorrect API key provided".into())
        );

        assert!(matches!(
            CompletionError::from(AdapterError::EmptyResponse),
            CompletionError::Other(_)
        ));
    }
}
