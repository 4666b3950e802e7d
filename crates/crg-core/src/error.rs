use thiserror::Error;

/// User-facing text for a market fetch that hit the rate limit.
pub const RATE_LIMITED_MESSAGE: &str = "Rate limit exceeded. Please wait a moment.";

/// User-facing text for every other market fetch failure.
pub const MARKET_FAILURE_MESSAGE: &str = "Failed to fetch market data.";

/// Errors raised while talking to the chat or market gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No credential was configured for the chat gateway.
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,

    /// The remote service answered with HTTP 429.
    #[error("rate limited by remote service")]
    RateLimited,

    /// Any other non-success HTTP status.
    #[error("remote service returned {0}: {1}")]
    Status(u16, String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The response decoded but carried no usable content.
    #[error("remote service returned an empty response")]
    Empty,

    /// The task running the request died before producing a result.
    #[error("request task failed: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Classify a non-success status code.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            GatewayError::RateLimited
        } else {
            GatewayError::Status(status.as_u16(), body)
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GatewayError::RateLimited)
    }

    /// Message shown in the market widget's error overlay.
    pub fn market_message(&self) -> &'static str {
        if self.is_rate_limited() {
            RATE_LIMITED_MESSAGE
        } else {
            MARKET_FAILURE_MESSAGE
        }
    }
}
