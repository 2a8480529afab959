use paperview_core::errors::PaperviewError;

#[derive(Debug, thiserror::Error)]
pub enum DnsError {
    #[error("Failed to build DNS API client: {message}")]
    ClientBuildFailed { message: String },

    #[error("DNS API request failed: {message}")]
    Request { message: String },

    #[error("DNS API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("DNS record has no content")]
    MissingContent,

    #[error("DNS record content '{value}' is not an IP address")]
    InvalidAddress { value: String },
}

impl From<reqwest::Error> for DnsError {
    fn from(error: reqwest::Error) -> Self {
        DnsError::Request {
            message: error.to_string(),
        }
    }
}

impl PaperviewError for DnsError {
    fn error_code(&self) -> &'static str {
        match self {
            DnsError::ClientBuildFailed { .. } => "DNS_CLIENT_BUILD_FAILED",
            DnsError::Request { .. } => "DNS_REQUEST_FAILED",
            DnsError::Status { .. } => "DNS_UNEXPECTED_STATUS",
            DnsError::MissingContent => "DNS_MISSING_CONTENT",
            DnsError::InvalidAddress { .. } => "DNS_INVALID_ADDRESS",
        }
    }
}
