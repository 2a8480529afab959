use crate::errors::PaperviewError;

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Content source '{url}' unreachable: {reason}")]
    SourceUnreachable { url: String, reason: String },

    #[error("Content source '{url}' answered with status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Failed to build probe client: {message}")]
    ClientBuildFailed { message: String },
}

impl PaperviewError for ProbeError {
    fn error_code(&self) -> &'static str {
        match self {
            ProbeError::SourceUnreachable { .. } => "SOURCE_UNREACHABLE",
            ProbeError::UnexpectedStatus { .. } => "SOURCE_UNEXPECTED_STATUS",
            ProbeError::ClientBuildFailed { .. } => "PROBE_CLIENT_BUILD_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_codes() {
        let error = ProbeError::UnexpectedStatus {
            url: "https://localhost/screen".to_string(),
            status: 502,
        };
        assert_eq!(error.error_code(), "SOURCE_UNEXPECTED_STATUS");
        assert_eq!(
            error.to_string(),
            "Content source 'https://localhost/screen' answered with status 502"
        );
        assert!(!error.is_user_error());
    }
}
