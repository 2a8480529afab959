use paperview_core::errors::PaperviewError;
use paperview_core::DisplayError;

#[derive(Debug, thiserror::Error)]
pub enum DaemonError {
    #[error("Failed to open display: {source}")]
    DisplayOpen {
        #[source]
        source: DisplayError,
    },

    #[error("Failed to bind control server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Control server failed: {source}")]
    Server {
        #[source]
        source: std::io::Error,
    },

    #[error("Background task failed: {message}")]
    TaskFailed { message: String },
}

impl PaperviewError for DaemonError {
    fn error_code(&self) -> &'static str {
        match self {
            DaemonError::DisplayOpen { .. } => "DAEMON_DISPLAY_OPEN_FAILED",
            DaemonError::Bind { .. } => "DAEMON_BIND_FAILED",
            DaemonError::Server { .. } => "DAEMON_SERVER_FAILED",
            DaemonError::TaskFailed { .. } => "DAEMON_TASK_FAILED",
        }
    }

    fn is_user_error(&self) -> bool {
        match self {
            DaemonError::DisplayOpen { source } => source.is_user_error(),
            DaemonError::Bind { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let error = DaemonError::Bind {
            addr: "0.0.0.0:5002".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use"),
        };
        assert_eq!(
            error.to_string(),
            "Failed to bind control server on 0.0.0.0:5002: address in use"
        );
        assert_eq!(error.error_code(), "DAEMON_BIND_FAILED");
        assert!(error.is_user_error());
    }

    #[test]
    fn test_display_open_inherits_user_error() {
        let error = DaemonError::DisplayOpen {
            source: DisplayError::DeviceOpen {
                device: "/dev/spidev0.0".to_string(),
                message: "permission denied".to_string(),
            },
        };
        assert!(error.is_user_error());
        assert_eq!(error.error_code(), "DAEMON_DISPLAY_OPEN_FAILED");
    }
}
