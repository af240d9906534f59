use thiserror::Error;

/// Failure modes of a dashboard run. `StudentNotFound` and `InvalidWindow`
/// are user-facing; storage and internal failures are logged in full and
/// surfaced to callers without detail.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("student not found: {0}")]
    StudentNotFound(String),

    #[error("lookback window must be positive, got {0} days")]
    InvalidWindow(i64),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::StudentNotFound(_) | DashboardError::InvalidWindow(_) => {
                self.to_string()
            }
            DashboardError::Storage(_) | DashboardError::Internal(_) => {
                "dashboard generation failed".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_surfaces_the_code() {
        let err = DashboardError::StudentNotFound("STU042".into());
        assert!(err.user_message().contains("STU042"));
    }

    #[test]
    fn invalid_window_surfaces_the_value() {
        let err = DashboardError::InvalidWindow(-3);
        assert!(err.user_message().contains("-3"));
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let err = DashboardError::Internal("corrupt row in engagement_logs".into());
        let msg = err.user_message();
        assert!(!msg.contains("engagement_logs"));
        assert_eq!(msg, "dashboard generation failed");
    }
}
