use std::fmt;

use crate::notify::NotifyOutcome;

/// Non-fatal conditions met during a deployment.
/// They are reported to the user but never change the exit code.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployWarning {
    /// No webhook URL was configured
    NotificationSkipped { variable: String },
    /// The webhook could not be reached or rejected the message
    NotificationFailed { reason: String },
    /// The allocated build number is lower than the one in the manifest
    BuildNumberBelowManifest { manifest: u64, allocated: u64 },
}

impl DeployWarning {
    /// Warning for a notification outcome, if any
    pub fn from_outcome(outcome: &NotifyOutcome, variable: &str) -> Option<Self> {
        match outcome {
            NotifyOutcome::Sent => None,
            NotifyOutcome::Skipped => Some(DeployWarning::NotificationSkipped {
                variable: variable.to_string(),
            }),
            NotifyOutcome::Failed(reason) => Some(DeployWarning::NotificationFailed {
                reason: reason.clone(),
            }),
        }
    }
}

impl fmt::Display for DeployWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployWarning::NotificationSkipped { variable } => {
                write!(f, "Notification skipped: {} is not set", variable)
            }
            DeployWarning::NotificationFailed { reason } => {
                write!(f, "Notification could not be delivered: {}", reason)
            }
            DeployWarning::BuildNumberBelowManifest {
                manifest,
                allocated,
            } => write!(
                f,
                "Allocated build number {} is lower than the manifest's {}",
                allocated, manifest
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sent_has_no_warning() {
        assert_eq!(DeployWarning::from_outcome(&NotifyOutcome::Sent, "SLACK_URL"), None);
    }

    #[test]
    fn test_skipped_names_variable() {
        let warning = DeployWarning::from_outcome(&NotifyOutcome::Skipped, "SLACK_URL").unwrap();
        assert_eq!(
            warning.to_string(),
            "Notification skipped: SLACK_URL is not set"
        );
    }

    #[test]
    fn test_failed_keeps_reason() {
        let outcome = NotifyOutcome::Failed("timed out".to_string());
        let warning = DeployWarning::from_outcome(&outcome, "SLACK_URL").unwrap();
        assert!(warning.to_string().contains("timed out"));
    }

    #[test]
    fn test_build_number_below_manifest() {
        let warning = DeployWarning::BuildNumberBelowManifest {
            manifest: 50,
            allocated: 42,
        };
        assert_eq!(
            warning.to_string(),
            "Allocated build number 42 is lower than the manifest's 50"
        );
    }
}
