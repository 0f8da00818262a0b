//! Chat notifications.
//!
//! This is the only stage whose failure does not abort a lane: dispatching
//! returns a [NotifyOutcome] rather than a `Result`.

use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::domain::ReleaseVersion;
use crate::error::{DeployError, Result};

/// Posts a JSON payload to a webhook
pub trait WebhookPoster {
    fn post(&self, url: &str, payload: &Value) -> Result<()>;
}

/// Slack-compatible incoming webhook over HTTP
pub struct HttpWebhook {
    client: Client,
}

impl HttpWebhook {
    pub fn new(client: Client) -> Self {
        HttpWebhook { client }
    }
}

impl WebhookPoster for HttpWebhook {
    fn post(&self, url: &str, payload: &Value) -> Result<()> {
        // The URL is the webhook's credential, so it never reaches an error
        let response = self.client.post(url).json(payload).send().map_err(|e| {
            DeployError::notification(format!("Webhook request failed: {}", e.without_url()))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().unwrap_or_default();
        Err(DeployError::notification(format!(
            "Webhook returned {}: {}",
            status,
            body.trim()
        )))
    }
}

/// What happened to a notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    Sent,
    /// No webhook configured
    Skipped,
    Failed(String),
}

/// Sends release notifications, swallowing failures
pub struct NotificationDispatcher<'a> {
    poster: &'a dyn WebhookPoster,
    url: Option<String>,
}

impl<'a> NotificationDispatcher<'a> {
    pub fn new(poster: &'a dyn WebhookPoster, url: Option<String>) -> Self {
        NotificationDispatcher {
            poster,
            url: url.filter(|u| !u.trim().is_empty()),
        }
    }

    /// Message body followed by the released version
    pub fn format_text(message: &str, version: &ReleaseVersion) -> String {
        format!("{}\nVersion: {}", message, version)
    }

    pub fn payload(message: &str, version: &ReleaseVersion, branch: Option<&str>) -> Value {
        let mut payload = json!({ "text": Self::format_text(message, version) });

        if let Some(branch) = branch {
            payload["attachments"] = json!([{
                "fields": [{ "title": "Git Branch", "value": branch, "short": true }]
            }]);
        }

        payload
    }

    pub fn dispatch(
        &self,
        message: &str,
        version: &ReleaseVersion,
        branch: Option<&str>,
    ) -> NotifyOutcome {
        let Some(url) = &self.url else {
            log::info!("Skipping notification: no webhook URL configured");
            return NotifyOutcome::Skipped;
        };

        let payload = Self::payload(message, version, branch);
        match self.poster.post(url, &payload) {
            Ok(()) => {
                log::info!("Notification sent for {}", version);
                NotifyOutcome::Sent
            }
            Err(e) => {
                log::error!("Failed to send notification: {}", e);
                NotifyOutcome::Failed(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingPoster {
        posts: RefCell<Vec<(String, Value)>>,
        fail: bool,
    }

    impl WebhookPoster for RecordingPoster {
        fn post(&self, url: &str, payload: &Value) -> Result<()> {
            self.posts
                .borrow_mut()
                .push((url.to_string(), payload.clone()));
            if self.fail {
                Err(DeployError::notification("500 Internal Server Error"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_skips_without_url() {
        let poster = RecordingPoster::default();
        let dispatcher = NotificationDispatcher::new(&poster, None);

        let outcome = dispatcher.dispatch("Deployed", &ReleaseVersion::new("1.0.0", 2), None);

        assert_eq!(outcome, NotifyOutcome::Skipped);
        assert!(poster.posts.borrow().is_empty());
    }

    #[test]
    fn test_blank_url_counts_as_missing() {
        let poster = RecordingPoster::default();
        let dispatcher = NotificationDispatcher::new(&poster, Some(" ".to_string()));
        let outcome = dispatcher.dispatch("Deployed", &ReleaseVersion::new("1.0.0", 2), None);
        assert_eq!(outcome, NotifyOutcome::Skipped);
        assert!(poster.posts.borrow().is_empty());
    }

    #[test]
    fn test_sends_formatted_message() {
        let poster = RecordingPoster::default();
        let dispatcher =
            NotificationDispatcher::new(&poster, Some("https://hooks.example.com/T/B/X".to_string()));

        let outcome = dispatcher.dispatch(
            "Android build uploaded",
            &ReleaseVersion::new("2.0.0", 42),
            Some("main"),
        );

        assert_eq!(outcome, NotifyOutcome::Sent);
        let posts = poster.posts.borrow();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, "https://hooks.example.com/T/B/X");
        assert_eq!(
            posts[0].1["text"],
            "Android build uploaded\nVersion: 2.0.0+42"
        );
        assert_eq!(posts[0].1["attachments"][0]["fields"][0]["value"], "main");
    }

    #[test]
    fn test_failure_is_tolerated() {
        let poster = RecordingPoster {
            fail: true,
            ..Default::default()
        };
        let dispatcher =
            NotificationDispatcher::new(&poster, Some("https://hooks.example.com/x".to_string()));

        let outcome = dispatcher.dispatch("Deployed", &ReleaseVersion::new("1.0.0", 2), None);

        match outcome {
            NotifyOutcome::Failed(reason) => assert!(reason.contains("500")),
            other => panic!("expected failure outcome, got {:?}", other),
        }
        assert_eq!(poster.posts.borrow().len(), 1);
    }

    #[test]
    fn test_unreachable_webhook_hides_url() {
        let poster = HttpWebhook::new(crate::remote::http_client(5).unwrap());
        let dispatcher = NotificationDispatcher::new(
            &poster,
            Some("http://127.0.0.1:1/services/T0/B0/SECRETTOKEN".to_string()),
        );

        let outcome = dispatcher.dispatch("Deployed", &ReleaseVersion::new("1.0.0", 2), None);

        match outcome {
            NotifyOutcome::Failed(reason) => {
                assert!(!reason.contains("SECRETTOKEN"), "{}", reason);
                assert!(!reason.contains("127.0.0.1"), "{}", reason);
                assert!(
                    reason.starts_with("Notification failed: Webhook request failed"),
                    "{}",
                    reason
                );
                assert!(!reason.contains("Remote operation failed"), "{}", reason);
            }
            other => panic!("expected failure outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_without_branch() {
        let payload =
            NotificationDispatcher::payload("Done", &ReleaseVersion::new("1.2.3", 7), None);
        assert_eq!(payload["text"], "Done\nVersion: 1.2.3+7");
        assert!(payload.get("attachments").is_none());
    }
}
