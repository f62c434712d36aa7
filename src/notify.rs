//! Digest notification over a chat webhook
//!
//! Builds the block-structured JSON payload (header, optional intro, field
//! section, summary, optional action section, trailing divider) and POSTs it
//! to the configured webhook. A non-2xx response is a reportable failure,
//! never fatal to the batch.

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::Notification;

/// Outcome of a notification attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NotifyOutcome {
    /// The webhook accepted the payload
    Sent,
    /// The POST failed or the webhook rejected the payload
    Failed { reason: String },
}

impl NotifyOutcome {
    /// Human-readable summary line for logs and CLI output
    pub fn summary(&self, subject: &str) -> String {
        match self {
            Self::Sent => format!("Notification sent successfully for email: {subject}"),
            Self::Failed { reason } => {
                format!("Error sending notification for email '{subject}': {reason}")
            }
        }
    }
}

/// Render an enum as its serialized wire string (e.g. `RECEIPTS_INVOICES`)
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

/// Build the block-structured webhook payload
pub fn build_payload(notification: &Notification) -> Value {
    let headline = notification
        .headline
        .clone()
        .unwrap_or_else(|| format!("Important Email: {}", notification.subject));

    let mut blocks = vec![json!({
        "type": "header",
        "text": { "type": "plain_text", "text": headline }
    })];

    if let Some(intro) = &notification.intro {
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*{intro}*") }
        }));
    }

    blocks.push(json!({
        "type": "section",
        "fields": [
            { "type": "mrkdwn", "text": format!("*From:*\n{}", notification.sender) },
            { "type": "mrkdwn", "text": format!("*Category:*\n{}", wire_name(&notification.category)) },
            { "type": "mrkdwn", "text": format!("*Priority:*\n{}", wire_name(&notification.priority)) },
        ]
    }));

    blocks.push(json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": format!("*Summary:*\n{}", notification.summary) }
    }));

    if let Some(action) = &notification.action_needed {
        let header = notification
            .action_header
            .clone()
            .unwrap_or_else(|| "Action Needed:".to_owned());
        blocks.push(json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": format!("*{header}*\n{action}") }
        }));
    }

    blocks.push(json!({ "type": "divider" }));

    json!({ "blocks": blocks })
}

/// POST the notification to the configured webhook
///
/// # Errors
///
/// - `InvalidInput` if no webhook URL is configured; transport and non-2xx
///   failures are reported through the outcome instead
pub async fn send_notification(
    config: &Config,
    notification: &Notification,
) -> AppResult<NotifyOutcome> {
    let url = config
        .slack_webhook_url
        .as_deref()
        .ok_or_else(|| AppError::invalid("TRIAGE_SLACK_WEBHOOK_URL is not configured"))?;

    let payload = build_payload(notification);
    let outcome = match reqwest::Client::new().post(url).json(&payload).send().await {
        Ok(response) if response.status().is_success() => NotifyOutcome::Sent,
        Ok(response) => NotifyOutcome::Failed {
            reason: format!("webhook returned status {}", response.status()),
        },
        Err(e) => NotifyOutcome::Failed {
            reason: e.to_string(),
        },
    };

    match &outcome {
        NotifyOutcome::Sent => info!("{}", outcome.summary(&notification.subject)),
        NotifyOutcome::Failed { .. } => warn!("{}", outcome.summary(&notification.subject)),
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use crate::models::{Category, Notification, Priority};

    use super::build_payload;

    fn sample(action: Option<&str>, headline: Option<&str>) -> Notification {
        Notification {
            subject: "Invoice for April".to_owned(),
            sender: "billing@example.com".to_owned(),
            category: Category::ReceiptsInvoices,
            priority: Priority::High,
            summary: "April invoice attached".to_owned(),
            action_needed: action.map(str::to_owned),
            headline: headline.map(str::to_owned),
            intro: None,
            action_header: None,
        }
    }

    #[test]
    fn payload_starts_with_header_and_ends_with_divider() {
        let payload = build_payload(&sample(None, None));
        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks.first().unwrap()["type"], "header");
        assert_eq!(blocks.last().unwrap()["type"], "divider");
    }

    #[test]
    fn default_headline_names_the_subject() {
        let payload = build_payload(&sample(None, None));
        let headline = payload["blocks"][0]["text"]["text"].as_str().unwrap();
        assert_eq!(headline, "Important Email: Invoice for April");
    }

    #[test]
    fn custom_headline_wins_over_default() {
        let payload = build_payload(&sample(None, Some("Pay this today")));
        let headline = payload["blocks"][0]["text"]["text"].as_str().unwrap();
        assert_eq!(headline, "Pay this today");
    }

    #[test]
    fn field_section_carries_wire_category_and_priority() {
        let payload = build_payload(&sample(None, None));
        let fields = payload["blocks"][1]["fields"].as_array().unwrap();
        let rendered = serde_json::to_string(fields).unwrap();
        assert!(rendered.contains("RECEIPTS_INVOICES"));
        assert!(rendered.contains("HIGH"));
    }

    #[test]
    fn action_section_is_present_only_when_action_needed() {
        let without = build_payload(&sample(None, None));
        let with = build_payload(&sample(Some("reply by Friday"), None));
        let without_len = without["blocks"].as_array().unwrap().len();
        let with_len = with["blocks"].as_array().unwrap().len();
        assert_eq!(with_len, without_len + 1);
        assert!(serde_json::to_string(&with).unwrap().contains("Action Needed:"));
    }
}
