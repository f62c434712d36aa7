//! Idempotent mailbox mutation
//!
//! Applies starring, importance-marking, and label application to a message
//! by id. Flag sets are safe to apply repeatedly. Label application is
//! create-or-reuse: the provider errors on duplicate creation, which is
//! treated as success. Order of operations is flags before labels, and a
//! failure on one label never aborts the remaining labels.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::imap::{self, TriageSession};
use crate::models::{OrganizeDirective, OrganizeOutcome};

/// Parse a provider-assigned message id into a UID
pub fn parse_message_id(id: &str) -> AppResult<u32> {
    if id.trim().is_empty() {
        return Err(AppError::invalid("email id must be a non-empty string"));
    }
    id.trim()
        .parse::<u32>()
        .map_err(|_| AppError::invalid(format!("invalid email id '{id}'")))
}

/// Quote a label name for an IMAP store argument
fn quote_label(label: &str) -> String {
    format!("\"{}\"", label.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Apply an organization directive to one message
///
/// Opens a fresh session, applies flags then labels, and reports an
/// aggregate outcome. Per-label failures are collected, not raised.
///
/// # Errors
///
/// - `InvalidInput` for a malformed id
/// - `AuthFailed` / `ConnectionFailed` / `Timeout` from session setup
/// - `NotFound` if INBOX cannot be selected
pub async fn organize(config: &Config, directive: &OrganizeDirective) -> AppResult<OrganizeOutcome> {
    let uid = parse_message_id(&directive.email_id)?;

    let mut session = imap::connect_authenticated(config).await?;
    let result = apply(config, &mut session, uid, directive).await;
    imap::logout_quietly(config, &mut session).await;

    let outcome = result?;
    info!(email_id = %directive.email_id, "{}", outcome.summary());
    Ok(outcome)
}

/// Flags-then-labels application against a selected inbox
async fn apply(
    config: &Config,
    session: &mut TriageSession,
    uid: u32,
    directive: &OrganizeDirective,
) -> AppResult<OrganizeOutcome> {
    imap::select_mailbox(config, session, "INBOX").await?;

    let mut starred = false;
    if directive.star {
        match imap::uid_store(config, session, uid, "+FLAGS.SILENT (\\Flagged)").await {
            Ok(()) => starred = true,
            Err(e) => warn!(uid, error = %e, "failed to star message"),
        }
    }

    let mut marked_important = false;
    if directive.mark_important {
        match imap::uid_store(config, session, uid, "+FLAGS.SILENT (\\Important)").await {
            Ok(()) => marked_important = true,
            Err(e) => warn!(uid, error = %e, "failed to mark message important"),
        }
    }

    let mut applied_labels = Vec::new();
    let mut failed_labels = Vec::new();
    for label in &directive.labels {
        // Duplicate creation errors are expected and swallowed
        if let Err(e) = imap::create_mailbox(config, session, label).await {
            debug!(label, error = %e, "label create failed; assuming it already exists");
        }

        let query = format!("+X-GM-LABELS ({})", quote_label(label));
        match imap::uid_store(config, session, uid, &query).await {
            Ok(()) => applied_labels.push(label.clone()),
            Err(e) => {
                warn!(uid, label, error = %e, "failed to apply label");
                failed_labels.push((label.clone(), e.to_string()));
            }
        }
    }

    Ok(OrganizeOutcome {
        email_id: directive.email_id.clone(),
        starred,
        marked_important,
        applied_labels,
        failed_labels,
    })
}

#[cfg(test)]
mod tests {
    use super::{parse_message_id, quote_label};

    #[test]
    fn parses_decimal_uid_ids() {
        assert_eq!(parse_message_id("42").unwrap(), 42);
        assert_eq!(parse_message_id(" 7 ").unwrap(), 7);
    }

    #[test]
    fn rejects_empty_and_malformed_ids() {
        assert!(parse_message_id("").is_err());
        assert!(parse_message_id("   ").is_err());
        assert!(parse_message_id("abc").is_err());
        assert!(parse_message_id("-1").is_err());
    }

    #[test]
    fn labels_are_quoted_and_escaped() {
        assert_eq!(quote_label("URGENT"), "\"URGENT\"");
        assert_eq!(quote_label("Follow Up"), "\"Follow Up\"");
        assert_eq!(quote_label("a\"b"), "\"a\\\"b\"");
    }
}
