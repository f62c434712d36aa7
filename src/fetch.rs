//! Unread batch fetcher
//!
//! Orchestrates connection, decoding, date normalization, and thread
//! resolution into a bounded, ordered batch of normalized email records.
//! Most-recently-received messages come first. A failure on one message is
//! logged and that message skipped; the batch continues. Only session-level
//! failures (cannot connect, cannot authenticate) abort the operation.

use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::dates;
use crate::errors::{AppError, AppResult};
use crate::imap::{self, TriageSession};
use crate::mime;
use crate::models::{EmailRecord, ThreadInfo};
use crate::threads;

/// Separator inserted between the current body and each quoted thread body
const THREAD_SEPARATOR: &str = "\n\n--- Previous Messages ---\n";

/// Fetch a bounded batch of unread emails, newest first
///
/// Opens a fresh session, queries the unseen state in INBOX, and produces at
/// most `limit` records. An empty inbox is an empty batch, not an error.
/// Failures after authentication degrade to an empty batch rather than
/// propagating past this boundary.
///
/// # Errors
///
/// - `InvalidInput` if `limit` is zero
/// - `AuthFailed` / `ConnectionFailed` / `Timeout` from session setup
pub async fn fetch_unread(config: &Config, limit: usize) -> AppResult<Vec<EmailRecord>> {
    if limit == 0 {
        return Err(AppError::invalid("limit must be at least 1"));
    }

    let mut session = imap::connect_authenticated(config).await?;
    let records = match fetch_batch(config, &mut session, limit).await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "unread fetch failed; returning empty batch");
            Vec::new()
        }
    };
    imap::logout_quietly(config, &mut session).await;

    info!(count = records.len(), "fetched unread batch");
    Ok(records)
}

/// Inner batch loop over the selected inbox
async fn fetch_batch(
    config: &Config,
    session: &mut TriageSession,
    limit: usize,
) -> AppResult<Vec<EmailRecord>> {
    imap::select_mailbox(config, session, "INBOX").await?;

    // uid_search returns newest-first already
    let mut uids = imap::uid_search(config, session, "UNSEEN").await?;
    debug!(unseen = uids.len(), "searched unseen messages");
    if uids.is_empty() {
        return Ok(Vec::new());
    }
    uids.truncate(limit);

    let mut records = Vec::with_capacity(uids.len());
    for uid in uids {
        match build_record(config, session, uid).await {
            Ok(record) => records.push(record),
            Err(e) => warn!(uid, error = %e, "skipping unfetchable message"),
        }
    }
    Ok(records)
}

/// Fetch and normalize a single message into an `EmailRecord`
async fn build_record(
    config: &Config,
    session: &mut TriageSession,
    uid: u32,
) -> AppResult<EmailRecord> {
    let raw = imap::fetch_raw_message(config, session, uid).await?;
    let parsed = mailparse::parse_mail(&raw)
        .map_err(|e| AppError::Internal(format!("failed to parse message: {e}")))?;

    let subject = mime::header_value(&parsed, "Subject");
    let sender = mime::header_value(&parsed, "From");
    let raw_date = mime::header_value(&parsed, "Date");
    let date = dates::normalize_date(&raw_date);

    let references = mime::header_value(&parsed, "References");
    let in_reply_to = mime::header_value(&parsed, "In-Reply-To");
    let message_id = mime::header_value(&parsed, "Message-ID");

    let current_body = mime::extract_body(&parsed);
    let thread_bodies =
        match threads::resolve_thread(config, session, &references, &in_reply_to).await {
            Ok(bodies) => bodies,
            Err(e) => {
                warn!(uid, error = %e, "thread resolution failed; keeping message without history");
                Vec::new()
            }
        };

    let body = assemble_body(&date, &current_body, &thread_bodies);
    let age_days = dates::parse_canonical(&date).map(dates::age_in_days);
    let id = uid.to_string();

    Ok(EmailRecord {
        id: id.clone(),
        subject,
        sender,
        body,
        date: date.clone(),
        age_days,
        thread_info: ThreadInfo {
            message_id,
            in_reply_to,
            references,
            date,
            raw_date,
            email_id: id,
        },
    })
}

/// Combine current body and thread history behind the date marker line
fn assemble_body(date: &str, current: &str, thread_bodies: &[String]) -> String {
    let mut combined = current.to_owned();
    for thread_body in thread_bodies {
        combined.push_str(THREAD_SEPARATOR);
        combined.push_str(thread_body);
    }
    format!("EMAIL DATE: {date}\n\n{combined}")
}

#[cfg(test)]
mod tests {
    use super::assemble_body;

    #[test]
    fn body_without_thread_has_only_date_marker() {
        let body = assemble_body("2024-05-01", "Hello", &[]);
        assert_eq!(body, "EMAIL DATE: 2024-05-01\n\nHello");
    }

    #[test]
    fn thread_bodies_are_appended_after_separator() {
        let history = vec!["first reply".to_owned(), "second reply".to_owned()];
        let body = assemble_body("2024-05-01", "Hello", &history);
        assert_eq!(
            body,
            "EMAIL DATE: 2024-05-01\n\nHello\n\n--- Previous Messages ---\nfirst reply\n\n--- Previous Messages ---\nsecond reply"
        );
    }

    #[test]
    fn unparseable_date_leaves_marker_empty() {
        let body = assemble_body("", "Hello", &[]);
        assert!(body.starts_with("EMAIL DATE: \n\n"));
    }
}
