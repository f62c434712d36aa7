//! Draft composition and durable persistence
//!
//! Composes a MIME reply with `mail-builder`, appends it to a
//! drafts-equivalent folder, and verifies the write landed. Verification
//! failure downgrades the result to a warning rather than an error, with a
//! fallback append into the general archive folder flagged as draft. The
//! caller must treat "unverified" as distinct from both verified success and
//! hard failure.

use std::sync::LazyLock;

use chrono::Utc;
use mail_builder::MessageBuilder;
use mail_builder::headers::raw::Raw;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::folders::{self, WellKnownFolder};
use crate::imap::{self, TriageSession};
use crate::models::{DraftRequest, ThreadInfo};

static NAME_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[Your [Nn]ame\]").expect("placeholder regex is valid"));

/// Terminal result of a draft save attempt
///
/// Three distinct states: confirmed in a drafts folder, stored in the
/// archive fallback, or appended without confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DraftOutcome {
    /// Draft found in a drafts folder after the append
    Verified { folder: String },
    /// Verification failed; draft stored in the archive folder flagged `\Draft`
    SavedToArchive,
    /// Append was accepted but the draft could not be confirmed anywhere
    Unverified,
}

impl DraftOutcome {
    /// Human-readable summary line for logs and CLI output
    pub fn summary(&self, subject: &str) -> String {
        match self {
            Self::Verified { folder } => {
                format!("VERIFIED: draft saved with subject '{subject}' in folder {folder}")
            }
            Self::SavedToArchive => {
                format!("Draft saved to archive with subject '{subject}' (flagged as draft)")
            }
            Self::Unverified => format!(
                "WARNING: draft append for subject '{subject}' returned OK but verification failed"
            ),
        }
    }
}

/// Substitute the signature placeholder or append the fixed signature block
///
/// A `[Your Name]` placeholder is replaced in place; otherwise the signature
/// is appended exactly once. Bodies keeping other `[Your ...]` placeholders
/// are left untouched so the substitution is never doubled.
pub fn format_body(body: &str, signature_name: &str) -> String {
    let substituted = NAME_PLACEHOLDER.replace_all(body, signature_name);
    if substituted.contains("[Your") || substituted.contains("[your") {
        return substituted.into_owned();
    }
    if substituted != body {
        return substituted.into_owned();
    }
    format!("{body}\n\nBest regards,\n{signature_name}")
}

/// Force a `Re:` prefix onto a reply subject
pub fn reply_subject(subject: &str) -> String {
    if subject.to_lowercase().starts_with("re:") {
        subject.to_owned()
    } else {
        format!("Re: {subject}")
    }
}

/// Build the outgoing `References` chain for a reply
///
/// Union of the parent's reference chain plus the parent's own message-id.
pub fn build_references(thread: &ThreadInfo) -> Vec<String> {
    let mut references: Vec<String> = thread
        .references
        .split_whitespace()
        .map(str::to_owned)
        .collect();
    if !thread.message_id.trim().is_empty() {
        references.push(thread.message_id.trim().to_owned());
    }
    references
}

/// Compose the RFC822 draft bytes
fn compose(
    config: &Config,
    subject: &str,
    body: &str,
    recipient: &str,
    thread: Option<&ThreadInfo>,
) -> AppResult<Vec<u8>> {
    let mut builder = MessageBuilder::new()
        .from(config.email_address.as_str())
        .to(recipient)
        .subject(subject)
        .text_body(body);

    if let Some(thread) = thread {
        let references = build_references(thread);
        if !references.is_empty() {
            builder = builder.header("References", Raw::new(references.join(" ")));
        }
        if !thread.message_id.trim().is_empty() {
            builder = builder.header("In-Reply-To", Raw::new(thread.message_id.trim().to_owned()));
        }
    }

    builder
        .write_to_vec()
        .map_err(|e| AppError::Internal(format!("failed to compose draft: {e}")))
}

/// Save a draft into the provider's drafts area with verification
///
/// # Errors
///
/// - `InvalidInput` for an empty recipient
/// - `AuthFailed` / `ConnectionFailed` / `Timeout` from session setup
/// - `FolderNotFound` if every drafts folder variant fails to select
pub async fn save_draft(config: &Config, request: &DraftRequest) -> AppResult<DraftOutcome> {
    if request.recipient.trim().is_empty() {
        return Err(AppError::invalid("recipient must be a non-empty string"));
    }

    let mut session = imap::connect_authenticated(config).await?;
    let result = save(config, &mut session, request).await;
    imap::logout_quietly(config, &mut session).await;

    let outcome = result?;
    info!("{}", outcome.summary(&request.subject));
    Ok(outcome)
}

/// Append-then-verify flow against an open session
async fn save(
    config: &Config,
    session: &mut TriageSession,
    request: &DraftRequest,
) -> AppResult<DraftOutcome> {
    let subject = match &request.thread_info {
        Some(_) => reply_subject(&request.subject),
        None => request.subject.clone(),
    };
    let body = format_body(&request.body, &config.signature_name);
    let content = compose(
        config,
        &subject,
        &body,
        &request.recipient,
        request.thread_info.as_ref(),
    )?;

    let drafts_folder =
        folders::select_well_known(config, session, WellKnownFolder::Drafts).await?;
    let internal_date = Utc::now().format("%d-%b-%Y %H:%M:%S +0000").to_string();
    imap::append_with_flags(
        config,
        session,
        drafts_folder,
        "(\\Draft)",
        &internal_date,
        &content,
    )
    .await?;
    debug!(folder = drafts_folder, "draft appended");

    if let Some(folder) = verify_saved(config, session, &subject).await {
        return Ok(DraftOutcome::Verified {
            folder: folder.to_owned(),
        });
    }

    // Fallback: store in the archive folder, still flagged as a draft
    for archive in WellKnownFolder::Archive.candidates() {
        match imap::append_with_flags(
            config,
            session,
            archive,
            "(\\Draft)",
            &internal_date,
            &content,
        )
        .await
        {
            Ok(()) => return Ok(DraftOutcome::SavedToArchive),
            Err(e) => debug!(folder = archive, error = %e, "archive fallback append failed"),
        }
    }

    warn!(subject = %subject, "draft could not be verified in any drafts folder");
    Ok(DraftOutcome::Unverified)
}

/// Search the candidate drafts folders for a message matching the subject
async fn verify_saved(
    config: &Config,
    session: &mut TriageSession,
    subject: &str,
) -> Option<&'static str> {
    let escaped = subject.replace('\\', "\\\\").replace('"', "\\\"");
    let query = format!("SUBJECT \"{escaped}\"");

    for folder in WellKnownFolder::Drafts.candidates() {
        if imap::examine_mailbox(config, session, folder).await.is_err() {
            continue;
        }
        match imap::uid_search(config, session, &query).await {
            Ok(uids) if !uids.is_empty() => {
                debug!(folder, matches = uids.len(), "draft verified by subject search");
                return Some(folder);
            }
            Ok(_) => {}
            Err(e) => debug!(folder, error = %e, "verification search failed"),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use crate::models::ThreadInfo;

    use super::{build_references, format_body, reply_subject};

    #[test]
    fn placeholder_is_substituted_without_appending_signature() {
        let body = format_body("Thanks!\n\n[Your Name]", "Tony Kipkemboi");
        assert_eq!(body, "Thanks!\n\nTony Kipkemboi");
        assert_eq!(body.matches("Tony Kipkemboi").count(), 1);
    }

    #[test]
    fn lowercase_placeholder_variant_is_substituted() {
        let body = format_body("Cheers, [Your name]", "Tony Kipkemboi");
        assert_eq!(body, "Cheers, Tony Kipkemboi");
    }

    #[test]
    fn signature_is_appended_exactly_once_without_placeholder() {
        let body = format_body("See you soon.", "Tony Kipkemboi");
        assert_eq!(body, "See you soon.\n\nBest regards,\nTony Kipkemboi");
        assert_eq!(body.matches("Best regards").count(), 1);
    }

    #[test]
    fn reply_prefix_is_forced_case_insensitively() {
        assert_eq!(reply_subject("Hello"), "Re: Hello");
        assert_eq!(reply_subject("Re: Hello"), "Re: Hello");
        assert_eq!(reply_subject("RE: Hello"), "RE: Hello");
        assert_eq!(reply_subject("re: Hello"), "re: Hello");
    }

    #[test]
    fn references_chain_includes_parent_message_id() {
        let thread = ThreadInfo {
            message_id: "<parent@x>".to_owned(),
            references: "<a@x> <b@x>".to_owned(),
            ..ThreadInfo::default()
        };
        assert_eq!(build_references(&thread), vec!["<a@x>", "<b@x>", "<parent@x>"]);
    }

    #[test]
    fn references_empty_when_thread_carries_no_identifiers() {
        let thread = ThreadInfo::default();
        assert!(build_references(&thread).is_empty());
    }
}
