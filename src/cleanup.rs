//! Message deletion and trash purging
//!
//! Deleting a message is a two-phase reclassification: add the trash label,
//! then remove the inbox label. The steps are not atomic; a crash between
//! them can leave a message in both or neither state, which is an accepted
//! limitation. Emptying the trash marks every contained message for
//! permanent deletion and commits the purge in one batch expunge.

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::folders::{self, WellKnownFolder};
use crate::imap::{self, TriageSession};
use crate::models::CleanupDirective;
use crate::organize::parse_message_id;

/// Outcome of a single-message delete
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    /// Identifier of the deleted email
    pub email_id: String,
    /// Decoded subject captured before deletion
    pub subject: String,
    /// Decoded sender captured before deletion
    pub sender: String,
    /// Caller-supplied reason for the deletion
    pub reason: String,
}

impl DeleteOutcome {
    /// Human-readable summary line for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "Email deleted: '{}' from {}. Reason: {}",
            self.subject, self.sender, self.reason
        )
    }
}

/// Outcome of a trash purge attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TrashOutcome {
    /// Messages were marked and expunged
    Emptied { folder: String, purged: usize },
    /// The trash folder selected but contained no messages
    AlreadyEmpty { folder: String },
    /// No known trash-folder variant selected successfully; zero deletions
    NoTrashFolder,
}

impl TrashOutcome {
    /// Human-readable summary line for logs and CLI output
    pub fn summary(&self) -> String {
        match self {
            Self::Emptied { folder, purged } => {
                format!("Emptied trash folder {folder}: deleted {purged} message(s)")
            }
            Self::AlreadyEmpty { folder } => {
                format!("Trash folder {folder} is already empty; nothing to delete")
            }
            Self::NoTrashFolder => "Could not empty trash: no trash folder found".to_owned(),
        }
    }
}

/// Execute one cleanup directive
///
/// A directive with `delete` unset is a preservation decision: nothing is
/// contacted and `None` is returned. Otherwise delegates to [`delete_email`].
pub async fn apply_directive(
    config: &Config,
    directive: &CleanupDirective,
) -> AppResult<Option<DeleteOutcome>> {
    if !directive.delete {
        info!(
            email_id = %directive.email_id,
            reason = %directive.reason,
            "email preserved"
        );
        return Ok(None);
    }
    delete_email(config, &directive.email_id, &directive.reason)
        .await
        .map(Some)
}

/// Move one message to trash, removing it from the inbox
///
/// Validates inputs before contacting the session, confirms the message
/// exists (capturing subject and sender for the outcome description), then
/// performs the two-phase reclassification.
///
/// # Errors
///
/// - `InvalidInput` if `id` or `reason` is empty or malformed
/// - `NotFound` if the referenced message is absent
/// - `AuthFailed` / `ConnectionFailed` / `Timeout` from session setup
pub async fn delete_email(config: &Config, id: &str, reason: &str) -> AppResult<DeleteOutcome> {
    let uid = parse_message_id(id)?;
    if reason.trim().is_empty() {
        return Err(AppError::invalid("reason must be a non-empty string"));
    }

    let mut session = imap::connect_authenticated(config).await?;
    let result = delete(config, &mut session, uid, id, reason).await;
    imap::logout_quietly(config, &mut session).await;

    let outcome = result?;
    info!("{}", outcome.summary());
    Ok(outcome)
}

/// Existence check followed by the two-phase trash move
async fn delete(
    config: &Config,
    session: &mut TriageSession,
    uid: u32,
    id: &str,
    reason: &str,
) -> AppResult<DeleteOutcome> {
    imap::select_mailbox(config, session, "INBOX").await?;

    let raw = imap::fetch_raw_message(config, session, uid)
        .await
        .map_err(|_| AppError::NotFound(format!("email with id {id} not found")))?;
    let (subject, sender) = match mailparse::parse_mail(&raw) {
        Ok(parsed) => (
            crate::mime::header_value(&parsed, "Subject"),
            crate::mime::header_value(&parsed, "From"),
        ),
        Err(_) => (String::new(), String::new()),
    };

    // Two-phase, not atomic: a crash here can leave the message in both or
    // neither state.
    imap::uid_store(config, session, uid, "+X-GM-LABELS (\\Trash)").await?;
    imap::uid_store(config, session, uid, "-X-GM-LABELS (\\Inbox)").await?;

    Ok(DeleteOutcome {
        email_id: id.to_owned(),
        subject,
        sender,
        reason: reason.to_owned(),
    })
}

/// Permanently purge the trash folder
///
/// Tries the known trash-folder naming variants in order; on the first that
/// selects, marks every contained message `\Deleted` and commits one batch
/// expunge. When no variant selects, the explicit "no trash folder" outcome
/// is reported rather than silently succeeding.
///
/// # Errors
///
/// - `AuthFailed` / `ConnectionFailed` / `Timeout` from session setup
/// - `Internal` for protocol failures after a folder selected
pub async fn empty_trash(config: &Config) -> AppResult<TrashOutcome> {
    let mut session = imap::connect_authenticated(config).await?;
    let result = purge(config, &mut session).await;
    imap::logout_quietly(config, &mut session).await;

    let outcome = result?;
    info!("{}", outcome.summary());
    Ok(outcome)
}

/// Mark-and-expunge loop against the first selectable trash variant
async fn purge(config: &Config, session: &mut TriageSession) -> AppResult<TrashOutcome> {
    let folder = match folders::select_well_known(config, session, WellKnownFolder::Trash).await {
        Ok(folder) => folder,
        Err(AppError::FolderNotFound(_)) => return Ok(TrashOutcome::NoTrashFolder),
        Err(e) => return Err(e),
    };

    let uids = imap::uid_search(config, session, "ALL").await?;
    if uids.is_empty() {
        return Ok(TrashOutcome::AlreadyEmpty {
            folder: folder.to_owned(),
        });
    }

    debug!(folder, count = uids.len(), "marking trash messages for deletion");
    for uid in &uids {
        imap::uid_store(config, session, *uid, "+FLAGS.SILENT (\\Deleted)").await?;
    }
    imap::expunge(config, session).await?;

    Ok(TrashOutcome::Emptied {
        folder: folder.to_owned(),
        purged: uids.len(),
    })
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use crate::config::Config;
    use crate::errors::AppError;

    use crate::models::CleanupDirective;

    use super::{TrashOutcome, apply_directive, delete_email};

    fn unreachable_config() -> Config {
        Config {
            email_address: "user@example.com".to_owned(),
            app_password: SecretString::new("secret".to_owned().into()),
            imap_host: "imap.invalid".to_owned(),
            imap_port: 993,
            connect_timeout_ms: 50,
            greeting_timeout_ms: 50,
            socket_timeout_ms: 50,
            slack_webhook_url: None,
            signature_name: "Tony Kipkemboi".to_owned(),
            output_dir: "output".to_owned(),
        }
    }

    #[tokio::test]
    async fn empty_reason_fails_before_any_connection() {
        let err = delete_email(&unreachable_config(), "42", "")
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn empty_id_fails_before_any_connection() {
        let err = delete_email(&unreachable_config(), "", "stale newsletter")
            .await
            .expect_err("must fail");
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn preservation_directive_never_connects() {
        let directive = CleanupDirective {
            email_id: "42".to_owned(),
            age_days: Some(2),
            delete: false,
            reason: "recent personal mail".to_owned(),
        };
        let outcome = apply_directive(&unreachable_config(), &directive)
            .await
            .expect("preservation must succeed offline");
        assert!(outcome.is_none());
    }

    #[test]
    fn trash_outcome_summaries_are_distinct() {
        let emptied = TrashOutcome::Emptied {
            folder: "Trash".to_owned(),
            purged: 3,
        };
        assert!(emptied.summary().contains("3 message(s)"));

        let missing = TrashOutcome::NoTrashFolder;
        assert!(missing.summary().contains("no trash folder found"));
    }
}
