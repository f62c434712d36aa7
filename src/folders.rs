//! Well-known folder resolution
//!
//! Providers spell their special folders several ways depending on locale
//! and product branding. Instead of hardcoded branching at each call site,
//! every well-known folder carries an ordered list of candidate names tried
//! in sequence until one selects successfully.

use tracing::debug;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::imap::{self, TriageSession};

/// A provider folder with multiple known naming variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WellKnownFolder {
    /// Unsent composed messages
    Drafts,
    /// Messages pending permanent deletion
    Trash,
    /// The general archive ("all mail") folder
    Archive,
}

impl WellKnownFolder {
    /// Candidate folder names in the order they should be tried
    ///
    /// Quoted variants are literal IMAP mailbox arguments; some servers
    /// require the quotes for names containing special characters.
    pub fn candidates(self) -> &'static [&'static str] {
        match self {
            Self::Drafts => &[
                "\"[Gmail]/Drafts\"",
                "[Gmail]/Drafts",
                "Drafts",
                "DRAFTS",
                "\"[Google Mail]/Drafts\"",
            ],
            Self::Trash => &[
                "\"[Gmail]/Trash\"",
                "[Gmail]/Trash",
                "Trash",
                "\"[Google Mail]/Trash\"",
                "[Google Mail]/Trash",
            ],
            Self::Archive => &["[Gmail]/All Mail", "\"[Gmail]/All Mail\"", "Archive"],
        }
    }

    /// Display name for diagnostics
    pub fn describe(self) -> &'static str {
        match self {
            Self::Drafts => "drafts",
            Self::Trash => "trash",
            Self::Archive => "archive",
        }
    }
}

/// Select the first candidate variant that the server accepts
///
/// Returns the name that selected successfully so later commands (append,
/// search) target the same folder.
///
/// # Errors
///
/// - `FolderNotFound` if every candidate variant fails to select
pub async fn select_well_known(
    config: &Config,
    session: &mut TriageSession,
    folder: WellKnownFolder,
) -> AppResult<&'static str> {
    for candidate in folder.candidates() {
        match imap::select_mailbox(config, session, candidate).await {
            Ok(()) => {
                debug!(folder = folder.describe(), name = candidate, "selected well-known folder");
                return Ok(candidate);
            }
            Err(e) => debug!(folder = folder.describe(), name = candidate, error = %e, "candidate did not select"),
        }
    }
    Err(AppError::FolderNotFound(format!(
        "no {} folder variant selected successfully",
        folder.describe()
    )))
}

#[cfg(test)]
mod tests {
    use super::WellKnownFolder;

    #[test]
    fn quoted_gmail_variant_is_tried_first() {
        assert_eq!(
            WellKnownFolder::Drafts.candidates()[0],
            "\"[Gmail]/Drafts\""
        );
        assert_eq!(WellKnownFolder::Trash.candidates()[0], "\"[Gmail]/Trash\"");
    }

    #[test]
    fn plain_names_are_among_candidates() {
        assert!(WellKnownFolder::Drafts.candidates().contains(&"Drafts"));
        assert!(WellKnownFolder::Trash.candidates().contains(&"Trash"));
    }
}
