//! Conversation reconstruction from reference headers
//!
//! A message's `References` and `In-Reply-To` identifiers form a reference
//! graph toward earlier messages. The resolver treats the union of both
//! identifier sets as the lookup key set, issues one OR search over the
//! `Message-ID` header, and extracts the body of every match. Returned order
//! is the server's match order, which is not guaranteed chronological.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::AppResult;
use crate::imap::{self, TriageSession};
use crate::mime;

/// Build the deduplicated identifier set from raw reference headers
///
/// Both headers are whitespace-separated lists of message identifiers. No
/// ordering is assumed; duplicates across the two headers are removed.
pub fn reference_ids(references: &str, in_reply_to: &str) -> Vec<String> {
    references
        .split_whitespace()
        .chain(in_reply_to.split_whitespace())
        .map(str::to_owned)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Build one IMAP search query matching any of the given message identifiers
///
/// IMAP `OR` is a binary prefix operator, so terms are nested right to left:
/// `OR a OR b c`. Returns `None` for an empty identifier set.
pub fn build_thread_query(ids: &[String]) -> Option<String> {
    ids.iter()
        .rev()
        .map(|id| format!("HEADER MESSAGE-ID \"{}\"", escape_quoted(id)))
        .reduce(|rest, term| format!("OR {term} {rest}"))
}

/// Escape backslashes and quotes for IMAP quoted strings
fn escape_quoted(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Resolve the other messages in a conversation
///
/// Returns the extracted body of each thread member the server matched. An
/// empty identifier set returns an empty sequence without any network call.
/// A fetch failure for an individual member is skipped; it does not abort
/// resolution of the remaining members.
pub async fn resolve_thread(
    config: &Config,
    session: &mut TriageSession,
    references: &str,
    in_reply_to: &str,
) -> AppResult<Vec<String>> {
    let ids = reference_ids(references, in_reply_to);
    let Some(query) = build_thread_query(&ids) else {
        return Ok(Vec::new());
    };

    debug!(identifiers = ids.len(), "resolving thread members");
    let uids = imap::uid_search(config, session, &query).await?;

    let mut bodies = Vec::with_capacity(uids.len());
    for uid in uids {
        let raw = match imap::fetch_raw_message(config, session, uid).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(uid, error = %e, "skipping unfetchable thread member");
                continue;
            }
        };
        match mailparse::parse_mail(&raw) {
            Ok(parsed) => bodies.push(mime::extract_body(&parsed)),
            Err(e) => warn!(uid, error = %e, "skipping unparseable thread member"),
        }
    }
    Ok(bodies)
}

#[cfg(test)]
mod tests {
    use super::{build_thread_query, reference_ids};

    #[test]
    fn empty_headers_yield_empty_identifier_set() {
        assert!(reference_ids("", "").is_empty());
        assert!(build_thread_query(&[]).is_none());
    }

    #[test]
    fn union_is_deduplicated() {
        let ids = reference_ids("<a@x> <b@x>", "<b@x>");
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"<a@x>".to_owned()));
        assert!(ids.contains(&"<b@x>".to_owned()));
    }

    #[test]
    fn single_identifier_needs_no_or() {
        let q = build_thread_query(&["<a@x>".to_owned()]).unwrap();
        assert_eq!(q, "HEADER MESSAGE-ID \"<a@x>\"");
    }

    #[test]
    fn two_identifiers_use_binary_or() {
        let q = build_thread_query(&["<a@x>".to_owned(), "<b@x>".to_owned()]).unwrap();
        assert_eq!(
            q,
            "OR HEADER MESSAGE-ID \"<a@x>\" HEADER MESSAGE-ID \"<b@x>\""
        );
    }

    #[test]
    fn three_identifiers_nest_right() {
        let q = build_thread_query(&[
            "<a@x>".to_owned(),
            "<b@x>".to_owned(),
            "<c@x>".to_owned(),
        ])
        .unwrap();
        assert_eq!(
            q,
            "OR HEADER MESSAGE-ID \"<a@x>\" OR HEADER MESSAGE-ID \"<b@x>\" HEADER MESSAGE-ID \"<c@x>\""
        );
    }

    #[test]
    fn quotes_in_identifiers_are_escaped() {
        let q = build_thread_query(&["<a\"b@x>".to_owned()]).unwrap();
        assert_eq!(q, "HEADER MESSAGE-ID \"<a\\\"b@x>\"");
    }
}
