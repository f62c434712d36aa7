//! Data records crossing the decision-logic boundary
//!
//! Defines the `EmailRecord` produced by the unread fetcher and the plain
//! records the external decision logic consumes and produces. Records are
//! immutable once produced; later stages reference messages only by `id`
//! and re-fetch server state before mutating.

use serde::{Deserialize, Serialize};

/// Thread metadata captured alongside a fetched message
///
/// Raw header strings are preserved verbatim so correct reply headers can be
/// built later without re-fetching the parent message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreadInfo {
    /// Raw `Message-ID` header of the fetched message
    #[serde(default)]
    pub message_id: String,
    /// Raw `In-Reply-To` header (may be empty)
    #[serde(default)]
    pub in_reply_to: String,
    /// Raw `References` header (may be empty)
    #[serde(default)]
    pub references: String,
    /// Canonical ISO date of the message, or empty if unparseable
    #[serde(default)]
    pub date: String,
    /// Original raw date header string
    #[serde(default)]
    pub raw_date: String,
    /// Provider-assigned message identifier (same as `EmailRecord::id`)
    #[serde(default)]
    pub email_id: String,
}

/// One normalized unread email
///
/// Produced by the unread fetcher, persisted to the per-run batch artifact,
/// and consumed by all downstream decision logic. Never updated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Provider-assigned opaque identifier; never empty for a fetched message
    pub id: String,
    /// Decoded subject (may be empty)
    pub subject: String,
    /// Decoded sender (may be empty)
    pub sender: String,
    /// Decoded, HTML-stripped body with `EMAIL DATE:` marker line and quoted
    /// thread history after separator markers
    pub body: String,
    /// Canonical ISO calendar date (`YYYY-MM-DD`) or empty if unparseable
    pub date: String,
    /// Whole days between the message date and today; absent when `date` is
    /// empty, negative for future-dated mail
    pub age_days: Option<i64>,
    /// Thread metadata for reply-header construction
    pub thread_info: ThreadInfo,
}

/// Email category assigned by the external decision logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Newsletters,
    Promotions,
    Personal,
    Github,
    Sponsorships,
    Recruitment,
    ColdEmail,
    EventInvitations,
    ReceiptsInvoices,
    Youtube,
    Socials,
}

/// Priority level assigned by the external decision logic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Action the decision logic says the email requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequiredAction {
    Reply,
    ReadOnly,
    Task,
    Ignore,
}

/// Categorization record produced per email by the decision logic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedEmail {
    /// Identifier of the categorized email
    pub email_id: String,
    /// Email subject line
    pub subject: String,
    /// Email sender (name and address)
    #[serde(default)]
    pub sender: String,
    /// Canonical email date
    #[serde(default)]
    pub date: String,
    /// Assigned category
    pub category: Category,
    /// Assigned priority
    pub priority: Priority,
    /// Required action
    pub required_action: RequiredAction,
    /// Reason for the categorization
    #[serde(default)]
    pub reason: String,
    /// Due date for the action, if applicable
    #[serde(default)]
    pub due_date: Option<String>,
}

/// Organization directive consumed by the mailbox mutator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeDirective {
    /// Identifier of the email to organize
    pub email_id: String,
    /// Whether to star the email (`\Flagged`)
    #[serde(default)]
    pub star: bool,
    /// Whether to mark the email important
    #[serde(default)]
    pub mark_important: bool,
    /// Labels to create-or-reuse and apply
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Aggregate outcome of one organize call
///
/// Per-label failures never abort the remaining labels; they are collected
/// here instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizeOutcome {
    /// Identifier of the organized email
    pub email_id: String,
    /// Whether the star flag was applied
    pub starred: bool,
    /// Whether the important flag was applied
    pub marked_important: bool,
    /// Labels applied successfully
    pub applied_labels: Vec<String>,
    /// Labels that failed to apply, with the failure reason
    pub failed_labels: Vec<(String, String)>,
}

impl OrganizeOutcome {
    /// Human-readable summary line for logs and CLI output
    pub fn summary(&self) -> String {
        format!(
            "Email {} organized: starred={}, important={}, labels applied={:?}, failed={}",
            self.email_id,
            self.starred,
            self.marked_important,
            self.applied_labels,
            self.failed_labels.len()
        )
    }
}

/// Draft request consumed by the draft writer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
    /// Draft subject
    pub subject: String,
    /// Draft body (placeholder `[Your Name]` is substituted if present)
    pub body: String,
    /// Recipient address
    pub recipient: String,
    /// Parent-thread metadata when the draft is a reply
    #[serde(default)]
    pub thread_info: Option<ThreadInfo>,
}

/// Cleanup directive consumed by the bulk deleter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupDirective {
    /// Identifier of the email
    pub email_id: String,
    /// Age of the email in days at decision time
    #[serde(default)]
    pub age_days: Option<i64>,
    /// Whether to delete the email
    pub delete: bool,
    /// Reason for deletion or preservation
    pub reason: String,
}

/// Notification record consumed by the webhook sender
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Email subject line
    pub subject: String,
    /// Email sender
    pub sender: String,
    /// Assigned category
    pub category: Category,
    /// Assigned priority
    pub priority: Priority,
    /// Brief summary of the email content
    pub summary: String,
    /// Action needed, if any
    #[serde(default)]
    pub action_needed: Option<String>,
    /// Custom headline for the notification header block
    #[serde(default)]
    pub headline: Option<String>,
    /// Custom intro phrase shown under the headline
    #[serde(default)]
    pub intro: Option<String>,
    /// Custom header for the action section
    #[serde(default)]
    pub action_header: Option<String>,
}
