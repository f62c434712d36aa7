//! inbox-triage: single-pass IMAP inbox triage tool
//!
//! Fetches a bounded batch of unread messages with reconstructed thread
//! history, and applies externally decided triage actions: mailbox
//! organization, verified draft replies, digest notifications, and trash
//! management. Every subcommand opens one fresh IMAP session, runs strictly
//! sequential commands against it, and releases it best-effort.
//!
//! # Architecture
//!
//! - [`main`]: CLI entry point with env loading and subcommand dispatch
//! - [`config`]: environment-derived configuration threaded through sessions
//! - [`errors`]: application error taxonomy
//! - [`imap`]: timeout-bounded TLS transport and session operations
//! - [`mime`]: header decoding, body extraction, HTML stripping
//! - [`dates`]: date-header normalization and age computation
//! - [`threads`]: conversation reconstruction from reference headers
//! - [`fetch`]: unread batch orchestration producing email records
//! - [`folders`]: well-known folder resolution with naming variants
//! - [`organize`]: idempotent star/important/label mutation
//! - [`draft`]: reply composition and verified draft persistence
//! - [`cleanup`]: two-phase deletion and batch trash purge
//! - [`models`]: email records and decision-logic boundary types
//! - [`decision`]: decision-output parsing shim with placeholder rejection
//! - [`notify`]: block-structured webhook notifications
//! - [`artifact`]: per-run JSON batch artifact

mod artifact;
mod cleanup;
mod config;
mod dates;
mod decision;
mod draft;
mod errors;
mod fetch;
mod folders;
mod imap;
mod mime;
mod models;
mod notify;
mod organize;
mod threads;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{CleanupDirective, DraftRequest, Notification, OrganizeDirective};

#[derive(Debug, Parser)]
#[command(name = "inbox-triage", about = "Single-pass IMAP inbox triage tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch unread emails, newest first, and write the batch artifact
    Fetch {
        /// Maximum number of unread emails to retrieve
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
    /// Star, mark important, and label one email
    Organize {
        /// Email id from a fetched batch
        #[arg(long)]
        id: String,
        /// Star the email
        #[arg(long)]
        star: bool,
        /// Mark the email important
        #[arg(long)]
        important: bool,
        /// Label to create-or-reuse and apply (repeatable)
        #[arg(long = "label")]
        labels: Vec<String>,
    },
    /// Compose a draft reply and save it to the drafts folder
    Draft {
        /// Draft subject
        #[arg(long)]
        subject: String,
        /// Draft body text
        #[arg(long)]
        body: String,
        /// Recipient address
        #[arg(long)]
        recipient: String,
        /// Reply to this email id, threading via the batch artifact
        #[arg(long)]
        reply_to: Option<String>,
    },
    /// Move one email to trash
    Delete {
        /// Email id from a fetched batch
        #[arg(long)]
        id: String,
        /// Reason for the deletion
        #[arg(long)]
        reason: String,
    },
    /// Permanently purge the trash folder
    EmptyTrash,
    /// Send a digest notification for one categorized email
    Notify {
        /// Path to a JSON notification record
        #[arg(long)]
        record: String,
    },
    /// Validate free-form decision-logic output against the record contract
    ValidateDecision {
        /// Path to the raw decision output
        #[arg(long)]
        file: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load_from_env()?;
    run(&config, cli.command).await?;
    Ok(())
}

/// Dispatch one subcommand and print its outcome
async fn run(config: &Config, command: Command) -> AppResult<()> {
    match command {
        Command::Fetch { limit } => {
            let records = fetch::fetch_unread(config, limit).await?;
            let path = artifact::write_batch(&config.output_dir, &records).await?;
            println!(
                "Fetched {} unread email(s); batch written to {}",
                records.len(),
                path.display()
            );
        }
        Command::Organize {
            id,
            star,
            important,
            labels,
        } => {
            let directive = OrganizeDirective {
                email_id: id,
                star,
                mark_important: important,
                labels,
            };
            let outcome = organize::organize(config, &directive).await?;
            println!("{}", outcome.summary());
        }
        Command::Draft {
            subject,
            body,
            recipient,
            reply_to,
        } => {
            let thread_info = match reply_to {
                Some(id) => Some(lookup_thread_info(config, &id).await?),
                None => None,
            };
            let request = DraftRequest {
                subject,
                body,
                recipient,
                thread_info,
            };
            let outcome = draft::save_draft(config, &request).await?;
            println!("{}", outcome.summary(&request.subject));
        }
        Command::Delete { id, reason } => {
            let directive = CleanupDirective {
                email_id: id,
                age_days: None,
                delete: true,
                reason,
            };
            match cleanup::apply_directive(config, &directive).await? {
                Some(outcome) => println!("{}", outcome.summary()),
                None => println!("Email {} preserved", directive.email_id),
            }
        }
        Command::EmptyTrash => {
            let outcome = cleanup::empty_trash(config).await?;
            println!("{}", outcome.summary());
        }
        Command::Notify { record } => {
            let raw = tokio::fs::read_to_string(&record)
                .await
                .map_err(|e| AppError::invalid(format!("cannot read record {record}: {e}")))?;
            let notification: Notification = serde_json::from_str(&raw)
                .map_err(|e| AppError::invalid(format!("malformed notification record: {e}")))?;
            let outcome = notify::send_notification(config, &notification).await?;
            println!("{}", outcome.summary(&notification.subject));
        }
        Command::ValidateDecision { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| AppError::invalid(format!("cannot read file {file}: {e}")))?;
            let record = decision::parse_categorization(&raw)?;
            println!(
                "Valid categorization for email {}: {}",
                record.email_id,
                serde_json::to_string(&record)
                    .map_err(|e| AppError::Internal(format!("serialization failure: {e}")))?
            );
        }
    }
    Ok(())
}

/// Look up thread metadata for a reply from the current batch artifact
async fn lookup_thread_info(config: &Config, email_id: &str) -> AppResult<models::ThreadInfo> {
    let batch = artifact::load_batch(&config.output_dir).await?;
    batch
        .into_iter()
        .find(|record| record.id == email_id)
        .map(|record| record.thread_info)
        .ok_or_else(|| {
            AppError::NotFound(format!("email id {email_id} not present in batch artifact"))
        })
}
