//! Decision-logic boundary deserialization
//!
//! The external decision producer is unreliable: its categorization output
//! sometimes arrives wrapped in explanatory prose, or carries the example
//! placeholder values from its own instructions. This module isolates the
//! recovery heuristics behind one function: parse the output into a
//! strictly-typed record, else fail with a structured error. Placeholder
//! records are rejected rather than silently patched.

use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::models::CategorizedEmail;

/// Known example values the external producer leaks from its instructions
const PLACEHOLDER_EMAIL_ID: &str = "12345";
const PLACEHOLDER_SUBJECT: &str = "Urgent Task Update";

/// Parse free-form decision output into a validated categorization record
///
/// Accepts a bare JSON object or JSON embedded in surrounding prose (the
/// substring between the first `{` and the last `}` is retried when the full
/// input does not parse). Records carrying placeholder identifiers fail with
/// `InvalidInput` instead of being silently repaired.
pub fn parse_categorization(raw: &str) -> AppResult<CategorizedEmail> {
    let record = match serde_json::from_str::<CategorizedEmail>(raw) {
        Ok(record) => record,
        Err(first_err) => {
            let embedded = extract_braced(raw).ok_or_else(|| {
                AppError::invalid(format!("categorization output is not JSON: {first_err}"))
            })?;
            debug!("recovered embedded JSON object from categorization output");
            serde_json::from_str::<CategorizedEmail>(embedded).map_err(|e| {
                AppError::invalid(format!("embedded categorization JSON is malformed: {e}"))
            })?
        }
    };
    validate(record)
}

/// Extract the substring between the first `{` and the last `}`
fn extract_braced(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

/// Reject empty or placeholder-valued records
fn validate(record: CategorizedEmail) -> AppResult<CategorizedEmail> {
    if record.email_id.trim().is_empty() {
        return Err(AppError::invalid(
            "categorization record is missing email_id",
        ));
    }
    if record.email_id == PLACEHOLDER_EMAIL_ID && record.subject == PLACEHOLDER_SUBJECT {
        return Err(AppError::invalid(
            "categorization record contains placeholder values; rejecting instead of substituting",
        ));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use crate::models::{Category, Priority, RequiredAction};

    use super::parse_categorization;

    const VALID: &str = r#"{
        "email_id": "42",
        "subject": "Invoice for April",
        "sender": "billing@example.com",
        "date": "2024-05-01",
        "category": "RECEIPTS_INVOICES",
        "priority": "LOW",
        "required_action": "READ_ONLY",
        "reason": "automated receipt"
    }"#;

    #[test]
    fn parses_bare_json_record() {
        let record = parse_categorization(VALID).expect("parse should succeed");
        assert_eq!(record.email_id, "42");
        assert_eq!(record.category, Category::ReceiptsInvoices);
        assert_eq!(record.priority, Priority::Low);
        assert_eq!(record.required_action, RequiredAction::ReadOnly);
    }

    #[test]
    fn recovers_json_embedded_in_prose() {
        let wrapped = format!("my best complete final answer is:\n{VALID}\nHope that helps!");
        let record = parse_categorization(&wrapped).expect("parse should succeed");
        assert_eq!(record.email_id, "42");
    }

    #[test]
    fn rejects_placeholder_record() {
        let placeholder = VALID
            .replace("\"42\"", "\"12345\"")
            .replace("Invoice for April", "Urgent Task Update");
        let err = parse_categorization(&placeholder).expect_err("must fail");
        assert!(err.to_string().contains("placeholder"));
    }

    #[test]
    fn rejects_record_without_email_id() {
        let missing = VALID.replace("\"42\"", "\"\"");
        let err = parse_categorization(&missing).expect_err("must fail");
        assert!(err.to_string().contains("email_id"));
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(parse_categorization("no json here").is_err());
        assert!(parse_categorization("{broken").is_err());
    }

    #[test]
    fn rejects_invalid_enum_value() {
        let bad = VALID.replace("RECEIPTS_INVOICES", "SPAM");
        assert!(parse_categorization(&bad).is_err());
    }
}
