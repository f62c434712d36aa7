//! Message parsing and MIME handling
//!
//! Parses RFC822 messages using `mailparse`, decodes encoded-word headers,
//! and extracts clean body text. HTML parts are converted to text with
//! `html2text` and whitespace-collapsed. Decoding problems never propagate:
//! headers fall back to their raw value and body parts degrade to an inline
//! error marker.

use std::sync::LazyLock;

use mailparse::{DispositionType, MailHeaderMap, ParsedMail};
use regex::Regex;
use tracing::warn;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Get a decoded header value by name
///
/// `mailparse` decodes RFC 2047 encoded words (including multiple segments
/// with mixed charsets) and substitutes replacement characters for invalid
/// byte sequences, so the result is always a best-effort readable string.
/// Returns an empty string when the header is absent.
pub fn header_value(parsed: &ParsedMail<'_>, name: &str) -> String {
    parsed.headers.get_first_value(name).unwrap_or_default()
}

/// Strip HTML tags and collapse whitespace
///
/// Falls back to the raw input (still whitespace-collapsed) if conversion
/// fails, so callers never see an error from cleaning.
pub fn clean_html(html: &str) -> String {
    let text = match html2text::from_read(html.as_bytes(), 120) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "HTML conversion failed; keeping raw body");
            html.to_owned()
        }
    };
    collapse_whitespace(&text)
}

/// Collapse runs of whitespace (including newlines) into single spaces
pub fn collapse_whitespace(input: &str) -> String {
    WHITESPACE.replace_all(input, " ").trim().to_owned()
}

/// Extract clean body text from a parsed message
///
/// For multipart messages, concatenates all `text/plain` parts verbatim and
/// all `text/html` parts after tag-stripping; parts with an attachment
/// disposition are skipped. Non-multipart messages get the same HTML-aware
/// cleaning applied to the single payload. A decoding error on an individual
/// part degrades to an inline marker string for that part rather than
/// aborting the whole message.
pub fn extract_body(parsed: &ParsedMail<'_>) -> String {
    if parsed.subparts.is_empty() {
        return match parsed.get_body() {
            Ok(payload) => clean_html(&payload),
            Err(e) => format!("Error decoding body: {e}"),
        };
    }

    let mut body = String::new();
    collect_parts(parsed, &mut body);
    body
}

/// Walk the MIME part tree, appending text content of non-attachment leaves
fn collect_parts(part: &ParsedMail<'_>, body: &mut String) {
    if part.subparts.is_empty() {
        let ctype = part.ctype.mimetype.to_ascii_lowercase();
        let is_attachment =
            part.get_content_disposition().disposition == DispositionType::Attachment;
        if is_attachment {
            return;
        }

        match ctype.as_str() {
            "text/plain" => match part.get_body() {
                Ok(text) => body.push_str(&text),
                Err(e) => body.push_str(&format!("[error decoding part: {e}]")),
            },
            "text/html" => match part.get_body() {
                Ok(html) => body.push_str(&clean_html(&html)),
                Err(e) => body.push_str(&format!("[error decoding part: {e}]")),
            },
            _ => {}
        }
        return;
    }

    for sub in &part.subparts {
        collect_parts(sub, body);
    }
}

#[cfg(test)]
mod tests {
    use super::{clean_html, collapse_whitespace, extract_body, header_value};

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("  a\n\n b\t\tc  "), "a b c");
    }

    #[test]
    fn strips_html_tags() {
        let out = clean_html("<html><body><p>Hello <b>there</b></p></body></html>");
        assert!(out.contains("Hello"));
        assert!(out.contains("there"));
        assert!(!out.contains('<'));
    }

    #[test]
    fn decodes_encoded_word_subject() {
        let raw = b"Subject: =?utf-8?B?SMOpbGxv?=\r\n\r\nbody";
        let parsed = mailparse::parse_mail(raw).expect("parse should succeed");
        assert_eq!(header_value(&parsed, "Subject"), "H\u{e9}llo");
    }

    #[test]
    fn missing_header_is_empty_string() {
        let raw = b"From: a@example.com\r\n\r\nbody";
        let parsed = mailparse::parse_mail(raw).expect("parse should succeed");
        assert_eq!(header_value(&parsed, "Subject"), "");
    }

    #[test]
    fn multipart_skips_attachment_and_keeps_plain_text() {
        let raw = concat!(
            "From: a@example.com\r\n",
            "To: b@example.com\r\n",
            "Subject: hi\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n",
            "\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "Hello\r\n",
            "--XYZ\r\n",
            "Content-Type: application/octet-stream\r\n",
            "Content-Disposition: attachment; filename=\"x.bin\"\r\n",
            "\r\n",
            "binarybytes\r\n",
            "--XYZ--\r\n",
        );
        let parsed = mailparse::parse_mail(raw.as_bytes()).expect("parse should succeed");
        assert_eq!(extract_body(&parsed).trim(), "Hello");
    }

    #[test]
    fn multipart_alternative_concatenates_plain_and_stripped_html() {
        let raw = concat!(
            "From: a@example.com\r\n",
            "Content-Type: multipart/alternative; boundary=\"AB\"\r\n",
            "\r\n",
            "--AB\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain part\r\n",
            "--AB\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<p>html   part</p>\r\n",
            "--AB--\r\n",
        );
        let parsed = mailparse::parse_mail(raw.as_bytes()).expect("parse should succeed");
        let body = extract_body(&parsed);
        assert!(body.contains("plain part"));
        assert!(body.contains("html part"));
        assert!(!body.contains('<'));
    }

    #[test]
    fn non_multipart_html_payload_is_cleaned() {
        let raw = concat!(
            "From: a@example.com\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<div>single <i>payload</i></div>\r\n",
        );
        let parsed = mailparse::parse_mail(raw.as_bytes()).expect("parse should succeed");
        let body = extract_body(&parsed);
        assert!(body.contains("single"));
        assert!(body.contains("payload"));
        assert!(!body.contains('<'));
    }
}
