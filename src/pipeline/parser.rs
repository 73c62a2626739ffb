//! Email parser — raw internet message into subject, plain-text body and PDF blobs.
//!
//! Decoding is best-effort: undecodable bytes are replaced, never fatal. Only
//! input that cannot be read as a message at all is an error.

use std::borrow::Cow;

use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};
use tracing::{debug, warn};

use crate::error::ParseError;
use crate::pipeline::types::ParsedEmail;

/// Stateless email parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmailParser;

impl EmailParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a raw message.
    ///
    /// - Multipart: every `text/plain` part (nested multiparts included) is
    ///   appended to the body, every `application/pdf` part is collected.
    /// - Single-part: the whole decoded payload is the body.
    /// - No blank line after the headers: text from the first line that is
    ///   not a header onward is the body.
    pub fn parse(&self, raw: &[u8]) -> Result<ParsedEmail, ParseError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::Empty);
        }

        let stray_body = body_without_separator(raw);
        let message = MessageParser::default().parse(raw);

        let parsed = match &message {
            Some(message) if !message.parts.is_empty() => from_message(message, stray_body),
            _ => {
                let body = stray_body.ok_or(ParseError::Unreadable)?;
                warn!("No message structure recognised, reading raw text as body");
                ParsedEmail {
                    body: String::from_utf8_lossy(body).into_owned(),
                    ..Default::default()
                }
            }
        };

        debug!(
            subject = %parsed.subject,
            body_len = parsed.body.len(),
            attachments = parsed.attachments.len(),
            "Parsed email"
        );
        Ok(parsed)
    }
}

fn from_message(message: &Message<'_>, stray_body: Option<&[u8]>) -> ParsedEmail {
    let mut parsed = ParsedEmail {
        subject: message.subject().unwrap_or_default().to_string(),
        ..Default::default()
    };

    match message.parts.first() {
        Some(root) if matches!(root.body, PartType::Multipart(_)) => walk(message, 0, &mut parsed),
        Some(root) => parsed.body = decode_text(root).into_owned(),
        None => {}
    }

    if parsed.body.trim().is_empty() {
        if let Some(body) = stray_body {
            warn!(subject = %parsed.subject, "Missing blank line after headers, recovering body");
            parsed.body = String::from_utf8_lossy(body).into_owned();
        }
    }
    parsed
}

/// Bytes from the first non-header line onward, when that line comes before
/// any blank line. `None` for well-formed input.
fn body_without_separator(raw: &[u8]) -> Option<&[u8]> {
    let mut offset = 0;
    let mut seen_header = false;

    for line in raw.split_inclusive(|b| *b == b'\n') {
        let content = line.trim_ascii_end();
        if content.is_empty() {
            return None;
        }

        let continuation = seen_header && matches!(content[0], b' ' | b'\t');
        if !continuation && !is_header_line(content) {
            return Some(&raw[offset..]);
        }

        seen_header = true;
        offset += line.len();
    }

    None
}

/// `Name: value`, where the name is printable ASCII without spaces or colons.
fn is_header_line(line: &[u8]) -> bool {
    match line.iter().position(|b| *b == b':') {
        Some(0) | None => false,
        Some(colon) => line[..colon].iter().all(|b| b.is_ascii_graphic()),
    }
}

/// Depth-first walk in structural order, starting at part `index`.
fn walk(message: &Message<'_>, index: usize, parsed: &mut ParsedEmail) {
    let Some(part) = message.parts.get(index) else {
        return;
    };

    match &part.body {
        PartType::Multipart(children) => {
            for child in children {
                walk(message, *child as usize, parsed);
            }
        }
        PartType::Message(inner) => {
            if !inner.parts.is_empty() {
                walk(inner, 0, parsed);
            }
        }
        _ => {
            let (ctype, subtype) = content_type(part);
            if ctype.eq_ignore_ascii_case("text") && subtype.eq_ignore_ascii_case("plain") {
                parsed.body.push_str(&decode_text(part));
            } else if ctype.eq_ignore_ascii_case("application")
                && subtype.eq_ignore_ascii_case("pdf")
            {
                parsed.attachments.push(part.contents().to_vec());
            }
        }
    }
}

/// Media type of a part; a part without a Content-Type header is `text/plain`.
fn content_type<'a>(part: &'a MessagePart<'_>) -> (&'a str, &'a str) {
    match MimeHeaders::content_type(part) {
        Some(ct) => (ct.ctype(), ct.subtype().unwrap_or_default()),
        None => ("text", "plain"),
    }
}

/// Decoded text of a part, replacing invalid byte sequences.
fn decode_text<'a>(part: &'a MessagePart<'_>) -> Cow<'a, str> {
    match &part.body {
        PartType::Text(text) | PartType::Html(text) => Cow::Borrowed(text.as_ref()),
        _ => String::from_utf8_lossy(part.contents()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> ParsedEmail {
        EmailParser::new().parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn single_part_plain_text() {
        let raw = "From: agent@bank.com\r\n\
                   Subject: Fee Request\r\n\
                   \r\n\
                   Please process $1,250.00 for deal Atlas\r\n";
        let parsed = parse(raw);
        assert_eq!(parsed.subject, "Fee Request");
        assert!(parsed.body.contains("Please process $1,250.00 for deal Atlas"));
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn missing_subject_is_empty_string() {
        let raw = "From: agent@bank.com\r\n\r\nNo subject here\r\n";
        let parsed = parse(raw);
        assert_eq!(parsed.subject, "");
        assert!(parsed.body.contains("No subject here"));
    }

    #[test]
    fn multipart_collects_plain_text_and_pdfs_in_order() {
        let raw = concat!(
            "From: agent@bank.com\r\n",
            "Subject: Closing\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"outer\"\r\n",
            "\r\n",
            "--outer\r\n",
            "Content-Type: multipart/alternative; boundary=\"inner\"\r\n",
            "\r\n",
            "--inner\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "First part.\r\n",
            "--inner\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>Ignored html</p>\r\n",
            "--inner--\r\n",
            "--outer\r\n",
            "Content-Type: application/pdf; name=\"notice.pdf\"\r\n",
            "Content-Disposition: attachment; filename=\"notice.pdf\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "JVBERi0xLjQgdGVzdA==\r\n",
            "--outer\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "\r\n",
            "Second part.\r\n",
            "--outer\r\n",
            "Content-Type: application/pdf; name=\"annex.pdf\"\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "JVBERi0xLjcgc2Vjb25k\r\n",
            "--outer--\r\n",
        );
        let parsed = parse(raw);

        assert_eq!(parsed.subject, "Closing");
        let first = parsed.body.find("First part.").unwrap();
        let second = parsed.body.find("Second part.").unwrap();
        assert!(first < second);
        assert!(!parsed.body.contains("Ignored html"));

        assert_eq!(parsed.attachments.len(), 2);
        assert_eq!(parsed.attachments[0], b"%PDF-1.4 test".to_vec());
        assert_eq!(parsed.attachments[1], b"%PDF-1.7 second".to_vec());
    }

    #[test]
    fn multipart_ignores_non_pdf_attachments() {
        let raw = concat!(
            "Subject: Files\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/mixed; boundary=\"b\"\r\n",
            "\r\n",
            "--b\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "See attached.\r\n",
            "--b\r\n",
            "Content-Type: image/png\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "iVBORw0KGgo=\r\n",
            "--b--\r\n",
        );
        let parsed = parse(raw);
        assert!(parsed.body.contains("See attached."));
        assert!(parsed.attachments.is_empty());
    }

    #[test]
    fn encoded_subject_is_decoded() {
        let raw = "Subject: =?UTF-8?B?RmVlIFJlcXVlc3Q=?=\r\n\r\nbody\r\n";
        assert_eq!(parse(raw).subject, "Fee Request");
    }

    #[test]
    fn invalid_bytes_degrade_instead_of_failing() {
        let mut raw = b"Subject: Broken\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nAmount due ".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe, 0xfd]);
        raw.extend_from_slice(b" today\r\n");

        let parsed = EmailParser::new().parse(&raw).unwrap();
        assert_eq!(parsed.subject, "Broken");
        assert!(parsed.body.contains("Amount due"));
    }

    #[test]
    fn headerless_single_line_becomes_body() {
        let parsed = parse("hello world this is just text");
        assert_eq!(parsed.subject, "");
        assert_eq!(parsed.body, "hello world this is just text");
    }

    #[test]
    fn headerless_multi_line_text_becomes_body() {
        let parsed = parse("Please pay $5 for deal Atlas\r\nsecond line\r\n");
        assert_eq!(parsed.subject, "");
        assert!(parsed.body.starts_with("Please pay $5 for deal Atlas"));
        assert!(parsed.body.contains("second line"));
    }

    #[test]
    fn body_recovered_when_blank_line_after_headers_is_missing() {
        let parsed = parse("Subject: Fee\r\nPlease pay $5 for deal Atlas\r\n");
        assert_eq!(parsed.subject, "Fee");
        assert!(parsed.body.starts_with("Please pay $5 for deal Atlas"));
    }

    #[test]
    fn separator_detection() {
        assert_eq!(
            body_without_separator(b"Subject: x\r\nbody here\r\n"),
            Some(&b"body here\r\n"[..])
        );
        assert_eq!(
            body_without_separator(b"Subject: a\r\n folded\r\nrest"),
            Some(&b"rest"[..])
        );
        assert_eq!(body_without_separator(b"Subject: x\r\n\r\nbody"), None);
        assert_eq!(body_without_separator(b"Subject: x\r\n"), None);
    }

    #[test]
    fn header_line_shape() {
        assert!(is_header_line(b"Subject: Fee"));
        assert!(is_header_line(b"X-Loan-Id:42"));
        assert!(!is_header_line(b"Please pay: $5"));
        assert!(!is_header_line(b": no name"));
        assert!(!is_header_line(b"no colon at all"));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(
            EmailParser::new().parse(b""),
            Err(ParseError::Empty)
        ));
        assert!(matches!(
            EmailParser::new().parse(b" \r\n "),
            Err(ParseError::Empty)
        ));
    }
}
