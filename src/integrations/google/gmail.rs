//! Gmail: send a message with optional attachments

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{check_response, http_client, GoogleAuth, GoogleError};

const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// An outgoing email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: vec![to.into()],
            cc: Vec::new(),
            subject: subject.into(),
            body: body.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_cc(mut self, cc: impl Into<String>) -> Self {
        self.cc.push(cc.into());
        self
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    /// Boundary derived from the content so output is reproducible
    fn boundary(&self) -> String {
        let mut hash: u64 = 0xcbf29ce484222325;
        for b in self.subject.bytes().chain(self.body.bytes()) {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        unused_boundary(hash, &self.body)
    }

    /// The message as RFC 2822 text. Attachments make it multipart/mixed.
    pub fn to_rfc2822(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("To: {}\r\n", address_list(&self.to)));
        if !self.cc.is_empty() {
            out.push_str(&format!("Cc: {}\r\n", address_list(&self.cc)));
        }
        out.push_str(&format!("Subject: {}\r\n", encode_header(&self.subject)));
        out.push_str("MIME-Version: 1.0\r\n");

        if self.attachments.is_empty() {
            out.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n");
            out.push_str(&self.body);
            return out;
        }

        let boundary = self.boundary();
        out.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            boundary
        ));
        out.push_str(&format!("--{}\r\n", boundary));
        out.push_str("Content-Type: text/plain; charset=\"UTF-8\"\r\n\r\n");
        out.push_str(&self.body);
        out.push_str("\r\n");

        for a in &self.attachments {
            let filename = filename_param(&a.filename);
            out.push_str(&format!("--{}\r\n", boundary));
            out.push_str(&format!(
                "Content-Type: {}; name=\"{}\"\r\n",
                single_line(&a.mime_type),
                filename
            ));
            out.push_str(&format!(
                "Content-Disposition: attachment; filename=\"{}\"\r\n",
                filename
            ));
            out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
            let encoded = STANDARD.encode(&a.data);
            // RFC 2045 caps encoded lines at 76 characters
            for chunk in encoded.as_bytes().chunks(76) {
                out.push_str(&String::from_utf8_lossy(chunk));
                out.push_str("\r\n");
            }
        }
        out.push_str(&format!("--{}--\r\n", boundary));
        out
    }

    /// The `raw` field Gmail expects: base64url without padding
    pub fn encode_raw(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_rfc2822())
    }
}

/// First `murp_<hash>` variant that never appears in the body
fn unused_boundary(hash: u64, body: &str) -> String {
    let mut boundary = format!("murp_{:016x}", hash);
    let mut n = 0u32;
    while body.contains(&boundary) {
        n += 1;
        boundary = format!("murp_{:016x}_{}", hash, n);
    }
    boundary
}

/// Header text cannot carry line breaks
fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

fn address_list(addresses: &[String]) -> String {
    addresses
        .iter()
        .map(|a| single_line(a).trim().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// Raw bytes per RFC 2047 word, keeping each word under 75 characters
const WORD_BYTES: usize = 45;

fn encoded_word(text: &str) -> String {
    format!("=?UTF-8?B?{}?=", STANDARD.encode(text.as_bytes()))
}

/// Header value with non-ASCII text as folded RFC 2047 encoded words
fn encode_header(value: &str) -> String {
    let value = single_line(value);
    if value.is_ascii() {
        return value;
    }
    let mut words = Vec::new();
    let mut chunk = String::new();
    for c in value.chars() {
        if chunk.len() + c.len_utf8() > WORD_BYTES {
            words.push(encoded_word(&chunk));
            chunk.clear();
        }
        chunk.push(c);
    }
    if !chunk.is_empty() {
        words.push(encoded_word(&chunk));
    }
    words.join("\r\n ")
}

/// Contents of a quoted filename parameter
fn filename_param(name: &str) -> String {
    let name = single_line(name);
    if name.is_ascii() {
        name.replace('\\', "\\\\").replace('"', "\\\"")
    } else {
        encoded_word(&name)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SentMessage {
    #[serde(rename = "id")]
    pub message_id: String,
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

pub trait GmailApi {
    fn send(&self, message: &EmailMessage) -> Result<SentMessage, GoogleError>;
}

pub struct HttpGmail {
    client: reqwest::blocking::Client,
    token: String,
}

impl HttpGmail {
    pub fn connect(auth: &GoogleAuth) -> Result<Self, GoogleError> {
        let client = http_client()?;
        let token = auth.access_token(&client)?;
        Ok(Self { client, token })
    }
}

impl GmailApi for HttpGmail {
    fn send(&self, message: &EmailMessage) -> Result<SentMessage, GoogleError> {
        tracing::info!(to = %message.to.join(", "), subject = %message.subject, "sending email");
        let resp = self
            .client
            .post(SEND_URL)
            .bearer_auth(&self.token)
            .json(&json!({ "raw": message.encode_raw() }))
            .send()?;
        check_response(resp)?
            .json()
            .map_err(|e| GoogleError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_message() {
        let msg = EmailMessage::new("orders@acme.example", "PO-2026-0001", "Hello");
        let text = msg.to_rfc2822();
        assert!(text.starts_with("To: orders@acme.example\r\n"));
        assert!(text.contains("Subject: PO-2026-0001\r\n"));
        assert!(text.ends_with("\r\n\r\nHello"));
    }

    #[test]
    fn test_attachment_is_multipart() {
        let msg = EmailMessage::new("a@b.example", "Order", "See attached")
            .with_cc("buyer@us.example")
            .with_attachment(Attachment {
                filename: "po.csv".into(),
                mime_type: "text/csv".into(),
                data: b"sku,qty\nKELP-01,40\n".to_vec(),
            });
        let text = msg.to_rfc2822();

        assert!(text.contains("Cc: buyer@us.example\r\n"));
        assert!(text.contains("multipart/mixed"));
        assert!(text.contains("filename=\"po.csv\""));
        assert!(text.contains(&STANDARD.encode(b"sku,qty\nKELP-01,40\n")));
        assert!(text.trim_end().ends_with("--"));
    }

    #[test]
    fn test_raw_is_url_safe_unpadded() {
        let msg = EmailMessage::new("a@b.example", "??>>", "~~~???");
        let raw = msg.encode_raw();
        assert!(!raw.contains('+') && !raw.contains('/') && !raw.contains('='));
        let decoded = URL_SAFE_NO_PAD.decode(raw).unwrap();
        assert_eq!(String::from_utf8(decoded).unwrap(), msg.to_rfc2822());
    }

    #[test]
    fn test_header_injection_is_flattened() {
        let msg = EmailMessage::new("a@b.example\r\nBcc: evil@x.example", "Order\r\nBcc: evil@x.example", "Hi")
            .with_attachment(Attachment {
                filename: "po.csv\r\nX-Evil: 1".into(),
                mime_type: "text/csv".into(),
                data: b"x".to_vec(),
            });
        let text = msg.to_rfc2822();
        assert!(!text.contains("\r\nBcc:"));
        assert!(!text.contains("\r\nX-Evil"));
        assert!(text.contains("Subject: Order  Bcc: evil@x.example\r\n"));
        assert!(text.contains("filename=\"po.csv  X-Evil: 1\""));
    }

    #[test]
    fn test_non_ascii_subject_and_filename_are_encoded() {
        let subject = "Bestellung für Düngemittel, Lieferung nächste Woche bitte bestätigen";
        let msg = EmailMessage::new("a@b.example", subject, "Hallo").with_attachment(Attachment {
            filename: "Bestellübersicht.csv".into(),
            mime_type: "text/csv".into(),
            data: b"x".to_vec(),
        });
        let text = msg.to_rfc2822();
        assert!(text.is_ascii());
        assert!(text.contains(&format!(
            "filename=\"=?UTF-8?B?{}?=\"",
            STANDARD.encode("Bestellübersicht.csv")
        )));

        let header = text
            .split("\r\nMIME-Version")
            .next()
            .and_then(|h| h.split("Subject: ").nth(1))
            .unwrap();
        let mut decoded = Vec::new();
        for word in header.split("\r\n ") {
            assert!(word.len() <= 75, "{}", word);
            let inner = word.strip_prefix("=?UTF-8?B?").and_then(|w| w.strip_suffix("?=")).unwrap();
            decoded.extend(STANDARD.decode(inner).unwrap());
        }
        assert!(header.contains("\r\n "));
        assert_eq!(String::from_utf8(decoded).unwrap(), subject);
    }

    #[test]
    fn test_boundary_never_appears_in_body() {
        assert_eq!(unused_boundary(7, "plain"), "murp_0000000000000007");

        let body = "--murp_0000000000000007 and murp_0000000000000007_1";
        let boundary = unused_boundary(7, body);
        assert_eq!(boundary, "murp_0000000000000007_2");
        assert!(!body.contains(&boundary));
    }
}
