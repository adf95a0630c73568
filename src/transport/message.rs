//! Message handed to a transport

use crate::transport::error::{SmtpLimits, TransportError};

use std::time::SystemTime;

/// A composed mail message together with its envelope
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// The sender's email address
    pub from: String,

    /// List of recipient email addresses
    pub to: Vec<String>,

    /// The raw content including headers and body
    pub data: String,

    /// When the message was composed
    pub timestamp: SystemTime,
}

impl Message {
    /// Create a new message
    pub fn new(from: impl Into<String>, to: Vec<String>, data: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to,
            data: data.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Check if this message is addressed to a specific recipient
    pub fn has_recipient(&self, recipient: &str) -> bool {
        self.to.iter().any(|addr| addr == recipient)
    }

    /// Check if this message is sent from a specific sender
    pub fn is_from_sender(&self, sender: &str) -> bool {
        self.from == sender
    }

    /// Get the size of the message data in bytes
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Get the subject line from the headers (if present)
    pub fn get_subject(&self) -> Option<&str> {
        for line in self.data.lines() {
            if line.is_empty() {
                // End of headers
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("subject") {
                    return Some(value.trim_start());
                }
            }
        }
        None
    }

    /// Get the message body (content after the first empty line)
    pub fn get_body(&self) -> Option<&str> {
        let lf = self.data.find("\n\n").map(|i| i + 2);
        let crlf = self.data.find("\r\n\r\n").map(|i| i + 4);

        let body_start = match (lf, crlf) {
            (Some(a), Some(b)) => a.min(b),
            (a, b) => a.or(b)?,
        };

        if body_start < self.data.len() {
            Some(&self.data[body_start..])
        } else {
            None
        }
    }

    /// Check if the message contains a specific text in headers or body
    pub fn contains_text(&self, text: &str) -> bool {
        self.data.contains(text)
    }

    /// The data with every line terminated by CRLF
    pub fn formatted(&self) -> String {
        let mut out = String::with_capacity(self.data.len() + 2);
        for line in self.data.lines() {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out
    }

    /// Validate the envelope before handing the message to a delivery agent
    pub fn validate_envelope(&self) -> Result<(), TransportError> {
        if self.from.is_empty() {
            return Err(TransportError::InvalidMessage(
                "message has no sender".to_string(),
            ));
        }
        validate_address(&self.from)?;

        if self.to.is_empty() {
            return Err(TransportError::InvalidMessage(
                "message has no recipients".to_string(),
            ));
        }

        if self.to.len() > SmtpLimits::MAX_RECIPIENTS {
            return Err(TransportError::TooManyRecipients {
                max: SmtpLimits::MAX_RECIPIENTS,
            });
        }

        for recipient in &self.to {
            validate_address(recipient)?;
        }

        Ok(())
    }

    /// Check every data line against the text line limit
    pub fn validate_lines(&self) -> Result<(), TransportError> {
        for line in self.data.lines() {
            // +2 for CRLF, +1 for a possible dot-stuffing prefix
            let line_size = line.len() + 2 + usize::from(line.starts_with('.'));
            if line_size > SmtpLimits::TEXT_LINE_MAX_LENGTH {
                return Err(TransportError::LineTooLong {
                    max: SmtpLimits::TEXT_LINE_MAX_LENGTH,
                });
            }
        }
        Ok(())
    }
}

/// Validate email address format and size limits
pub(crate) fn validate_address(addr: &str) -> Result<(), TransportError> {
    if addr.len() > SmtpLimits::PATH_MAX_LENGTH {
        return Err(TransportError::PathTooLong {
            max: SmtpLimits::PATH_MAX_LENGTH,
        });
    }

    if addr.starts_with('-')
        || addr
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == '<' || c == '>')
    {
        return Err(TransportError::InvalidMessage(format!(
            "address contains forbidden characters: {addr:?}"
        )));
    }

    let Some(at_pos) = addr.rfind('@') else {
        return Err(TransportError::InvalidMessage(format!(
            "address must contain @ symbol: {addr:?}"
        )));
    };

    let user_part = &addr[..at_pos];
    let domain_part = &addr[at_pos + 1..];

    if user_part.len() > SmtpLimits::USER_MAX_LENGTH {
        return Err(TransportError::UserTooLong {
            max: SmtpLimits::USER_MAX_LENGTH,
        });
    }

    if domain_part.len() > SmtpLimits::DOMAIN_MAX_LENGTH {
        return Err(TransportError::DomainTooLong {
            max: SmtpLimits::DOMAIN_MAX_LENGTH,
        });
    }

    if user_part.is_empty() || domain_part.is_empty() {
        return Err(TransportError::InvalidMessage(format!(
            "invalid email address format: {addr:?}"
        )));
    }

    Ok(())
}
