//! SMTP reply parsing

use crate::transport::error::TransportError;

use std::io::BufRead;

/// A reply received from an SMTP server
#[derive(Debug, Clone, PartialEq)]
pub struct SmtpReply {
    /// The SMTP reply code (e.g., "250", "354", "500")
    pub code: String,
    /// The human-readable message of the first line
    pub message: String,
    /// Remaining lines of a multiline reply (e.g., EHLO capabilities)
    pub multiline: Option<Vec<String>>,
}

impl SmtpReply {
    /// Create a single-line reply
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            multiline: None,
        }
    }

    /// Create a multiline reply
    pub fn new_multiline(code: &str, message: &str, lines: Vec<String>) -> Self {
        Self {
            code: code.to_owned(),
            message: message.to_owned(),
            multiline: Some(lines),
        }
    }

    /// Read one complete reply, following `NNN-` continuation lines
    pub fn read_from<R: BufRead>(reader: &mut R) -> Result<Self, TransportError> {
        let mut lines: Vec<String> = Vec::new();
        let mut code: Option<String> = None;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Err(TransportError::ConnectionClosed);
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\r', '\n']);

            let (line_code, rest) = split_reply_line(line)?;
            match &code {
                Some(first) if first != line_code => {
                    return Err(TransportError::MalformedReply(format!(
                        "reply code changed from {first} to {line_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(line_code.to_string()),
            }

            let (last, text) = match rest.chars().next() {
                None => (true, ""),
                Some(' ') => (true, &rest[1..]),
                Some('-') => (false, &rest[1..]),
                Some(_) => return Err(TransportError::MalformedReply(line.to_string())),
            };
            lines.push(text.to_string());

            if last {
                break;
            }
        }

        let code = code.unwrap_or_default();
        let mut lines = lines.into_iter();
        let message = lines.next().unwrap_or_default();
        let rest: Vec<String> = lines.collect();

        Ok(if rest.is_empty() {
            Self::new(&code, &message)
        } else {
            Self::new_multiline(&code, &message, rest)
        })
    }

    /// Check if this is a success reply (2xx)
    pub fn is_success(&self) -> bool {
        self.code.starts_with('2')
    }

    /// Check if this is a permanent failure (5xx)
    pub fn is_permanent_failure(&self) -> bool {
        self.code.starts_with('5')
    }

    /// Capability lines advertised after EHLO
    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.multiline.iter().flatten().map(String::as_str)
    }

    pub(crate) fn into_error(self) -> TransportError {
        TransportError::Rejected {
            code: self.code,
            message: self.message,
        }
    }
}

fn split_reply_line(line: &str) -> Result<(&str, &str), TransportError> {
    let code = line
        .get(..3)
        .filter(|code| code.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| TransportError::MalformedReply(line.to_string()))?;
    Ok((code, &line[3..]))
}
