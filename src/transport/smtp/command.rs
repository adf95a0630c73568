//! SMTP commands issued by the client

use crate::transport::error::{SmtpLimits, TransportError};
use crate::transport::smtp::reply::SmtpReply;

/// A command the client sends to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpCommand<'a> {
    Helo(&'a str),
    #[cfg(feature = "ehlo")]
    Ehlo(&'a str),
    MailFrom(&'a str),
    RcptTo(&'a str),
    Data,
    Rset,
    Quit,
}

impl SmtpCommand<'_> {
    /// Format the command line, including CRLF
    pub fn format(&self) -> Result<String, TransportError> {
        let line = match self {
            SmtpCommand::Helo(domain) => format!("HELO {domain}\r\n"),
            #[cfg(feature = "ehlo")]
            SmtpCommand::Ehlo(domain) => format!("EHLO {domain}\r\n"),
            SmtpCommand::MailFrom(addr) => format!("MAIL FROM:<{addr}>\r\n"),
            SmtpCommand::RcptTo(addr) => format!("RCPT TO:<{addr}>\r\n"),
            SmtpCommand::Data => "DATA\r\n".to_string(),
            SmtpCommand::Rset => "RSET\r\n".to_string(),
            SmtpCommand::Quit => "QUIT\r\n".to_string(),
        };

        if line.len() > SmtpLimits::COMMAND_LINE_MAX_LENGTH {
            return Err(TransportError::LineTooLong {
                max: SmtpLimits::COMMAND_LINE_MAX_LENGTH,
            });
        }

        Ok(line)
    }

    /// Name of the command verb
    pub fn verb(&self) -> &'static str {
        match self {
            SmtpCommand::Helo(_) => "HELO",
            #[cfg(feature = "ehlo")]
            SmtpCommand::Ehlo(_) => "EHLO",
            SmtpCommand::MailFrom(_) => "MAIL",
            SmtpCommand::RcptTo(_) => "RCPT",
            SmtpCommand::Data => "DATA",
            SmtpCommand::Rset => "RSET",
            SmtpCommand::Quit => "QUIT",
        }
    }

    /// Whether the reply completes the command successfully
    pub fn accepts(&self, reply: &SmtpReply) -> bool {
        match self {
            SmtpCommand::Data => reply.code == "354",
            SmtpCommand::Quit => reply.code == "221",
            // 250 or 251 (user not local, will forward)
            SmtpCommand::RcptTo(_) => reply.is_success(),
            _ => reply.code == "250",
        }
    }
}
