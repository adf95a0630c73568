//! Transport that delivers messages to an SMTP server

pub mod command;
pub mod options;
pub mod reply;

pub use command::SmtpCommand;
pub use options::SmtpOptions;
pub use reply::SmtpReply;

use crate::transport::error::TransportError;
use crate::transport::message::Message;
use crate::transport::Transport;

use std::any::Any;
use std::io::{self, BufReader, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Longest a dropped transport waits on the server to acknowledge QUIT
const QUIT_ON_DROP_TIMEOUT: Duration = Duration::from_secs(1);

/// Sends messages over a plain SMTP connection
///
/// The connection is opened on the first send and reused afterwards.
#[derive(Debug, Default)]
pub struct SmtpTransport {
    options: SmtpOptions,
    connection: Option<SmtpConnection>,
}

impl SmtpTransport {
    /// Create a transport with the given options; no connection is made yet
    pub fn new(options: SmtpOptions) -> Self {
        Self {
            options,
            connection: None,
        }
    }

    pub fn options(&self) -> &SmtpOptions {
        &self.options
    }

    /// Whether a connection is currently open
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Close the connection with QUIT
    pub fn disconnect(&mut self) -> Result<(), TransportError> {
        match self.connection.take() {
            Some(mut connection) => connection.quit(),
            None => Ok(()),
        }
    }

    fn connection(&mut self) -> Result<&mut SmtpConnection, TransportError> {
        let expired = match (&self.connection, self.options.connection_time_limit()) {
            (Some(connection), Some(limit)) => connection.opened_at.elapsed() >= limit,
            _ => false,
        };
        if expired {
            tracing::debug!("smtp connection time limit reached, reconnecting");
            if let Err(e) = self.disconnect() {
                tracing::warn!("failed to close expired smtp connection: {e}");
            }
        }

        if self.connection.is_none() {
            self.connection = Some(SmtpConnection::open(&self.options)?);
        }
        self.connection
            .as_mut()
            .ok_or(TransportError::ConnectionClosed)
    }
}

impl Transport for SmtpTransport {
    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        message.validate_envelope()?;
        message.validate_lines()?;

        let result = self.connection()?.transaction(message);

        if let Err(ref e) = result {
            let keep = e.is_recoverable()
                && self
                    .connection
                    .as_mut()
                    .is_some_and(|connection| connection.command(SmtpCommand::Rset).is_ok());
            if !keep {
                self.connection = None;
            }
        }

        result
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for SmtpTransport {
    fn drop(&mut self) {
        if let Some(connection) = &self.connection {
            if let Err(e) = connection.limit_timeouts(QUIT_ON_DROP_TIMEOUT) {
                tracing::debug!("failed to limit smtp timeouts before QUIT: {e}");
            }
        }
        if let Err(e) = self.disconnect() {
            tracing::debug!("smtp QUIT on drop failed: {e}");
        }
    }
}

/// An open, greeted connection to an SMTP server
#[derive(Debug)]
struct SmtpConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    opened_at: Instant,
}

impl SmtpConnection {
    fn open(options: &SmtpOptions) -> Result<Self, TransportError> {
        let stream = connect(options)?;
        stream.set_read_timeout(options.timeout())?;
        stream.set_write_timeout(options.timeout())?;

        let mut connection = Self {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
            opened_at: Instant::now(),
        };

        let greeting = connection.read_reply()?;
        if greeting.code != "220" {
            return Err(greeting.into_error());
        }
        tracing::info!(
            "SMTP connected to {}:{} - {}",
            options.host(),
            options.port(),
            greeting.message
        );

        connection.greet(options.name())?;
        Ok(connection)
    }

    #[cfg(not(feature = "ehlo"))]
    fn greet(&mut self, name: &str) -> Result<(), TransportError> {
        self.command(SmtpCommand::Helo(name))?;
        Ok(())
    }

    #[cfg(feature = "ehlo")]
    fn greet(&mut self, name: &str) -> Result<(), TransportError> {
        let reply = self.exchange(SmtpCommand::Ehlo(name))?;
        if reply.is_success() {
            tracing::debug!(capabilities = ?reply.capabilities().collect::<Vec<_>>(), "EHLO accepted");
            Ok(())
        } else if reply.is_permanent_failure() {
            // Servers that predate ESMTP answer EHLO with 500/502
            self.command(SmtpCommand::Helo(name))?;
            Ok(())
        } else {
            Err(reply.into_error())
        }
    }

    fn transaction(&mut self, message: &Message) -> Result<(), TransportError> {
        self.command(SmtpCommand::MailFrom(&message.from))?;
        for recipient in &message.to {
            self.command(SmtpCommand::RcptTo(recipient))?;
        }
        self.command(SmtpCommand::Data)?;

        for line in message.data.lines() {
            if line.starts_with('.') {
                self.writer.write_all(b".")?;
            }
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\r\n")?;
        }
        self.writer.write_all(b".\r\n")?;
        self.writer.flush()?;

        let reply = self.read_reply()?;
        if reply.code != "250" {
            return Err(reply.into_error());
        }

        tracing::debug!(
            from = %message.from,
            recipients = message.to.len(),
            "message accepted: {}",
            reply.message
        );
        Ok(())
    }

    fn command(&mut self, command: SmtpCommand<'_>) -> Result<SmtpReply, TransportError> {
        let reply = self.exchange(command)?;
        if command.accepts(&reply) {
            Ok(reply)
        } else {
            tracing::debug!(command = command.verb(), code = %reply.code, "command rejected");
            Err(reply.into_error())
        }
    }

    /// Send a command and read whatever the server answers
    fn exchange(&mut self, command: SmtpCommand<'_>) -> Result<SmtpReply, TransportError> {
        let line = command.format()?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.read_reply()
    }

    /// Cap both socket timeouts at `limit`
    fn limit_timeouts(&self, limit: Duration) -> io::Result<()> {
        let read = self.writer.read_timeout()?.map_or(limit, |t| t.min(limit));
        let write = self.writer.write_timeout()?.map_or(limit, |t| t.min(limit));
        self.writer.set_read_timeout(Some(read))?;
        self.writer.set_write_timeout(Some(write))
    }

    fn quit(&mut self) -> Result<(), TransportError> {
        self.command(SmtpCommand::Quit)?;
        Ok(())
    }

    fn read_reply(&mut self) -> Result<SmtpReply, TransportError> {
        SmtpReply::read_from(&mut self.reader)
    }
}

fn connect(options: &SmtpOptions) -> Result<TcpStream, TransportError> {
    let addrs = (options.host(), options.port()).to_socket_addrs()?;

    let mut last_error = None;
    for addr in addrs {
        let attempt = match options.timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }

    Err(last_error
        .unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no address found for {}", options.host()),
            )
        })
        .into())
}
