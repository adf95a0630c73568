//! Transport that hands messages to a local sendmail executable

use crate::transport::error::{FactoryError, TransportError};
use crate::transport::message::Message;
use crate::transport::spec::options_mapping;
use crate::transport::Transport;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use std::any::Any;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

/// Default location of the sendmail executable
pub const DEFAULT_SENDMAIL_PATH: &str = "/usr/sbin/sendmail";

/// Options for [`SendmailTransport`]
///
/// Recognized keys: `path` and `parameters`. `parameters` may be a list or a
/// whitespace-separated string. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SendmailOptions {
    /// The sendmail executable
    pub path: PathBuf,

    /// Extra arguments placed before the envelope arguments
    #[serde(deserialize_with = "one_or_many")]
    pub parameters: Vec<String>,
}

impl SendmailOptions {
    /// Build options from a spec's `options` value
    pub fn from_value(options: &Value) -> Result<Self, FactoryError> {
        let mapping = options_mapping(options).ok_or_else(|| {
            FactoryError::invalid_argument("sendmail transport options must be a mapping")
        })?;
        serde_json::from_value(Value::Object(mapping)).map_err(|e| {
            FactoryError::invalid_argument(format!("invalid sendmail transport options: {e}"))
        })
    }
}

impl Default for SendmailOptions {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_SENDMAIL_PATH),
            parameters: Vec::new(),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(line) => line.split_whitespace().map(str::to_owned).collect(),
        OneOrMany::Many(list) => list,
    })
}

/// Pipes every message into `sendmail -i`
#[derive(Debug, Clone, Default)]
pub struct SendmailTransport {
    options: SendmailOptions,
}

impl SendmailTransport {
    /// Create a transport with the given options
    pub fn new(options: SendmailOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SendmailOptions {
        &self.options
    }

    /// Executable that will be invoked
    pub fn program(&self) -> &Path {
        &self.options.path
    }

    /// Command line arguments used for the given message
    pub fn arguments(&self, message: &Message) -> Vec<String> {
        let mut args = vec!["-i".to_string()];
        args.extend(self.options.parameters.iter().cloned());

        let has_sender = self
            .options
            .parameters
            .iter()
            .any(|param| param.starts_with("-f"));
        if !has_sender {
            args.push("-f".to_string());
            args.push(message.from.clone());
        }

        args.push("--".to_string());
        args.extend(message.to.iter().cloned());
        args
    }
}

impl Transport for SendmailTransport {
    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        message.validate_envelope()?;

        let args = self.arguments(message);
        tracing::debug!(program = %self.program().display(), ?args, "invoking sendmail");

        let mut child = Command::new(self.program())
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // stderr is drained by wait_with_output while the body is written
        let stdin = child.stdin.take();
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || write_body(stdin, message));
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output?;
        if !output.status.success() {
            return Err(TransportError::Sendmail {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        written.map_err(|_| io::Error::other("sendmail stdin writer panicked"))??;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Feed the message to sendmail with LF line endings
fn write_body(stdin: Option<ChildStdin>, message: &Message) -> io::Result<()> {
    let Some(mut stdin) = stdin else {
        return Ok(());
    };

    let mut body = String::with_capacity(message.data.len() + 1);
    for line in message.data.lines() {
        body.push_str(line);
        body.push('\n');
    }

    match stdin.write_all(body.as_bytes()) {
        // The exit status tells whether delivery failed
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        result => result,
    }
}
