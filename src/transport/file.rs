//! Transport that writes each message to a file

use crate::transport::error::{FactoryError, TransportError};
use crate::transport::message::Message;
use crate::transport::spec::options_mapping;
use crate::transport::Transport;

use serde::Deserialize;
use serde_json::Value;

use std::any::Any;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Produces the file name a message is stored under
pub type FilenameGenerator = Arc<dyn Fn(&Message) -> String + Send + Sync>;

static FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Options for [`FileTransport`]
///
/// Recognized keys: `path`. Unknown keys are rejected.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileOptions {
    /// Directory messages are written to
    pub path: PathBuf,

    #[serde(skip)]
    filename: Option<FilenameGenerator>,
}

impl FileOptions {
    /// Options writing to `path` with the default file names
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filename: None,
        }
    }

    /// Build options from a spec's `options` value
    pub fn from_value(options: &Value) -> Result<Self, FactoryError> {
        let mapping = options_mapping(options).ok_or_else(|| {
            FactoryError::invalid_argument("file transport options must be a mapping")
        })?;
        serde_json::from_value(Value::Object(mapping)).map_err(|e| {
            FactoryError::invalid_argument(format!("invalid file transport options: {e}"))
        })
    }

    /// Use a custom file name generator
    pub fn with_filename<F>(mut self, generator: F) -> Self
    where
        F: Fn(&Message) -> String + Send + Sync + 'static,
    {
        self.filename = Some(Arc::new(generator));
        self
    }

    /// Directory messages are written to
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name for the given message
    pub fn filename_for(&self, message: &Message) -> String {
        match &self.filename {
            Some(generator) => generator(message),
            None => default_filename(),
        }
    }
}

impl Default for FileOptions {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl fmt::Debug for FileOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileOptions")
            .field("path", &self.path)
            .field("custom_filename", &self.filename.is_some())
            .finish()
    }
}

fn default_filename() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let seq = FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "mogipost_{}_{:09}_{seq}.eml",
        now.as_secs(),
        now.subsec_nanos()
    )
}

/// Stores every message as an `.eml` file in a directory
#[derive(Debug, Clone, Default)]
pub struct FileTransport {
    options: FileOptions,
    last_file: Option<PathBuf>,
}

impl FileTransport {
    /// Create a transport with the given options
    pub fn new(options: FileOptions) -> Self {
        Self {
            options,
            last_file: None,
        }
    }

    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    /// Path of the most recently written message
    pub fn last_file(&self) -> Option<&Path> {
        self.last_file.as_deref()
    }
}

impl Transport for FileTransport {
    fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        let dir = self.options.path();
        if !dir.is_dir() {
            return Err(TransportError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} is not a directory", dir.display()),
            )));
        }

        let name = self.options.filename_for(message);
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(TransportError::InvalidMessage(format!(
                "invalid file name {name:?}"
            )));
        }

        let file = dir.join(name);
        fs::write(&file, message.formatted())?;
        tracing::debug!(file = %file.display(), "message written to file");

        self.last_file = Some(file);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message() -> Message {
        Message::new(
            "sender@example.com",
            vec!["recipient@example.com".to_string()],
            "Subject: Stored\n\nHello file",
        )
    }

    #[test]
    fn test_options_from_value() {
        let options = FileOptions::from_value(&json!({"path": "/tmp"})).unwrap();
        assert_eq!(options.path(), Path::new("/tmp"));

        let defaults = FileOptions::from_value(&json!({})).unwrap();
        assert_eq!(defaults.path(), std::env::temp_dir());
    }

    #[test]
    fn test_options_reject_unknown_keys() {
        let err = FileOptions::from_value(&json!({"path": "/tmp", "callback": "x"})).unwrap_err();
        assert!(matches!(err, FactoryError::InvalidArgument(_)));

        let err = FileOptions::from_value(&json!("/tmp")).unwrap_err();
        assert!(matches!(err, FactoryError::InvalidArgument(_)));
    }

    #[test]
    fn test_default_filenames_are_unique() {
        let options = FileOptions::default();
        let first = options.filename_for(&message());
        let second = options.filename_for(&message());
        assert_ne!(first, second);
        assert!(first.starts_with("mogipost_"));
        assert!(first.ends_with(".eml"));
    }

    #[test]
    fn test_writes_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = FileTransport::new(FileOptions::new(dir.path()));

        transport.send(&message()).unwrap();

        let file = transport.last_file().unwrap().to_path_buf();
        assert_eq!(file.parent(), Some(dir.path()));
        let contents = fs::read_to_string(&file).unwrap();
        assert_eq!(contents, "Subject: Stored\r\n\r\nHello file\r\n");
    }

    #[test]
    fn test_custom_filename() {
        let dir = tempfile::tempdir().unwrap();
        let options = FileOptions::new(dir.path())
            .with_filename(|m| format!("{}.eml", m.get_subject().unwrap_or("none")));
        let mut transport = FileTransport::new(options);

        transport.send(&message()).unwrap();
        assert_eq!(transport.last_file(), Some(dir.path().join("Stored.eml").as_path()));
    }

    #[test]
    fn test_rejects_path_like_filename() {
        let dir = tempfile::tempdir().unwrap();
        let options = FileOptions::new(dir.path()).with_filename(|_| "../escape.eml".to_string());
        let mut transport = FileTransport::new(options);

        let result = transport.send(&message());
        assert!(matches!(result, Err(TransportError::InvalidMessage(_))));
        assert!(transport.last_file().is_none());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut transport = FileTransport::new(FileOptions::new(dir.path().join("missing")));

        let result = transport.send(&message());
        assert!(matches!(result, Err(TransportError::Io(ref e)) if e.kind() == io::ErrorKind::NotFound));
    }
}
