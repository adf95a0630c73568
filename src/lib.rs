//! # MogiPost
//!
//! MogiPost builds mail transports from configuration.
//!
//! A transport spec names the transport to use and carries its options. The
//! factory resolves the name, validates it and hands back a ready-to-use
//! [`Transport`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mogipost::{InMemoryTransport, Message, Transport};
//! use serde_json::json;
//!
//! let mut transport = mogipost::TransportFactory::new()
//!     .create_from_value(json!({"type": "memory"}))
//!     .unwrap();
//!
//! let message = Message::new(
//!     "sender@example.com",
//!     vec!["recipient@example.com".to_string()],
//!     "Subject: Hello\n\nHello World",
//! );
//! transport.send(&message).unwrap();
//!
//! let memory = transport.downcast_ref::<InMemoryTransport>().unwrap();
//! assert_eq!(memory.last_message().unwrap().get_subject(), Some("Hello"));
//! ```
//!
//! ## Specs
//!
//! A spec is absent, a mapping, or a sequence of key-value pairs with two
//! optional keys:
//!
//! - `type` - an alias or a registered type identifier (default: `sendmail`)
//! - `options` - transport specific settings
//!
//! ## Aliases
//!
//! Aliases are matched without regard to case.
//!
//! | Alias | Transport |
//! |---|---|
//! | `file` | [`FileTransport`] |
//! | `memory`, `inmemory`, `null` | [`InMemoryTransport`] |
//! | `sendmail` | [`SendmailTransport`] |
//! | `smtp` | [`SmtpTransport`] |
//!
//! Naming a built-in transport by its type identifier (for example
//! `mogipost::SmtpTransport`) still works but is deprecated.
//!
//! ## Options
//!
//! - `file`: `path`
//! - `sendmail`: `path`, `parameters`
//! - `smtp`: `name`, `host`, `port`, `timeout`, `connection_time_limit`
//! - `memory`: none, anything given is ignored
//!
//! Unknown option keys are rejected.
//!
//! ## Additional Features
//!
//! Enabling the `ehlo` feature makes the SMTP transport greet with `EHLO`,
//! falling back to `HELO` for servers that refuse it.
//!
//! ## Notes
//!
//! - The factory performs no I/O. SMTP connections are opened on first send.
//! - SMTP authentication is not supported.
//! - SSL/TLS connection is not supported.
//! - RFC 821 size limits are enforced on outgoing messages.

mod transport;

pub use transport::{
    ALIASES, Constructor, DEFAULT_KIND, DEFAULT_SENDMAIL_PATH, FactoryError, FileOptions,
    FileTransport, FilenameGenerator, InMemoryTransport, Message, Resolution, ResolvedVia,
    SendmailOptions, SendmailTransport, SmtpCommand, SmtpLimits, SmtpOptions, SmtpReply,
    SmtpTransport, Spec, Transport, TransportError, TransportFactory, TransportKind,
    TransportSpec, create, default_factory,
};
