//! Mail transports and the factory that builds them

pub mod error;
pub mod factory;
pub mod file;
pub mod in_memory;
pub mod message;
pub mod sendmail;
pub mod smtp;
pub mod spec;

use std::any::Any;
use std::fmt;

pub use error::{FactoryError, SmtpLimits, TransportError};
pub use factory::{
    ALIASES, Constructor, DEFAULT_KIND, Resolution, ResolvedVia, TransportFactory, TransportKind,
    create, default_factory,
};
pub use file::{FileOptions, FileTransport, FilenameGenerator};
pub use in_memory::InMemoryTransport;
pub use message::Message;
pub use sendmail::{DEFAULT_SENDMAIL_PATH, SendmailOptions, SendmailTransport};
pub use smtp::{SmtpCommand, SmtpOptions, SmtpReply, SmtpTransport};
pub use spec::{Spec, TransportSpec};

/// Capability shared by every transport: deliver one message
pub trait Transport: fmt::Debug + Send {
    /// Deliver the message
    fn send(&mut self, message: &Message) -> Result<(), TransportError>;

    /// The concrete transport, for downcasting
    fn as_any(&self) -> &dyn Any;
}

impl dyn Transport + '_ {
    /// Borrow the concrete transport if it is a `T`
    pub fn downcast_ref<T: Transport + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Check whether the concrete transport is a `T`
    pub fn is<T: Transport + 'static>(&self) -> bool {
        self.as_any().is::<T>()
    }
}
