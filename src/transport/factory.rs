//! Building transports from specs
//!
//! A spec names its transport either through one of the [`ALIASES`] or
//! through the identifier a constructor is registered under. Built-in
//! transports are registered as `mogipost::FileTransport`,
//! `mogipost::InMemoryTransport`, `mogipost::SendmailTransport` and
//! `mogipost::SmtpTransport`; naming them that way still works but is
//! deprecated in favour of the aliases.

use crate::transport::error::FactoryError;
use crate::transport::file::{FileOptions, FileTransport};
use crate::transport::in_memory::InMemoryTransport;
use crate::transport::sendmail::{SendmailOptions, SendmailTransport};
use crate::transport::smtp::{SmtpOptions, SmtpTransport};
use crate::transport::spec::Spec;
use crate::transport::Transport;

use serde_json::Value;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Builds a transport from the `options` of a spec
pub type Constructor = fn(Option<&Value>) -> Result<Box<dyn Transport>, FactoryError>;

/// Case-insensitive short names of the built-in transports
pub const ALIASES: &[(&str, TransportKind)] = &[
    ("file", TransportKind::File),
    ("memory", TransportKind::InMemory),
    ("inmemory", TransportKind::InMemory),
    ("null", TransportKind::InMemory),
    ("sendmail", TransportKind::Sendmail),
    ("smtp", TransportKind::Smtp),
];

/// Transport used when a spec names none
pub const DEFAULT_KIND: TransportKind = TransportKind::Sendmail;

/// The built-in transports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    File,
    InMemory,
    Sendmail,
    Smtp,
}

impl TransportKind {
    pub const ALL: [TransportKind; 4] = [
        TransportKind::File,
        TransportKind::InMemory,
        TransportKind::Sendmail,
        TransportKind::Smtp,
    ];

    /// Canonical identifier the transport is registered under
    pub const fn type_name(self) -> &'static str {
        match self {
            TransportKind::File => "mogipost::FileTransport",
            TransportKind::InMemory => "mogipost::InMemoryTransport",
            TransportKind::Sendmail => "mogipost::SendmailTransport",
            TransportKind::Smtp => "mogipost::SmtpTransport",
        }
    }

    /// Look up an alias, ignoring ASCII case
    pub fn from_alias(alias: &str) -> Option<Self> {
        ALIASES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(alias))
            .map(|&(_, kind)| kind)
    }

    /// Look up a canonical identifier (exact match)
    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == type_name)
    }

    /// Aliases resolving to this transport
    pub fn aliases(self) -> impl Iterator<Item = &'static str> {
        ALIASES
            .iter()
            .filter(move |&&(_, kind)| kind == self)
            .map(|&(name, _)| name)
    }

    fn constructor(self) -> Constructor {
        match self {
            TransportKind::File => build_file,
            TransportKind::InMemory => build_in_memory,
            TransportKind::Sendmail => build_sendmail,
            TransportKind::Smtp => build_smtp,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for TransportKind {
    type Err = FactoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_alias(s)
            .or_else(|| Self::from_type_name(s))
            .ok_or_else(|| FactoryError::domain(s))
    }
}

fn build_file(options: Option<&Value>) -> Result<Box<dyn Transport>, FactoryError> {
    let options = options
        .map(FileOptions::from_value)
        .transpose()?
        .unwrap_or_default();
    Ok(Box::new(FileTransport::new(options)))
}

fn build_in_memory(options: Option<&Value>) -> Result<Box<dyn Transport>, FactoryError> {
    if options.is_some() {
        tracing::debug!("in-memory transport takes no options, ignoring them");
    }
    Ok(Box::new(InMemoryTransport::new()))
}

fn build_sendmail(options: Option<&Value>) -> Result<Box<dyn Transport>, FactoryError> {
    let options = options
        .map(SendmailOptions::from_value)
        .transpose()?
        .unwrap_or_default();
    Ok(Box::new(SendmailTransport::new(options)))
}

fn build_smtp(options: Option<&Value>) -> Result<Box<dyn Transport>, FactoryError> {
    let options = options
        .map(SmtpOptions::from_value)
        .transpose()?
        .unwrap_or_default();
    Ok(Box::new(SmtpTransport::new(options)))
}

/// How the type identifier of a spec was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedVia {
    /// The spec named no type
    Default,
    /// The spec used an alias
    Alias,
    /// The spec used a registered identifier literally
    TypeName,
}

/// Outcome of resolving a spec, before anything is constructed
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Registered identifier of the transport to build
    pub type_name: String,
    pub via: ResolvedVia,
    /// Options to hand to the constructor
    pub options: Option<Value>,
    deprecated: bool,
}

impl Resolution {
    /// The spec reached a built-in transport through its identifier instead of an alias
    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// The built-in transport this resolves to, if any
    pub fn kind(&self) -> Option<TransportKind> {
        TransportKind::from_type_name(&self.type_name)
    }
}

/// Turns specs into transports
///
/// The table of constructors is fixed once the factory is built, so a
/// factory can be shared between threads freely.
#[derive(Clone)]
pub struct TransportFactory {
    constructors: HashMap<String, Constructor>,
}

impl TransportFactory {
    /// Factory knowing the built-in transports
    pub fn new() -> Self {
        let constructors = TransportKind::ALL
            .into_iter()
            .map(|kind| (kind.type_name().to_string(), kind.constructor()))
            .collect();
        Self { constructors }
    }

    /// Register a constructor under `type_name`, replacing any previous one
    ///
    /// Aliases are looked up before registered names, so a name matching an
    /// alias in any case could never be reached and is refused.
    pub fn register(
        mut self,
        type_name: impl Into<String>,
        constructor: Constructor,
    ) -> Result<Self, FactoryError> {
        let type_name = type_name.into();
        if let Some(kind) = TransportKind::from_alias(&type_name) {
            return Err(FactoryError::invalid_argument(format!(
                "\"{type_name}\" is an alias of {kind} and cannot be registered"
            )));
        }
        self.constructors.insert(type_name, constructor);
        Ok(self)
    }

    /// Registered identifiers, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Normalize the spec and find the transport it names
    pub fn resolve(&self, spec: impl Into<Spec>) -> Result<Resolution, FactoryError> {
        let spec = spec.into().normalize();

        let (type_name, via) = match spec.kind {
            None => (DEFAULT_KIND.type_name().to_string(), ResolvedVia::Default),
            Some(Value::String(name)) => match TransportKind::from_alias(&name) {
                Some(kind) => (kind.type_name().to_string(), ResolvedVia::Alias),
                None => (name, ResolvedVia::TypeName),
            },
            Some(other) => return Err(FactoryError::domain(other.to_string())),
        };

        if !self.constructors.contains_key(&type_name) {
            return Err(FactoryError::domain(type_name));
        }

        let deprecated =
            via == ResolvedVia::TypeName && TransportKind::from_type_name(&type_name).is_some();
        if deprecated {
            tracing::warn!(
                type_name = %type_name,
                "selecting a transport by type name is deprecated, use an alias instead"
            );
        }

        Ok(Resolution {
            type_name,
            via,
            options: spec.options,
            deprecated,
        })
    }

    /// Construct the transport a resolution points at
    pub fn build(&self, resolution: &Resolution) -> Result<Box<dyn Transport>, FactoryError> {
        let constructor = self
            .constructors
            .get(&resolution.type_name)
            .ok_or_else(|| FactoryError::domain(resolution.type_name.as_str()))?;

        tracing::debug!(
            type_name = %resolution.type_name,
            via = ?resolution.via,
            has_options = resolution.options.is_some(),
            "creating transport"
        );
        constructor(resolution.options.as_ref())
    }

    /// Resolve the spec and construct its transport
    pub fn create(&self, spec: impl Into<Spec>) -> Result<Box<dyn Transport>, FactoryError> {
        let resolution = self.resolve(spec)?;
        self.build(&resolution)
    }

    /// Like [`create`](Self::create), for a spec given as a JSON value
    pub fn create_from_value(&self, spec: Value) -> Result<Box<dyn Transport>, FactoryError> {
        self.create(Spec::try_from(spec)?)
    }

    /// Like [`create`](Self::create), for a spec given as JSON text
    pub fn create_from_json(&self, json: &str) -> Result<Box<dyn Transport>, FactoryError> {
        let value: Value = serde_json::from_str(json).map_err(|e| {
            FactoryError::invalid_argument(format!("transport spec is not valid JSON: {e}"))
        })?;
        self.create_from_value(value)
    }
}

impl Default for TransportFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TransportFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportFactory")
            .field("type_names", &self.type_names())
            .finish()
    }
}

/// Factory with only the built-in transports, shared by the whole process
pub fn default_factory() -> &'static TransportFactory {
    static FACTORY: OnceLock<TransportFactory> = OnceLock::new();
    FACTORY.get_or_init(TransportFactory::new)
}

/// Build a transport from a spec using the built-in transports
pub fn create(spec: impl Into<Spec>) -> Result<Box<dyn Transport>, FactoryError> {
    default_factory().create(spec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportSpec;
    use serde_json::json;

    #[test]
    fn test_alias_lookup_ignores_case() {
        assert_eq!(TransportKind::from_alias("smtp"), Some(TransportKind::Smtp));
        assert_eq!(TransportKind::from_alias("SMTP"), Some(TransportKind::Smtp));
        assert_eq!(TransportKind::from_alias("InMemory"), Some(TransportKind::InMemory));
        assert_eq!(TransportKind::from_alias("NULL"), Some(TransportKind::InMemory));
        assert_eq!(TransportKind::from_alias("stdClass"), None);
    }

    #[test]
    fn test_every_alias_maps_to_one_registered_type() {
        let factory = TransportFactory::new();
        for (alias, kind) in ALIASES {
            assert_eq!(TransportKind::from_alias(alias), Some(*kind));
            assert!(factory.type_names().contains(&kind.type_name()));
        }
    }

    #[test]
    fn test_aliases_per_kind() {
        let aliases: Vec<_> = TransportKind::InMemory.aliases().collect();
        assert_eq!(aliases, vec!["memory", "inmemory", "null"]);
        assert_eq!(TransportKind::Smtp.aliases().collect::<Vec<_>>(), vec!["smtp"]);
    }

    #[test]
    fn test_type_name_lookup_is_exact() {
        assert_eq!(
            TransportKind::from_type_name("mogipost::SmtpTransport"),
            Some(TransportKind::Smtp)
        );
        assert_eq!(TransportKind::from_type_name("mogipost::smtptransport"), None);
        assert_eq!(TransportKind::Smtp.to_string(), "mogipost::SmtpTransport");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("File".parse::<TransportKind>().unwrap(), TransportKind::File);
        assert_eq!(
            "mogipost::SendmailTransport".parse::<TransportKind>().unwrap(),
            TransportKind::Sendmail
        );
        assert!(matches!(
            "carrier-pigeon".parse::<TransportKind>(),
            Err(FactoryError::Domain(_))
        ));
    }

    #[test]
    fn test_resolve_default() {
        let resolution = TransportFactory::new().resolve(Spec::Absent).unwrap();
        assert_eq!(resolution.via, ResolvedVia::Default);
        assert_eq!(resolution.kind(), Some(TransportKind::Sendmail));
        assert!(!resolution.is_deprecated());
    }

    #[test]
    fn test_resolve_alias_is_not_deprecated() {
        let resolution = TransportFactory::new()
            .resolve(TransportSpec::new("Smtp"))
            .unwrap();
        assert_eq!(resolution.via, ResolvedVia::Alias);
        assert_eq!(resolution.type_name, "mogipost::SmtpTransport");
        assert!(!resolution.is_deprecated());
    }

    #[test]
    fn test_resolve_type_name_is_deprecated() {
        let resolution = TransportFactory::new()
            .resolve(TransportSpec::new("mogipost::FileTransport"))
            .unwrap();
        assert_eq!(resolution.via, ResolvedVia::TypeName);
        assert_eq!(resolution.kind(), Some(TransportKind::File));
        assert!(resolution.is_deprecated());
    }

    #[test]
    fn test_resolve_keeps_options() {
        let resolution = TransportFactory::new()
            .resolve(TransportSpec::new("smtp").with_options(json!({"host": "somehost"})))
            .unwrap();
        assert_eq!(resolution.options, Some(json!({"host": "somehost"})));
    }

    #[test]
    fn test_non_string_type_names_nothing() {
        let err = TransportFactory::new()
            .create_from_value(json!({"type": 42}))
            .unwrap_err();
        assert_eq!(err, FactoryError::Domain("42".to_string()));
    }

    #[test]
    fn test_registered_constructor() {
        fn build_capture(_: Option<&Value>) -> Result<Box<dyn Transport>, FactoryError> {
            Ok(Box::new(InMemoryTransport::new()))
        }

        let factory = TransportFactory::new()
            .register("app::CaptureTransport", build_capture)
            .unwrap();
        let resolution = factory.resolve(TransportSpec::new("app::CaptureTransport")).unwrap();
        assert_eq!(resolution.via, ResolvedVia::TypeName);
        assert!(!resolution.is_deprecated());
        assert_eq!(resolution.kind(), None);

        let transport = factory.build(&resolution).unwrap();
        assert!(transport.is::<InMemoryTransport>());

        // The shared factory does not see registrations made elsewhere
        assert!(matches!(
            create(TransportSpec::new("app::CaptureTransport")),
            Err(FactoryError::Domain(_))
        ));
    }

    #[test]
    fn test_register_refuses_alias_names() {
        fn build_capture(_: Option<&Value>) -> Result<Box<dyn Transport>, FactoryError> {
            Ok(Box::new(InMemoryTransport::new()))
        }

        for name in ["smtp", "SMTP", "Null", "inMemory"] {
            let err = TransportFactory::new()
                .register(name, build_capture)
                .unwrap_err();
            assert!(
                matches!(err, FactoryError::InvalidArgument(_)),
                "{name} should be refused"
            );
        }

        // A built-in identifier can still be overridden
        let factory = TransportFactory::new()
            .register(TransportKind::Smtp.type_name(), build_capture)
            .unwrap();
        let transport = factory.create(TransportSpec::new("smtp")).unwrap();
        assert!(transport.is::<InMemoryTransport>());
    }

    #[test]
    fn test_create_from_json() {
        let transport = TransportFactory::new()
            .create_from_json(r#"{"type": "memory"}"#)
            .unwrap();
        assert!(transport.is::<InMemoryTransport>());

        let err = TransportFactory::new().create_from_json("{type: memory}").unwrap_err();
        assert!(matches!(err, FactoryError::InvalidArgument(_)));
    }

    #[test]
    fn test_debug_lists_type_names() {
        let debug = format!("{:?}", TransportFactory::new());
        assert!(debug.contains("mogipost::FileTransport"));
        assert!(debug.contains("mogipost::SmtpTransport"));
    }
}
