//! Integration tests for building transports from specs

use mogipost::{
    FactoryError, FileTransport, InMemoryTransport, SendmailTransport, SmtpTransport, Spec,
    Transport, TransportFactory, TransportKind, TransportSpec,
};
use serde_json::{Value, json};
use std::path::Path;

fn create(spec: Value) -> Result<Box<dyn Transport>, FactoryError> {
    TransportFactory::new().create_from_value(spec)
}

fn is_kind(transport: &dyn Transport, kind: TransportKind) -> bool {
    match kind {
        TransportKind::File => transport.is::<FileTransport>(),
        TransportKind::InMemory => transport.is::<InMemoryTransport>(),
        TransportKind::Sendmail => transport.is::<SendmailTransport>(),
        TransportKind::Smtp => transport.is::<SmtpTransport>(),
    }
}

#[test]
fn test_invalid_spec_is_invalid_argument() {
    for spec in [json!("spec"), json!(17), json!(false), json!([1, 2, 3])] {
        let result = create(spec.clone());
        assert!(
            matches!(result, Err(FactoryError::InvalidArgument(_))),
            "expected InvalidArgument for {spec}"
        );
    }
}

#[test]
fn test_default_type_is_sendmail() {
    let transport = mogipost::create(Spec::Absent).unwrap();
    assert!(transport.is::<SendmailTransport>());

    let transport = create(Value::Null).unwrap();
    assert!(transport.is::<SendmailTransport>());

    let transport = create(json!({})).unwrap();
    assert!(transport.is::<SendmailTransport>());
}

#[test]
fn test_can_create_from_type_name() {
    for kind in TransportKind::ALL {
        let transport = create(json!({"type": kind.type_name()})).unwrap();
        assert!(is_kind(&*transport, kind), "wrong transport for {kind}");
    }
}

#[test]
fn test_can_create_from_type_alias() {
    let cases = [
        ("file", TransportKind::File),
        ("memory", TransportKind::InMemory),
        ("inmemory", TransportKind::InMemory),
        ("InMemory", TransportKind::InMemory),
        ("sendmail", TransportKind::Sendmail),
        ("smtp", TransportKind::Smtp),
        ("File", TransportKind::File),
        ("null", TransportKind::InMemory),
        ("Null", TransportKind::InMemory),
        ("NULL", TransportKind::InMemory),
        ("Sendmail", TransportKind::Sendmail),
        ("SendMail", TransportKind::Sendmail),
        ("Smtp", TransportKind::Smtp),
        ("SMTP", TransportKind::Smtp),
    ];

    for (alias, kind) in cases {
        let transport = create(json!({"type": alias})).unwrap();
        assert!(is_kind(&*transport, kind), "alias {alias} should build {kind}");
    }
}

#[test]
fn test_can_use_pairs_as_spec() {
    let spec: Spec = [("type", "inMemory")].into_iter().collect();
    let transport = TransportFactory::new().create(spec).unwrap();
    assert!(transport.is::<InMemoryTransport>());

    let transport = create(json!([["type", "inMemory"]])).unwrap();
    assert!(transport.is::<InMemoryTransport>());
}

#[test]
fn test_invalid_type_is_domain_error() {
    for name in ["stdClass", "non-existent-class", "", "mogipost::Transport"] {
        let result = create(json!({"type": name}));
        assert_eq!(
            result.unwrap_err(),
            FactoryError::Domain(name.to_string()),
            "expected DomainError for {name:?}"
        );
    }
}

#[test]
fn test_can_create_smtp_transport_with_options() {
    let transport = create(json!({
        "type": "smtp",
        "options": {
            "host": "somehost"
        }
    }))
    .unwrap();

    let smtp = transport.downcast_ref::<SmtpTransport>().unwrap();
    assert_eq!(smtp.options().host(), "somehost");
    assert!(!smtp.is_connected());
}

#[test]
fn test_can_create_file_transport_with_options() {
    let transport = create(json!({
        "type": "file",
        "options": {
            "path": "/tmp"
        }
    }))
    .unwrap();

    let file = transport.downcast_ref::<FileTransport>().unwrap();
    assert_eq!(file.options().path(), Path::new("/tmp"));
}

#[test]
fn test_can_create_sendmail_transport_with_options() {
    let transport = create(json!({
        "type": "sendmail",
        "options": {"path": "/usr/lib/sendmail", "parameters": "-oi"}
    }))
    .unwrap();

    let sendmail = transport.downcast_ref::<SendmailTransport>().unwrap();
    assert_eq!(sendmail.program(), Path::new("/usr/lib/sendmail"));
    assert_eq!(sendmail.options().parameters, vec!["-oi"]);
}

#[test]
fn test_in_memory_ignores_options() {
    let transport = create(json!({"type": "memory", "options": {"anything": true}})).unwrap();
    assert!(transport.is::<InMemoryTransport>());
}

#[test]
fn test_invalid_options_are_invalid_argument() {
    for spec in [
        json!({"type": "smtp", "options": {"port": 0}}),
        json!({"type": "smtp", "options": {"hostname": "somehost"}}),
        json!({"type": "smtp", "options": "somehost"}),
        json!({"type": "file", "options": {"path": 5}}),
        json!({"type": "sendmail", "options": {"parameters": 5}}),
    ] {
        let result = create(spec.clone());
        assert!(
            matches!(result, Err(FactoryError::InvalidArgument(_))),
            "expected InvalidArgument for {spec}"
        );
    }
}

#[test]
fn test_equal_specs_give_independent_transports() {
    let spec = TransportSpec::new("smtp").with_options(json!({"host": "somehost", "port": 2525}));
    let factory = TransportFactory::new();

    let first = factory.create(spec.clone()).unwrap();
    let second = factory.create(spec).unwrap();

    let first = first.downcast_ref::<SmtpTransport>().unwrap();
    let second = second.downcast_ref::<SmtpTransport>().unwrap();
    assert_eq!(first.options(), second.options());
    assert!(!std::ptr::eq(first, second));
}

#[test]
fn test_in_memory_transports_do_not_share_messages() {
    let factory = TransportFactory::new();
    let mut first = factory.create(TransportSpec::new("memory")).unwrap();
    let second = factory.create(TransportSpec::new("memory")).unwrap();

    let message = mogipost::Message::new(
        "sender@example.com",
        vec!["recipient@example.com".to_string()],
        "Subject: Only once\n\nbody",
    );
    first.send(&message).unwrap();

    let first = first.downcast_ref::<InMemoryTransport>().unwrap();
    let second = second.downcast_ref::<InMemoryTransport>().unwrap();
    assert_eq!(first.messages().len(), 1);
    assert!(second.messages().is_empty());
}

#[test]
fn test_create_is_safe_across_threads() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let alias = ["file", "memory", "sendmail", "smtp"][i];
                mogipost::create(TransportSpec::new(alias)).map(|_| alias)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_ok());
    }
}

#[test]
fn test_spec_from_config_file() {
    let config = r#"{"transport": {"type": "SMTP", "options": {"host": "mail.internal", "port": 587}}}"#;

    #[derive(serde::Deserialize)]
    struct AppConfig {
        transport: TransportSpec,
    }

    let config: AppConfig = serde_json::from_str(config).unwrap();
    let transport = TransportFactory::new().create(config.transport).unwrap();
    let smtp = transport.downcast_ref::<SmtpTransport>().unwrap();
    assert_eq!(smtp.options().host(), "mail.internal");
    assert_eq!(smtp.options().port(), 587);
}
