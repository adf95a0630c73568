use mogipost::{Message, Spec, Transport, TransportFactory};
use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

/// Environment variable consulted when no spec argument is given
const SPEC_ENV: &str = "MOGIPOST_TRANSPORT";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        let program = args.first().map(String::as_str).unwrap_or("mogipost");
        eprintln!("Usage: {program} <from> <to[,to...]> [spec | @spec.json]");
        eprintln!();
        eprintln!("Reads the message (headers, blank line, body) from standard input.");
        eprintln!("Without a spec argument, {SPEC_ENV} is used; without that, sendmail.");
        std::process::exit(2);
    }

    if let Err(e) = run(&args[1], &args[2], args.get(3).map(String::as_str)) {
        eprintln!("Failed to send message: {e}");
        std::process::exit(1);
    }
}

fn run(from: &str, to: &str, spec_arg: Option<&str>) -> Result<(), Box<dyn Error>> {
    let recipients: Vec<String> = to
        .split(',')
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_owned)
        .collect();

    let factory = TransportFactory::new();
    let mut transport = match load_spec(spec_arg)? {
        Some(json) => factory.create_from_json(&json)?,
        None => factory.create(Spec::Absent)?,
    };

    let mut data = String::new();
    io::stdin().read_to_string(&mut data)?;

    let message = Message::new(from, recipients, data);
    transport.send(&message)?;

    println!("Sent message from: {} to: {:?}", message.from, message.to);
    if let Some(subject) = message.get_subject() {
        println!("  Subject: {subject}");
    }
    Ok(())
}

/// Spec JSON from the argument (inline or `@file`) or the environment
fn load_spec(arg: Option<&str>) -> io::Result<Option<String>> {
    match arg {
        Some(arg) => match arg.strip_prefix('@') {
            Some(path) => fs::read_to_string(path).map(Some),
            None => Ok(Some(arg.to_string())),
        },
        None => Ok(env::var(SPEC_ENV).ok()),
    }
}
