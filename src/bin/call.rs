//! Command-line method caller, handy for poking at real services:
//!
//! ```text
//! call session org.freedesktop.DBus /org/freedesktop/DBus \
//!     org.freedesktop.DBus GetNameOwner org.freedesktop.DBus
//! ```
//!
//! Trailing arguments are passed as strings.

use dynbus::value::insert_entry;
use dynbus::{Agent, Value};
use std::process::exit;

fn main() {
    pretty_env_logger::init();

    let mut args = std::env::args().skip(1);
    let (bus, record) = match parse(&mut args) {
        Some(parsed) => parsed,
        None => {
            eprintln!(
                "usage: call <system|session> <destination> <path> <interface> <method> [arg...]"
            );
            exit(2);
        }
    };
    let call_args = Value::List(args.map(Value::Str).collect());

    let mut agent = Agent::new();
    if let Err(err) = agent.bus(&bus) {
        eprintln!("call: cannot connect to the {} bus: {}", bus, err);
        exit(1);
    }
    match agent.execute(".method", Some(&record), Some(&call_args)) {
        Ok(reply) => println!("{:?}", reply),
        Err(err) => {
            eprintln!("call: {}", err);
            exit(1);
        }
    }
}

fn parse(args: &mut impl Iterator<Item = String>) -> Option<(String, Value)> {
    let bus = args.next()?;
    let mut entries = Vec::new();
    for key in ["destination", "path", "interface", "method"] {
        insert_entry(&mut entries, Value::Str(key.to_owned()), Value::Str(args.next()?));
    }
    Some((bus, Value::Map(entries)))
}
