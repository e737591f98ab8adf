//! The verb surface: an agent that holds at most one bus connection and
//! routes dotted subpaths like `.dbus.method` to it.

use crate::bus::{BusKind, Connection};
use crate::call::{call, CallRecord};
use crate::error::{Error, Result};
use crate::value::Value;
use log::debug;

/// Stateful front end over one optional bus connection. `bus` replaces
/// any previous connection; `execute` routes method calls through it.
#[derive(Default)]
pub struct Agent {
    connection: Option<Connection>,
}

impl Agent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connects to the named bus (`"system"` or `"session"`), dropping
    /// any connection held so far.
    pub fn bus(&mut self, name: &str) -> Result<()> {
        let kind = BusKind::from_name(name)?;
        self.disconnect();
        self.connection = Some(Connection::open(kind)?);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!("dropping bus connection");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The agent exposes nothing readable; every subpath is an error.
    pub fn read(&self, path: &str) -> Result<Value> {
        if path.is_empty() {
            return Err(Error::MissingSubpath("Read"));
        }
        Err(Error::UndefinedSubpath {
            verb: "Read",
            path: path.to_owned(),
        })
    }

    /// The agent exposes nothing writable; every subpath is an error.
    pub fn write(&mut self, path: &str, _value: &Value) -> Result<()> {
        if path.is_empty() {
            return Err(Error::MissingSubpath("Write"));
        }
        Err(Error::UndefinedSubpath {
            verb: "Write",
            path: path.to_owned(),
        })
    }

    /// Runs a verb subpath. `.method` places a method call: `value` is
    /// the call record map and `args` the argument list.
    pub fn execute(
        &mut self,
        path: &str,
        value: Option<&Value>,
        args: Option<&Value>,
    ) -> Result<Value> {
        if path.is_empty() {
            return Err(Error::MissingSubpath("Execute"));
        }
        let mut components = path.trim_start_matches('.').split('.');
        match components.next() {
            Some("method") => self.execute_method(value, args),
            _ => Err(Error::UndefinedSubpath {
                verb: "Execute",
                path: path.to_owned(),
            }),
        }
    }

    fn execute_method(&mut self, value: Option<&Value>, args: Option<&Value>) -> Result<Value> {
        let connection = self.connection.as_mut().ok_or(Error::NotConnected)?;
        let record = match value {
            Some(record) => CallRecord::from_value(record)?,
            None => return Err(Error::MissingArgument),
        };
        call(connection, &record, argument_list(args)?)
    }
}

/// The argument list is mandatory, even when empty, and must be a list.
fn argument_list(args: Option<&Value>) -> Result<&[Value]> {
    match args {
        Some(Value::List(items)) => Ok(items),
        Some(_) | None => Err(Error::BadCallArguments),
    }
}
