//! Blocking connections to the system and session message buses over a
//! unix socket: EXTERNAL authentication, the initial `Hello` exchange,
//! and the serial-matched call/reply loop.

mod wire;

use crate::call::{MethodCall, Transport};
use crate::de::from_message;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::value::Value;
use log::{debug, info};
use std::fmt;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

const SYSTEM_BUS_SOCKET: &str = "/var/run/dbus/system_bus_socket";
const DBUS_SERVICE: &str = "org.freedesktop.DBus";
const DBUS_PATH: &str = "/org/freedesktop/DBus";
const GENERIC_ERROR: &str = "org.freedesktop.DBus.Error.Failed";

/// Which of the two well-known buses to talk to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusKind {
    System,
    Session,
}

impl BusKind {
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "system" => Ok(BusKind::System),
            "session" => Ok(BusKind::Session),
            other => Err(Error::UnknownBus(other.to_owned())),
        }
    }
}

impl fmt::Display for BusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusKind::System => write!(f, "system"),
            BusKind::Session => write!(f, "session"),
        }
    }
}

fn socket_path(kind: BusKind) -> Result<String> {
    match kind {
        BusKind::Session => {
            let address = std::env::var("DBUS_SESSION_BUS_ADDRESS").map_err(|_| {
                Error::Transport("DBUS_SESSION_BUS_ADDRESS is not set".to_owned())
            })?;
            parse_unix_address(&address)
        }
        BusKind::System => match std::env::var("DBUS_SYSTEM_BUS_ADDRESS") {
            Ok(address) => parse_unix_address(&address),
            Err(_) => Ok(SYSTEM_BUS_SOCKET.to_owned()),
        },
    }
}

/// Picks the socket path out of an address like
/// `unix:path=/run/user/1000/bus,guid=...`.
fn parse_unix_address(address: &str) -> Result<String> {
    address
        .split(',')
        .find_map(|part| {
            part.strip_prefix("unix:path=")
                .or_else(|| part.strip_prefix("path="))
        })
        .map(str::to_owned)
        .ok_or_else(|| Error::Transport(format!("unsupported bus address {:?}", address)))
}

/// An authenticated, registered bus connection. One outstanding call at
/// a time; replies for other serials are skipped, not queued.
pub struct Connection {
    stream: UnixStream,
    serial: u32,
    unique_name: String,
}

impl Connection {
    pub fn open(kind: BusKind) -> Result<Self> {
        let path = socket_path(kind)?;
        debug!("connecting to the {} bus at {}", kind, path);
        let stream = UnixStream::connect(&path)?;
        let mut connection = Self {
            stream,
            serial: 0,
            unique_name: String::new(),
        };
        connection.authenticate()?;
        connection.hello()?;
        Ok(connection)
    }

    /// The unique name the bus assigned at registration (`:1.42` style).
    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// EXTERNAL authentication with an anonymous identity. The server
    /// either accepts the initial AUTH outright or asks for a DATA
    /// round first.
    fn authenticate(&mut self) -> Result<()> {
        self.stream.write_all(b"\0AUTH EXTERNAL\r\n")?;
        let mut line = self.read_line()?;
        if line.starts_with("DATA") {
            self.stream.write_all(b"DATA\r\n")?;
            line = self.read_line()?;
        }
        if !line.starts_with("OK ") {
            return Err(Error::Transport(format!(
                "authentication rejected: {}",
                line
            )));
        }
        debug!("authenticated, server guid {}", &line[3..]);
        self.stream.write_all(b"BEGIN\r\n")?;
        Ok(())
    }

    // Only used before BEGIN, where the conversation is line-oriented.
    fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            self.stream.read_exact(&mut byte)?;
            if byte[0] == b'\n' {
                break;
            }
            line.push(byte[0]);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(String::from_utf8(line)?)
    }

    /// Registers with the bus. Until `Hello` is answered the bus will
    /// not route any other call.
    fn hello(&mut self) -> Result<()> {
        let hello = MethodCall {
            destination: DBUS_SERVICE.to_owned(),
            path: DBUS_PATH.to_owned(),
            interface: DBUS_SERVICE.to_owned(),
            method: "Hello".to_owned(),
            body: Message::empty(),
        };
        let reply = self.roundtrip(&hello)?;
        match from_message(&reply)? {
            Value::Str(name) => {
                info!("connected as {}", name);
                self.unique_name = name;
                Ok(())
            }
            other => Err(Error::Transport(format!(
                "unexpected Hello reply of kind {}",
                other.kind()
            ))),
        }
    }
}

impl Transport for Connection {
    fn roundtrip(&mut self, outbound: &MethodCall) -> Result<Message> {
        self.serial += 1;
        let frame = wire::encode_call(self.serial, outbound);
        self.stream.write_all(&frame)?;

        loop {
            let frame = wire::read_frame(&mut self.stream)?;
            if frame.reply_serial != Some(self.serial) {
                debug!(
                    "skipping unrelated message (type {}, serial {})",
                    frame.message_type, frame.serial
                );
                continue;
            }
            return match frame.message_type {
                wire::METHOD_RETURN => Ok(frame.into_body()),
                wire::ERROR => {
                    let name = frame
                        .error_name
                        .clone()
                        .unwrap_or_else(|| GENERIC_ERROR.to_owned());
                    // The first body argument of an error is its
                    // human-readable text, when there is one.
                    let text = match from_message(&frame.into_body()) {
                        Ok(Value::Str(text)) => text,
                        _ => String::new(),
                    };
                    Err(Error::CallFailed { name, text })
                }
                other => Err(Error::Transport(format!(
                    "unexpected reply message type {}",
                    other
                ))),
            };
        }
    }
}
