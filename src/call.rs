//! The call dispatcher: one synchronous method call, end to end.
//!
//! The dispatcher validates the call record and marshals every argument
//! before any wire activity happens, performs exactly one blocking
//! send-with-reply through the injected [`Transport`], and unpacks the
//! reply body into a dynamic value. No retries, no extra timeout layer on
//! top of the transport's own wait policy.

use crate::de::from_message;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::ser::to_message;
use crate::value::Value;
use log::debug;

/// Addressing for one method call.
#[derive(Clone, Debug, PartialEq)]
pub struct CallRecord {
    pub destination: String,
    pub path: String,
    pub interface: String,
    pub method: String,
}

impl CallRecord {
    /// Extracts the four addressing fields from a dynamic map. A missing
    /// or non-string field is an error naming that field; nothing touches
    /// the wire before this passes.
    pub fn from_value(value: &Value) -> Result<Self> {
        if !matches!(value, Value::Map(_)) {
            return Err(Error::RecordNotMap);
        }
        let field = |name: &'static str| -> Result<String> {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or(Error::BadCallRecord(name))
        };
        Ok(Self {
            destination: field("destination")?,
            path: field("path")?,
            interface: field("interface")?,
            method: field("method")?,
        })
    }
}

/// A fully addressed outbound method call with its marshaled body.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodCall {
    pub destination: String,
    pub path: String,
    pub interface: String,
    pub method: String,
    pub body: Message,
}

/// The blocking send-with-reply primitive the dispatcher runs on. The
/// bus connection implements it; tests substitute a stub.
pub trait Transport {
    fn roundtrip(&mut self, call: &MethodCall) -> Result<Message>;
}

/// Performs one blocking method call and decodes the reply.
pub fn call(transport: &mut dyn Transport, record: &CallRecord, args: &[Value]) -> Result<Value> {
    // Marshal first: an unencodable argument aborts the call with zero
    // transport interaction.
    let body = to_message(args)?;
    debug!(
        "calling {}.{}({}) on {} at {}",
        record.interface,
        record.method,
        body.signature_str(),
        record.destination,
        record.path
    );

    let outbound = MethodCall {
        destination: record.destination.clone(),
        path: record.path.clone(),
        interface: record.interface.clone(),
        method: record.method.clone(),
        body,
    };
    let reply = transport.roundtrip(&outbound)?;
    from_message(&reply)
}

#[cfg(test)]
mod tests {
    use super::{call, CallRecord, MethodCall, Transport};
    use crate::error::{Error, Result};
    use crate::message::Message;
    use crate::value::Value;
    use test_log::test;

    struct StubTransport {
        reply: Message,
        calls: Vec<MethodCall>,
    }

    impl StubTransport {
        fn new(reply: Message) -> Self {
            Self {
                reply,
                calls: Vec::new(),
            }
        }
    }

    impl Transport for StubTransport {
        fn roundtrip(&mut self, outbound: &MethodCall) -> Result<Message> {
            self.calls.push(outbound.clone());
            Ok(self.reply.clone())
        }
    }

    fn record() -> CallRecord {
        CallRecord {
            destination: "org.test.Svc".to_owned(),
            path: "/obj".to_owned(),
            interface: "org.test.Iface".to_owned(),
            method: "Echo".to_owned(),
        }
    }

    fn record_map(fields: &[(&str, &str)]) -> Value {
        Value::Map(
            fields
                .iter()
                .map(|(k, v)| (Value::Str((*k).to_owned()), Value::Str((*v).to_owned())))
                .collect(),
        )
    }

    #[test]
    fn record_from_map() -> Result<()> {
        let value = record_map(&[
            ("destination", "org.test.Svc"),
            ("path", "/obj"),
            ("interface", "org.test.Iface"),
            ("method", "Echo"),
        ]);
        assert_eq!(CallRecord::from_value(&value)?, record());
        Ok(())
    }

    #[test]
    fn record_missing_method_is_rejected() {
        let value = record_map(&[
            ("destination", "org.test.Svc"),
            ("path", "/obj"),
            ("interface", "org.test.Iface"),
        ]);
        assert_eq!(
            CallRecord::from_value(&value),
            Err(Error::BadCallRecord("method"))
        );
    }

    #[test]
    fn record_with_mistyped_field_is_rejected() {
        let mut fields = vec![
            (Value::Str("destination".to_owned()), Value::Int(1)),
            (Value::Str("path".to_owned()), Value::Str("/obj".to_owned())),
        ];
        fields.push((
            Value::Str("interface".to_owned()),
            Value::Str("i".to_owned()),
        ));
        fields.push((Value::Str("method".to_owned()), Value::Str("m".to_owned())));
        assert_eq!(
            CallRecord::from_value(&Value::Map(fields)),
            Err(Error::BadCallRecord("destination"))
        );
    }

    #[test]
    fn record_from_non_map_is_rejected() {
        assert_eq!(
            CallRecord::from_value(&Value::Str("nope".to_owned())),
            Err(Error::RecordNotMap)
        );
    }

    #[test]
    fn encode_failure_means_no_transport_contact() {
        let mut stub = StubTransport::new(Message::empty());
        let result = call(&mut stub, &record(), &[Value::Unsupported]);
        assert_eq!(result, Err(Error::UnsupportedKind("unsupported")));
        assert!(stub.calls.is_empty(), "transport was contacted");
    }

    #[test]
    fn echo_round_trip() -> Result<()> {
        // The stub service replies with a 2-element struct echoing the
        // arguments back.
        let reply = Message {
            data: vec![2, 0, 0, 0, b'h', b'i', 0, 0, 1, 0, 0, 0],
            signature: b"(sb)".to_vec(),
        };
        let mut stub = StubTransport::new(reply);

        let args = [Value::Str("hi".to_owned()), Value::Bool(true)];
        let result = call(&mut stub, &record(), &args)?;

        assert_eq!(
            result,
            Value::List(vec![Value::Str("hi".to_owned()), Value::Bool(true)])
        );
        assert_eq!(stub.calls.len(), 1);
        let sent = &stub.calls[0];
        assert_eq!(sent.method, "Echo");
        assert_eq!(sent.body.signature, b"sb");
        assert_eq!(
            sent.body.data,
            vec![2, 0, 0, 0, b'h', b'i', 0, 0, 1, 0, 0, 0]
        );
        Ok(())
    }

    #[test]
    fn empty_reply_decodes_to_void() -> Result<()> {
        let mut stub = StubTransport::new(Message::empty());
        let result = call(&mut stub, &record(), &[])?;
        assert_eq!(result, Value::Void);
        Ok(())
    }
}
