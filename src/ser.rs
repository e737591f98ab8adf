//! Value-to-wire encoding.
//!
//! [`to_message`] appends one wire argument per value into a message
//! body, synthesizing the container signatures the encoder needs from
//! each value's type descriptor. Known lossy behaviors, kept on purpose:
//! integers narrow to the unsigned 32-bit wire type (out-of-range values
//! reinterpret, no range check). An empty list has no element to take a
//! signature from and encodes as a zero-element variant array (`av`).
//!
//! A failure anywhere leaves no partial state behind: the half-built
//! message is discarded, and container open/close stays balanced on every
//! exit path.

use crate::error::{Error, Result};
use crate::message::Message;
use crate::sig::{alignment_of, lossy, synthesize, synthesize_dict_key};
use crate::value::{TypeDesc, Value};
use log::trace;

mod builder;
pub(crate) use builder::BodyBuilder;

/// Marshals an argument list into a message body.
pub fn to_message(args: &[Value]) -> Result<Message> {
    let mut builder = BodyBuilder::new();
    for arg in args {
        encode_value(&mut builder, arg)?;
        builder.push_signature(&synthesize(&TypeDesc::of(arg))?);
    }
    Ok(builder.finish())
}

/// Appends exactly one wire argument representing `value`.
pub(crate) fn encode_value(builder: &mut BodyBuilder, value: &Value) -> Result<()> {
    match value {
        Value::Bool(v) => builder.put_u32(*v as u32),
        // Narrowing to u32 is the documented compatibility behavior.
        Value::Int(v) => builder.put_u32(*v as u32),
        Value::Float(v) => builder.put_f64(*v),
        Value::Str(v) => builder.put_string(v),
        Value::List(items) => encode_list(builder, items)?,
        Value::Map(entries) => encode_map(builder, entries)?,
        Value::Void | Value::Unsupported => {
            return Err(Error::UnsupportedKind(value.kind()));
        }
    }
    Ok(())
}

fn encode_list(builder: &mut BodyBuilder, items: &[Value]) -> Result<()> {
    let elem_desc = items.first().map(TypeDesc::of).unwrap_or(TypeDesc::Any);
    let elem_sig = synthesize(&elem_desc)?;
    if elem_sig.is_empty() {
        return Err(Error::NoSignature(elem_desc.kind()));
    }
    trace!("opening array container {:?}", lossy(&elem_sig));

    let token = builder.begin_array(alignment_of(elem_sig[0])?);
    let mut result = Ok(());
    for item in items {
        if let Err(err) = encode_element(builder, item, &elem_sig) {
            result = Err(err);
            break;
        }
    }
    // The container closes on every exit path, including mid-list failure.
    builder.end_array(token);
    result
}

fn encode_element(builder: &mut BodyBuilder, item: &Value, elem_sig: &[u8]) -> Result<()> {
    let item_sig = synthesize(&TypeDesc::of(item))?;
    if item_sig != elem_sig {
        return Err(Error::ElementMismatch {
            expected: lossy(elem_sig),
            found: lossy(&item_sig),
        });
    }
    encode_value(builder, item)
}

fn encode_map(builder: &mut BodyBuilder, entries: &[(Value, Value)]) -> Result<()> {
    let (key_desc, value_desc) = match entries.first() {
        Some((k, v)) => (TypeDesc::of(k), TypeDesc::of(v)),
        None => (TypeDesc::Any, TypeDesc::Any),
    };
    let key_sig = synthesize_dict_key(&key_desc)?;
    let value_sig = synthesize(&value_desc)?;
    if value_sig.is_empty() {
        return Err(Error::NoSignature(value_desc.kind()));
    }
    trace!(
        "opening dict container {{{:?} {:?}}}",
        lossy(&key_sig),
        lossy(&value_sig)
    );

    let token = builder.begin_array(8); // dict entries are 8-aligned
    let mut result = Ok(());
    for (key, value) in entries {
        builder.begin_entry();
        let entry = encode_element(builder, key, &key_sig)
            .and_then(|_| encode_element(builder, value, &value_sig));
        builder.end_entry();
        if let Err(err) = entry {
            result = Err(err);
            break;
        }
    }
    builder.end_array(token);
    result
}
