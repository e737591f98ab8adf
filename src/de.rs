//! Wire-to-value decoding.
//!
//! [`from_message`] walks a message's (signature, data) pair and builds a
//! [`Value`] tree. Decoding is total over well-formed wire data: a wire
//! type with no mapping in the dynamic model (signatures, unix fds)
//! decodes to [`Value::Unsupported`] with a logged warning rather than an
//! error. Only corrupt data — reads past the end, bad utf-8, unbalanced
//! signature brackets, out-of-range booleans — fails.
//!
//! The load-bearing step is container disambiguation: DBus encodes
//! dictionaries as arrays of dict entries, so an array is a map exactly
//! when its element signature opens with `{`, and that must be checked
//! before any element is consumed.

use crate::error::{Error, Result};
use crate::message::Message;
use crate::sig::{alignment_of, lossy};
use crate::value::{insert_entry, Value};
use log::{debug, trace, warn};

mod reader;
pub(crate) use reader::{Data, Sig};

/// Decodes the first argument of a message body. An empty signature
/// yields `Void`.
pub fn from_message(mesg: &Message) -> Result<Value> {
    let mut sig = Sig::new(&mesg.signature);
    if sig.is_empty() {
        return Ok(Value::Void);
    }
    let single = sig.next_single()?;
    let mut data = Data::new(&mesg.data);
    read_value(single, &mut data)
}

/// Decodes one complete value described by `sig` from the data cursor.
pub(crate) fn read_value(sig: &[u8], data: &mut Data<'_>) -> Result<Value> {
    let value = match sig[0] {
        b'b' => {
            // Boolean wire width is u32, not a single byte.
            let raw = data.u32()?;
            if raw > 1 {
                return Err(Error::InvalidBool(raw));
            }
            Value::Bool(raw == 1)
        }
        b's' | b'o' => Value::Str(data.string()?),
        b'd' => Value::Float(data.f64()?),
        b'y' => Value::Int(i64::from(data.u8()?)),
        b'n' => Value::Int(i64::from(data.i16()?)),
        b'q' => Value::Int(i64::from(data.u16()?)),
        b'i' => Value::Int(i64::from(data.i32()?)),
        b'u' => Value::Int(i64::from(data.u32()?)),
        b'x' => Value::Int(data.i64()?),
        // Values above i64::MAX wrap; accepted precision loss.
        b't' => Value::Int(data.u64()? as i64),
        b'v' => read_variant(data)?,
        b'a' => read_array(&sig[1..], data)?,
        b'(' => read_struct(&sig[1..sig.len() - 1], data)?,
        b'g' => {
            warn!("unsupported DBus type 'g' (signature), substituting the unrepresentable value");
            data.signature()?;
            Value::Unsupported
        }
        b'h' => {
            warn!("unsupported DBus type 'h' (unix fd), substituting the unrepresentable value");
            data.u32()?;
            Value::Unsupported
        }
        other => return Err(Error::MalformedSignature((other as char).to_string())),
    };
    trace!("decoded {} at byte {}", value.kind(), data.pos());
    Ok(value)
}

/// The variant wrapper is transparent: the inner value comes back
/// directly, and an empty variant decodes to `Void`.
fn read_variant(data: &mut Data<'_>) -> Result<Value> {
    let inner = data.signature()?;
    if inner.is_empty() {
        return Ok(Value::Void);
    }
    let mut sig = Sig::new(inner);
    let single = sig.next_single()?;
    read_value(single, data)
}

fn read_array(elem_sig: &[u8], data: &mut Data<'_>) -> Result<Value> {
    let len = data.u32()? as usize;
    if elem_sig.is_empty() {
        return Err(Error::MalformedSignature(String::from("a")));
    }
    data.align(alignment_of(elem_sig[0])?)?;
    let end = data.pos() + len;
    if end > data.len() {
        return Err(Error::Truncated(end));
    }

    // Dictionaries ride on the array container: the element signature is
    // the only way to tell them from plain lists.
    if elem_sig[0] == b'{' {
        debug!("container {:?} is a dictionary", lossy(elem_sig));
        let mut inner = Sig::new(&elem_sig[1..elem_sig.len() - 1]);
        let key_sig = inner.next_single()?;
        let value_sig = inner.next_single()?;
        let mut entries = Vec::new();
        while data.pos() < end {
            data.align(8)?;
            let key = read_value(key_sig, data)?;
            let value = read_value(value_sig, data)?;
            insert_entry(&mut entries, key, value);
        }
        Ok(Value::Map(entries))
    } else {
        debug!("container {:?} is a list", lossy(elem_sig));
        let mut items = Vec::new();
        while data.pos() < end {
            items.push(read_value(elem_sig, data)?);
        }
        Ok(Value::List(items))
    }
}

/// Structs have no counterpart in the dynamic model; members decode in
/// order into a list.
fn read_struct(member_sigs: &[u8], data: &mut Data<'_>) -> Result<Value> {
    data.align(8)?;
    let mut sig = Sig::new(member_sigs);
    let mut items = Vec::new();
    while !sig.is_empty() {
        let single = sig.next_single()?;
        items.push(read_value(single, data)?);
    }
    Ok(Value::List(items))
}

#[cfg(test)]
mod tests {
    use crate::de::from_message;
    use crate::error::{Error, Result};
    use crate::message::Message;
    use crate::ser::to_message;
    use crate::value::Value;
    use test_log::test;

    fn round_trip(value: Value) -> Result<()> {
        let mesg = to_message(std::slice::from_ref(&value))?;
        let decoded = from_message(&mesg)?;
        assert_eq!(value, decoded);
        Ok(())
    }

    #[test]
    fn round_trip_bool() -> Result<()> {
        round_trip(Value::Bool(true))
    }

    #[test]
    fn round_trip_int() -> Result<()> {
        round_trip(Value::Int(37))
    }

    #[test]
    fn round_trip_float() -> Result<()> {
        round_trip(Value::Float(3.14))
    }

    #[test]
    fn round_trip_string() -> Result<()> {
        round_trip(Value::Str("hello".to_owned()))
    }

    #[test]
    fn round_trip_list() -> Result<()> {
        round_trip(Value::List(vec![
            Value::Int(1),
            Value::Int(2),
            Value::Int(3),
        ]))
    }

    #[test]
    fn round_trip_empty_list() -> Result<()> {
        round_trip(Value::List(vec![]))
    }

    #[test]
    fn round_trip_list_of_lists() -> Result<()> {
        round_trip(Value::List(vec![
            Value::List(vec![Value::Str("a".to_owned())]),
            Value::List(vec![Value::Str("b".to_owned()), Value::Str("c".to_owned())]),
        ]))
    }

    #[test]
    fn round_trip_map() -> Result<()> {
        round_trip(Value::Map(vec![
            (Value::Str("a".to_owned()), Value::Int(1)),
            (Value::Str("b".to_owned()), Value::Int(2)),
        ]))
    }

    #[test]
    fn round_trip_map_of_lists() -> Result<()> {
        round_trip(Value::Map(vec![(
            Value::Str("xs".to_owned()),
            Value::List(vec![Value::Str("x".to_owned())]),
        )]))
    }

    #[test]
    fn empty_signature_is_void() -> Result<()> {
        assert_eq!(from_message(&Message::empty())?, Value::Void);
        Ok(())
    }

    #[test]
    fn variant_is_transparent() -> Result<()> {
        // 1-byte signature "s", nul, pad, then the string "x"
        let wrapped = Message {
            data: vec![1, b's', 0, 0, 1, 0, 0, 0, b'x', 0],
            signature: b"v".to_vec(),
        };
        let bare = Message {
            data: vec![1, 0, 0, 0, b'x', 0],
            signature: b"s".to_vec(),
        };
        assert_eq!(from_message(&wrapped)?, from_message(&bare)?);
        Ok(())
    }

    #[test]
    fn empty_variant_is_void() -> Result<()> {
        let mesg = Message {
            data: vec![0, 0],
            signature: b"v".to_vec(),
        };
        assert_eq!(from_message(&mesg)?, Value::Void);
        Ok(())
    }

    // Identical bytes, different element signature: array-of-struct is a
    // list, array-of-dict-entry is a map.
    const PAIR_DATA: &[u8] = &[
        14, 0, 0, 0, // array byte length
        0, 0, 0, 0, // padding to the 8-aligned element
        1, 0, 0, 0, b'k', 0, // string "k"
        0, 0, // padding
        1, 0, 0, 0, b'v', 0, // string "v"
    ];

    #[test]
    fn array_of_struct_decodes_as_list() -> Result<()> {
        let mesg = Message {
            data: PAIR_DATA.to_vec(),
            signature: b"a(ss)".to_vec(),
        };
        let expected = Value::List(vec![Value::List(vec![
            Value::Str("k".to_owned()),
            Value::Str("v".to_owned()),
        ])]);
        assert_eq!(from_message(&mesg)?, expected);
        Ok(())
    }

    #[test]
    fn array_of_dict_entry_decodes_as_map() -> Result<()> {
        let mesg = Message {
            data: PAIR_DATA.to_vec(),
            signature: b"a{ss}".to_vec(),
        };
        let expected = Value::Map(vec![(
            Value::Str("k".to_owned()),
            Value::Str("v".to_owned()),
        )]);
        assert_eq!(from_message(&mesg)?, expected);
        Ok(())
    }

    #[test]
    fn struct_decodes_as_list() -> Result<()> {
        let mesg = Message {
            data: vec![2, 0, 0, 0, b'h', b'i', 0, 0, 1, 0, 0, 0],
            signature: b"(sb)".to_vec(),
        };
        let expected = Value::List(vec![Value::Str("hi".to_owned()), Value::Bool(true)]);
        assert_eq!(from_message(&mesg)?, expected);
        Ok(())
    }

    #[test]
    fn object_path_decodes_as_string() -> Result<()> {
        let mesg = Message {
            data: vec![4, 0, 0, 0, b'/', b'o', b'b', b'j', 0],
            signature: b"o".to_vec(),
        };
        assert_eq!(from_message(&mesg)?, Value::Str("/obj".to_owned()));
        Ok(())
    }

    #[test]
    fn unmapped_wire_type_is_unrepresentable() -> Result<()> {
        let mesg = Message {
            data: vec![1, b's', 0],
            signature: b"g".to_vec(),
        };
        assert_eq!(from_message(&mesg)?, Value::Unsupported);
        Ok(())
    }

    #[test]
    fn tag_outside_the_grammar_is_an_error() {
        // Unlike 'g' and 'h', an unknown tag has no known payload width,
        // so there is nothing to skip over.
        let mesg = Message {
            data: vec![0, 0, 0, 0],
            signature: b"z".to_vec(),
        };
        assert_eq!(
            from_message(&mesg),
            Err(Error::MalformedSignature("z".to_owned()))
        );
    }

    #[test]
    fn large_u64_wraps() -> Result<()> {
        let mesg = Message {
            data: u64::MAX.to_le_bytes().to_vec(),
            signature: b"t".to_vec(),
        };
        assert_eq!(from_message(&mesg)?, Value::Int(-1));
        Ok(())
    }

    #[test]
    fn integer_widths_widen_to_i64() -> Result<()> {
        let mesg = Message {
            data: vec![0xfe, 0xff], // i16 -2
            signature: b"n".to_vec(),
        };
        assert_eq!(from_message(&mesg)?, Value::Int(-2));
        Ok(())
    }

    #[test]
    fn truncated_data_is_an_error() {
        let mesg = Message {
            data: vec![5, 0, 0, 0, b'h'],
            signature: b"s".to_vec(),
        };
        assert!(from_message(&mesg).is_err());
    }
}
