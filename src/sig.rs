//! The DBus type-signature grammar: per-tag alignment, splitting one
//! complete single signature off a signature string, and synthesizing
//! signatures from type descriptors.

use crate::error::{Error, Result};
use crate::value::TypeDesc;

pub(crate) fn alignment_of(tag: u8) -> Result<usize> {
    match tag {
        b'y' => Ok(1), // BYTE
        b'b' => Ok(4), // BOOLEAN
        b'n' => Ok(2), // INT16
        b'q' => Ok(2), // UINT16
        b'i' => Ok(4), // INT32
        b'u' => Ok(4), // UINT32
        b'x' => Ok(8), // INT64
        b't' => Ok(8), // UINT64
        b'd' => Ok(8), // DOUBLE
        b's' => Ok(4), // STRING
        b'o' => Ok(4), // OBJECT_PATH
        b'g' => Ok(1), // SIGNATURE
        b'a' => Ok(4), // ARRAY
        b'(' => Ok(8), // STRUCT
        b'v' => Ok(1), // VARIANT
        b'{' => Ok(8), // DICT_ENTRY
        b'h' => Ok(4), // UNIX_FD
        _ => Err(Error::MalformedSignature((tag as char).to_string())),
    }
}

/// Length of the first complete single signature in `sig`. An `a` prefix
/// extends over the following element signature; brackets must balance.
pub(crate) fn single_len(sig: &[u8]) -> Result<usize> {
    let mut nesting = 0usize;
    for (i, &b) in sig.iter().enumerate() {
        match b {
            b'(' | b'{' => nesting += 1,
            b')' | b'}' => {
                nesting = nesting
                    .checked_sub(1)
                    .ok_or_else(|| Error::MalformedSignature(lossy(sig)))?;
            }
            b'a' => continue,
            _ => (),
        }
        if nesting == 0 {
            return Ok(i + 1);
        }
    }
    Err(Error::MalformedSignature(lossy(sig)))
}

pub(crate) fn lossy(sig: &[u8]) -> String {
    String::from_utf8_lossy(sig).into_owned()
}

/// Produces the wire signature for a type descriptor.
///
/// `Any` maps to the variant wildcard. Dictionary keys cannot be variants
/// on the wire, so an `Any`-typed key is coerced to the string signature.
/// The integer kind maps to the unsigned 32-bit code; 64-bit widths do
/// not round-trip through this path (known limitation). `Void` yields an
/// empty signature, which is an error wherever a list or map needs a real
/// element type.
pub fn synthesize(desc: &TypeDesc) -> Result<Vec<u8>> {
    let sig = match desc {
        TypeDesc::Any => vec![b'v'],
        TypeDesc::Void => Vec::new(),
        TypeDesc::Bool => vec![b'b'],
        TypeDesc::Int => vec![b'u'],
        TypeDesc::Float => vec![b'd'],
        TypeDesc::Str => vec![b's'],
        TypeDesc::List(elem) => {
            let inner = synthesize(elem)?;
            if inner.is_empty() {
                return Err(Error::NoSignature(elem.kind()));
            }
            let mut sig = vec![b'a'];
            sig.extend_from_slice(&inner);
            sig
        }
        TypeDesc::Map(key, value) => {
            let key_sig = synthesize_dict_key(key)?;
            let value_sig = synthesize(value)?;
            if value_sig.is_empty() {
                return Err(Error::NoSignature(value.kind()));
            }
            let mut sig = vec![b'a', b'{'];
            sig.extend_from_slice(&key_sig);
            sig.extend_from_slice(&value_sig);
            sig.push(b'}');
            sig
        }
        TypeDesc::Opaque => return Err(Error::NoSignature(desc.kind())),
    };
    Ok(sig)
}

/// Key position of a dict entry: `Any` coerces to string. The wire
/// restricts dict keys to basic types, so a container-typed key is
/// rejected here instead of letting the bus bounce the frame remotely.
pub(crate) fn synthesize_dict_key(desc: &TypeDesc) -> Result<Vec<u8>> {
    match desc {
        TypeDesc::Any => Ok(vec![b's']),
        TypeDesc::Bool | TypeDesc::Int | TypeDesc::Float | TypeDesc::Str => synthesize(desc),
        _ => Err(Error::InvalidDictKey(desc.kind())),
    }
}
