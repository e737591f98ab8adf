//! The outer DBus message frame: 16-byte fixed header, header-field
//! array, padded body. Only what a blocking method-call client needs.

use crate::align::align;
use crate::call::MethodCall;
use crate::de::{read_value, Data, Sig};
use crate::error::{Error, Result};
use crate::message::Message;
use crate::ser::BodyBuilder;
use byteorder::{ByteOrder, LE};
use std::io::Read;

pub(crate) const METHOD_CALL: u8 = 1;
pub(crate) const METHOD_RETURN: u8 = 2;
pub(crate) const ERROR: u8 = 3;

const LITTLE_ENDIAN: u8 = b'l';
const PROTOCOL_VERSION: u8 = 1;

const FIELD_PATH: u8 = 1;
const FIELD_INTERFACE: u8 = 2;
const FIELD_MEMBER: u8 = 3;
const FIELD_ERROR_NAME: u8 = 4;
const FIELD_REPLY_SERIAL: u8 = 5;
const FIELD_DESTINATION: u8 = 6;
const FIELD_SIGNATURE: u8 = 8;

/// An inbound message frame, reduced to what the dispatcher cares about.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) message_type: u8,
    pub(crate) serial: u32,
    pub(crate) reply_serial: Option<u32>,
    pub(crate) error_name: Option<String>,
    pub(crate) signature: Vec<u8>,
    pub(crate) body: Vec<u8>,
}

impl Frame {
    pub(crate) fn into_body(self) -> Message {
        Message {
            data: self.body,
            signature: self.signature,
        }
    }
}

/// Encodes a complete method-call frame. Alignment runs from the frame
/// start, and the body begins on the 8-aligned boundary after the
/// header fields, so body-relative padding stays congruent.
pub(crate) fn encode_call(serial: u32, call: &MethodCall) -> Vec<u8> {
    let mut b = BodyBuilder::new();
    b.put_u8(LITTLE_ENDIAN);
    b.put_u8(METHOD_CALL);
    b.put_u8(0); // flags
    b.put_u8(PROTOCOL_VERSION);
    b.put_u32(call.body.data.len() as u32);
    b.put_u32(serial);

    let token = b.begin_array(8); // array of 8-aligned (byte, variant)
    string_field(&mut b, FIELD_PATH, b'o', &call.path);
    string_field(&mut b, FIELD_INTERFACE, b's', &call.interface);
    string_field(&mut b, FIELD_MEMBER, b's', &call.method);
    string_field(&mut b, FIELD_DESTINATION, b's', &call.destination);
    if !call.body.signature.is_empty() {
        b.align(8);
        b.put_u8(FIELD_SIGNATURE);
        b.put_signature(b"g");
        b.put_signature(&call.body.signature);
    }
    b.end_array(token);

    b.align(8);
    b.extend_raw(&call.body.data);
    b.into_data()
}

fn string_field(b: &mut BodyBuilder, code: u8, tag: u8, value: &str) {
    b.align(8);
    b.put_u8(code);
    b.put_signature(&[tag]); // variant signature
    b.put_string(value);
}

/// Reads one complete frame from the stream. Header fields other than
/// reply-serial, error-name and signature are skipped by their own
/// signatures.
pub(crate) fn read_frame(stream: &mut impl Read) -> Result<Frame> {
    let mut fixed = [0u8; 16];
    stream.read_exact(&mut fixed)?;
    if fixed[0] != LITTLE_ENDIAN {
        return Err(Error::Transport(format!(
            "unsupported endianness marker {:?}",
            fixed[0] as char
        )));
    }
    let message_type = fixed[1];
    let body_len = LE::read_u32(&fixed[4..8]) as usize;
    let serial = LE::read_u32(&fixed[8..12]);
    let fields_len = LE::read_u32(&fixed[12..16]) as usize;

    // The body starts 8-aligned after the fields; the padding is not
    // part of the field array's byte length.
    let fields_padded = align(fields_len, 8);
    let mut rest = vec![0u8; fields_padded + body_len];
    stream.read_exact(&mut rest)?;

    let mut reply_serial = None;
    let mut error_name = None;
    let mut signature = Vec::new();

    // Offset 16 is 8-aligned, so field-relative positions pad correctly.
    let mut data = Data::new(&rest[..fields_len]);
    while data.pos() < fields_len {
        data.align(8)?;
        let code = data.u8()?;
        let field_sig = data.signature()?;
        match (code, field_sig) {
            (FIELD_REPLY_SERIAL, b"u") => reply_serial = Some(data.u32()?),
            (FIELD_ERROR_NAME, b"s") => error_name = Some(data.string()?),
            (FIELD_SIGNATURE, b"g") => signature = data.signature()?.to_vec(),
            _ => {
                let mut sig = Sig::new(field_sig);
                let single = sig.next_single()?;
                read_value(single, &mut data)?;
            }
        }
    }

    Ok(Frame {
        message_type,
        serial,
        reply_serial,
        error_name,
        signature,
        body: rest[fields_padded..].to_vec(),
    })
}
