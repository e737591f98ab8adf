use crate::align::pad_to;
use crate::message::Message;

/// Builds the data side of a message body in one pass. Array lengths are
/// backfilled when the container closes; the depth counter exists so
/// callers can prove open/close stayed balanced across failures.
pub(crate) struct BodyBuilder {
    data: Vec<u8>,
    signature: Vec<u8>,
    depth: usize,
}

#[must_use]
pub(crate) struct ArrayToken {
    len_pos: usize,
    start: usize,
}

impl BodyBuilder {
    pub(crate) fn new() -> Self {
        Self {
            data: Vec::new(),
            signature: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn align(&mut self, alignment: usize) {
        pad_to(&mut self.data, alignment);
    }

    pub(crate) fn put_u8(&mut self, value: u8) {
        self.data.push(value);
    }

    pub(crate) fn put_u32(&mut self, value: u32) {
        self.align(4);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_f64(&mut self, value: f64) {
        self.align(8);
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn put_string(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
    }

    pub(crate) fn put_signature(&mut self, sig: &[u8]) {
        self.data.push(sig.len() as u8);
        self.data.extend_from_slice(sig);
        self.data.push(0);
    }

    /// Opens an array container: aligned length placeholder, then padding
    /// to the element boundary. The padding is not counted in the length.
    pub(crate) fn begin_array(&mut self, elem_alignment: usize) -> ArrayToken {
        self.align(4);
        let len_pos = self.data.len();
        self.data.extend_from_slice(&[0, 0, 0, 0]);
        self.align(elem_alignment);
        self.depth += 1;
        ArrayToken {
            len_pos,
            start: self.data.len(),
        }
    }

    pub(crate) fn end_array(&mut self, token: ArrayToken) {
        let len = (self.data.len() - token.start) as u32;
        self.data[token.len_pos..token.len_pos + 4].copy_from_slice(&len.to_le_bytes());
        self.depth -= 1;
    }

    pub(crate) fn begin_entry(&mut self) {
        self.align(8);
        self.depth += 1;
    }

    pub(crate) fn end_entry(&mut self) {
        self.depth -= 1;
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Appends a top-level argument signature.
    pub(crate) fn push_signature(&mut self, sig: &[u8]) {
        self.signature.extend_from_slice(sig);
    }

    pub(crate) fn extend_raw(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub(crate) fn finish(self) -> Message {
        debug_assert_eq!(self.depth, 0, "unbalanced container open/close");
        Message {
            data: self.data,
            signature: self.signature,
        }
    }

    pub(crate) fn into_data(self) -> Vec<u8> {
        self.data
    }
}
