/// The marshaled body of a DBus message: the argument bytes plus the
/// concatenated type signatures of the top-level arguments. All data is
/// little-endian and padded relative to the body start, which on the wire
/// is always 8-aligned.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl Message {
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            signature: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.signature.is_empty()
    }

    pub fn signature_str(&self) -> String {
        String::from_utf8_lossy(&self.signature).into_owned()
    }
}
