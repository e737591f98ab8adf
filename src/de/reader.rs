use crate::align::align;
use crate::error::{Error, Result};
use crate::sig::single_len;
use byteorder::{ByteOrder, LE};

/// Cursor over the data side of a marshaled body. Positions are relative
/// to the body start, which the wire guarantees is 8-aligned, so padding
/// computed here matches padding on the wire.
pub(crate) struct Data<'de> {
    bytes: &'de [u8],
    pos: usize,
}

impl<'de> Data<'de> {
    pub(crate) fn new(bytes: &'de [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn len(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn align(&mut self, alignment: usize) -> Result<()> {
        self.pos = align(self.pos, alignment);
        if self.pos > self.bytes.len() {
            return Err(Error::Truncated(self.pos));
        }
        Ok(())
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'de [u8]> {
        let old = self.pos;
        let new = old + len;
        if new > self.bytes.len() {
            return Err(Error::Truncated(new));
        }
        self.pos = new;
        Ok(&self.bytes[old..new])
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn i16(&mut self) -> Result<i16> {
        self.align(2)?;
        Ok(LE::read_i16(self.take(2)?))
    }

    pub(crate) fn u16(&mut self) -> Result<u16> {
        self.align(2)?;
        Ok(LE::read_u16(self.take(2)?))
    }

    pub(crate) fn i32(&mut self) -> Result<i32> {
        self.align(4)?;
        Ok(LE::read_i32(self.take(4)?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        self.align(4)?;
        Ok(LE::read_u32(self.take(4)?))
    }

    pub(crate) fn i64(&mut self) -> Result<i64> {
        self.align(8)?;
        Ok(LE::read_i64(self.take(8)?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        self.align(8)?;
        Ok(LE::read_u64(self.take(8)?))
    }

    pub(crate) fn f64(&mut self) -> Result<f64> {
        self.align(8)?;
        Ok(LE::read_f64(self.take(8)?))
    }

    /// String wire form: aligned u32 length, bytes, terminating nul.
    pub(crate) fn string(&mut self) -> Result<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len + 1)?;
        Ok(std::str::from_utf8(&bytes[..len])?.to_owned())
    }

    /// Signature wire form: u8 length, bytes, terminating nul. Unaligned.
    pub(crate) fn signature(&mut self) -> Result<&'de [u8]> {
        let len = self.u8()? as usize;
        let bytes = self.take(len + 1)?;
        Ok(&bytes[..len])
    }
}

/// Cursor over a signature string, splitting off one complete single
/// signature at a time.
pub(crate) struct Sig<'de> {
    sig: &'de [u8],
    ix: usize,
}

impl<'de> Sig<'de> {
    pub(crate) fn new(sig: &'de [u8]) -> Self {
        Self { sig, ix: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ix >= self.sig.len()
    }

    pub(crate) fn next_single(&mut self) -> Result<&'de [u8]> {
        let rest = &self.sig[self.ix..];
        let len = single_len(rest)?;
        self.ix += len;
        Ok(&rest[..len])
    }
}

#[cfg(test)]
mod tests {
    use super::{Data, Sig};
    use crate::error::Error;

    #[test]
    fn reads_are_aligned() {
        let bytes = [7u8, 0, 0, 0, 42, 0, 0, 0];
        let mut data = Data::new(&bytes);
        assert_eq!(data.u8().unwrap(), 7);
        // u32 skips the padding after the byte
        assert_eq!(data.u32().unwrap(), 42);
        assert_eq!(data.pos(), 8);
    }

    #[test]
    fn read_past_end_is_truncated() {
        let bytes = [1u8, 2];
        let mut data = Data::new(&bytes);
        assert_eq!(data.u32(), Err(Error::Truncated(4)));
    }

    #[test]
    fn string_drops_terminator() {
        let bytes = [2u8, 0, 0, 0, b'h', b'i', 0];
        let mut data = Data::new(&bytes);
        assert_eq!(data.string().unwrap(), "hi");
    }

    #[test]
    fn signature_cursor_walks_singles() {
        let mut sig = Sig::new(b"sa{sv}u");
        assert_eq!(sig.next_single().unwrap(), b"s");
        assert_eq!(sig.next_single().unwrap(), b"a{sv}");
        assert_eq!(sig.next_single().unwrap(), b"u");
        assert!(sig.is_empty());
    }
}
