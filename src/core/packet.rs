// Length-prefixed record I/O
//
// Every record is framed as: len(i32 LE) payload[len] len(i32 LE).

use crate::core::constants::{MAX_SIGNATURE_LEN, SIGNATURE};
use crate::core::error::{ResError, Result};
use crate::core::format::{Packet, Step, Stop};
use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::WINDOWS_1252;
use std::io::{ErrorKind, Read, Seek, SeekFrom};

/// Decodes Windows-1252 text as written by the simulation code.
pub fn decode_text(bytes: &[u8]) -> String {
    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Converts a count read from the file into a length.
pub fn to_count(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| ResError::Format(format!("negative {}: {}", what, value)))
}

pub struct PacketReader<R> {
    inner: R,
}

impl<R: Read + Seek> PacketReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn rewind(&mut self, bytes: i64) -> Result<()> {
        self.inner.seek(SeekFrom::Current(-bytes))?;
        Ok(())
    }

    /// Reads as many bytes as available up to `buf.len()`.
    fn fill(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    fn read_exact_or_truncated(&mut self, buf: &mut [u8], context: &'static str) -> Result<()> {
        let n = self.fill(buf)?;
        if n != buf.len() {
            return Err(ResError::Truncated {
                context,
                expected: buf.len(),
                found: n,
            });
        }
        Ok(())
    }

    /// Reads one length field.
    ///
    /// `previous` is the leading length the field has to repeat, `max` an
    /// upper bound for the declared size.
    pub fn read_length(&mut self, previous: Option<i32>, max: Option<i32>) -> Result<i32> {
        let mut buf = [0u8; 4];
        let size = match self.fill(&mut buf)? {
            0 => return Err(ResError::EndOfStream),
            4 => LittleEndian::read_i32(&buf),
            n => {
                return Err(ResError::Truncated {
                    context: "length field",
                    expected: 4,
                    found: n,
                })
            }
        };

        if let Some(leading) = previous {
            if size != leading {
                return Err(ResError::PacketMismatch {
                    leading,
                    trailing: size,
                });
            }
        }
        if let Some(max) = max {
            if size > max {
                return Err(ResError::PacketTooLarge { size, max });
            }
        }
        if size < 0 {
            return Err(ResError::Format(format!("negative packet length {}", size)));
        }
        Ok(size)
    }

    pub fn read_length_prefixed(&mut self, max: Option<i32>) -> Result<Packet> {
        let length = self.read_length(None, max)?;
        self.read_body(length)
    }

    /// Reads the payload and trailing length of a record whose leading length
    /// has already been consumed.
    pub fn read_body(&mut self, length: i32) -> Result<Packet> {
        // Grows with the data actually present, not with the declared length.
        let mut payload = Vec::new();
        let found = (&mut self.inner)
            .take(length as u64)
            .read_to_end(&mut payload)?;
        if found != length as usize {
            return Err(ResError::Truncated {
                context: "packet payload",
                expected: length as usize,
                found,
            });
        }
        self.read_length(Some(length), None)?;
        Ok(Packet { length, payload })
    }

    /// Reads a string record: one length byte followed by the text.
    ///
    /// If the record does not have that shape the stream is moved back to the
    /// record start and `Stop::NotAString` is returned.
    pub fn read_string_record(&mut self) -> Result<Step<String>> {
        let length = self.read_length(None, None)?;
        let mut len_byte = [0u8; 1];
        self.read_exact_or_truncated(&mut len_byte, "string length")?;
        let text_len = len_byte[0] as i32;

        if length != text_len + 1 {
            self.rewind(5)?;
            return Ok(Step::Stop(Stop::NotAString));
        }

        let mut text = vec![0u8; text_len as usize];
        self.read_exact_or_truncated(&mut text, "string record")?;
        self.read_length(Some(length), None)?;
        Ok(Step::Value(decode_text(&text)))
    }

    pub fn read_signature_record(&mut self) -> Result<String> {
        let packet = self.read_length_prefixed(Some(MAX_SIGNATURE_LEN))?;
        let text = decode_text(&packet.payload);
        if text != SIGNATURE {
            return Err(ResError::InvalidSignature(text));
        }
        Ok(text)
    }

    pub fn read_i32_packet(&mut self) -> Result<i32> {
        let packet = self.read_length_prefixed(None)?;
        if packet.len() != 4 {
            return Err(ResError::Format(format!(
                "integer record of {} bytes (should be 4)",
                packet.len()
            )));
        }
        Ok(LittleEndian::read_i32(&packet.payload))
    }

    pub fn read_f64_packet(&mut self) -> Result<f64> {
        let packet = self.read_length_prefixed(None)?;
        if packet.len() != 8 {
            return Err(ResError::Format(format!(
                "double record of {} bytes (should be 8)",
                packet.len()
            )));
        }
        Ok(LittleEndian::read_f64(&packet.payload))
    }

    pub fn read_f64_array_packet(&mut self) -> Result<Vec<f64>> {
        let packet = self.read_length_prefixed(None)?;
        let n = packet.len() / 8;
        let mut values = vec![0.0; n];
        LittleEndian::read_f64_into(&packet.payload[..n * 8], &mut values);
        Ok(values)
    }
}

/// Sequential field decoder over the payload of one record.
pub struct FieldCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize, context: &'static str) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(ResError::Truncated {
                context,
                expected: n,
                found: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4, "i32 field")?))
    }

    pub fn f64(&mut self) -> Result<f64> {
        Ok(LittleEndian::read_f64(self.take(8, "f64 field")?))
    }

    /// Fixed-width text field.
    pub fn text(&mut self, width: usize) -> Result<String> {
        Ok(decode_text(self.take(width, "text field")?))
    }

    /// `count` consecutive fixed-width names, each trimmed.
    pub fn names(&mut self, count: usize, width: usize) -> Result<Vec<String>> {
        let bytes = self.take(count * width, "name list")?;
        Ok(bytes
            .chunks(width)
            .map(|chunk| decode_text(chunk).trim().to_string())
            .collect())
    }

    pub fn i32_array(&mut self, n: usize) -> Result<Vec<i32>> {
        let bytes = self.take(n * 4, "i32 array")?;
        let mut out = vec![0; n];
        LittleEndian::read_i32_into(bytes, &mut out);
        Ok(out)
    }

    pub fn i16_array(&mut self, n: usize) -> Result<Vec<i16>> {
        let bytes = self.take(n * 2, "i16 array")?;
        let mut out = vec![0; n];
        LittleEndian::read_i16_into(bytes, &mut out);
        Ok(out)
    }

    pub fn f32_array(&mut self, n: usize) -> Result<Vec<f32>> {
        let bytes = self.take(n * 4, "f32 array")?;
        let mut out = vec![0.0; n];
        LittleEndian::read_f32_into(bytes, &mut out);
        Ok(out)
    }

    pub fn f64_array(&mut self, n: usize) -> Result<Vec<f64>> {
        let bytes = self.take(n * 8, "f64 array")?;
        let mut out = vec![0.0; n];
        LittleEndian::read_f64_into(bytes, &mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::ResWriter;
    use std::io::Cursor;

    fn reader(bytes: Vec<u8>) -> PacketReader<Cursor<Vec<u8>>> {
        PacketReader::new(Cursor::new(bytes))
    }

    #[test]
    fn test_round_trip_framing() {
        let mut w = ResWriter::new();
        w.packet(&[1, 2, 3, 4, 5, 6, 7]);
        let bytes = w.finish();
        assert_eq!(&bytes[0..4], &7i32.to_le_bytes());
        assert_eq!(&bytes[11..15], &7i32.to_le_bytes());

        let packet = reader(bytes).read_length_prefixed(None).unwrap();
        assert_eq!(packet.length, 7);
        assert_eq!(packet.payload, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_trailing_length_mismatch() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&[9, 9]);
        bytes.extend_from_slice(&3i32.to_le_bytes());
        let err = reader(bytes).read_length_prefixed(None).unwrap_err();
        assert!(matches!(
            err,
            ResError::PacketMismatch {
                leading: 2,
                trailing: 3
            }
        ));
        assert!(err.is_format_error());
    }

    #[test]
    fn test_end_of_stream_and_truncation() {
        let err = reader(Vec::new()).read_length_prefixed(None).unwrap_err();
        assert!(err.is_end_of_stream());

        let err = reader(vec![1, 0]).read_length(None, None).unwrap_err();
        assert!(matches!(err, ResError::Truncated { found: 2, .. }));

        let mut bytes = 10i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 3]);
        let err = reader(bytes).read_length_prefixed(None).unwrap_err();
        assert!(matches!(
            err,
            ResError::Truncated {
                expected: 10,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_oversize_packet() {
        let mut w = ResWriter::new();
        w.packet(&[b'^'; 40]);
        let err = reader(w.finish())
            .read_length_prefixed(Some(MAX_SIGNATURE_LEN))
            .unwrap_err();
        assert!(matches!(err, ResError::PacketTooLarge { size: 40, max: 32 }));
    }

    #[test]
    fn test_string_record_and_rewind() {
        let mut w = ResWriter::new();
        w.string("caf\u{e9}");
        w.i32_packet(7);
        let mut r = reader(w.finish());

        assert_eq!(r.read_string_record().unwrap(), Step::Value("café".to_string()));
        let before = r.position().unwrap();
        assert_eq!(r.read_string_record().unwrap(), Step::Stop(Stop::NotAString));
        assert_eq!(r.position().unwrap(), before);
        assert_eq!(r.read_i32_packet().unwrap(), 7);
    }

    #[test]
    fn test_signature_record() {
        let mut w = ResWriter::new();
        w.signature();
        assert_eq!(reader(w.finish()).read_signature_record().unwrap(), SIGNATURE);

        let mut w = ResWriter::new();
        w.packet(&[b'~'; 32]);
        let err = reader(w.finish()).read_signature_record().unwrap_err();
        assert!(matches!(err, ResError::InvalidSignature(_)));
    }

    #[test]
    fn test_typed_packets() {
        let mut w = ResWriter::new();
        w.f64_packet(1.5);
        w.f64_array_packet(&[1.0, 2.0, 3.0]);
        w.packet(&[0; 6]);
        let mut r = reader(w.finish());
        assert_eq!(r.read_f64_packet().unwrap(), 1.5);
        assert_eq!(r.read_f64_array_packet().unwrap(), vec![1.0, 2.0, 3.0]);
        assert!(r.read_i32_packet().unwrap_err().is_format_error());
    }

    #[test]
    fn test_field_cursor() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"Te  ne  ");
        bytes.extend_from_slice(&(-7i32).to_le_bytes());
        bytes.extend_from_slice(&(-32768i16).to_le_bytes());
        bytes.extend_from_slice(&0.25f32.to_le_bytes());
        let mut c = FieldCursor::new(&bytes);
        assert_eq!(c.names(2, 4).unwrap(), vec!["Te", "ne"]);
        assert_eq!(c.i32().unwrap(), -7);
        assert_eq!(c.i16_array(1).unwrap(), vec![-32768]);
        assert_eq!(c.f32_array(1).unwrap(), vec![0.25]);
        assert_eq!(c.remaining(), 0);
        assert!(matches!(c.f64().unwrap_err(), ResError::Truncated { .. }));
    }

    #[test]
    fn test_negative_count() {
        assert_eq!(to_count(3, "n").unwrap(), 3);
        assert!(to_count(-1, "n").unwrap_err().is_format_error());
    }
}
