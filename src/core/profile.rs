// Scaled 16-bit profile records

use crate::core::constants::{INT_RECORD_SIZE, PROFILE_PREFIX_SIZE, SAMPLE_BIAS, SAMPLE_SPAN};
use crate::core::error::{ResError, Result};
use crate::core::format::{Profile, Step, Stop};
use crate::core::packet::{FieldCursor, PacketReader};
use std::io::{Read, Seek};

/// Maps a raw sample onto [offset, offset + scale].
#[inline]
pub fn decode_sample(raw: i16, scale: f64, offset: f64) -> f64 {
    offset + (SAMPLE_BIAS + raw as f64) * scale / SAMPLE_SPAN
}

pub fn decode_samples(raw: &[i16], scale: f64, offset: f64) -> Vec<f64> {
    raw.iter().map(|&r| decode_sample(r, scale, offset)).collect()
}

/// Reads the next profile of a frame.
///
/// A 4-byte record is the slice count opening the next frame; it is left in
/// the stream and `Stop::ProfileNotFound` is returned.
pub fn read_profile<R: Read + Seek>(reader: &mut PacketReader<R>) -> Result<Step<Profile>> {
    let length = match reader.read_length(None, None) {
        Ok(length) => length,
        Err(ResError::EndOfStream) => return Ok(Step::Stop(Stop::EndOfStream)),
        Err(e) => return Err(e),
    };

    if length == INT_RECORD_SIZE {
        reader.rewind(4)?;
        return Ok(Step::Stop(Stop::ProfileNotFound));
    }
    if (length as usize) < PROFILE_PREFIX_SIZE {
        return Err(ResError::Format(format!("profile record of {} bytes", length)));
    }

    let packet = reader.read_body(length)?;
    let mut fields = FieldCursor::new(&packet.payload);
    let scale = fields.f64()?;
    let offset = fields.f64()?;
    let raw = fields.i16_array(fields.remaining() / 2)?;
    let values = decode_samples(&raw, scale, offset);

    Ok(Step::Value(Profile {
        scale,
        offset,
        raw,
        values,
    }))
}
