// Per-timestep frame records

use crate::core::error::{ResError, Result};
use crate::core::format::{Frame, Step};
use crate::core::packet::PacketReader;
use crate::core::profile::read_profile;
use std::io::{Read, Seek};

/// Reads one frame.
///
/// Returns `Ok(None)` when the stream is exhausted before the frame starts.
/// An exhausted stream inside the frame is reported as `EndOfStream`.
pub fn read_frame<R: Read + Seek>(reader: &mut PacketReader<R>) -> Result<Option<Frame>> {
    let nslices = match reader.read_i32_packet() {
        Ok(n) => n,
        Err(ResError::EndOfStream) => return Ok(None),
        Err(e) => return Err(e),
    };

    let time_slices = if nslices > 0 {
        let merged = reader.read_f64_array_packet()?;
        split_slices(&merged, nslices as usize)?
    } else {
        Vec::new()
    };

    let time = reader.read_f64_packet()?;
    let constants = reader.read_f64_array_packet()?;
    let reserved = reader.read_length_prefixed(None)?.payload;

    // Profile count is not stored; read until the next frame or end of stream.
    let mut profiles = Vec::new();
    while let Step::Value(profile) = read_profile(reader)? {
        profiles.push(profile);
    }

    Ok(Some(Frame {
        time_slices,
        time,
        constants,
        reserved,
        profiles,
    }))
}

/// Splits the merged slice record into `count` slices of equal width.
/// Values beyond `count * width` are dropped. Every slice holds at least one
/// value, so a count larger than the record is a format error.
fn split_slices(merged: &[f64], count: usize) -> Result<Vec<Vec<f64>>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    if count > merged.len() {
        return Err(ResError::Format(format!(
            "{} time slices in a record of {} values",
            count,
            merged.len()
        )));
    }
    let width = merged.len() / count;
    Ok(merged.chunks_exact(width).take(count).map(<[f64]>::to_vec).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::ResWriter;
    use std::io::Cursor;

    #[test]
    fn test_two_frames() {
        let mut w = ResWriter::new();
        w.frame(&[&[0.1, 1.0], &[0.2, 2.0]], 0.2, &[&[0, 1], &[2, 3], &[4, 5]]);
        w.frame(&[], 0.3, &[&[0, 1]]);
        let mut r = PacketReader::new(Cursor::new(w.finish()));

        let first = read_frame(&mut r).unwrap().unwrap();
        assert_eq!(first.time_slices, vec![vec![0.1, 1.0], vec![0.2, 2.0]]);
        assert_eq!(first.time, 0.2);
        assert_eq!(first.constants, vec![0.5, 1.5]);
        assert_eq!(first.reserved, vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(first.profiles.len(), 3);
        assert_eq!(first.profiles[2].raw, vec![4, 5]);

        let second = read_frame(&mut r).unwrap().unwrap();
        assert!(second.time_slices.is_empty());
        assert_eq!(second.profiles.len(), 1);

        assert!(read_frame(&mut r).unwrap().is_none());
    }

    #[test]
    fn test_end_inside_frame() {
        let mut w = ResWriter::new();
        w.i32_packet(0).f64_packet(1.0);
        let mut r = PacketReader::new(Cursor::new(w.finish()));
        assert!(read_frame(&mut r).unwrap_err().is_end_of_stream());
    }

    #[test]
    fn test_split_slices_drops_remainder() {
        let merged = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(
            split_slices(&merged, 2).unwrap(),
            vec![vec![1.0, 2.0], vec![3.0, 4.0]]
        );
    }

    #[test]
    fn test_slice_count_beyond_record() {
        assert!(split_slices(&[1.0], 2).unwrap_err().is_format_error());

        let mut w = ResWriter::new();
        w.i32_packet(i32::MAX).f64_array_packet(&[1.0]);
        let mut r = PacketReader::new(Cursor::new(w.finish()));
        assert!(read_frame(&mut r).unwrap_err().is_format_error());
    }
}
