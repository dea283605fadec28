// Header records: fixed layout plus optional grid output section

use crate::core::constants::*;
use crate::core::error::{ResError, Result};
use crate::core::format::{ExtendedGrid, Header, OutputCatalog};
use crate::core::packet::{to_count, FieldCursor, PacketReader};
use std::io::{Read, Seek};
use tracing::debug;

/// Decodes the two header records.
///
/// When the second record is only 4 bytes long it is the slice count of the
/// first frame, so the stream is moved back in front of it.
pub fn read_header<R: Read + Seek>(reader: &mut PacketReader<R>) -> Result<Header> {
    let fixed = reader.read_length_prefixed(None)?;
    let mut header = decode_fixed(&fixed.payload)?;

    let second_pos = reader.position()?;
    let second = reader.read_length_prefixed(None)?;
    if second.len() == 4 {
        debug!("No second header record, rewinding to {}", second_pos);
        reader.seek_to(second_pos)?;
        return Ok(header);
    }

    if header.nxout > 0 {
        let (grid, consumed) = decode_extended(&second.payload, header.ngr)?;
        header.extended = Some(grid);
        header.unparsed_tail = second.len() - consumed;
    } else {
        header.unparsed_tail = second.len();
    }

    debug!(
        "Header: version={:?}, {} radial names, {} time names, extended={}, unparsed={} bytes",
        header.version,
        header.rad_catalog.len(),
        header.time_catalog.len(),
        header.extended.is_some(),
        header.unparsed_tail
    );
    Ok(header)
}

fn read_catalog(fields: &mut FieldCursor<'_>, prefix: &[&str]) -> Result<OutputCatalog> {
    let count = to_count(fields.i32()?, "output name count")?;
    let names = fields.names(count, OUTPUT_NAME_WIDTH)?;
    let scales = fields.f64_array(count)?;
    Ok(OutputCatalog::with_prefix(prefix, names, scales))
}

fn decode_fixed(payload: &[u8]) -> Result<Header> {
    let mut fields = FieldCursor::new(payload);

    let rd_name = fields.text(RD_NAME_LEN)?.trim().to_string();
    let eq_name = fields.text(EQ_NAME_LEN)?.trim().to_string();
    let version = fields
        .text(VERSION_LEN)?
        .trim_matches(|c: char| c == ' ' || c == '\0')
        .to_string();
    let xline1 = fields.text(XLINE_LEN)?.trim().to_string();

    let year = fields.i32()?;
    let month = fields.i32()?;
    let day = fields.i32()?;
    let hour = fields.i32()?;
    let minute = fields.i32()?;

    let n_cf_nam = fields.i32()?;
    let n_pr_nam = fields.i32()?;

    let rad_catalog = read_catalog(&mut fields, RADIAL_PREFIX)?;
    let time_catalog = read_catalog(&mut fields, TIME_PREFIX)?;

    let hro = fields.f64()?;
    let nb1 = fields.i32()?;
    let nsbr = fields.i32()?;
    let ngr = fields.i32()?;
    let nxout = fields.i32()?;

    let leq = fields.i32_array(NEQNS)?;

    if fields.remaining() != 0 {
        return Err(ResError::Format(format!(
            "header record has {} unexpected trailing bytes",
            fields.remaining()
        )));
    }

    Ok(Header {
        rd_name,
        eq_name,
        version,
        xline1,
        year,
        month,
        day,
        hour,
        minute,
        n_cf_nam,
        n_pr_nam,
        rad_catalog,
        time_catalog,
        hro,
        nb1,
        nsbr,
        ngr,
        nxout,
        leq,
        extended: None,
        unparsed_tail: 0,
    })
}

/// Decodes the grid output section. Returns the grid and the number of
/// payload bytes consumed; the rest of the record is not decoded.
fn decode_extended(payload: &[u8], ngr: i32) -> Result<(ExtendedGrid, usize)> {
    let ngr = to_count(ngr, "grid count")?;
    if ngr == 0 {
        return Err(ResError::Format(
            "grid output requested with zero grids".to_string(),
        ));
    }

    let mut fields = FieldCursor::new(payload);
    let kto = fields.i32_array(ngr)?;
    let ngridx = fields.i32_array(ngr)?;
    let ntypex = fields.i32_array(ngr)?;
    let timex = fields.f64_array(ngr)?;
    let gdex = fields.i32_array(ngr)?;
    let gdey = fields.i32_array(ngr)?;

    // Data length depends on the last grid's start and size.
    let data_len = gdey[ngr - 1] as i64 + ngridx[ngr - 1] as i64 - 1;
    let data_len = usize::try_from(data_len)
        .map_err(|_| ResError::Format(format!("negative grid data length {}", data_len)))?;
    let datarr = fields.f32_array(data_len)?;

    let namex = fields.names(NARRX, GRID_NAME_WIDTH)?;
    let nwindx = fields.i32_array(NARRX)?;
    let kogda = fields.i32_array(NARRX)?;

    let grid = ExtendedGrid {
        kto,
        ngridx,
        ntypex,
        timex,
        gdex,
        gdey,
        datarr,
        namex,
        nwindx,
        kogda,
    };
    Ok((grid, fields.position()))
}
