// Test-only writer producing res-file records

use crate::core::constants::*;
use encoding_rs::WINDOWS_1252;

pub struct ResWriter {
    buf: Vec<u8>,
}

impl ResWriter {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    pub fn packet(&mut self, payload: &[u8]) -> &mut Self {
        let len = (payload.len() as i32).to_le_bytes();
        self.buf.extend_from_slice(&len);
        self.buf.extend_from_slice(payload);
        self.buf.extend_from_slice(&len);
        self
    }

    pub fn i32_packet(&mut self, v: i32) -> &mut Self {
        self.packet(&v.to_le_bytes())
    }

    pub fn f64_packet(&mut self, v: f64) -> &mut Self {
        self.packet(&v.to_le_bytes())
    }

    pub fn f64_array_packet(&mut self, values: &[f64]) -> &mut Self {
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.packet(&bytes)
    }

    pub fn string(&mut self, s: &str) -> &mut Self {
        let (encoded, _, _) = WINDOWS_1252.encode(s);
        let mut payload = vec![encoded.len() as u8];
        payload.extend_from_slice(&encoded);
        self.packet(&payload)
    }

    /// Leading signature record: the bare signature bytes.
    pub fn signature(&mut self) -> &mut Self {
        self.packet(SIGNATURE.as_bytes())
    }

    /// Signature separating the model and log sections, framed as a string.
    pub fn divider(&mut self) -> &mut Self {
        self.string(SIGNATURE)
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn profile(&mut self, scale: f64, offset: f64, raw: &[i16]) -> &mut Self {
        let mut payload = Vec::new();
        payload.extend_from_slice(&scale.to_le_bytes());
        payload.extend_from_slice(&offset.to_le_bytes());
        for v in raw {
            payload.extend_from_slice(&v.to_le_bytes());
        }
        self.packet(&payload)
    }

    /// Frame with the given slices, timestamp and profiles (scale 1, offset 0).
    pub fn frame(&mut self, slices: &[&[f64]], time: f64, profiles: &[&[i16]]) -> &mut Self {
        self.i32_packet(slices.len() as i32);
        if !slices.is_empty() {
            let merged: Vec<f64> = slices.iter().flat_map(|s| s.iter().copied()).collect();
            self.f64_array_packet(&merged);
        }
        self.f64_packet(time);
        self.f64_array_packet(&[0.5, 1.5]);
        self.packet(&[1, 0, 0, 0, 0, 0, 0, 0]);
        for raw in profiles {
            self.profile(1.0, 0.0, raw);
        }
        self
    }
}

pub fn fixed_text(s: &str, width: usize) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.resize(width, b' ');
    out
}

/// Payload of the fixed header record.
pub fn header_payload(rad_names: &[&str], time_names: &[&str], ngr: i32, nxout: i32) -> Vec<u8> {
    let mut p = Vec::new();
    p.extend(fixed_text("tokamak.rd", RD_NAME_LEN));
    p.extend(fixed_text("neo.eq", EQ_NAME_LEN));
    let mut version = b"ASTRA 7.0".to_vec();
    version.resize(VERSION_LEN, 0);
    p.extend(version);
    p.extend(fixed_text("ohmic shot", XLINE_LEN));
    for v in [2019i32, 9, 13, 12, 21] {
        p.extend(v.to_le_bytes());
    }
    p.extend(3i32.to_le_bytes());
    p.extend(4i32.to_le_bytes());
    for names in [rad_names, time_names] {
        p.extend((names.len() as i32).to_le_bytes());
        for name in names {
            p.extend(fixed_text(name, OUTPUT_NAME_WIDTH));
        }
        for i in 0..names.len() {
            p.extend((i as f64 + 2.0).to_le_bytes());
        }
    }
    p.extend(0.01f64.to_le_bytes());
    for v in [1, 2, ngr, nxout] {
        p.extend(v.to_le_bytes());
    }
    for v in 0..NEQNS as i32 {
        p.extend(v.to_le_bytes());
    }
    p
}

/// Payload of the extended header record for `ngr` grids, followed by `tail`
/// bytes that are never decoded.
pub fn extended_payload(ngr: usize, tail: usize) -> Vec<u8> {
    let mut p = Vec::new();
    let ints = |p: &mut Vec<u8>, vals: &[i32]| {
        for v in vals {
            p.extend(v.to_le_bytes());
        }
    };
    let kto: Vec<i32> = (0..ngr as i32).collect();
    let ngridx: Vec<i32> = (0..ngr as i32).map(|i| 3 + i).collect();
    let ntypex = vec![1; ngr];
    let gdex = vec![1; ngr];
    let gdey: Vec<i32> = (0..ngr as i32).map(|i| 1 + 3 * i).collect();
    ints(&mut p, &kto);
    ints(&mut p, &ngridx);
    ints(&mut p, &ntypex);
    for i in 0..ngr {
        p.extend((i as f64 * 0.5).to_le_bytes());
    }
    ints(&mut p, &gdex);
    ints(&mut p, &gdey);
    let datarr_len = (gdey[ngr - 1] + ngridx[ngr - 1] - 1) as usize;
    for i in 0..datarr_len {
        p.extend((i as f32).to_le_bytes());
    }
    for i in 0..NARRX {
        p.extend(fixed_text(&format!("G{}", i), GRID_NAME_WIDTH));
    }
    ints(&mut p, &vec![2; NARRX]);
    ints(&mut p, &vec![3; NARRX]);
    p.extend(vec![0xAB; tail]);
    p
}
