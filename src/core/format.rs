// Data structures for the res format

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;

/// Outcome of a decode step that may legitimately stop short of a value.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<T> {
    Value(T),
    Stop(Stop),
}

/// Recoverable reasons for a decode step not producing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stop {
    /// The record is not a string record; the stream was rewound to its start.
    NotAString,
    /// The record is the next frame's slice count; the stream was rewound.
    ProfileNotFound,
    /// Nothing left to read.
    EndOfStream,
}

#[derive(Debug, Clone)]
pub struct Packet {
    pub length: i32,
    pub payload: Vec<u8>,
}

impl Packet {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Ordered (name, scale) list describing one output axis.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OutputCatalog {
    pub names: Vec<String>,
    pub scales: Vec<f64>,
}

impl OutputCatalog {
    /// Builds a catalog from synthetic prefix names (scale 1.0) followed by
    /// the names and scales stored in the file.
    pub fn with_prefix(prefix: &[&str], names: Vec<String>, scales: Vec<f64>) -> Self {
        let mut all_names: Vec<String> = prefix.iter().map(|n| n.trim().to_string()).collect();
        let mut all_scales = vec![1.0; prefix.len()];
        all_names.extend(names.into_iter().map(|n| n.trim().to_string()));
        all_scales.extend(scales);
        Self {
            names: all_names,
            scales: all_scales,
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn truncate(&mut self, len: usize) {
        self.names.truncate(len);
        self.scales.truncate(len);
    }

    /// Appends `#last`, `#last2`, ... until the catalog holds `len` entries.
    pub fn pad_with_placeholders(&mut self, len: usize, base: &str) {
        let mut n = 1;
        while self.names.len() < len {
            let name = if n == 1 {
                base.to_string()
            } else {
                format!("{}{}", base, n)
            };
            self.names.push(name);
            self.scales.push(1.0);
            n += 1;
        }
    }
}

/// Grid output section of the second header record.
#[derive(Debug, Clone, Default)]
pub struct ExtendedGrid {
    pub kto: Vec<i32>,
    pub ngridx: Vec<i32>,
    pub ntypex: Vec<i32>,
    pub timex: Vec<f64>,
    pub gdex: Vec<i32>,
    pub gdey: Vec<i32>,
    pub datarr: Vec<f32>,
    pub namex: Vec<String>,
    pub nwindx: Vec<i32>,
    pub kogda: Vec<i32>,
}

#[derive(Debug, Clone)]
pub struct Header {
    pub rd_name: String,
    pub eq_name: String,
    pub version: String,
    pub xline1: String,
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub hour: i32,
    pub minute: i32,
    pub n_cf_nam: i32,
    pub n_pr_nam: i32,
    pub rad_catalog: OutputCatalog,
    pub time_catalog: OutputCatalog,
    pub hro: f64,
    pub nb1: i32,
    pub nsbr: i32,
    pub ngr: i32,
    pub nxout: i32,
    pub leq: Vec<i32>,
    pub extended: Option<ExtendedGrid>,
    /// Bytes of the second header record left undecoded.
    pub unparsed_tail: usize,
}

impl Header {
    pub fn summary(&self) -> HeaderSummary {
        HeaderSummary {
            rd_name: self.rd_name.clone(),
            eq_name: self.eq_name.clone(),
            version: self.version.clone(),
            xline1: self.xline1.clone(),
        }
    }

    /// Date and time the run was written, if the stored fields form a valid one.
    pub fn created(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::from_ymd_opt(
            self.year,
            u32::try_from(self.month).ok()?,
            u32::try_from(self.day).ok()?,
        )?;
        date.and_hms_opt(
            u32::try_from(self.hour).ok()?,
            u32::try_from(self.minute).ok()?,
            0,
        )
    }

    /// Leading digit of the version number, e.g. '6' for "ASTRA 6.2.1".
    pub fn major_version(&self) -> Option<char> {
        self.version.split_whitespace().nth(1)?.chars().next()
    }
}

/// The four descriptive strings of a header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSummary {
    pub rd_name: String,
    pub eq_name: String,
    pub version: String,
    pub xline1: String,
}

impl fmt::Display for HeaderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------- ASTRA res-file header -------")?;
        writeln!(f, "   {}", self.rd_name)?;
        writeln!(f, "   {}", self.eq_name)?;
        writeln!(f, "   {}", self.version)?;
        write!(f, "   {}", self.xline1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub scale: f64,
    pub offset: f64,
    pub raw: Vec<i16>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time_slices: Vec<Vec<f64>>,
    pub time: f64,
    pub constants: Vec<f64>,
    /// Opaque record kept verbatim, usually zero except the first byte.
    pub reserved: Vec<u8>,
    pub profiles: Vec<Profile>,
}

/// One profile of one frame, together with the frame's radius grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileView<'a> {
    pub radius: &'a [f64],
    pub time: f64,
    pub values: &'a [f64],
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl TimeSeries {
    pub fn with_capacity(cap: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(cap),
            values: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Non-fatal observations made while opening a file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Diagnostic {
    /// Frame decoding stopped on an error; frames read before it are kept.
    IncompleteRead { frames_read: usize, reason: String },
    /// Decoding ended before the end of the file.
    TrailingBytes { position: u64, file_size: u64 },
    /// The radial catalog declared more names than the first frame has profiles.
    CatalogTruncated { declared: usize, actual: usize },
    /// The first frame has more profiles than the radial catalog names.
    CatalogExtended { declared: usize, actual: usize },
}
