// Res file document: one-pass decode, then read-only queries

use crate::core::constants::PLACEHOLDER_NAME;
use crate::core::error::{ResError, Result};
use crate::core::format::*;
use crate::core::frame::read_frame;
use crate::core::header::read_header;
use crate::core::packet::PacketReader;
use crate::core::text::{constant_names, read_text_sections};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Output variable addressed by catalog name or position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKey<'a> {
    Name(&'a str),
    Index(usize),
}

impl<'a> From<&'a str> for VarKey<'a> {
    fn from(name: &'a str) -> Self {
        VarKey::Name(name)
    }
}

impl<'a> From<&'a String> for VarKey<'a> {
    fn from(name: &'a String) -> Self {
        VarKey::Name(name.as_str())
    }
}

impl From<usize> for VarKey<'_> {
    fn from(index: usize) -> Self {
        VarKey::Index(index)
    }
}

/// Which frame a profile is taken from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameSelector {
    Index(usize),
    /// First frame whose timestamp is not before the given time, or the
    /// last frame when the time is past the end or NaN.
    Time(f64),
}

#[derive(Debug)]
pub struct ResFile {
    path: Option<PathBuf>,
    model: Vec<String>,
    log: Vec<String>,
    const_names: Vec<String>,
    header: Header,
    frames: Vec<Frame>,
    rad_times: Vec<f64>,
    time_times: Vec<f64>,
    file_size: u64,
    end_position: u64,
    diagnostics: Vec<Diagnostic>,
}

impl ResFile {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening res file: {}", path.display());

        let file = File::open(path)?;
        let mut res = Self::from_reader(BufReader::new(file))?;
        res.path = Some(path.to_path_buf());
        Ok(res)
    }

    /// Decodes a whole res file from the current position of `inner`.
    pub fn from_reader<R: Read + Seek>(mut inner: R) -> Result<Self> {
        let start = inner.stream_position()?;
        let file_size = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(start))?;

        let mut reader = PacketReader::new(inner);
        reader.read_signature_record()?;

        let sections = read_text_sections(&mut reader)?;
        let const_names = constant_names(&sections.log);

        let mut header = read_header(&mut reader)?;

        let mut diagnostics = Vec::new();
        let frames = read_frames(&mut reader, &mut diagnostics);

        let end_position = reader.position()?;
        if end_position != file_size {
            warn!(
                "End of the file not reached: stopped at {} of {} bytes",
                end_position, file_size
            );
            diagnostics.push(Diagnostic::TrailingBytes {
                position: end_position,
                file_size,
            });
        }

        reconcile_catalog(&mut header.rad_catalog, &frames, &mut diagnostics);

        let rad_times = frames.iter().map(|f| f.time).collect();
        let time_times = frames
            .iter()
            .flat_map(|f| f.time_slices.iter())
            .map(|slice| slice.first().copied().unwrap_or(f64::NAN))
            .collect();

        info!(
            "Res file read: {} frames, {} profiles, {} signals",
            frames.len(),
            frames.first().map_or(0, |f| f.profiles.len()),
            header.time_catalog.len()
        );

        Ok(Self {
            path: None,
            model: sections.model,
            log: sections.log,
            const_names,
            header,
            frames,
            rad_times,
            time_times,
            file_size,
            end_position,
            diagnostics,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn model(&self) -> &[String] {
        &self.model
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn const_names(&self) -> &[String] {
        &self.const_names
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn summary(&self) -> HeaderSummary {
        self.header.summary()
    }

    pub fn rad_names(&self) -> &[String] {
        &self.header.rad_catalog.names
    }

    pub fn time_names(&self) -> &[String] {
        &self.header.time_catalog.names
    }

    /// Timestamp of every frame.
    pub fn rad_times(&self) -> &[f64] {
        &self.rad_times
    }

    /// Timestamp of every time slice, in file order.
    pub fn time_times(&self) -> &[f64] {
        &self.time_times
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Number of profiles in the first frame.
    pub fn profile_count(&self) -> usize {
        self.frames.first().map_or(0, |f| f.profiles.len())
    }

    pub fn signal_count(&self) -> usize {
        self.header.time_catalog.len()
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn end_position(&self) -> u64 {
        self.end_position
    }

    pub fn fully_consumed(&self) -> bool {
        self.end_position == self.file_size
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Resolves a time to a frame index.
    pub fn frame_index_at(&self, time: f64) -> Option<usize> {
        if self.rad_times.is_empty() {
            return None;
        }
        let last = self.rad_times.len() - 1;
        if time.is_nan() {
            return Some(last);
        }
        let index = self.rad_times.partition_point(|&t| t < time);
        Some(index.min(last))
    }

    /// Profile `key` of one frame, with that frame's radius and timestamp.
    pub fn find_profile<'k>(
        &self,
        key: impl Into<VarKey<'k>>,
        at: FrameSelector,
    ) -> Result<ProfileView<'_>> {
        let profile_index = resolve(key.into(), &self.header.rad_catalog)?;

        let index = match at {
            FrameSelector::Index(index) => index,
            FrameSelector::Time(time) => self.frame_index_at(time).unwrap_or(0),
        };
        let frame = self.frames.get(index).ok_or(ResError::IndexOutOfRange {
            what: "frame",
            index,
            len: self.frames.len(),
        })?;

        let profile_at = move |i: usize| {
            frame.profiles.get(i).ok_or(ResError::IndexOutOfRange {
                what: "profile",
                index: i,
                len: frame.profiles.len(),
            })
        };
        let radius = profile_at(0)?;
        let profile = profile_at(profile_index)?;

        Ok(ProfileView {
            radius: &radius.values,
            time: self.rad_times[index],
            values: &profile.values,
        })
    }

    /// Time signal `key` across all frames and slices, in file order.
    pub fn find_signal<'k>(&self, key: impl Into<VarKey<'k>>) -> Result<TimeSeries> {
        let index = resolve(key.into(), &self.header.time_catalog)?;

        let mut series = TimeSeries::with_capacity(self.time_times.len());
        series.timestamps.extend_from_slice(&self.time_times);
        for slice in self.frames.iter().flat_map(|f| f.time_slices.iter()) {
            let value = slice.get(index).ok_or(ResError::IndexOutOfRange {
                what: "signal",
                index,
                len: slice.len(),
            })?;
            series.values.push(*value);
        }
        Ok(series)
    }
}

fn resolve(key: VarKey<'_>, catalog: &OutputCatalog) -> Result<usize> {
    match key {
        VarKey::Index(index) => Ok(index),
        VarKey::Name(name) => catalog
            .index_of(name)
            .ok_or_else(|| ResError::NameNotFound(name.to_string())),
    }
}

/// Reads frames until the stream ends. A frame that fails to decode ends the
/// loop; frames before it are kept.
fn read_frames<R: Read + Seek>(
    reader: &mut PacketReader<R>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Frame> {
    let mut frames = Vec::new();
    loop {
        match read_frame(reader) {
            Ok(Some(frame)) => {
                debug!(
                    "Frame {}: t={}, {} slices, {} profiles",
                    frames.len(),
                    frame.time,
                    frame.time_slices.len(),
                    frame.profiles.len()
                );
                frames.push(frame);
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Not all the frames have been read: frame {}: {}", frames.len(), e);
                diagnostics.push(Diagnostic::IncompleteRead {
                    frames_read: frames.len(),
                    reason: e.to_string(),
                });
                break;
            }
        }
    }
    frames
}

/// Aligns the radial catalog with the profile count of the first frame.
/// Without frames the count is zero and the catalog ends up empty.
fn reconcile_catalog(
    catalog: &mut OutputCatalog,
    frames: &[Frame],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let actual = frames.first().map_or(0, |f| f.profiles.len());
    let declared = catalog.len();

    if declared > actual {
        warn!(
            "Actual profile number ({}) is less than the expected number ({})",
            actual, declared
        );
        catalog.truncate(actual);
        diagnostics.push(Diagnostic::CatalogTruncated { declared, actual });
    } else if declared < actual {
        warn!(
            "Actual profile number ({}) exceeds the expected number ({})",
            actual, declared
        );
        catalog.pad_with_placeholders(actual, PLACEHOLDER_NAME);
        diagnostics.push(Diagnostic::CatalogExtended { declared, actual });
    }
}
