// Model and log text sections following the signature

use crate::core::constants::SIGNATURE;
use crate::core::error::Result;
use crate::core::format::Step;
use crate::core::packet::PacketReader;
use std::io::{Read, Seek};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TextSections {
    pub model: Vec<String>,
    pub log: Vec<String>,
}

/// Reads string records until the first record that is not a string.
///
/// Records before the repeated signature form the model section, records
/// after it the log section. Anything after a further signature is skipped.
pub fn read_text_sections<R: Read + Seek>(reader: &mut PacketReader<R>) -> Result<TextSections> {
    let mut sections = TextSections::default();
    let mut section = 0;

    loop {
        let line = match reader.read_string_record()? {
            Step::Value(line) => line,
            Step::Stop(_) => break,
        };

        if line == SIGNATURE {
            section += 1;
        } else if section == 0 {
            sections.model.push(line);
        } else if section == 1 {
            sections.log.push(line);
        }
    }

    debug!(
        "Text sections: {} model lines, {} log lines",
        sections.model.len(),
        sections.log.len()
    );
    Ok(sections)
}

/// Names of the constants listed in the log.
///
/// The list starts after a line containing "constants:" and ends at the first
/// line without '='.
pub fn constant_names(log: &[String]) -> Vec<String> {
    let mut names = Vec::new();
    let mut section = 0;

    for line in log {
        if line.to_lowercase().contains("constants:") {
            section += 1;
        } else if section == 1 && !line.contains('=') {
            section += 1;
        } else if section == 1 {
            if let Some((name, _)) = line.split_once('=') {
                names.push(name.trim().to_string());
            }
        }
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::ResWriter;
    use std::io::Cursor;

    #[test]
    fn test_sections_split_by_signature() {
        let mut w = ResWriter::new();
        w.string("model line 1")
            .string("model line 2")
            .divider()
            .string("log line")
            .i32_packet(0);
        let mut r = PacketReader::new(Cursor::new(w.finish()));

        let sections = read_text_sections(&mut r).unwrap();
        assert_eq!(sections.model, vec!["model line 1", "model line 2"]);
        assert_eq!(sections.log, vec!["log line"]);
        // The non-string record is left for the next decoder.
        assert_eq!(r.read_i32_packet().unwrap(), 0);
    }

    #[test]
    fn test_constant_names() {
        let log: Vec<String> = [
            "run started",
            "Constants:",
            " AB = 1.0",
            "ZMJ=2",
            "end of list",
            "late = 3",
            "constants:",
            "again = 4",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(constant_names(&log), vec!["AB", "ZMJ"]);
    }

    #[test]
    fn test_no_constants() {
        let log = vec!["a = 1".to_string()];
        assert!(constant_names(&log).is_empty());
    }
}
