// Error handling for the res reader

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResError>;

#[derive(Error, Debug)]
pub enum ResError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("End of stream")]
    EndOfStream,

    #[error("Truncated {context}: expected {expected} bytes, got {found}")]
    Truncated {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid signature: got {0:?}")]
    InvalidSignature(String),

    #[error("Wrong packet format ({leading} != {trailing})")]
    PacketMismatch { leading: i32, trailing: i32 },

    #[error("Packet too large: {size} bytes (max {max})")]
    PacketTooLarge { size: i32, max: i32 },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Name not found: {0}")]
    NameNotFound(String),

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

impl ResError {
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, ResError::EndOfStream)
    }

    /// Framing, signature and layout failures. These abort an open.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ResError::InvalidSignature(_)
                | ResError::PacketMismatch { .. }
                | ResError::PacketTooLarge { .. }
                | ResError::Format(_)
        )
    }
}
