// ASTRA res-file reader
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::error::{ResError, Result};
pub use crate::core::format::{
    Diagnostic, Frame, Header, HeaderSummary, OutputCatalog, Profile, ProfileView, TimeSeries,
};
pub use crate::core::reader::{FrameSelector, ResFile, VarKey};

#[cfg(test)]
mod tests {
    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(SIGNATURE.len(), MAX_SIGNATURE_LEN as usize);
        assert!(SIGNATURE.chars().all(|c| c == '^'));
        assert_eq!(RADIAL_PREFIX.len(), 7);
        assert_eq!(TIME_PREFIX, ["#time"]);
    }
}
