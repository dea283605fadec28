// Format constants for ASTRA res files

/// Magic string opening the file and separating the model and log sections.
pub const SIGNATURE: &str = "^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^";
pub const MAX_SIGNATURE_LEN: i32 = 32;

// Header string widths
pub const RD_NAME_LEN: usize = 40;
pub const EQ_NAME_LEN: usize = 40;
pub const VERSION_LEN: usize = 32;
pub const XLINE_LEN: usize = 132;

// Catalog names are stored as char[4], extended grid names as char[6]
pub const OUTPUT_NAME_WIDTH: usize = 4;
pub const GRID_NAME_WIDTH: usize = 6;

pub const NEQNS: usize = 7;
pub const NARRX: usize = 67;

/// Synthetic names preceding the radial catalog stored in the file.
pub const RADIAL_PREFIX: &[&str] = &["#radius", "#x1", "#x2", "#x3", "#x4", "#x5", "#x6"];
/// Synthetic names preceding the time catalog stored in the file.
pub const TIME_PREFIX: &[&str] = &["#time"];

/// Base name for profiles present in frames but missing from the catalog.
pub const PLACEHOLDER_NAME: &str = "#last";

// Profile record: scale(f64) offset(f64) then i16 samples
pub const PROFILE_PREFIX_SIZE: usize = 8 + 8;

// A record of exactly this length where a profile is expected is the next
// frame's slice count.
pub const INT_RECORD_SIZE: i32 = 4;

// Sample conversion: offset + (BIAS + raw) * scale / SPAN
pub const SAMPLE_BIAS: f64 = 32768.0;
pub const SAMPLE_SPAN: f64 = 65535.0;
