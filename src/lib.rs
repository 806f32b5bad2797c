//! Delta and dictionary compression for timestamped scoreboard logs.
//!
//! A log of full snapshots is stored as one baseline plus structural deltas.
//! Clock-derived fields are replaced by markers before diffing and repeated
//! object keys by short dictionary codes. Decompression reproduces the input
//! exactly.
//!
//! ```
//! use scorepack::{compress, decompress, Config, Entry};
//!
//! let entries: Vec<Entry> = serde_json::from_str(
//!     r#"[{"t":0,"data":{"Score":1}},{"t":1,"data":{"Score":2}}]"#,
//! ).unwrap();
//! let log = compress(&entries, &Config::default()).unwrap();
//! assert_eq!(decompress(&log, &Config::default()).unwrap(), entries);
//! ```

pub mod artifact;
pub mod clock;
pub mod compress;
pub mod config;
pub mod decompress;
pub mod delta;
pub mod dictionary;
pub mod diff;
pub mod error;
pub mod io_utils;
pub mod logger;
pub mod patch;
pub mod sentinel;
pub mod stats;
pub mod value;
pub mod wire;

pub use artifact::{CompressedLog, Frame, Step};
pub use compress::compress;
pub use config::{Config, FieldPath, SentinelConfig};
pub use decompress::decompress;
pub use delta::{Delta, ListDelta, MapDelta, Op};
pub use dictionary::Dictionary;
pub use diff::diff;
pub use error::{Result, ScorepackError};
pub use logger::IncrementalLogger;
pub use patch::{apply, apply_in_place};
pub use stats::CompressionReport;
pub use value::{Entry, Map, Marker, Value};

/// Artifact format version written and accepted.
pub const FORMAT_VERSION: u64 = 1;
/// Wire token for a deleted key or list position.
pub const DELETE_TOKEN: &str = "__$DEL$__";
/// List delta key carrying the new length.
pub const LEN_KEY: &str = "__len";
/// Wrapper key for a literal map that would otherwise read as a delta.
pub const SET_KEY: &str = "__set";
/// Wire token for [`Marker::MatchesClock`].
pub const RT_TOKEN: &str = "=RT";
/// Wire token for [`Marker::TickAdvance`].
pub const TICK_TOKEN: &str = "=TICK";
/// Leading character reserved for marker tokens; literal strings starting
/// with it are escaped by doubling it.
pub const ESCAPE: char = '=';

/// Parse a JSON array of `{t, data}` entries.
pub fn parse_entries(text: &str) -> Result<Vec<Entry>> {
    Ok(serde_json::from_str(text)?)
}
