//! The conversion engine between the host and compute worlds.
//!
//! Forward ([`to_compute`]) wraps host arrays into compute fields without
//! moving data; reverse ([`from_compute`]) materializes compute handles back
//! into host arrays, preferring ownership transfer or aliasing over copying.
//! Dataset-level orchestrators convert whole attribute collections with
//! per-field failure containment.

pub mod error;
pub mod from_compute;
pub mod to_compute;

pub use error::ConvertError;
pub use from_compute::{convert_field, convert_geometry, populate_host_dataset};
pub use to_compute::{convert_array, populate_compute_dataset};

bitflags::bitflags! {
    /// Which host attribute associations the forward conversion visits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FieldFlags: u8 {
        const POINTS = 0b01;
        const CELLS = 0b10;
    }
}
