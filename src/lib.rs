//! Zero-copy conversion of named, typed, multi-component arrays between two
//! independently-owned array runtimes.
//!
//! ## The two worlds
//! - The **host** world ([`host`]) owns datasets of named arrays addressed by
//!   a runtime element-type tag, with interleaved (AoS) or planar (SoA)
//!   physical layouts, grouped into point and cell data.
//! - The **compute** world ([`compute`]) represents the same data as fields:
//!   a name, an association, and a type-erased array handle backed by one of
//!   several storage strategies (owned buffer, layout-tagged view over host
//!   memory, polymorphic/computed portal).
//!
//! ## The conversion engine
//! [`convert`] moves data between the worlds while preserving field semantics
//! (name, association, component count) and avoiding bulk copies wherever the
//! source memory is directly reusable:
//! - forward, [`convert_array`] wraps a host array into a field as a zero-copy
//!   view;
//! - reverse, [`convert_field`] materializes a handle into a host array by
//!   aliasing a view, stealing an owned buffer, or, only when the storage
//!   cannot relinquish a pointer, copying element-wise through its read
//!   portal;
//! - [`populate_compute_dataset`] / [`populate_host_dataset`] convert whole
//!   datasets with per-field failure containment, and [`convert_geometry`]
//!   handles the distinguished coordinate field whose failure is fatal.
//!
//! Conversions are synchronous, single-threaded, and never mutate the
//! semantic content of the data; the only shared state is the reference count
//! on aliased buffers.

pub mod compute;
pub mod convert;
pub mod dtype;
pub mod host;

pub use compute::handle::{ArrayHandle, HandleError, OwnedBuffer};
pub use compute::portal::{Portal, Resolved};
pub use compute::{Association, ComputeDataset, Field, ValueShape};
pub use convert::{
    ConvertError, FieldFlags, convert_array, convert_field, convert_geometry,
    populate_compute_dataset, populate_host_dataset,
};
pub use dtype::{Scalar, ScalarType};
pub use host::dataset::{AttributeSet, HostDataset, PointSet};
pub use host::{ArrayError, HostArray, Layout};
