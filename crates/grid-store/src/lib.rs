//! Zarr V3 persistence for gridded fields.
//!
//! Every array written here is a single Zarr V3 array stored at the root of
//! its own filesystem store (`<name>.zarr/`), chunked one time step per
//! chunk. Coordinate metadata travels in the array attributes as a
//! serialized [`FieldMetadata`].
//!
//! # Architecture
//!
//! ```text
//! ModelSource (ZarrModelSource / MemorySource)
//!      │  U, V, T, Q, Z3, PS, SST/TS + coords.json
//!      ▼
//! derived-fields ──► FieldWriter ──► <case>.U300.zarr, <case>.vort850.zarr, ...
//!      ▲                                  │
//!      └────────── FieldReader ◄──────────┘   (cache hit)
//! ```

pub mod config;
pub mod error;
pub mod metadata;
pub mod reader;
pub mod source;
pub mod writer;

pub use config::{StoreConfig, ZarrCompression};
pub use error::{Result, StoreError};
pub use metadata::FieldMetadata;
pub use reader::{array_exists, FieldReader};
pub use source::{
    vars, CaseCoordinates, HybridCoefficients, MemorySource, ModelSource, ZarrModelSource,
};
pub use writer::{FieldWriter, ZarrWriteResult};
