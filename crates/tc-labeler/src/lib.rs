//! Labeling of tracked TC-like objects and the per-case output files.
//!
//! The tracker leaves a raw mask of storm ids and a track file. Storms that
//! pass the genesis filter are copied from the raw mask into a label
//! volume, which is written together with a summary report and a GrADS
//! descriptor. The tracker's Fortran parameter file is refreshed from the
//! case grid before tracking.

pub mod assembler;
pub mod descriptor;
pub mod error;
pub mod mask;
pub mod report;
pub mod tracker_params;

pub use assembler::{
    LabelJob, LabeledCase, OutputAssembler, DESCRIPTOR_FILE, LABEL_STORE, LABEL_VARIABLE,
    SUMMARY_FILE, TRACK_FILE,
};
pub use descriptor::{GradsDescriptor, MASK_FILE};
pub use error::{LabelError, Result};
pub use mask::{LabelVolume, RawMask};
pub use report::Summary;
pub use tracker_params::TrackerParameters;
