//! Diagnostic fields for TC-like object detection.
//!
//! Model output on hybrid levels is reduced to the single-level fields the
//! object tracker consumes: winds at 300 and 850 hPa, relative vorticity at
//! 850 hPa and sea-level pressure.
//!
//! # Architecture
//!
//! ```text
//! ModelSource ──► hybrid_pressure ──► interpolate_to_pressure ──► U300/V300/U850/V850
//!      │                 │
//!      │                 └──► bracketing_levels ──► VorticityEngine ──► vort850
//!      │                                               (rayon pool, one task per step)
//!      └──► lowest level T, Q, Z3 ──► sea_level_pressure ──► PSL
//!
//! every computed field ──► DerivedFieldCache ({case}.{field}.zarr, fingerprinted)
//! DiagnosticSet ──► tracker_inputs/{FIELD}.zarr (SH-inverted vorticity, PS)
//! ```

pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod slp;
pub mod vertical;
pub mod vorticity;

pub use cache::{CacheKey, CacheOutcome, DerivedFieldCache, CACHE_FORMAT_VERSION};
pub use config::DiagnosticsConfig;
pub use diagnostics::{pressure_field, DiagnosticSet, Diagnostics, TRACKER_INPUT_DIR};
pub use error::{DerivedFieldError, Result};
pub use slp::sea_level_pressure;
pub use vertical::{
    bracket, bracketing_levels, hybrid_pressure, interp_column, interpolate_to_level,
    interpolate_to_pressure, Bracket, P300, P850,
};
pub use vorticity::{FiniteDifferenceVorticity, VorticityEngine, VorticityOperator, EARTH_RADIUS};
