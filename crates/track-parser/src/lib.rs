//! Track-file parsing and the storm genesis filter.
//!
//! ```text
//! track file ──► TrackGroups (marker state machine) ──► TrackGroup
//!                                                          │
//!   SST field ──► GenesisFilter::qualify ◄─────────────────┘
//!                      │  lifetime >= 36 steps, any position with SST >= 299.15 K
//!                      ▼
//!               Option<QualifiedStorm>
//! ```

pub mod error;
pub mod groups;
pub mod lifetime;
pub mod record;

pub use error::{Result, TrackError};
pub use groups::{is_marker, TrackGroup, TrackGroups, TrackLine};
pub use lifetime::{GenesisFilter, QualifiedStorm, MIN_LIFETIME_STEPS, SST_THRESHOLD_K};
pub use record::{GridIndex, StormHeader, TrackPosition};
