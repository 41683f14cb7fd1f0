//! On-disk memoization of derived fields.
//!
//! Each diagnostic lives in its own store, `{dir}/{case}.{field}.zarr`. The
//! store carries a fingerprint of the inputs it was computed from; a store
//! whose fingerprint no longer matches is recomputed and overwritten.

use std::path::{Path, PathBuf};

use grid_store::{array_exists, FieldMetadata, FieldReader, FieldWriter, StoreConfig};
use tc_common::{Field3, LatLonGrid, TimeAxis};
use tracing::{info, warn};

use crate::error::Result;

/// Bumped whenever the computation behind a cached field changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// Identity of one cached field.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheKey {
    pub case: String,
    pub field: String,
    pub grid: LatLonGrid,
    pub time: TimeAxis,
    /// Nominal model levels the field was derived from.
    pub levels: Vec<f64>,
}

impl CacheKey {
    pub fn new(
        case: impl Into<String>,
        field: impl Into<String>,
        grid: &LatLonGrid,
        time: &TimeAxis,
        levels: &[f64],
    ) -> Self {
        Self {
            case: case.into(),
            field: field.into(),
            grid: grid.clone(),
            time: time.clone(),
            levels: levels.to_vec(),
        }
    }

    /// Readable digest of everything the cached values depend on.
    pub fn fingerprint(&self) -> String {
        let time = match (self.time.times.first(), self.time.times.last()) {
            (Some(first), Some(last)) => format!("{}..{}", first, last),
            _ => "empty".to_string(),
        };
        let levels: Vec<String> = self.levels.iter().map(|l| l.to_string()).collect();
        format!(
            "tc-derived/v{};case={};field={};shape={}x{}x{};lat={}..{};lon={}..{};time={};levels={}",
            CACHE_FORMAT_VERSION,
            self.case,
            self.field,
            self.time.len(),
            self.grid.nlat(),
            self.grid.nlon(),
            self.grid.lat.first().copied().unwrap_or_default(),
            self.grid.lat.last().copied().unwrap_or_default(),
            self.grid.lon.first().copied().unwrap_or_default(),
            self.grid.lon.last().copied().unwrap_or_default(),
            time,
            levels.join(",")
        )
    }
}

/// Where a field returned by [`DerivedFieldCache::get_or_compute`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Loaded,
    Computed,
}

/// Cache of derived fields for one case.
pub struct DerivedFieldCache {
    dir: PathBuf,
    writer: FieldWriter,
}

impl DerivedFieldCache {
    pub fn new(dir: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            dir: dir.into(),
            writer: FieldWriter::new(config),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Store path for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}.zarr", key.case, key.field))
    }

    /// Load the field for `key` if a matching store exists, otherwise run
    /// `compute` and persist its result.
    ///
    /// `metadata` describes the stored variable; its fingerprint is set here.
    pub fn get_or_compute<F>(
        &self,
        key: &CacheKey,
        metadata: FieldMetadata,
        compute: F,
    ) -> Result<(Field3, CacheOutcome)>
    where
        F: FnOnce() -> Result<Field3>,
    {
        let path = self.path_for(key);
        let fingerprint = key.fingerprint();

        if let Some(field) = self.load_matching(&path, &fingerprint, key) {
            info!(case = %key.case, field = %key.field, path = %path.display(), "Loaded cached field");
            return Ok((field, CacheOutcome::Loaded));
        }

        info!(case = %key.case, field = %key.field, "Computing field");
        let field = compute()?;

        std::fs::create_dir_all(&self.dir).map_err(grid_store::StoreError::from)?;
        self.writer
            .write_field3(&path, &field, &metadata.with_fingerprint(fingerprint))?;
        info!(case = %key.case, field = %key.field, path = %path.display(), "Cached field");

        Ok((field, CacheOutcome::Computed))
    }

    fn load_matching(&self, path: &Path, fingerprint: &str, key: &CacheKey) -> Option<Field3> {
        if !array_exists(path) {
            return None;
        }

        let loaded = FieldReader::open(path).and_then(|reader| {
            let meta = reader.metadata()?;
            if meta.fingerprint.as_deref() != Some(fingerprint) {
                return Ok(None);
            }
            reader.read_field3().map(Some)
        });

        match loaded {
            Ok(Some(field))
                if (field.nt, field.nlat, field.nlon)
                    == (key.time.len(), key.grid.nlat(), key.grid.nlon()) =>
            {
                Some(field)
            }
            Ok(_) => {
                warn!(
                    path = %path.display(),
                    "Cached field is stale, recomputing"
                );
                None
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Cached field is unreadable, recomputing"
                );
                None
            }
        }
    }
}
