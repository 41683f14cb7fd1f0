//! Zarr V3 writer for gridded fields.
//!
//! Arrays are written to the root of a fresh filesystem store. An existing
//! store at the same path is replaced, so a recomputed diagnostic never
//! mixes chunks with a stale one.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tc_common::{Field3, Field4, MISSING_VALUE};
use tracing::debug;
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::{ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};
use zarrs_filesystem::FilesystemStore;

use crate::config::{StoreConfig, ZarrCompression};
use crate::error::{Result, StoreError};
use crate::metadata::FieldMetadata;

/// Result of writing a Zarr array.
#[derive(Debug)]
pub struct ZarrWriteResult {
    /// Store directory.
    pub path: PathBuf,
    /// Array shape, leading dimension is time.
    pub shape: Vec<u64>,
    /// Total uncompressed bytes written.
    pub bytes_written: u64,
}

/// Writer for creating Zarr V3 arrays from fields.
pub struct FieldWriter {
    config: StoreConfig,
}

impl FieldWriter {
    /// Create a new FieldWriter with the given configuration.
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    /// Write a `(time, lat, lon)` field.
    pub fn write_field3(
        &self,
        path: &Path,
        field: &Field3,
        metadata: &FieldMetadata,
    ) -> Result<ZarrWriteResult> {
        let shape = vec![field.nt as u64, field.nlat as u64, field.nlon as u64];
        self.write_array(path, shape, &field.data, metadata)
    }

    /// Write a `(time, level, lat, lon)` field.
    pub fn write_field4(
        &self,
        path: &Path,
        field: &Field4,
        metadata: &FieldMetadata,
    ) -> Result<ZarrWriteResult> {
        let shape = field.shape().iter().map(|&n| n as u64).collect();
        self.write_array(path, shape, &field.data, metadata)
    }

    fn write_array(
        &self,
        path: &Path,
        shape: Vec<u64>,
        data: &[f32],
        metadata: &FieldMetadata,
    ) -> Result<ZarrWriteResult> {
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        std::fs::create_dir_all(path)?;

        let store = FilesystemStore::new(path)
            .map_err(|e| StoreError::StorageError(e.to_string()))?;
        let store = Arc::new(store);

        let array = self.build_array(store, &shape, metadata)?;

        array
            .store_metadata()
            .map_err(|e| StoreError::write_failed(e.to_string()))?;

        if !data.is_empty() {
            let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape.clone())
                .map_err(|e| StoreError::write_failed(e.to_string()))?;

            array
                .store_array_subset_elements(&subset, data)
                .map_err(|e| StoreError::write_failed(e.to_string()))?;
        }

        let bytes_written = std::mem::size_of_val(data) as u64;
        debug!(
            path = %path.display(),
            field = %metadata.name,
            shape = ?shape,
            bytes = bytes_written,
            "Wrote Zarr array"
        );

        Ok(ZarrWriteResult {
            path: path.to_path_buf(),
            shape,
            bytes_written,
        })
    }

    /// Build a Zarr array with the configured settings.
    fn build_array<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        storage: Arc<S>,
        shape: &[u64],
        metadata: &FieldMetadata,
    ) -> Result<zarrs::array::Array<S>> {
        let attrs = metadata.to_attributes()?;

        // One chunk per `time_chunk` steps, full extent elsewhere
        let chunk_shape: Vec<u64> = shape
            .iter()
            .enumerate()
            .map(|(d, &n)| {
                if d == 0 {
                    (self.config.time_chunk as u64).min(n).max(1)
                } else {
                    n.max(1)
                }
            })
            .collect();

        let chunk_grid: zarrs::array::ChunkGrid = chunk_shape
            .try_into()
            .map_err(|e| StoreError::ConfigError(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            shape.to_vec(),
            DataType::Float32,
            chunk_grid,
            FillValue::from(MISSING_VALUE),
        );
        let mut builder = binding.attributes(attrs);

        if self.config.compression != ZarrCompression::None {
            let codec = self.create_compression_codec()?;
            builder = builder.bytes_to_bytes_codecs(vec![codec]);
        }

        builder
            .build(storage, "/")
            .map_err(|e| StoreError::write_failed(e.to_string()))
    }

    /// Create the compression codec based on configuration.
    fn create_compression_codec(
        &self,
    ) -> Result<Arc<dyn zarrs::array::codec::BytesToBytesCodecTraits>> {
        let level = BloscCompressionLevel::try_from(self.config.compression_level)
            .map_err(|_| StoreError::ConfigError("Invalid compression level".to_string()))?;

        let shuffle = if self.config.shuffle {
            BloscShuffleMode::Shuffle
        } else {
            BloscShuffleMode::NoShuffle
        };

        // typesize is required when shuffle is enabled
        let typesize = if self.config.shuffle { Some(4) } else { None };

        let compressor = match self.config.compression {
            ZarrCompression::None => {
                return Err(StoreError::ConfigError(
                    "No compression configured".to_string(),
                ))
            }
            ZarrCompression::BloscLz4 => BloscCompressor::LZ4,
            ZarrCompression::BloscZstd => BloscCompressor::Zstd,
        };

        let codec = BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| StoreError::ConfigError(e.to_string()))?;

        Ok(Arc::new(codec))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tc_common::{LatLonGrid, TimeAxis};

    fn metadata(nt: usize) -> FieldMetadata {
        let grid = LatLonGrid::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let start = chrono::NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let time = TimeAxis::regular(start, chrono::Duration::hours(1), nt);
        FieldMetadata::new("TEST", &grid, &time)
    }

    #[test]
    fn test_write_field3_uncompressed() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("test.zarr");

        let writer = FieldWriter::new(StoreConfig {
            compression: ZarrCompression::None,
            ..Default::default()
        });
        let field = Field3::new(2, 3, 4, (0..24).map(|v| v as f32).collect()).unwrap();

        let result = writer
            .write_field3(&path, &field, &metadata(2))
            .expect("Failed to write");

        assert_eq!(result.shape, vec![2, 3, 4]);
        assert_eq!(result.bytes_written, 24 * 4);
        assert!(path.join("zarr.json").is_file());
    }

    #[test]
    fn test_write_replaces_existing_store() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("test.zarr");
        std::fs::create_dir_all(path.join("c")).unwrap();
        std::fs::write(path.join("c").join("stale"), b"x").unwrap();

        let writer = FieldWriter::new(StoreConfig::default());
        let field = Field3::filled(1, 3, 4, 1.0);
        writer
            .write_field3(&path, &field, &metadata(1))
            .expect("Failed to write");

        assert!(!path.join("c").join("stale").exists());
    }
}
