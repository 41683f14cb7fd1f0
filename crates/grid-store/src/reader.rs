//! Reading fields back from Zarr V3 stores.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tc_common::{Field3, Field4};
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs_filesystem::FilesystemStore;

use crate::error::{Result, StoreError};
use crate::metadata::FieldMetadata;

/// True if `path` holds a Zarr V3 array written by [`crate::FieldWriter`].
pub fn array_exists(path: &Path) -> bool {
    path.join("zarr.json").is_file()
}

/// Reader for a single stored field.
pub struct FieldReader {
    array: Array<FilesystemStore>,
    path: PathBuf,
}

impl FieldReader {
    /// Open the array at the root of the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if !array_exists(path) {
            return Err(StoreError::open_failed(format!(
                "no Zarr array at {}",
                path.display()
            )));
        }

        let store = FilesystemStore::new(path)
            .map_err(|e| StoreError::open_failed(e.to_string()))?;
        let array = Array::open(Arc::new(store), "/")
            .map_err(|e| StoreError::open_failed(e.to_string()))?;

        if !matches!(array.data_type(), DataType::Float32) {
            return Err(StoreError::invalid_metadata(format!(
                "{}: expected float32 data",
                path.display()
            )));
        }

        Ok(Self {
            array,
            path: path.to_path_buf(),
        })
    }

    pub fn shape(&self) -> Vec<usize> {
        self.array.shape().iter().map(|&n| n as usize).collect()
    }

    /// Field metadata stored in the array attributes.
    pub fn metadata(&self) -> Result<FieldMetadata> {
        FieldMetadata::from_attributes(self.array.attributes())
    }

    /// Read a `(time, lat, lon)` array.
    pub fn read_field3(&self) -> Result<Field3> {
        let shape = self.shape();
        let &[nt, nlat, nlon] = shape.as_slice() else {
            return Err(self.rank_error(3, shape.len()));
        };
        let data = self.read_all()?;
        Ok(Field3::new(nt, nlat, nlon, data)?)
    }

    /// Read a `(time, level, lat, lon)` array.
    pub fn read_field4(&self) -> Result<Field4> {
        let shape = self.shape();
        let &[nt, nlev, nlat, nlon] = shape.as_slice() else {
            return Err(self.rank_error(4, shape.len()));
        };
        let data = self.read_all()?;
        Ok(Field4::new(nt, nlev, nlat, nlon, data)?)
    }

    fn read_all(&self) -> Result<Vec<f32>> {
        let shape = self.array.shape().to_vec();
        if shape.iter().any(|&n| n == 0) {
            return Ok(Vec::new());
        }

        let subset = ArraySubset::new_with_start_shape(vec![0; shape.len()], shape)
            .map_err(|e| StoreError::read_failed(e.to_string()))?;

        let data: Vec<f32> = self
            .array
            .retrieve_array_subset_elements(&subset)
            .map_err(|e| StoreError::read_failed(format!("{}: {}", self.path.display(), e)))?;

        Ok(data)
    }

    fn rank_error(&self, expected: usize, actual: usize) -> StoreError {
        StoreError::invalid_metadata(format!(
            "{}: expected {}-D array, found {}-D",
            self.path.display(),
            expected,
            actual
        ))
    }
}
