//! Index + size descriptor delimiting a sub-array of a volume.

use crate::error::{Result, SliceError};
use serde::{Deserialize, Serialize};

/// A rectangular region of a D-dimensional volume: an origin index plus an
/// extent per dimension. Origins may be negative, matching the convention of
/// pipelines that track physical sub-regions of a larger acquisition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeRegion {
    /// Origin index per dimension.
    pub index: Vec<i64>,
    /// Extent per dimension.
    pub size: Vec<usize>,
}

impl VolumeRegion {
    pub fn new(index: Vec<i64>, size: Vec<usize>) -> Result<Self> {
        if index.len() != size.len() {
            return Err(SliceError::config(format!(
                "region origin has {} dimensions but size has {}",
                index.len(),
                size.len()
            )));
        }
        Ok(Self { index, size })
    }

    /// Region covering `size` with a zero origin.
    pub fn from_size(size: &[usize]) -> Self {
        Self {
            index: vec![0; size.len()],
            size: size.to_vec(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.size.len()
    }

    pub fn extent(&self, axis: usize) -> Option<usize> {
        self.size.get(axis).copied()
    }

    /// Total number of pixels covered.
    pub fn num_pixels(&self) -> usize {
        self.size.iter().product()
    }

    /// The (D-1)-dimensional region obtained by removing `axis`, i.e. the
    /// region of one cross-sectional slice. `axis` must be in range.
    pub fn drop_axis(&self, axis: usize) -> VolumeRegion {
        debug_assert!(axis < self.ndim(), "axis {axis} out of range");
        let index = self
            .index
            .iter()
            .enumerate()
            .filter_map(|(d, &i)| (d != axis).then_some(i))
            .collect();
        let size = self
            .size
            .iter()
            .enumerate()
            .filter_map(|(d, &s)| (d != axis).then_some(s))
            .collect();
        VolumeRegion { index, size }
    }
}
