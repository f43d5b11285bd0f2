//! Slice extraction and injection.
//!
//! A slice is the (D-1)-dimensional cross-section of a volume at one index
//! along the slicing axis. Extraction copies the cross-section out of the
//! source volume (the source is never mutated); injection writes a computed
//! slice back over the matching sub-region of an output volume and touches
//! nothing else. Because each index targets a disjoint sub-region, slices
//! can be produced and injected in any order.

mod extract;
mod inject;

pub use self::extract::extract_slice;
pub use self::inject::inject_slice;

use crate::error::{Result, SliceError};
use crate::volume::{PixelBuffer, PixelFormat, VolumeRegion};

/// The (D-1)-dimensional cross-section extracted at one index along the
/// slicing axis. Carries the region obtained by dropping that axis from the
/// volume's region, so downstream stages see the same origin/size metadata
/// the volume had along the remaining dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Slice {
    buffer: PixelBuffer,
    region: VolumeRegion,
}

impl Slice {
    pub fn new(buffer: PixelBuffer, region: VolumeRegion) -> Result<Self> {
        if region.size != buffer.shape() {
            return Err(SliceError::config(format!(
                "slice region size {:?} does not match buffer shape {:?}",
                region.size,
                buffer.shape()
            )));
        }
        Ok(Self { buffer, region })
    }

    /// Wrap a buffer with a zero-origin region covering its full shape.
    pub fn from_buffer(buffer: PixelBuffer) -> Self {
        let region = VolumeRegion::from_size(buffer.shape());
        Self { buffer, region }
    }

    pub fn format(&self) -> PixelFormat {
        self.buffer.format()
    }

    pub fn ndim(&self) -> usize {
        self.buffer.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.buffer.shape()
    }

    pub fn region(&self) -> &VolumeRegion {
        &self.region
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn into_buffer(self) -> PixelBuffer {
        self.buffer
    }
}

#[cfg(test)]
mod tests;
