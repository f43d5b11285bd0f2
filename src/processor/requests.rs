//! Region negotiation between the slice loop and its producing stage.
//!
//! Slices are computed independently and atomically, so the engine does not
//! stream sub-regions: any partial output request is expanded to the whole
//! volume, and the input needed for it covers the full extent along the
//! slicing axis. Finer-grained streaming along the non-sliced dimensions is
//! a possible future optimization; the current behaviour matches pipelines
//! that recompute whole volumes per request.

use crate::error::{Result, SliceError};
use crate::volume::VolumeRegion;

/// Expand a requested output region to the volume's entire region
/// (full-coverage rule).
pub fn enlarge_output_requested_region(
    _requested: &VolumeRegion,
    largest: &VolumeRegion,
) -> VolumeRegion {
    largest.clone()
}

/// The input region required to produce `output_requested`: the same region
/// with the slicing-axis dimension widened to the volume's full extent.
pub fn input_requested_region(
    output_requested: &VolumeRegion,
    largest: &VolumeRegion,
    axis: usize,
) -> Result<VolumeRegion> {
    if output_requested.ndim() != largest.ndim() {
        return Err(SliceError::config(format!(
            "requested region has {} dimensions, volume has {}",
            output_requested.ndim(),
            largest.ndim()
        )));
    }
    if axis >= largest.ndim() {
        return Err(SliceError::config(format!(
            "slicing axis {axis} out of range for {}-dimensional volume",
            largest.ndim()
        )));
    }
    let mut region = output_requested.clone();
    region.index[axis] = largest.index[axis];
    region.size[axis] = largest.size[axis];
    Ok(region)
}
