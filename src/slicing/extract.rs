use super::Slice;
use crate::error::{Result, SliceError};
use crate::volume::Volume;

/// Extract the (D-1)-dimensional cross-section of `volume` at `index` along
/// `axis`. Read-only with respect to the source volume.
pub fn extract_slice(volume: &Volume, axis: usize, index: usize) -> Result<Slice> {
    let extent = volume.extent(axis).ok_or_else(|| {
        SliceError::config(format!(
            "slicing axis {axis} out of range for {}-dimensional volume",
            volume.ndim()
        ))
    })?;
    if index >= extent {
        return Err(SliceError::Bounds {
            axis,
            index,
            extent,
        });
    }
    let buffer = volume.buffer().index_axis(axis, index);
    let region = volume.region().drop_axis(axis);
    Slice::new(buffer, region)
}
