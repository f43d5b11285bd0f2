use super::Slice;
use crate::error::{Result, SliceError};
use crate::volume::Volume;

/// Write `slice` over the cross-section of `volume` at `index` along `axis`.
/// Mutates only the targeted sub-region.
pub fn inject_slice(slice: &Slice, axis: usize, index: usize, volume: &mut Volume) -> Result<()> {
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
    if slice.format() != volume.format() {
        return Err(SliceError::config(format!(
            "cannot inject a {} slice into a {} volume",
            slice.format(),
            volume.format()
        )));
    }
    let expected: Vec<usize> = volume
        .shape()
        .iter()
        .enumerate()
        .filter_map(|(d, &s)| (d != axis).then_some(s))
        .collect();
    if expected != slice.shape() {
        return Err(SliceError::config(format!(
            "slice shape {:?} does not match volume cross-section {expected:?}",
            slice.shape()
        )));
    }
    volume.buffer_mut().assign_axis(axis, index, slice.buffer())
}
