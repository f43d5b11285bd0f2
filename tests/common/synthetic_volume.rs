use ndarray::{ArrayD, Dimension, IxDyn};
use slicewise::{PixelBuffer, Volume};

/// Volume whose voxel value encodes its coordinates. Deterministic, distinct
/// across slices, and sensitive to the slicing axis.
pub fn gradient_volume_u8(shape: &[usize]) -> Volume {
    assert!(!shape.is_empty(), "volume needs at least one dimension");
    let mut data = ArrayD::zeros(IxDyn(shape));
    for (idx, value) in data.indexed_iter_mut() {
        let coords = idx.slice();
        let mut acc = 0usize;
        for (d, &c) in coords.iter().enumerate() {
            acc += c * (7 * d + 3);
        }
        *value = (acc % 251) as u8;
    }
    Volume::new(PixelBuffer::U8(data))
}

/// Volume filled with a single value.
pub fn constant_volume_u8(shape: &[usize], value: u8) -> Volume {
    Volume::new(PixelBuffer::U8(ArrayD::from_elem(IxDyn(shape), value)))
}
