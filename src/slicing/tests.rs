use super::*;
use crate::error::SliceError;
use crate::volume::{PixelValue, Volume};

fn gradient_volume(shape: &[usize]) -> Volume {
    let mut volume = Volume::new(PixelBuffer::zeros(PixelFormat::U8, shape));
    let mut counter = 0u8;
    fill(&mut volume, shape, &mut vec![], &mut counter);
    volume
}

fn fill(volume: &mut Volume, shape: &[usize], prefix: &mut Vec<usize>, counter: &mut u8) {
    if prefix.len() == shape.len() {
        volume
            .set(prefix, PixelValue::U8(*counter))
            .expect("coordinate in range");
        *counter = counter.wrapping_add(1);
        return;
    }
    for i in 0..shape[prefix.len()] {
        prefix.push(i);
        fill(volume, shape, prefix, counter);
        prefix.pop();
    }
}

#[test]
fn extract_matches_direct_pixel_reads() {
    let volume = gradient_volume(&[3, 4, 2]);
    let slice = extract_slice(&volume, 1, 2).unwrap();
    assert_eq!(slice.shape(), &[3, 2]);
    for i in 0..3 {
        for k in 0..2 {
            assert_eq!(slice.buffer().get(&[i, k]), volume.get(&[i, 2, k]));
        }
    }
}

#[test]
fn extract_index_out_of_extent_is_bounds_error() {
    let volume = gradient_volume(&[3, 4, 2]);
    match extract_slice(&volume, 2, 2) {
        Err(SliceError::Bounds {
            axis,
            index,
            extent,
        }) => {
            assert_eq!((axis, index, extent), (2, 2, 2));
        }
        other => panic!("expected bounds error, got {other:?}"),
    }
}

#[test]
fn extract_axis_out_of_range_is_configuration_error() {
    let volume = gradient_volume(&[3, 4, 2]);
    assert!(matches!(
        extract_slice(&volume, 3, 0),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn inject_round_trip_restores_cross_section() {
    let volume = gradient_volume(&[3, 4, 2]);
    let slice = extract_slice(&volume, 0, 1).unwrap();
    let mut target = Volume::new(PixelBuffer::zeros(PixelFormat::U8, &[3, 4, 2]));
    inject_slice(&slice, 0, 1, &mut target).unwrap();
    assert_eq!(extract_slice(&target, 0, 1).unwrap(), slice);
}

#[test]
fn inject_leaves_other_slices_untouched() {
    let volume = gradient_volume(&[2, 3, 3]);
    let slice = extract_slice(&volume, 2, 1).unwrap();
    let mut target = Volume::new(PixelBuffer::zeros(PixelFormat::U8, &[2, 3, 3]));
    inject_slice(&slice, 2, 1, &mut target).unwrap();
    let zeros = PixelBuffer::zeros(PixelFormat::U8, &[2, 3]);
    assert_eq!(*extract_slice(&target, 2, 0).unwrap().buffer(), zeros);
    assert_eq!(*extract_slice(&target, 2, 2).unwrap().buffer(), zeros);
}

#[test]
fn inject_rejects_format_mismatch() {
    let slice = Slice::from_buffer(PixelBuffer::zeros(PixelFormat::U16, &[3, 4]));
    let mut target = Volume::new(PixelBuffer::zeros(PixelFormat::U8, &[3, 4, 2]));
    assert!(matches!(
        inject_slice(&slice, 2, 0, &mut target),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn inject_rejects_shape_mismatch() {
    let slice = Slice::from_buffer(PixelBuffer::zeros(PixelFormat::U8, &[4, 4]));
    let mut target = Volume::new(PixelBuffer::zeros(PixelFormat::U8, &[3, 4, 2]));
    assert!(matches!(
        inject_slice(&slice, 2, 0, &mut target),
        Err(SliceError::Configuration(_))
    ));
}

#[test]
fn slice_region_drops_the_sliced_axis() {
    let buffer = PixelBuffer::zeros(PixelFormat::U8, &[3, 4, 2]);
    let region = crate::volume::VolumeRegion::new(vec![10, -5, 0], vec![3, 4, 2]).unwrap();
    let volume = Volume::with_region(buffer, region).unwrap();
    let slice = extract_slice(&volume, 1, 0).unwrap();
    assert_eq!(slice.region().index, vec![10, 0]);
    assert_eq!(slice.region().size, vec![3, 2]);
}
