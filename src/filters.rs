//! Reference sub-operations used by the drivers and tests.
//!
//! These are pluggable [`SliceOp`] implementations, not part of the slicing
//! engine itself (the engine treats every operation as opaque). The set mirrors
//! what the drivers need: pass-through, clamped-window smoothing and median,
//! a two-input add producing a wider intermediate type, and a min/max
//! intensity rescale back to 8-bit. All window-based operations work on
//! slices of any dimensionality; borders clamp to the slice extents.

use crate::error::OpFailure;
use crate::ops::SliceOp;
use crate::slicing::Slice;
use crate::volume::{PixelBuffer, PixelFormat};
use ndarray::{ArrayD, Dimension, IxDyn};

fn no_input() -> OpFailure {
    OpFailure::new("no input staged")
}

fn stage_single(
    dst: &mut Option<Slice>,
    format: PixelFormat,
    slot: usize,
    slice: Slice,
) -> Result<(), OpFailure> {
    if slot != 0 {
        return Err(OpFailure::new(format!(
            "input slot {slot} out of range (operation takes 1 input)"
        )));
    }
    if slice.format() != format {
        return Err(OpFailure::new(format!(
            "expected {format} input, got {}",
            slice.format()
        )));
    }
    *dst = Some(slice);
    Ok(())
}

fn replace_buffer(slice: &Slice, buffer: PixelBuffer) -> Result<Slice, OpFailure> {
    Slice::new(buffer, slice.region().clone()).map_err(|e| OpFailure::new(e.to_string()))
}

/// Collect the values of the clamped window of `radius` around `center`.
fn collect_window(data: &ArrayD<u8>, center: &[usize], radius: usize, window: &mut Vec<u8>) {
    window.clear();
    let shape = data.shape();
    if shape.is_empty() {
        window.push(data[IxDyn(&[])]);
        return;
    }
    let lo: Vec<usize> = center.iter().map(|&c| c.saturating_sub(radius)).collect();
    let hi: Vec<usize> = center
        .iter()
        .zip(shape)
        .map(|(&c, &n)| (c + radius).min(n - 1))
        .collect();
    let mut cursor = lo.clone();
    loop {
        window.push(data[IxDyn(&cursor)]);
        let mut dim = cursor.len();
        let advanced = loop {
            if dim == 0 {
                break false;
            }
            dim -= 1;
            if cursor[dim] < hi[dim] {
                cursor[dim] += 1;
                for d in dim + 1..cursor.len() {
                    cursor[d] = lo[d];
                }
                break true;
            }
        };
        if !advanced {
            break;
        }
    }
}

/// Apply `f` to the clamped window around every element.
fn window_map_u8(data: &ArrayD<u8>, radius: usize, f: impl Fn(&[u8]) -> u8) -> ArrayD<u8> {
    let mut out = ArrayD::zeros(data.raw_dim());
    let mut window = Vec::new();
    for idx in ndarray::indices(data.shape()) {
        let center = idx.slice();
        collect_window(data, center, radius, &mut window);
        out[IxDyn(center)] = f(&window);
    }
    out
}

/// Pass-through operation for the configured pixel format.
#[derive(Debug)]
pub struct Identity {
    format: PixelFormat,
    version: u64,
    input: Option<Slice>,
    output: Option<Slice>,
}

impl Identity {
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            version: 0,
            input: None,
            output: None,
        }
    }
}

impl SliceOp for Identity {
    fn input_format(&self) -> PixelFormat {
        self.format
    }

    fn output_format(&self) -> PixelFormat {
        self.format
    }

    fn set_input(&mut self, slot: usize, slice: Slice) -> Result<(), OpFailure> {
        stage_single(&mut self.input, self.format, slot, slice)
    }

    fn run(&mut self) -> Result<(), OpFailure> {
        let slice = self.input.take().ok_or_else(no_input)?;
        self.output = Some(slice);
        Ok(())
    }

    fn take_output(&mut self) -> Option<Slice> {
        self.output.take()
    }

    fn config_version(&self) -> u64 {
        self.version
    }

    fn duplicate(&self) -> Box<dyn SliceOp> {
        Box::new(Self {
            format: self.format,
            version: self.version,
            input: None,
            output: None,
        })
    }
}

/// Mean over the clamped window of the given radius. A radius at least as
/// large as the slice extent degenerates to the whole-slice mean.
#[derive(Debug)]
pub struct BoxMean {
    radius: usize,
    version: u64,
    input: Option<Slice>,
    output: Option<Slice>,
}

impl BoxMean {
    pub fn new(radius: usize) -> Self {
        Self {
            radius,
            version: 0,
            input: None,
            output: None,
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn set_radius(&mut self, radius: usize) {
        if radius != self.radius {
            self.radius = radius;
            self.version += 1;
        }
    }
}

impl SliceOp for BoxMean {
    fn input_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn output_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn set_input(&mut self, slot: usize, slice: Slice) -> Result<(), OpFailure> {
        stage_single(&mut self.input, PixelFormat::U8, slot, slice)
    }

    fn run(&mut self) -> Result<(), OpFailure> {
        let slice = self.input.take().ok_or_else(no_input)?;
        let data = slice
            .buffer()
            .as_u8()
            .ok_or_else(|| OpFailure::new("box mean expects u8 slices"))?;
        let out = window_map_u8(data, self.radius, |values| {
            let sum: u32 = values.iter().map(|&v| u32::from(v)).sum();
            (f64::from(sum) / values.len() as f64).round() as u8
        });
        self.output = Some(replace_buffer(&slice, PixelBuffer::U8(out))?);
        Ok(())
    }

    fn take_output(&mut self) -> Option<Slice> {
        self.output.take()
    }

    fn config_version(&self) -> u64 {
        self.version
    }

    fn duplicate(&self) -> Box<dyn SliceOp> {
        Box::new(Self {
            radius: self.radius,
            version: self.version,
            input: None,
            output: None,
        })
    }
}

/// Median over the clamped window of the given radius.
#[derive(Debug)]
pub struct MedianFilter {
    radius: usize,
    version: u64,
    input: Option<Slice>,
    output: Option<Slice>,
}

impl MedianFilter {
    pub fn new(radius: usize) -> Self {
        Self {
            radius,
            version: 0,
            input: None,
            output: None,
        }
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn set_radius(&mut self, radius: usize) {
        if radius != self.radius {
            self.radius = radius;
            self.version += 1;
        }
    }
}

impl SliceOp for MedianFilter {
    fn input_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn output_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn set_input(&mut self, slot: usize, slice: Slice) -> Result<(), OpFailure> {
        stage_single(&mut self.input, PixelFormat::U8, slot, slice)
    }

    fn run(&mut self) -> Result<(), OpFailure> {
        let slice = self.input.take().ok_or_else(no_input)?;
        let data = slice
            .buffer()
            .as_u8()
            .ok_or_else(|| OpFailure::new("median expects u8 slices"))?;
        let out = window_map_u8(data, self.radius, |values| {
            let mut values = values.to_vec();
            values.sort_unstable();
            values[values.len() / 2]
        });
        self.output = Some(replace_buffer(&slice, PixelBuffer::U8(out))?);
        Ok(())
    }

    fn take_output(&mut self) -> Option<Slice> {
        self.output.take()
    }

    fn config_version(&self) -> u64 {
        self.version
    }

    fn duplicate(&self) -> Box<dyn SliceOp> {
        Box::new(Self {
            radius: self.radius,
            version: self.version,
            input: None,
            output: None,
        })
    }
}

/// Pixelwise sum of two 8-bit slices, widened to u16 so no value saturates.
#[derive(Debug, Default)]
pub struct AddSlices {
    version: u64,
    inputs: [Option<Slice>; 2],
    output: Option<Slice>,
}

impl AddSlices {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SliceOp for AddSlices {
    fn input_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn output_format(&self) -> PixelFormat {
        PixelFormat::U16
    }

    fn input_count(&self) -> usize {
        2
    }

    fn set_input(&mut self, slot: usize, slice: Slice) -> Result<(), OpFailure> {
        if slot >= 2 {
            return Err(OpFailure::new(format!(
                "input slot {slot} out of range (operation takes 2 inputs)"
            )));
        }
        if slice.format() != PixelFormat::U8 {
            return Err(OpFailure::new(format!(
                "expected u8 input, got {}",
                slice.format()
            )));
        }
        self.inputs[slot] = Some(slice);
        Ok(())
    }

    fn run(&mut self) -> Result<(), OpFailure> {
        let a = self.inputs[0].take().ok_or_else(no_input)?;
        let b = self.inputs[1].take().ok_or_else(no_input)?;
        let av = a
            .buffer()
            .as_u8()
            .ok_or_else(|| OpFailure::new("add expects u8 slices"))?;
        let bv = b
            .buffer()
            .as_u8()
            .ok_or_else(|| OpFailure::new("add expects u8 slices"))?;
        if av.shape() != bv.shape() {
            return Err(OpFailure::new(format!(
                "input slices differ in shape: {:?} vs {:?}",
                av.shape(),
                bv.shape()
            )));
        }
        let sum = av.mapv(u16::from) + bv.mapv(u16::from);
        self.output = Some(replace_buffer(&a, PixelBuffer::U16(sum))?);
        Ok(())
    }

    fn take_output(&mut self) -> Option<Slice> {
        self.output.take()
    }

    fn config_version(&self) -> u64 {
        self.version
    }

    fn duplicate(&self) -> Box<dyn SliceOp> {
        Box::new(Self {
            version: self.version,
            inputs: [None, None],
            output: None,
        })
    }
}

/// Linear rescale of a u16 slice onto an 8-bit output range: the observed
/// minimum maps to `out_min`, the observed maximum to `out_max`. A constant
/// slice has no usable scale and maps entirely to `out_min`.
#[derive(Debug)]
pub struct RescaleIntensity {
    out_min: u8,
    out_max: u8,
    version: u64,
    input: Option<Slice>,
    output: Option<Slice>,
}

impl RescaleIntensity {
    pub fn new(out_min: u8, out_max: u8) -> Self {
        Self {
            out_min,
            out_max,
            version: 0,
            input: None,
            output: None,
        }
    }

    pub fn output_range(&self) -> (u8, u8) {
        (self.out_min, self.out_max)
    }

    pub fn set_output_range(&mut self, out_min: u8, out_max: u8) {
        if (out_min, out_max) != (self.out_min, self.out_max) {
            self.out_min = out_min;
            self.out_max = out_max;
            self.version += 1;
        }
    }
}

impl SliceOp for RescaleIntensity {
    fn input_format(&self) -> PixelFormat {
        PixelFormat::U16
    }

    fn output_format(&self) -> PixelFormat {
        PixelFormat::U8
    }

    fn set_input(&mut self, slot: usize, slice: Slice) -> Result<(), OpFailure> {
        stage_single(&mut self.input, PixelFormat::U16, slot, slice)
    }

    fn run(&mut self) -> Result<(), OpFailure> {
        if self.out_max < self.out_min {
            return Err(OpFailure::new(format!(
                "output range is inverted: [{}, {}]",
                self.out_min, self.out_max
            )));
        }
        let slice = self.input.take().ok_or_else(no_input)?;
        let data = slice
            .buffer()
            .as_u16()
            .ok_or_else(|| OpFailure::new("rescale expects u16 slices"))?;
        let mut lo = u16::MAX;
        let mut hi = u16::MIN;
        for &v in data.iter() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        let span = f64::from(self.out_max - self.out_min);
        let scale = if hi > lo {
            span / f64::from(hi - lo)
        } else {
            0.0
        };
        let out_min = self.out_min;
        let out = data.mapv(|v| {
            let scaled = (f64::from(v - lo) * scale).round() as i64;
            (scaled + i64::from(out_min)).clamp(0, 255) as u8
        });
        self.output = Some(replace_buffer(&slice, PixelBuffer::U8(out))?);
        Ok(())
    }

    fn take_output(&mut self) -> Option<Slice> {
        self.output.take()
    }

    fn config_version(&self) -> u64 {
        self.version
    }

    fn duplicate(&self) -> Box<dyn SliceOp> {
        Box::new(Self {
            out_min: self.out_min,
            out_max: self.out_max,
            version: self.version,
            input: None,
            output: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::ArrayD;

    fn u8_slice(shape: &[usize], values: &[u8]) -> Slice {
        let array = ArrayD::from_shape_vec(IxDyn(shape), values.to_vec()).unwrap();
        Slice::from_buffer(PixelBuffer::U8(array))
    }

    fn u16_slice(shape: &[usize], values: &[u16]) -> Slice {
        let array = ArrayD::from_shape_vec(IxDyn(shape), values.to_vec()).unwrap();
        Slice::from_buffer(PixelBuffer::U16(array))
    }

    fn run_single(op: &mut dyn SliceOp, slice: Slice) -> Slice {
        op.set_input(0, slice).unwrap();
        op.run().unwrap();
        op.take_output().unwrap()
    }

    #[test]
    fn identity_passes_pixels_through() {
        let slice = u8_slice(&[2, 2], &[1, 2, 3, 4]);
        let mut op = Identity::new(PixelFormat::U8);
        let out = run_single(&mut op, slice.clone());
        assert_eq!(out, slice);
    }

    #[test]
    fn identity_rejects_mismatched_format() {
        let mut op = Identity::new(PixelFormat::U8);
        assert!(op.set_input(0, u16_slice(&[1], &[5])).is_err());
    }

    #[test]
    fn box_mean_radius_zero_is_identity() {
        let slice = u8_slice(&[3], &[10, 20, 30]);
        let mut op = BoxMean::new(0);
        let out = run_single(&mut op, slice.clone());
        assert_eq!(out, slice);
    }

    #[test]
    fn box_mean_averages_clamped_window() {
        let slice = u8_slice(&[3], &[0, 90, 30]);
        let mut op = BoxMean::new(1);
        let out = run_single(&mut op, slice);
        let expected = u8_slice(&[3], &[45, 40, 60]);
        assert_eq!(out, expected);
    }

    #[test]
    fn median_picks_middle_of_window() {
        let slice = u8_slice(&[3, 3], &[9, 3, 5, 1, 7, 2, 8, 6, 4]);
        let mut op = MedianFilter::new(1);
        let out = run_single(&mut op, slice);
        // centre window covers the whole slice: median of 1..=9
        assert_eq!(out.buffer().get(&[1, 1]), Some(crate::volume::PixelValue::U8(5)));
    }

    #[test]
    fn add_slices_widens_to_u16() {
        let mut op = AddSlices::new();
        op.set_input(0, u8_slice(&[2], &[200, 200])).unwrap();
        op.set_input(1, u8_slice(&[2], &[100, 56])).unwrap();
        op.run().unwrap();
        let out = op.take_output().unwrap();
        assert_eq!(out, u16_slice(&[2], &[300, 256]));
    }

    #[test]
    fn add_requires_both_inputs() {
        let mut op = AddSlices::new();
        op.set_input(0, u8_slice(&[1], &[1])).unwrap();
        assert!(op.run().is_err());
    }

    #[test]
    fn rescale_maps_observed_range_onto_output_range() {
        let mut op = RescaleIntensity::new(0, 200);
        let out = run_single(&mut op, u16_slice(&[3], &[0, 50, 100]));
        assert_eq!(out, u8_slice(&[3], &[0, 100, 200]));
    }

    #[test]
    fn rescale_constant_slice_maps_to_out_min() {
        let mut op = RescaleIntensity::new(3, 250);
        let out = run_single(&mut op, u16_slice(&[4], &[7, 7, 7, 7]));
        assert_eq!(out, u8_slice(&[4], &[3, 3, 3, 3]));
    }

    #[test]
    fn duplicate_copies_configuration_but_not_staged_state() {
        let mut op = BoxMean::new(2);
        op.set_input(0, u8_slice(&[2], &[1, 2])).unwrap();
        let mut copy = op.duplicate();
        assert_eq!(copy.config_version(), op.config_version());
        // the duplicate has nothing staged
        assert!(copy.run().is_err());
        // the original still does
        op.run().unwrap();
        assert!(op.take_output().is_some());
    }
}
