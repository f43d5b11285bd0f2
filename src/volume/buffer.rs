//! Dynamically-typed pixel storage shared by volumes and slices.
//!
//! The engine is configured at run time (drivers pick pixel types from file
//! headers), so buffers follow the enum-of-arrays idiom rather than being
//! generic over the pixel type. Structural compatibility between stages is
//! then a value-level check performed when sub-operations are bound.

use crate::error::{Result, SliceError};
use ndarray::{ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel types supported by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    U8,
    U16,
    F32,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::U8 => 1,
            PixelFormat::U16 => 2,
            PixelFormat::F32 => 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::U8 => write!(f, "u8"),
            PixelFormat::U16 => write!(f, "u16"),
            PixelFormat::F32 => write!(f, "f32"),
        }
    }
}

/// A single pixel value read from or written to a buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelValue {
    U8(u8),
    U16(u16),
    F32(f32),
}

impl PixelValue {
    pub fn format(self) -> PixelFormat {
        match self {
            PixelValue::U8(_) => PixelFormat::U8,
            PixelValue::U16(_) => PixelFormat::U16,
            PixelValue::F32(_) => PixelFormat::F32,
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            PixelValue::U8(v) => v as f64,
            PixelValue::U16(v) => v as f64,
            PixelValue::F32(v) => v as f64,
        }
    }
}

/// N-dimensional pixel storage. Used both for volumes (D dimensions) and for
/// the (D-1)-dimensional slices cut from them.
#[derive(Clone, Debug, PartialEq)]
pub enum PixelBuffer {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    F32(ArrayD<f32>),
}

impl PixelBuffer {
    /// Zero-initialized buffer of the given format and shape.
    pub fn zeros(format: PixelFormat, shape: &[usize]) -> Self {
        match format {
            PixelFormat::U8 => PixelBuffer::U8(ArrayD::zeros(IxDyn(shape))),
            PixelFormat::U16 => PixelBuffer::U16(ArrayD::zeros(IxDyn(shape))),
            PixelFormat::F32 => PixelBuffer::F32(ArrayD::zeros(IxDyn(shape))),
        }
    }

    pub fn format(&self) -> PixelFormat {
        match self {
            PixelBuffer::U8(_) => PixelFormat::U8,
            PixelBuffer::U16(_) => PixelFormat::U16,
            PixelBuffer::F32(_) => PixelFormat::F32,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            PixelBuffer::U8(a) => a.shape(),
            PixelBuffer::U16(a) => a.shape(),
            PixelBuffer::F32(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, coords: &[usize]) -> Option<PixelValue> {
        match self {
            PixelBuffer::U8(a) => a.get(IxDyn(coords)).copied().map(PixelValue::U8),
            PixelBuffer::U16(a) => a.get(IxDyn(coords)).copied().map(PixelValue::U16),
            PixelBuffer::F32(a) => a.get(IxDyn(coords)).copied().map(PixelValue::F32),
        }
    }

    pub fn set(&mut self, coords: &[usize], value: PixelValue) -> Result<()> {
        let format = self.format();
        let written = match (&mut *self, value) {
            (PixelBuffer::U8(a), PixelValue::U8(v)) => {
                a.get_mut(IxDyn(coords)).map(|p| *p = v).is_some()
            }
            (PixelBuffer::U16(a), PixelValue::U16(v)) => {
                a.get_mut(IxDyn(coords)).map(|p| *p = v).is_some()
            }
            (PixelBuffer::F32(a), PixelValue::F32(v)) => {
                a.get_mut(IxDyn(coords)).map(|p| *p = v).is_some()
            }
            (_, value) => {
                return Err(SliceError::config(format!(
                    "cannot write a {} value into a {} buffer",
                    value.format(),
                    format
                )))
            }
        };
        if written {
            Ok(())
        } else {
            Err(SliceError::config(format!(
                "pixel coordinate {coords:?} outside buffer of shape {:?}",
                self.shape()
            )))
        }
    }

    /// Owned copy of the cross-section at `index` along `axis`. Callers are
    /// expected to have validated both against the buffer shape.
    pub fn index_axis(&self, axis: usize, index: usize) -> PixelBuffer {
        match self {
            PixelBuffer::U8(a) => PixelBuffer::U8(a.index_axis(Axis(axis), index).to_owned()),
            PixelBuffer::U16(a) => PixelBuffer::U16(a.index_axis(Axis(axis), index).to_owned()),
            PixelBuffer::F32(a) => PixelBuffer::F32(a.index_axis(Axis(axis), index).to_owned()),
        }
    }

    /// Write `src` over the cross-section at `index` along `axis`. Shapes
    /// must already agree; only the formats are re-checked here.
    pub fn assign_axis(&mut self, axis: usize, index: usize, src: &PixelBuffer) -> Result<()> {
        match (self, src) {
            (PixelBuffer::U8(dst), PixelBuffer::U8(s)) => {
                dst.index_axis_mut(Axis(axis), index).assign(s);
                Ok(())
            }
            (PixelBuffer::U16(dst), PixelBuffer::U16(s)) => {
                dst.index_axis_mut(Axis(axis), index).assign(s);
                Ok(())
            }
            (PixelBuffer::F32(dst), PixelBuffer::F32(s)) => {
                dst.index_axis_mut(Axis(axis), index).assign(s);
                Ok(())
            }
            (dst, src) => Err(SliceError::config(format!(
                "cannot write a {} slice into a {} volume",
                src.format(),
                dst.format()
            ))),
        }
    }

    pub fn as_u8(&self) -> Option<&ArrayD<u8>> {
        match self {
            PixelBuffer::U8(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<&ArrayD<u16>> {
        match self {
            PixelBuffer::U16(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            PixelBuffer::F32(a) => Some(a),
            _ => None,
        }
    }
}

impl From<ArrayD<u8>> for PixelBuffer {
    fn from(a: ArrayD<u8>) -> Self {
        PixelBuffer::U8(a)
    }
}

impl From<ArrayD<u16>> for PixelBuffer {
    fn from(a: ArrayD<u16>) -> Self {
        PixelBuffer::U16(a)
    }
}

impl From<ArrayD<f32>> for PixelBuffer {
    fn from(a: ArrayD<f32>) -> Self {
        PixelBuffer::F32(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_matches_requested_format_and_shape() {
        let buf = PixelBuffer::zeros(PixelFormat::U16, &[2, 3]);
        assert_eq!(buf.format(), PixelFormat::U16);
        assert_eq!(buf.shape(), &[2, 3]);
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn get_set_round_trip() {
        let mut buf = PixelBuffer::zeros(PixelFormat::U8, &[2, 2]);
        buf.set(&[1, 0], PixelValue::U8(7)).unwrap();
        assert_eq!(buf.get(&[1, 0]), Some(PixelValue::U8(7)));
        assert_eq!(buf.get(&[2, 0]), None);
    }

    #[test]
    fn set_rejects_format_mismatch() {
        let mut buf = PixelBuffer::zeros(PixelFormat::U8, &[2, 2]);
        assert!(buf.set(&[0, 0], PixelValue::F32(1.0)).is_err());
    }

    #[test]
    fn assign_axis_rejects_format_mismatch() {
        let mut vol = PixelBuffer::zeros(PixelFormat::U8, &[2, 2, 2]);
        let slice = PixelBuffer::zeros(PixelFormat::U16, &[2, 2]);
        assert!(vol.assign_axis(2, 0, &slice).is_err());
    }
}
