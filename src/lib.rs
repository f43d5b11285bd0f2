#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod error;
pub mod ops;
pub mod processor;
pub mod slicing;
pub mod volume;

// Driver-facing modules.
pub mod config;
pub mod filters;

// --- High-level re-exports -------------------------------------------------

// Main entry points: processor + binding.
pub use crate::ops::{BindingState, OperationBinding, SliceOp};
pub use crate::processor::{CancelToken, SliceProcessor};

// Error types surfaced throughout the API.
pub use crate::error::{OpFailure, Result, SliceError};

// Data types the processor consumes and produces.
pub use crate::slicing::{extract_slice, inject_slice, Slice};
pub use crate::volume::{PixelBuffer, PixelFormat, PixelValue, Volume, VolumeRegion};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use slicewise::prelude::*;
/// use slicewise::PixelBuffer;
/// use ndarray::{ArrayD, IxDyn};
///
/// let volume = Volume::new(PixelBuffer::U8(ArrayD::zeros(IxDyn(&[4, 4, 3]))));
///
/// let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
/// processor
///     .bind_filter(Box::new(Identity::new(PixelFormat::U8)))
///     .unwrap();
///
/// let output = processor.execute(&[&volume]).unwrap();
/// assert_eq!(output.shape(), volume.shape());
/// ```
pub mod prelude {
    pub use crate::filters::Identity;
    pub use crate::{PixelFormat, SliceProcessor, Volume};
}
