//! Sub-operation capability interface and operation binding.
//!
//! The slice loop depends only on the [`SliceOp`] trait: stage inputs, run,
//! take the output, report a configuration version. Concrete operations are
//! supplied by the caller and remain opaque to the engine; the engine never
//! implements image-processing algorithms itself.
//!
//! An [`OperationBinding`] holds either a single operation covering the whole
//! per-slice pipeline or an entry/exit pair for the case where the
//! operation's natural output pixel type differs from the volume's. All
//! structural compatibility checks happen when stages are assigned, never
//! during the slice loop.

mod binding;

pub use self::binding::{BindingState, OperationBinding};

use crate::error::OpFailure;
use crate::slicing::Slice;
use crate::volume::PixelFormat;

/// A lower-dimensional operation applied once per slice.
///
/// Implementations must be pure per slice: staged inputs and the produced
/// output are the only mutable state, and a `set_input` → `run` →
/// `take_output` cycle must not depend on any earlier cycle. This is what
/// allows the slice loop to process indices in any order, or in parallel
/// with [`SliceOp::duplicate`]d instances.
pub trait SliceOp: Send {
    /// Pixel format consumed from each input slot.
    fn input_format(&self) -> PixelFormat;

    /// Pixel format of the produced slice.
    fn output_format(&self) -> PixelFormat;

    /// Number of input slices consumed per run.
    fn input_count(&self) -> usize {
        1
    }

    /// Stage one input slice.
    fn set_input(&mut self, slot: usize, slice: Slice) -> Result<(), OpFailure>;

    /// Process the staged inputs.
    fn run(&mut self) -> Result<(), OpFailure>;

    /// Take the slice produced by the last `run`, leaving the operation
    /// without an output.
    fn take_output(&mut self) -> Option<Slice>;

    /// Monotonic counter advanced whenever an operation parameter changes.
    /// Consumers compare it against the value seen at the last run to decide
    /// whether a cached result is stale.
    fn config_version(&self) -> u64;

    /// An independent instance with identical configuration and no staged
    /// state, suitable for a worker thread.
    fn duplicate(&self) -> Box<dyn SliceOp>;
}
