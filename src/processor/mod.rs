//! Slice loop controller orchestrating per-index execution.
//!
//! Overview
//! - Validates that the operation binding is fully specified and that the
//!   supplied volumes match its declared formats and arity.
//! - Negotiates regions with the producing stage: any partial output request
//!   expands to the whole volume (`requests`, full-coverage rule).
//! - Walks every index along the slicing axis, extracting one slice per
//!   input, running the bound operation (or entry/exit pair), and injecting
//!   the result into the output volume.
//! - Tracks configuration versions (axis, binding, stage parameters, input
//!   identity/version) and reuses the previous output when nothing changed.
//!
//! Slice indices carry no data dependency on each other. With the `parallel`
//! feature the loop maps indices onto rayon workers, giving each worker an
//! independently-duplicated stage pair; injection targets disjoint
//! sub-regions, so results are identical to the serial loop regardless of
//! completion order. Sub-operation failures abort the whole run with the
//! originating slice index attached; there is no partial output and no
//! internal retry.

mod cancel;
pub mod requests;

pub use self::cancel::CancelToken;

use crate::error::{OpFailure, Result, SliceError};
use crate::ops::{OperationBinding, SliceOp};
use crate::slicing::{extract_slice, inject_slice, Slice};
use crate::volume::{PixelBuffer, PixelFormat, Volume, VolumeRegion};
use log::{debug, info, warn};
use std::time::Instant;

/// Applies a (D-1)-dimensional operation to every cross-sectional slice of a
/// D-dimensional volume, reassembling the per-slice outputs into a volume of
/// the same shape.
pub struct SliceProcessor {
    axis: Option<usize>,
    requested: Option<VolumeRegion>,
    binding: OperationBinding,
    version: u64,
    cache: Option<CachedRun>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RunFingerprint {
    processor_version: u64,
    binding_version: u64,
    stage_versions: (u64, u64),
    inputs: Vec<(u64, u64)>,
}

struct CachedRun {
    fingerprint: RunFingerprint,
    output: Volume,
}

impl SliceProcessor {
    /// Create a processor for volumes of `input_format` producing volumes of
    /// `output_format`.
    pub fn new(input_format: PixelFormat, output_format: PixelFormat) -> Self {
        Self {
            axis: None,
            requested: None,
            binding: OperationBinding::new(input_format, output_format),
            version: 0,
            cache: None,
        }
    }

    /// Select the slicing axis. Unset, the last (highest) dimension is used.
    /// Range validation happens at execution time, when the dimensionality
    /// of the volume is known.
    pub fn set_axis(&mut self, axis: usize) {
        if self.axis != Some(axis) {
            self.axis = Some(axis);
            self.version += 1;
        }
    }

    pub fn axis(&self) -> Option<usize> {
        self.axis
    }

    /// Record the output sub-region a downstream consumer asked for. Under
    /// the full-coverage rule the produced volume always spans the whole
    /// input region, so this only feeds the region negotiation (and does not
    /// invalidate a cached result).
    pub fn request_output_region(&mut self, region: VolumeRegion) {
        self.requested = Some(region);
    }

    /// Bind one operation covering the whole per-slice pipeline.
    pub fn bind_filter(&mut self, op: Box<dyn SliceOp>) -> Result<()> {
        self.binding.bind_filter(op)
    }

    /// Bind the entry stage of a split pipeline.
    pub fn bind_entry(&mut self, op: Box<dyn SliceOp>) -> Result<()> {
        self.binding.bind_entry(op)
    }

    /// Bind the exit stage of a split pipeline.
    pub fn bind_exit(&mut self, op: Box<dyn SliceOp>) -> Result<()> {
        self.binding.bind_exit(op)
    }

    pub fn clear_binding(&mut self) {
        self.binding.clear();
    }

    pub fn binding(&self) -> &OperationBinding {
        &self.binding
    }

    /// Run the bound operation over every slice of `inputs`.
    ///
    /// Multi-input operations receive one slice per input volume at each
    /// index; all inputs must share one shape and the binding's input
    /// format. Returns the reassembled output volume, or the cached output
    /// when no configuration or input changed since the last run.
    pub fn execute(&mut self, inputs: &[&Volume]) -> Result<Volume> {
        self.execute_with_cancel(inputs, &CancelToken::default())
    }

    /// Like [`execute`](Self::execute), checking `cancel` between slice
    /// iterations. A cancelled run returns
    /// [`SliceError::Cancelled`] and retains no partial output.
    pub fn execute_with_cancel(
        &mut self,
        inputs: &[&Volume],
        cancel: &CancelToken,
    ) -> Result<Volume> {
        self.binding.validate_for_execute()?;

        let first = *inputs
            .first()
            .ok_or_else(|| SliceError::config("no input volume supplied"))?;
        let arity = self.binding.input_arity().unwrap_or(1);
        if inputs.len() != arity {
            return Err(SliceError::config(format!(
                "bound operation consumes {arity} input slice(s) per index, got {} volume(s)",
                inputs.len()
            )));
        }
        for volume in inputs {
            if volume.format() != self.binding.input_format() {
                return Err(SliceError::config(format!(
                    "input volume is {}, bound operation consumes {}",
                    volume.format(),
                    self.binding.input_format()
                )));
            }
            if volume.shape() != first.shape() {
                return Err(SliceError::config(format!(
                    "input volumes must share one shape: {:?} vs {:?}",
                    volume.shape(),
                    first.shape()
                )));
            }
        }

        let ndim = first.ndim();
        if ndim == 0 {
            return Err(SliceError::config("volume must have at least one dimension"));
        }
        let axis = self.axis.unwrap_or(ndim - 1);
        if axis >= ndim {
            return Err(SliceError::config(format!(
                "slicing axis {axis} out of range for {ndim}-dimensional volume"
            )));
        }

        let fingerprint = self.run_fingerprint(inputs);
        if let Some(cached) = &self.cache {
            if cached.fingerprint == fingerprint {
                debug!("configuration unchanged since last run; reusing cached output");
                return Ok(cached.output.clone());
            }
        }

        let largest = first.region().clone();
        let requested = self.requested.clone().unwrap_or_else(|| largest.clone());
        let output_request = requests::enlarge_output_requested_region(&requested, &largest);
        let input_request = requests::input_requested_region(&output_request, &largest, axis)?;
        debug!("output request expanded to {output_request:?}; input request {input_request:?}");

        let extent = first.extent(axis).unwrap_or(0);
        if extent == 0 {
            warn!("volume has zero extent along axis {axis}; output is empty");
        }

        let start = Instant::now();
        let buffer = PixelBuffer::zeros(self.binding.output_format(), first.shape());
        let mut output = Volume::with_region(buffer, largest)?;
        run_slices(&mut self.binding, inputs, axis, extent, cancel, &mut output)?;
        output.set_requested_region(output_request)?;
        info!(
            "processed {extent} slices along axis {axis} in {:.3} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let result = output.clone();
        self.cache = Some(CachedRun {
            fingerprint,
            output,
        });
        Ok(result)
    }

    fn run_fingerprint(&self, inputs: &[&Volume]) -> RunFingerprint {
        RunFingerprint {
            processor_version: self.version,
            binding_version: self.binding.version(),
            stage_versions: self.binding.stage_versions(),
            inputs: inputs.iter().map(|v| (v.id(), v.version())).collect(),
        }
    }
}

/// One slice index through the bound pipeline: stage the extracted inputs,
/// run the entry (or unified) operation, feed the exit stage when present.
fn run_stage_pair(
    entry: &mut (dyn SliceOp + 'static),
    exit: Option<&mut (dyn SliceOp + 'static)>,
    inputs: &[&Volume],
    axis: usize,
    index: usize,
) -> Result<Slice> {
    let op_err = |source: OpFailure| SliceError::Operation { index, source };
    for (slot, volume) in inputs.iter().enumerate() {
        let slice = extract_slice(volume, axis, index)?;
        entry.set_input(slot, slice).map_err(op_err)?;
    }
    entry.run().map_err(op_err)?;
    let mut produced = entry
        .take_output()
        .ok_or_else(|| op_err(OpFailure::new("stage produced no output")))?;
    if let Some(exit) = exit {
        exit.set_input(0, produced).map_err(op_err)?;
        exit.run().map_err(op_err)?;
        produced = exit
            .take_output()
            .ok_or_else(|| op_err(OpFailure::new("stage produced no output")))?;
    }
    Ok(produced)
}

#[cfg(not(feature = "parallel"))]
fn run_slices(
    binding: &mut OperationBinding,
    inputs: &[&Volume],
    axis: usize,
    extent: usize,
    cancel: &CancelToken,
    output: &mut Volume,
) -> Result<()> {
    for index in 0..extent {
        if cancel.is_cancelled() {
            return Err(SliceError::Cancelled);
        }
        let (entry, exit) = binding.stages_mut();
        let entry = entry.ok_or_else(|| SliceError::config("no operation bound"))?;
        let produced = run_stage_pair(entry, exit, inputs, axis, index)?;
        inject_slice(&produced, axis, index, output)?;
        debug!("processed slice {index} of {extent} along axis {axis}");
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn run_slices(
    binding: &mut OperationBinding,
    inputs: &[&Volume],
    axis: usize,
    extent: usize,
    cancel: &CancelToken,
    output: &mut Volume,
) -> Result<()> {
    use rayon::prelude::*;

    let entry_proto = binding
        .entry()
        .ok_or_else(|| SliceError::config("no operation bound"))?;
    let exit_proto = binding.exit();
    // One independently-configured stage pair per index; staged state is
    // never shared between workers.
    let stages: Vec<(Box<dyn SliceOp>, Option<Box<dyn SliceOp>>)> = (0..extent)
        .map(|_| (entry_proto.duplicate(), exit_proto.map(|op| op.duplicate())))
        .collect();
    let produced: Vec<(usize, Slice)> = stages
        .into_par_iter()
        .enumerate()
        .map(|(index, (mut entry, mut exit))| {
            if cancel.is_cancelled() {
                return Err(SliceError::Cancelled);
            }
            let slice = run_stage_pair(entry.as_mut(), exit.as_deref_mut(), inputs, axis, index)?;
            Ok((index, slice))
        })
        .collect::<Result<Vec<_>>>()?;
    for (index, slice) in &produced {
        inject_slice(slice, axis, *index, output)?;
    }
    Ok(())
}
