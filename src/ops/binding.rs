//! Binding of sub-operations to the slice loop, with structural validation.

use super::SliceOp;
use crate::error::{Result, SliceError};
use crate::volume::PixelFormat;

/// Completeness of an [`OperationBinding`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    /// No sub-operation assigned; execution is rejected.
    Unbound,
    /// Exactly one of entry/exit assigned; execution is rejected.
    PartiallyBound,
    /// A unified operation, or an entry/exit pair, fully assigned.
    Bound,
}

/// Holds the sub-operation(s) applied to every slice and validates their
/// structural compatibility at assignment time.
///
/// The endpoint formats are fixed at construction: the entry side must
/// consume the volume's slice format and the exit side must produce the
/// output volume's slice format. In the unified case one operation covers
/// both ends; in the split case the entry's output format and the exit's
/// input format meet at an intermediate type which only has to be consistent
/// between the two stages.
pub struct OperationBinding {
    input_format: PixelFormat,
    output_format: PixelFormat,
    entry: Option<Box<dyn SliceOp>>,
    exit: Option<Box<dyn SliceOp>>,
    unified: bool,
    version: u64,
}

impl OperationBinding {
    pub fn new(input_format: PixelFormat, output_format: PixelFormat) -> Self {
        Self {
            input_format,
            output_format,
            entry: None,
            exit: None,
            unified: false,
            version: 0,
        }
    }

    pub fn input_format(&self) -> PixelFormat {
        self.input_format
    }

    pub fn output_format(&self) -> PixelFormat {
        self.output_format
    }

    /// Bind one operation covering the whole per-slice pipeline. Its
    /// declared formats must match both endpoint formats exactly.
    pub fn bind_filter(&mut self, op: Box<dyn SliceOp>) -> Result<()> {
        if !self.unified && (self.entry.is_some() || self.exit.is_some()) {
            return Err(SliceError::config(
                "binding already holds staged entry/exit operations; clear it first",
            ));
        }
        if op.input_format() != self.input_format {
            return Err(SliceError::config(format!(
                "operation consumes {} slices but the volume provides {}",
                op.input_format(),
                self.input_format
            )));
        }
        if op.output_format() != self.output_format {
            return Err(SliceError::config(format!(
                "operation produces {} slices but the output volume expects {}",
                op.output_format(),
                self.output_format
            )));
        }
        self.entry = Some(op);
        self.exit = None;
        self.unified = true;
        self.touch();
        Ok(())
    }

    /// Bind the entry stage of a split pipeline.
    pub fn bind_entry(&mut self, op: Box<dyn SliceOp>) -> Result<()> {
        if self.unified {
            return Err(SliceError::config(
                "binding already holds a unified operation; an operation cannot also serve as \
                 one stage of it; clear the binding first",
            ));
        }
        if op.input_format() != self.input_format {
            return Err(SliceError::config(format!(
                "entry stage consumes {} slices but the volume provides {}",
                op.input_format(),
                self.input_format
            )));
        }
        if let Some(exit) = &self.exit {
            if op.output_format() != exit.input_format() {
                return Err(SliceError::config(format!(
                    "entry stage produces {} slices but the exit stage consumes {}",
                    op.output_format(),
                    exit.input_format()
                )));
            }
        }
        self.entry = Some(op);
        self.touch();
        Ok(())
    }

    /// Bind the exit stage of a split pipeline.
    pub fn bind_exit(&mut self, op: Box<dyn SliceOp>) -> Result<()> {
        if self.unified {
            return Err(SliceError::config(
                "binding already holds a unified operation; an operation cannot also serve as \
                 one stage of it; clear the binding first",
            ));
        }
        if op.output_format() != self.output_format {
            return Err(SliceError::config(format!(
                "exit stage produces {} slices but the output volume expects {}",
                op.output_format(),
                self.output_format
            )));
        }
        if let Some(entry) = &self.entry {
            if entry.output_format() != op.input_format() {
                return Err(SliceError::config(format!(
                    "entry stage produces {} slices but the exit stage consumes {}",
                    entry.output_format(),
                    op.input_format()
                )));
            }
        }
        self.exit = Some(op);
        self.touch();
        Ok(())
    }

    /// Drop all bound operations, returning to `Unbound`.
    pub fn clear(&mut self) {
        self.entry = None;
        self.exit = None;
        self.unified = false;
        self.touch();
    }

    pub fn state(&self) -> BindingState {
        match (&self.entry, &self.exit) {
            (None, None) => BindingState::Unbound,
            (Some(_), None) if self.unified => BindingState::Bound,
            (Some(_), Some(_)) => BindingState::Bound,
            _ => BindingState::PartiallyBound,
        }
    }

    /// Whether the bound pipeline runs as two stages.
    pub fn is_split(&self) -> bool {
        !self.unified && self.exit.is_some()
    }

    /// Number of input volumes the bound pipeline consumes per slice index.
    pub fn input_arity(&self) -> Option<usize> {
        self.entry.as_ref().map(|op| op.input_count())
    }

    /// Monotonic counter advanced on every binding mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Configuration versions of the bound stages (zero when absent).
    pub fn stage_versions(&self) -> (u64, u64) {
        (
            self.entry.as_ref().map_or(0, |op| op.config_version()),
            self.exit.as_ref().map_or(0, |op| op.config_version()),
        )
    }

    pub fn entry(&self) -> Option<&dyn SliceOp> {
        self.entry.as_deref()
    }

    pub fn exit(&self) -> Option<&dyn SliceOp> {
        self.exit.as_deref()
    }

    /// Mutable access to both stages at once, for the slice loop.
    pub(crate) fn stages_mut(
        &mut self,
    ) -> (Option<&mut (dyn SliceOp + 'static)>, Option<&mut (dyn SliceOp + 'static)>) {
        (self.entry.as_deref_mut(), self.exit.as_deref_mut())
    }

    /// Reject execution unless the binding is fully specified.
    pub fn validate_for_execute(&self) -> Result<()> {
        match self.state() {
            BindingState::Bound => Ok(()),
            BindingState::Unbound => Err(SliceError::config("no operation bound")),
            BindingState::PartiallyBound => {
                if self.entry.is_some() {
                    Err(SliceError::config(
                        "entry stage bound without a matching exit stage",
                    ))
                } else {
                    Err(SliceError::config(
                        "exit stage bound without a matching entry stage",
                    ))
                }
            }
        }
    }

    fn touch(&mut self) {
        self.version += 1;
    }
}

impl std::fmt::Debug for OperationBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationBinding")
            .field("input_format", &self.input_format)
            .field("output_format", &self.output_format)
            .field("state", &self.state())
            .field("unified", &self.unified)
            .field("version", &self.version)
            .finish()
    }
}
