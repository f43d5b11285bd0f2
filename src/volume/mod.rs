//! Volume abstraction over `ndarray` storage.
//!
//! The engine treats the multi-dimensional array itself as an external
//! collaborator: storage, axis subviews and subview assignment come from
//! `ndarray`. This module adds the thin layer the slicing engine needs on
//! top: a region descriptor, a pixel-format tag, identity/version change
//! tracking, and file I/O.

pub mod buffer;
pub mod io;
pub mod region;
#[allow(clippy::module_inception)]
mod volume;

pub use self::buffer::{PixelBuffer, PixelFormat, PixelValue};
pub use self::region::VolumeRegion;
pub use self::volume::Volume;
