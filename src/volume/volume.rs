//! A D-dimensional pixel array with region metadata and change tracking.

use super::{PixelBuffer, PixelFormat, PixelValue, VolumeRegion};
use crate::error::{Result, SliceError};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VOLUME_ID: AtomicU64 = AtomicU64::new(1);

fn next_volume_id() -> u64 {
    NEXT_VOLUME_ID.fetch_add(1, Ordering::Relaxed)
}

/// The D-dimensional array the engine operates on as a whole.
///
/// A volume pairs its pixel storage with a [`VolumeRegion`] describing where
/// the data sits in a larger index space, a unique identity, and a
/// modification version advanced on every mutating access. Identity and
/// version together let downstream consumers decide whether a previously
/// computed result is still valid without any global registry.
#[derive(Debug)]
pub struct Volume {
    buffer: PixelBuffer,
    region: VolumeRegion,
    requested: Option<VolumeRegion>,
    id: u64,
    version: u64,
}

impl Volume {
    /// Wrap a buffer with a zero-origin region covering its full shape.
    pub fn new(buffer: PixelBuffer) -> Self {
        let region = VolumeRegion::from_size(buffer.shape());
        Self {
            buffer,
            region,
            requested: None,
            id: next_volume_id(),
            version: 0,
        }
    }

    /// Wrap a buffer with an explicit region. The region size must match the
    /// buffer shape.
    pub fn with_region(buffer: PixelBuffer, region: VolumeRegion) -> Result<Self> {
        if region.size != buffer.shape() {
            return Err(SliceError::config(format!(
                "region size {:?} does not match buffer shape {:?}",
                region.size,
                buffer.shape()
            )));
        }
        Ok(Self {
            buffer,
            region,
            requested: None,
            id: next_volume_id(),
            version: 0,
        })
    }

    pub fn format(&self) -> PixelFormat {
        self.buffer.format()
    }

    pub fn ndim(&self) -> usize {
        self.buffer.ndim()
    }

    pub fn shape(&self) -> &[usize] {
        self.buffer.shape()
    }

    /// Extent along `axis`, or `None` when the axis is out of range.
    pub fn extent(&self, axis: usize) -> Option<usize> {
        self.shape().get(axis).copied()
    }

    pub fn region(&self) -> &VolumeRegion {
        &self.region
    }

    /// Unique identity of this volume object. Clones receive a fresh id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Modification version; advanced by every mutating access.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Mutable access to the pixel storage. Counts as a modification.
    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        self.version += 1;
        &mut self.buffer
    }

    pub fn get(&self, coords: &[usize]) -> Option<PixelValue> {
        self.buffer.get(coords)
    }

    pub fn set(&mut self, coords: &[usize], value: PixelValue) -> Result<()> {
        self.version += 1;
        self.buffer.set(coords, value)
    }

    /// The sub-region a downstream consumer asked this volume to produce.
    /// Purely a pipeline negotiation artifact; not part of the pixel data.
    pub fn requested_region(&self) -> Option<&VolumeRegion> {
        self.requested.as_ref()
    }

    pub fn set_requested_region(&mut self, region: VolumeRegion) -> Result<()> {
        if region.ndim() != self.ndim() {
            return Err(SliceError::config(format!(
                "requested region has {} dimensions, volume has {}",
                region.ndim(),
                self.ndim()
            )));
        }
        self.requested = Some(region);
        Ok(())
    }
}

impl Clone for Volume {
    /// A clone is a distinct volume object: same pixels and region, fresh
    /// identity, version reset to zero.
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            region: self.region.clone(),
            requested: self.requested.clone(),
            id: next_volume_id(),
            version: 0,
        }
    }
}
