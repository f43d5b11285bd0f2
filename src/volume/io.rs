//! I/O helpers for volumes.
//!
//! - `load_volume` / `save_volume`: JSON descriptor plus a raw little-endian
//!   payload file, for volumes of any dimensionality.
//! - `load_volume_png` / `save_volume_png`: 2-D 8-bit volumes as grayscale
//!   PNG images.

use super::{PixelBuffer, PixelFormat, Volume, VolumeRegion};
use crate::error::{Result, SliceError};
use image::GrayImage;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Sidecar descriptor stored as JSON next to the raw payload.
#[derive(Debug, Serialize, Deserialize)]
struct VolumeDescriptor {
    format: PixelFormat,
    shape: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<Vec<i64>>,
    /// Payload path, relative to the descriptor file.
    data: PathBuf,
}

/// Load a volume from a JSON descriptor and its raw payload.
pub fn load_volume(path: &Path) -> Result<Volume> {
    let text = fs::read_to_string(path)
        .map_err(|e| SliceError::io(format!("Failed to read {}: {e}", path.display())))?;
    let desc: VolumeDescriptor = serde_json::from_str(&text)
        .map_err(|e| SliceError::io(format!("Failed to parse {}: {e}", path.display())))?;

    let data_path = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(&desc.data),
        _ => desc.data.clone(),
    };
    let bytes = fs::read(&data_path)
        .map_err(|e| SliceError::io(format!("Failed to read {}: {e}", data_path.display())))?;

    let num_pixels: usize = desc.shape.iter().product();
    let expected = num_pixels * desc.format.bytes_per_pixel();
    if bytes.len() != expected {
        return Err(SliceError::io(format!(
            "{}: expected {expected} payload bytes for shape {:?} ({}), got {}",
            data_path.display(),
            desc.shape,
            desc.format,
            bytes.len()
        )));
    }

    let buffer = decode_payload(desc.format, &desc.shape, bytes, &data_path)?;
    match desc.origin {
        Some(origin) => {
            let region = VolumeRegion::new(origin, desc.shape)?;
            Volume::with_region(buffer, region)
        }
        None => Ok(Volume::new(buffer)),
    }
}

/// Save a volume as a JSON descriptor at `path` plus a sibling `.raw` payload.
pub fn save_volume(volume: &Volume, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let data_path = path.with_extension("raw");
    let data_name = data_path
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| SliceError::io(format!("Invalid output path {}", path.display())))?;

    let desc = VolumeDescriptor {
        format: volume.format(),
        shape: volume.shape().to_vec(),
        origin: Some(volume.region().index.clone()),
        data: data_name,
    };
    let json = serde_json::to_string_pretty(&desc)
        .map_err(|e| SliceError::io(format!("Failed to serialize {}: {e}", path.display())))?;
    fs::write(path, json)
        .map_err(|e| SliceError::io(format!("Failed to write {}: {e}", path.display())))?;

    let bytes = encode_payload(volume.buffer());
    fs::write(&data_path, bytes)
        .map_err(|e| SliceError::io(format!("Failed to write {}: {e}", data_path.display())))
}

/// Load a grayscale PNG/JPEG/etc. as a 2-D 8-bit volume shaped `[height, width]`.
pub fn load_volume_png(path: &Path) -> Result<Volume> {
    let img = image::open(path)
        .map_err(|e| SliceError::io(format!("Failed to open {}: {e}", path.display())))?
        .into_luma8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    let data = img.into_raw();
    let array = ArrayD::from_shape_vec(IxDyn(&[height, width]), data)
        .map_err(|e| SliceError::io(format!("Failed to shape {}: {e}", path.display())))?;
    Ok(Volume::new(PixelBuffer::U8(array)))
}

/// Save a 2-D 8-bit volume as a grayscale PNG.
pub fn save_volume_png(volume: &Volume, path: &Path) -> Result<()> {
    if volume.ndim() != 2 {
        return Err(SliceError::config(format!(
            "PNG output needs a 2-dimensional volume, got {} dimensions",
            volume.ndim()
        )));
    }
    let data = volume.buffer().as_u8().ok_or_else(|| {
        SliceError::config(format!(
            "PNG output needs a u8 volume, got {}",
            volume.format()
        ))
    })?;
    ensure_parent_dir(path)?;
    let (height, width) = (volume.shape()[0], volume.shape()[1]);
    let pixels: Vec<u8> = data.iter().copied().collect();
    let img = GrayImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| SliceError::io("Failed to create image buffer".to_string()))?;
    img.save(path)
        .map_err(|e| SliceError::io(format!("Failed to save {}: {e}", path.display())))
}

fn decode_payload(
    format: PixelFormat,
    shape: &[usize],
    bytes: Vec<u8>,
    path: &Path,
) -> Result<PixelBuffer> {
    let shape_err =
        |e: ndarray::ShapeError| SliceError::io(format!("Failed to shape {}: {e}", path.display()));
    match format {
        PixelFormat::U8 => Ok(PixelBuffer::U8(
            ArrayD::from_shape_vec(IxDyn(shape), bytes).map_err(shape_err)?,
        )),
        PixelFormat::U16 => {
            let values: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            Ok(PixelBuffer::U16(
                ArrayD::from_shape_vec(IxDyn(shape), values).map_err(shape_err)?,
            ))
        }
        PixelFormat::F32 => {
            let values: Vec<f32> = bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect();
            Ok(PixelBuffer::F32(
                ArrayD::from_shape_vec(IxDyn(shape), values).map_err(shape_err)?,
            ))
        }
    }
}

fn encode_payload(buffer: &PixelBuffer) -> Vec<u8> {
    match buffer {
        PixelBuffer::U8(a) => a.iter().copied().collect(),
        PixelBuffer::U16(a) => a.iter().flat_map(|v| v.to_le_bytes()).collect(),
        PixelBuffer::F32(a) => a.iter().flat_map(|v| v.to_le_bytes()).collect(),
    }
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| SliceError::io(format!("Failed to create {}: {e}", parent.display())))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::PixelValue;

    #[test]
    fn raw_round_trip_preserves_pixels_and_region() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vol.json");

        let mut buffer = PixelBuffer::zeros(PixelFormat::U16, &[2, 3, 2]);
        buffer.set(&[1, 2, 0], PixelValue::U16(777)).unwrap();
        let region = VolumeRegion::new(vec![-1, 0, 4], vec![2, 3, 2]).unwrap();
        let volume = Volume::with_region(buffer, region).unwrap();

        save_volume(&volume, &path).unwrap();
        let loaded = load_volume(&path).unwrap();

        assert_eq!(loaded.buffer(), volume.buffer());
        assert_eq!(loaded.region(), volume.region());
    }

    #[test]
    fn png_round_trip_for_2d_u8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slice.png");

        let mut volume = Volume::new(PixelBuffer::zeros(PixelFormat::U8, &[3, 5]));
        volume.set(&[2, 4], PixelValue::U8(200)).unwrap();

        save_volume_png(&volume, &path).unwrap();
        let loaded = load_volume_png(&path).unwrap();
        assert_eq!(loaded.buffer(), volume.buffer());
    }

    #[test]
    fn png_output_rejects_3d_volumes() {
        let volume = Volume::new(PixelBuffer::zeros(PixelFormat::U8, &[2, 2, 2]));
        assert!(save_volume_png(&volume, Path::new("unused.png")).is_err());
    }
}
