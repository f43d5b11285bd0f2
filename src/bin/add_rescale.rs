//! Sums a volume with itself slice by slice through a u16 intermediate, then
//! rescales back to 8-bit. Probes the binding validation on the way: an
//! unbound processor must refuse to execute, and the add stage alone must be
//! rejected as a unified operation because it produces u16 slices.

use slicewise::filters::{AddSlices, RescaleIntensity};
use slicewise::volume::io::{load_volume, save_volume};
use slicewise::{PixelFormat, Result, SliceError, SliceProcessor};
use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        let program = args.first().map(String::as_str).unwrap_or("add_rescale");
        eprintln!("usage: {program} <input> <output>");
        process::exit(1);
    }
    if let Err(err) = run(Path::new(&args[1]), Path::new(&args[2])) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run(input: &Path, output: &Path) -> Result<()> {
    let volume = load_volume(input)?;

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);

    if processor.execute(&[&volume, &volume]).is_ok() {
        return Err(SliceError::config(
            "executing with no operation bound unexpectedly succeeded",
        ));
    }
    if processor.bind_filter(Box::new(AddSlices::new())).is_ok() {
        return Err(SliceError::config(
            "a u16-producing stage was accepted as a unified u8 operation",
        ));
    }

    processor.bind_entry(Box::new(AddSlices::new()))?;
    processor.bind_exit(Box::new(RescaleIntensity::new(0, 255)))?;

    let result = processor.execute(&[&volume, &volume])?;
    save_volume(&result, output)?;

    let axis = volume.ndim().saturating_sub(1);
    println!(
        "summed and rescaled {} slices along axis {axis} -> {}",
        volume.extent(axis).unwrap_or(0),
        output.display()
    );
    Ok(())
}
