use slicewise::filters::MedianFilter;
use slicewise::volume::io::{load_volume, load_volume_png, save_volume, save_volume_png};
use slicewise::{PixelFormat, Result, SliceProcessor, Volume};
use std::env;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() != 3 {
        let program = args.first().map(String::as_str).unwrap_or("slicewise");
        eprintln!("usage: {program} <input> <output>");
        process::exit(1);
    }
    if let Err(err) = run(Path::new(&args[1]), Path::new(&args[2])) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}

fn run(input: &Path, output: &Path) -> Result<()> {
    let volume = read_volume(input)?;

    let mut processor = SliceProcessor::new(PixelFormat::U8, PixelFormat::U8);
    processor.bind_filter(Box::new(MedianFilter::new(1)))?;
    let result = processor.execute(&[&volume])?;

    write_volume(&result, output)?;

    let axis = volume.ndim().saturating_sub(1);
    let slices = volume.extent(axis).unwrap_or(0);
    println!(
        "median-filtered {slices} slices along axis {axis} -> {}",
        output.display()
    );
    Ok(())
}

fn read_volume(path: &Path) -> Result<Volume> {
    if is_png(path) {
        load_volume_png(path)
    } else {
        load_volume(path)
    }
}

fn write_volume(volume: &Volume, path: &Path) -> Result<()> {
    if is_png(path) {
        save_volume_png(volume, path)
    } else {
        save_volume(volume, path)
    }
}

fn is_png(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("png"))
        .unwrap_or(false)
}
