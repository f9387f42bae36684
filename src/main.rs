use anyhow::{Context, Result};
use clap::Parser;
use image::ImageReader;

use markcrop::{process, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load input image
    let img = ImageReader::open(&cli.input)
        .with_context(|| format!("Failed to open input file: {:?}", cli.input))?
        .decode()
        .with_context(|| format!("Failed to decode image: {:?}", cli.input))?;

    let (input_width, input_height) = (img.width(), img.height());

    if cli.verbose {
        eprintln!("Loaded image: {:?} ({}x{})", cli.input, input_width, input_height);
        eprintln!(
            "Marker ids: even {}/{}, odd {}/{}",
            cli.marker_ids.even_side,
            cli.marker_ids.even_top,
            cli.marker_ids.odd_side,
            cli.marker_ids.odd_top
        );
        eprintln!();
    }

    // Detect markers, straighten, crop
    let cropped = process(img, &cli.crop_config(), cli.verbose)
        .with_context(|| format!("Failed to crop page: {:?}", cli.input))?;

    // Save result
    cropped
        .save(&cli.output)
        .with_context(|| format!("Failed to save output: {:?}", cli.output))?;

    eprintln!("Saved cropped page: {:?}", cli.output);
    eprintln!(
        "Dimensions: {}x{} -> {}x{}",
        input_width,
        input_height,
        cropped.width(),
        cropped.height()
    );

    Ok(())
}
