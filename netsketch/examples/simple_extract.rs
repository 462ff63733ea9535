//! Simple extraction example: run the pipeline on an image and its detector/OCR JSON.

use netsketch::prelude::*;
use std::path::PathBuf;

fn main() -> Result<(), NetSketchError> {
    let mut args = std::env::args().skip(1);
    let (Some(image), Some(detections)) = (args.next(), args.next()) else {
        eprintln!("Usage: cargo run --example simple_extract <image> <detections.json> [ocr.json]");
        std::process::exit(1);
    };

    let inputs = InputFiles {
        image: PathBuf::from(image),
        detections: PathBuf::from(detections),
        ocr: args.next().map(PathBuf::from),
    };

    let output = NetSketchCore::process_files(
        &inputs,
        &PipelineOptions::default(),
        &RenderConfig::with_system_font(),
    )?;

    println!("{}", output.report);
    println!("{}", output.netlist_text);

    output.annotated.save("annotated.png")?;
    println!("Annotated image written to annotated.png");

    Ok(())
}
