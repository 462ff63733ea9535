//! netsketch - netlist extraction from photographed circuit sketches
//!
//! Takes a photo of a circuit diagram together with the output of an object
//! detector (component boxes) and an OCR engine (text fragments), and produces
//! a SPICE-like netlist plus two debug images.
//!
//! # Quick Start
//!
//! ```no_run
//! use netsketch::prelude::*;
//! use std::path::PathBuf;
//!
//! let inputs = InputFiles {
//!     image: PathBuf::from("sketch.png"),
//!     detections: PathBuf::from("detections.json"),
//!     ocr: Some(PathBuf::from("ocr.json")),
//! };
//! let output = NetSketchCore::process_files(
//!     &inputs,
//!     &PipelineOptions::default(),
//!     &RenderConfig::default(),
//! ).unwrap();
//!
//! println!("{}", output.netlist_text);
//! ```
//!
//! # Pipeline
//!
//! - **Fusion**: unit symbols seen by the detector are appended to OCR text
//! - **Value matching**: nearest unit-compatible fragment per component
//! - **Node extraction**: wire regions from the masked, dilated image
//! - **Synthesis**: `R1 1 0 10K` lines, a report and an annotated image

pub mod config;
pub mod core;
pub mod detection;
pub mod geometry;
pub mod netlist;
pub mod nodes;
pub mod render;

// Re-export main types
pub use crate::config::PipelineOptions;
pub use crate::core::{
    load_image, load_json, InputFiles, NetSketchCore, NetSketchError, PipelineOutput,
    PipelineStats,
};
pub use detection::{
    ComponentKind, DetectedComponent, DetectedText, RawDetection, RawText, SymbolKind, UnitSymbol,
};
pub use geometry::{Point, Rect, Shape};
pub use netlist::{solver_input, Netlist, NetlistEntry, NetlistSynthesizer};
pub use nodes::{NodeExtractor, NodeMap, NodeRegion};
pub use render::RenderConfig;

/// Run the pipeline with default options and no font (convenience wrapper).
///
/// Returns `(masked image, annotated image, netlist text)`.
pub fn extract_netlist(
    image: &image::RgbImage,
    detections: Vec<RawDetection>,
    ocr: &[RawText],
) -> (image::RgbImage, image::RgbImage, String) {
    NetSketchCore::process(
        image,
        detections,
        ocr,
        &PipelineOptions::default(),
        &RenderConfig::default(),
    )
    .into_parts()
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        ComponentKind, InputFiles, NetSketchCore, NetSketchError, PipelineOptions, PipelineOutput,
        RawDetection, RawText, Rect, RenderConfig, Shape,
    };
}
