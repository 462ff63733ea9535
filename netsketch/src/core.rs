//! Core pipeline shared by the CLI and library users.
//! One call processes one image end to end; nothing is kept between calls.

use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::de::DeserializeOwned;

use crate::config::PipelineOptions;
use crate::detection::{
    collect_components, collect_texts, DetectedComponent, DetectedText, RawDetection, RawText,
    UnitSymbol,
};
use crate::netlist::Netlist;
use crate::nodes::{NodeMap, NodeRegion};
use crate::render::{render_schematic, RenderConfig};

#[derive(Debug, thiserror::Error)]
pub enum NetSketchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Font error: {0}")]
    Font(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<toml::de::Error> for NetSketchError {
    fn from(e: toml::de::Error) -> Self {
        NetSketchError::Config(e.to_string())
    }
}

/// Counts gathered during one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PipelineStats {
    pub components: usize,
    pub symbols: usize,
    pub texts: usize,
    pub fused_texts: usize,
    pub matched_values: usize,
    pub wire_regions: usize,
    pub active_nodes: usize,
}

/// Everything one pass produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Input with components and text erased.
    pub masked: RgbImage,
    /// Input annotated with nodes, components and OCR outlines.
    pub annotated: RgbImage,
    pub netlist_text: String,
    pub netlist: Netlist,
    pub report: String,
    pub components: Vec<DetectedComponent>,
    pub texts: Vec<DetectedText>,
    pub symbols: Vec<UnitSymbol>,
    pub node_map: NodeMap,
    /// Active node regions, by ascending raw id.
    pub nodes: Vec<NodeRegion>,
    pub stats: PipelineStats,
}

impl PipelineOutput {
    /// `(masked, annotated, netlist text)`.
    pub fn into_parts(self) -> (RgbImage, RgbImage, String) {
        (self.masked, self.annotated, self.netlist_text)
    }

    /// Structured result (netlist, nodes, values, OCR, stats) as pretty JSON.
    pub fn to_json(&self) -> Result<String, NetSketchError> {
        let nodes: Vec<_> = self
            .nodes
            .iter()
            .map(|n| {
                serde_json::json!({
                    "raw_id": n.id,
                    "name": self.node_map.name(n.id),
                    "pixel_area": n.pixel_area,
                    "centroid": [n.centroid.x, n.centroid.y],
                })
            })
            .collect();
        let output = serde_json::json!({
            "netlist": self.netlist_text,
            "entries": self.netlist.entries,
            "nodes": nodes,
            "texts": self.texts,
            "stats": self.stats,
        });
        Ok(serde_json::to_string_pretty(&output)?)
    }
}

/// Core pipeline API used by both library users and the CLI.
pub struct NetSketchCore;

impl NetSketchCore {
    /// Run fusion, value matching, node extraction and synthesis on one image.
    ///
    /// `image` is RGB. Never fails: empty or odd inputs give an empty but
    /// valid netlist.
    pub fn process(
        image: &RgbImage,
        detections: Vec<RawDetection>,
        ocr: &[RawText],
        options: &PipelineOptions,
        render: &RenderConfig,
    ) -> PipelineOutput {
        let mut texts = collect_texts(ocr, options.min_text_confidence);

        let fusion = options.fusion().apply(detections, &mut texts);
        let symbols = fusion.symbols;

        let mut components = collect_components(&fusion.components);
        let matched_values = options.matcher().assign(&mut components, &texts);

        let extraction = options.node_extractor().extract(image, &mut components, &texts);

        let synthesizer = options.synthesizer();
        let netlist = synthesizer.synthesize(&components, &extraction.node_map);
        let netlist_text = netlist.to_text();
        let report = synthesizer.report(&netlist, &texts);

        let annotated = render_schematic(image, &extraction, &components, &texts, &netlist, render);

        let nodes: Vec<NodeRegion> = extraction.active_regions().copied().collect();
        let stats = PipelineStats {
            components: components.len(),
            symbols: symbols.len(),
            texts: texts.len(),
            fused_texts: fusion.fused,
            matched_values,
            wire_regions: extraction.regions.len(),
            active_nodes: extraction.node_map.len(),
        };
        tracing::info!(
            "Extracted {} components on {} nodes ({} values matched)",
            stats.components,
            stats.active_nodes,
            stats.matched_values
        );

        PipelineOutput {
            masked: extraction.masked,
            annotated,
            netlist_text,
            netlist,
            report,
            components,
            texts,
            symbols,
            node_map: extraction.node_map,
            nodes,
            stats,
        }
    }

    /// Load inputs from disk and run [`NetSketchCore::process`].
    pub fn process_files(
        inputs: &InputFiles,
        options: &PipelineOptions,
        render: &RenderConfig,
    ) -> Result<PipelineOutput, NetSketchError> {
        let image = load_image(&inputs.image)?;
        let detections: Vec<RawDetection> = load_json(&inputs.detections)?;
        let ocr: Vec<RawText> = match &inputs.ocr {
            Some(path) => load_json(path)?,
            None => Vec::new(),
        };
        tracing::debug!(
            "Loaded {}x{} image, {} detections, {} OCR fragments",
            image.width(),
            image.height(),
            detections.len(),
            ocr.len()
        );
        Ok(Self::process(&image, detections, &ocr, options, render))
    }
}

/// Paths of one pipeline run's inputs.
#[derive(Debug, Clone)]
pub struct InputFiles {
    pub image: PathBuf,
    /// JSON array of detector hits.
    pub detections: PathBuf,
    /// JSON array of OCR fragments.
    pub ocr: Option<PathBuf>,
}

/// Decode an image file as RGB.
pub fn load_image(path: &Path) -> Result<RgbImage, NetSketchError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Read a JSON document from `path`.
pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, NetSketchError> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        NetSketchError::InvalidInput(format!("{}: {}", path.display(), e))
    })
}
