//! Pipeline configuration
//!
//! Thresholds for every stage, stored in TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::NetSketchError;
use crate::detection::fusion::{TextSymbolFusion, DEFAULT_FUSION_RADIUS};
use crate::detection::matcher::{ComponentValueMatcher, DEFAULT_MATCH_RADIUS, DEFAULT_UNIT_BONUS};
use crate::netlist::{NetlistSynthesizer, DEFAULT_VALUE};
use crate::nodes::{
    NodeExtractor, DEFAULT_BINARIZE_THRESHOLD, DEFAULT_DILATE_ITERATIONS, DEFAULT_DILATE_KERNEL,
    DEFAULT_MIN_NODE_AREA, DEFAULT_ROI_MARGIN,
};

/// Options for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Max distance (px) between an OCR fragment and a unit symbol.
    pub fusion_radius: f64,
    /// Max distance (px) between a component center and a value fragment.
    pub match_radius: f64,
    /// Score bonus for unit-compatible fragments.
    pub unit_bonus: f64,
    /// Gray level at or below which a pixel counts as a stroke.
    pub binarize_threshold: u8,
    /// Side of the square dilation kernel.
    pub dilate_kernel: u32,
    pub dilate_iterations: u32,
    /// Padding (px) around a component box when looking for wires.
    pub roi_margin: u32,
    /// Regions at or below this area (px²) are not nodes.
    pub min_node_area: u32,
    /// OCR fragments below this confidence are dropped.
    pub min_text_confidence: f64,
    /// Value written for components with no matched fragment.
    pub default_value: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fusion_radius: DEFAULT_FUSION_RADIUS,
            match_radius: DEFAULT_MATCH_RADIUS,
            unit_bonus: DEFAULT_UNIT_BONUS,
            binarize_threshold: DEFAULT_BINARIZE_THRESHOLD,
            dilate_kernel: DEFAULT_DILATE_KERNEL,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
            roi_margin: DEFAULT_ROI_MARGIN,
            min_node_area: DEFAULT_MIN_NODE_AREA,
            min_text_confidence: 0.0,
            default_value: DEFAULT_VALUE.to_string(),
        }
    }
}

impl PipelineOptions {
    pub fn from_toml_str(content: &str) -> Result<Self, NetSketchError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, NetSketchError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, NetSketchError> {
        toml::to_string_pretty(self).map_err(|e| NetSketchError::Config(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), NetSketchError> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn fusion(&self) -> TextSymbolFusion {
        TextSymbolFusion::new(self.fusion_radius)
    }

    pub fn matcher(&self) -> ComponentValueMatcher {
        ComponentValueMatcher::new(self.match_radius, self.unit_bonus)
    }

    pub fn node_extractor(&self) -> NodeExtractor {
        NodeExtractor {
            binarize_threshold: self.binarize_threshold,
            dilate_kernel: self.dilate_kernel,
            dilate_iterations: self.dilate_iterations,
            roi_margin: self.roi_margin,
            min_node_area: self.min_node_area,
        }
    }

    pub fn synthesizer(&self) -> NetlistSynthesizer {
        NetlistSynthesizer::new(self.default_value.clone())
    }
}
