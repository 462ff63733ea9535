//! Detector and OCR records
//!
//! Raw records come from the external object detector and OCR engine (either
//! in-process or as JSON files). This module turns them into the typed
//! records the pipeline works on: [`DetectedComponent`], [`DetectedText`] and
//! [`UnitSymbol`].

pub mod fusion;
pub mod matcher;
pub mod value;

use crate::geometry::{Point, Rect, Shape};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Electrical kind of a detected component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Other,
}

impl ComponentKind {
    /// Classify a detector class label ("resistor", "dc_voltage_source", ...).
    pub fn from_label(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("resistor") {
            ComponentKind::Resistor
        } else if label.contains("capacitor") {
            ComponentKind::Capacitor
        } else if label.contains("inductor") {
            ComponentKind::Inductor
        } else if label.contains("current") {
            ComponentKind::CurrentSource
        } else if label.contains("voltage") || label.contains("source") || label.contains("battery")
        {
            ComponentKind::VoltageSource
        } else {
            ComponentKind::Other
        }
    }

    /// SPICE element letter.
    pub fn spice_prefix(&self) -> char {
        match self {
            ComponentKind::Resistor => 'R',
            ComponentKind::Capacitor => 'C',
            ComponentKind::Inductor => 'L',
            ComponentKind::VoltageSource => 'V',
            ComponentKind::CurrentSource => 'I',
            ComponentKind::Other => 'X',
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentKind::Resistor => "resistor",
            ComponentKind::Capacitor => "capacitor",
            ComponentKind::Inductor => "inductor",
            ComponentKind::VoltageSource => "voltage_source",
            ComponentKind::CurrentSource => "current_source",
            ComponentKind::Other => "other",
        };
        write!(f, "{}", s)
    }
}

/// Unit glyph the detector recognizes as a separate symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Micro,
    Ohm,
}

impl SymbolKind {
    /// `None` when the label is a real circuit element.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "micro" | "mu" | "µ" | "μ" | "micro_symbol" => Some(SymbolKind::Micro),
            "ohm" | "omega" | "Ω" | "ω" | "ohm_symbol" => Some(SymbolKind::Ohm),
            _ => None,
        }
    }

    /// Normalized text appended to a value fragment.
    pub fn suffix(&self) -> &'static str {
        match self {
            SymbolKind::Micro => "u",
            SymbolKind::Ohm => "ohm",
        }
    }
}

/// One detector hit as delivered by the detection service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub label: String,
    #[serde(rename = "box")]
    pub bbox: Rect,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RawDetection {
    pub fn new(label: impl Into<String>, bbox: Rect) -> Self {
        Self {
            label: label.into(),
            bbox,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

fn default_confidence() -> f64 {
    1.0
}

/// One OCR fragment as delivered by the OCR service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawText {
    pub text: String,
    #[serde(rename = "box")]
    pub shape: Shape,
    #[serde(default = "default_confidence", alias = "conf")]
    pub confidence: f64,
}

impl RawText {
    pub fn new(text: impl Into<String>, shape: impl Into<Shape>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            shape: shape.into(),
            confidence,
        }
    }
}

/// A circuit element found on the sketch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedComponent {
    pub id: usize,
    /// Detector-side name, unique within one pass (`resistor_1`).
    pub name: String,
    pub label: String,
    pub kind: ComponentKind,
    pub bbox: Rect,
    /// Raw node labels touched by this component, ascending.
    pub raw_nodes: Vec<u32>,
    pub matched_value: Option<String>,
}

impl DetectedComponent {
    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

/// An OCR fragment after confidence filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedText {
    pub text: String,
    pub shape: Shape,
    pub confidence: f64,
}

impl DetectedText {
    pub fn center(&self) -> Point {
        self.shape.center()
    }
}

/// A unit glyph pulled out of the detector output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSymbol {
    pub kind: SymbolKind,
    pub bbox: Rect,
}

impl UnitSymbol {
    pub fn center(&self) -> Point {
        self.bbox.center()
    }
}

/// Turn OCR records into [`DetectedText`], dropping fragments below
/// `min_confidence`.
pub fn collect_texts(raw: &[RawText], min_confidence: f64) -> Vec<DetectedText> {
    let mut texts = Vec::with_capacity(raw.len());
    for item in raw {
        if item.confidence < min_confidence {
            tracing::debug!(
                "Dropping OCR fragment {:?} (confidence {:.2} < {:.2})",
                item.text,
                item.confidence,
                min_confidence
            );
            continue;
        }
        if item.shape.is_degenerate() {
            tracing::warn!("OCR fragment {:?} has a degenerate box", item.text);
        }
        texts.push(DetectedText {
            text: item.text.clone(),
            shape: item.shape.clone(),
            confidence: item.confidence,
        });
    }
    texts
}

/// Build component records from detector hits that are real circuit
/// elements.
///
/// Names supplied by the detector are kept when unique; otherwise a
/// `<label>_<n>` name is synthesized from per-label counters scoped to this
/// call.
pub fn collect_components(raw: &[RawDetection]) -> Vec<DetectedComponent> {
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = HashSet::new();
    let mut components = Vec::with_capacity(raw.len());

    for det in raw {
        let label = if det.label.trim().is_empty() {
            "comp".to_string()
        } else {
            det.label.trim().to_string()
        };

        let name = match &det.name {
            Some(n) if !n.trim().is_empty() && !taken.contains(n.trim()) => n.trim().to_string(),
            _ => loop {
                let counter = counters.entry(label.clone()).or_insert(0);
                *counter += 1;
                let candidate = format!("{}_{}", label, counter);
                if !taken.contains(&candidate) {
                    break candidate;
                }
            },
        };
        taken.insert(name.clone());

        if !det.bbox.is_finite() {
            tracing::warn!("Component {} has a non-finite bounding box", name);
        }

        components.push(DetectedComponent {
            id: components.len(),
            name,
            kind: ComponentKind::from_label(&label),
            label,
            bbox: det.bbox.normalized(),
            raw_nodes: Vec::new(),
            matched_value: None,
        });
    }

    components
}
