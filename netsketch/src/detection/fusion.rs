//! Text/symbol fusion
//!
//! Some unit markers (the micro sign, the ohm glyph) are picked up by the
//! object detector as symbols instead of being read by OCR. Each OCR fragment
//! takes the suffix of the nearest such symbol when it lies within the
//! fusion radius.

use super::{DetectedText, RawDetection, SymbolKind, UnitSymbol};
use crate::geometry::distance;

/// Default maximum centroid distance (px) between a fragment and a symbol.
pub const DEFAULT_FUSION_RADIUS: f64 = 80.0;

/// Detector output after symbols were pulled out and fused.
#[derive(Debug, Clone, Default)]
pub struct FusionResult {
    pub components: Vec<RawDetection>,
    pub symbols: Vec<UnitSymbol>,
    /// Number of fragments that received a suffix.
    pub fused: usize,
}

/// Attaches detected unit symbols to nearby OCR fragments.
#[derive(Debug, Clone)]
pub struct TextSymbolFusion {
    radius: f64,
}

impl Default for TextSymbolFusion {
    fn default() -> Self {
        Self::new(DEFAULT_FUSION_RADIUS)
    }
}

impl TextSymbolFusion {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    /// Split detector hits into real components and unit symbols.
    ///
    /// Symbols never reach the component list.
    pub fn split_symbols(detections: Vec<RawDetection>) -> (Vec<RawDetection>, Vec<UnitSymbol>) {
        let mut components = Vec::with_capacity(detections.len());
        let mut symbols = Vec::new();
        for det in detections {
            match SymbolKind::from_label(&det.label) {
                Some(kind) => symbols.push(UnitSymbol {
                    kind,
                    bbox: det.bbox.normalized(),
                }),
                None => components.push(det),
            }
        }
        (components, symbols)
    }

    /// Rewrite fragment texts in place; returns how many were changed.
    pub fn fuse(&self, texts: &mut [DetectedText], symbols: &[UnitSymbol]) -> usize {
        if symbols.is_empty() {
            return 0;
        }

        let mut changed = 0;
        for text in texts.iter_mut() {
            let Some(symbol) = self.nearest_symbol(text, symbols) else {
                continue;
            };
            let suffix = symbol.kind.suffix();
            if text.text.to_lowercase().contains(suffix) {
                continue;
            }
            tracing::debug!("Fusing {:?} with {:?} symbol", text.text, symbol.kind);
            text.text.push_str(suffix);
            changed += 1;
        }
        changed
    }

    /// Detector output in, components out: symbols are stripped from
    /// `detections` and fused into `texts`.
    pub fn apply(&self, detections: Vec<RawDetection>, texts: &mut [DetectedText]) -> FusionResult {
        let (components, symbols) = Self::split_symbols(detections);
        let fused = self.fuse(texts, &symbols);
        tracing::debug!(
            "Fusion: {} symbols, {} fragments rewritten, {} components kept",
            symbols.len(),
            fused,
            components.len()
        );
        FusionResult {
            components,
            symbols,
            fused,
        }
    }

    // Strict `<` keeps the first-seen symbol on equal distances. Fragments
    // without a location never fuse.
    fn nearest_symbol<'a>(
        &self,
        text: &DetectedText,
        symbols: &'a [UnitSymbol],
    ) -> Option<&'a UnitSymbol> {
        if text.shape.is_degenerate() {
            return None;
        }
        let center = text.center();
        let mut best: Option<(&UnitSymbol, f64)> = None;
        for symbol in symbols {
            let d = distance(center, symbol.center());
            if d.is_nan() || d >= self.radius {
                continue;
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((symbol, d)),
            }
        }
        best.map(|(s, _)| s)
    }
}
