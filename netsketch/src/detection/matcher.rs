//! Component value matching
//!
//! Each component takes the closest OCR fragment, with a flat bonus for
//! fragments whose units fit the component kind. This is a greedy
//! per-component choice: two components may claim the same fragment.

use super::value::normalize_value;
use super::{ComponentKind, DetectedComponent, DetectedText};
use crate::geometry::distance;

/// Default search radius (px) around a component center.
pub const DEFAULT_MATCH_RADIUS: f64 = 250.0;
/// Default score reduction for unit-compatible fragments.
pub const DEFAULT_UNIT_BONUS: f64 = 100.0;

/// Whether `text` looks like a value for a component of `kind`.
pub fn is_unit_compatible(text: &str, kind: ComponentKind) -> bool {
    let text = text.trim().to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    match kind {
        ComponentKind::Resistor => contains_any(&["ohm", "k", "m", "r"]) || is_plain_number(&text),
        ComponentKind::Capacitor => contains_any(&["f", "u", "n", "p", "micro"]),
        ComponentKind::Inductor => text.contains('h'),
        ComponentKind::VoltageSource => text.contains('v'),
        ComponentKind::CurrentSource => text.contains('a'),
        ComponentKind::Other => true,
    }
}

fn is_plain_number(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| c.is_ascii_digit() || c == '.')
        && text.chars().any(|c| c.is_ascii_digit())
}

/// A scored fragment for one component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub text_index: usize,
    pub distance: f64,
    pub score: f64,
    pub compatible: bool,
}

/// Greedy nearest-with-bonus value matcher.
#[derive(Debug, Clone)]
pub struct ComponentValueMatcher {
    radius: f64,
    unit_bonus: f64,
}

impl Default for ComponentValueMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_RADIUS, DEFAULT_UNIT_BONUS)
    }
}

impl ComponentValueMatcher {
    pub fn new(radius: f64, unit_bonus: f64) -> Self {
        Self { radius, unit_bonus }
    }

    /// All located fragments within range of `component`, in input order.
    pub fn candidates(&self, component: &DetectedComponent, texts: &[DetectedText]) -> Vec<Candidate> {
        let center = component.center();
        texts
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.shape.is_degenerate())
            .filter_map(|(i, t)| {
                let d = distance(center, t.center());
                if d.is_nan() || d >= self.radius {
                    return None;
                }
                let compatible = is_unit_compatible(&t.text, component.kind);
                let score = if compatible { d - self.unit_bonus } else { d };
                Some(Candidate {
                    text_index: i,
                    distance: d,
                    score,
                    compatible,
                })
            })
            .collect()
    }

    /// Lowest-scoring candidate; the first one wins on equal scores.
    pub fn best_candidate(
        &self,
        component: &DetectedComponent,
        texts: &[DetectedText],
    ) -> Option<Candidate> {
        self.candidates(component, texts)
            .into_iter()
            .fold(None, |best: Option<Candidate>, c| match best {
                Some(b) if b.score <= c.score => Some(b),
                _ => Some(c),
            })
    }

    /// Set `matched_value` on every component. Components with no fragment
    /// in range (or whose fragment normalizes to nothing) are left `None`.
    pub fn assign(&self, components: &mut [DetectedComponent], texts: &[DetectedText]) -> usize {
        let mut matched = 0;
        for component in components.iter_mut() {
            component.matched_value = self
                .best_candidate(component, texts)
                .and_then(|c| normalize_value(&texts[c.text_index].text));
            match &component.matched_value {
                Some(v) => {
                    matched += 1;
                    tracing::debug!("{} matched value {}", component.name, v);
                }
                None => tracing::debug!("{} has no value in range", component.name),
            }
        }
        matched
    }
}
