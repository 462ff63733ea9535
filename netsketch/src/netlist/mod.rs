//! Netlist synthesis
//!
//! Turns components with raw node ids and matched values into a SPICE-like
//! netlist (`R1 1 0 10K`), plus a human-readable report of the same pass.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detection::value::parse_magnitude;
use crate::detection::{ComponentKind, DetectedComponent, DetectedText};
use crate::nodes::{NodeMap, GROUND};

/// First line of every generated netlist.
pub const NETLIST_HEADER: &str = "# netsketch netlist";
/// Value written when no fragment was matched.
pub const DEFAULT_VALUE: &str = "1k";
/// Terminal name for a component that touches no node.
pub const UNKNOWN_NODE: &str = "?";

/// Hands out `R1`, `R2`, `C1`, ... for one pass.
#[derive(Debug, Default)]
pub struct NameAllocator {
    counters: HashMap<ComponentKind, usize>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self, kind: ComponentKind) -> String {
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        format!("{}{}", kind.spice_prefix(), counter)
    }
}

/// One element line of the netlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetlistEntry {
    /// SPICE name (`R1`).
    pub name: String,
    /// Detector-side name of the component (`resistor_1`).
    pub component: String,
    pub kind: ComponentKind,
    pub node1: String,
    pub node2: String,
    pub value: String,
    /// `false` when `value` is the default placeholder.
    pub value_matched: bool,
    /// Numeric reading of `value`, when it parses.
    pub magnitude: Option<f64>,
    /// Every canonical node the component touches, sorted.
    pub nodes: Vec<String>,
}

impl NetlistEntry {
    pub fn to_line(&self) -> String {
        format!("{} {} {} {}", self.name, self.node1, self.node2, self.value)
    }
}

/// Netlist for one processed image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Netlist {
    pub entries: Vec<NetlistEntry>,
}

impl Netlist {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Header line followed by one line per component.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(NETLIST_HEADER);
        out.push('\n');
        for entry in &self.entries {
            out.push_str(&entry.to_line());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Netlist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Builds netlists and reports.
#[derive(Debug, Clone)]
pub struct NetlistSynthesizer {
    default_value: String,
}

impl Default for NetlistSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_VALUE)
    }
}

impl NetlistSynthesizer {
    pub fn new(default_value: impl Into<String>) -> Self {
        Self {
            default_value: default_value.into(),
        }
    }

    /// One entry per component, in input order.
    pub fn synthesize(&self, components: &[DetectedComponent], nodes: &NodeMap) -> Netlist {
        let mut names = NameAllocator::new();
        let entries = components
            .iter()
            .map(|c| {
                let terminals: Vec<&str> =
                    c.raw_nodes.iter().filter_map(|&id| nodes.name(id)).collect();
                let value = c
                    .matched_value
                    .clone()
                    .unwrap_or_else(|| self.default_value.clone());
                let sorted: BTreeSet<&str> = terminals.iter().copied().collect();

                NetlistEntry {
                    name: names.next_name(c.kind),
                    component: c.name.clone(),
                    kind: c.kind,
                    node1: terminals.first().copied().unwrap_or(UNKNOWN_NODE).to_string(),
                    node2: terminals.get(1).copied().unwrap_or(GROUND).to_string(),
                    magnitude: parse_magnitude(&value),
                    value,
                    value_matched: c.matched_value.is_some(),
                    nodes: sorted.into_iter().map(str::to_string).collect(),
                }
            })
            .collect();
        Netlist { entries }
    }

    /// Human-readable summary: connections, matched values, raw OCR.
    pub fn report(&self, netlist: &Netlist, texts: &[DetectedText]) -> String {
        let mut out = String::new();
        out.push_str("=== Circuit Netlist ===\n\n");

        out.push_str("--- Connections ---\n");
        for entry in &netlist.entries {
            let nodes = if entry.nodes.is_empty() {
                "[Not Connected]".to_string()
            } else {
                format!("[{}]", entry.nodes.join(", "))
            };
            out.push_str(&format!("{} ({}) -> Nodes: {}\n", entry.name, entry.component, nodes));
        }

        out.push_str("\n--- Component Values ---\n");
        let matched: Vec<_> = netlist.entries.iter().filter(|e| e.value_matched).collect();
        if matched.is_empty() {
            out.push_str("No values matched with correct units.\n");
        }
        for entry in matched {
            out.push_str(&format!("{} = {}\n", entry.name, entry.value));
        }

        out.push_str("\n--- Raw OCR Data ---\n");
        if texts.is_empty() {
            out.push_str("No text detected.\n");
        }
        for (i, text) in texts.iter().enumerate() {
            out.push_str(&format!("{}. {} (Conf: {:.2})\n", i + 1, text.text, text.confidence));
        }

        out
    }
}

/// Netlist text as a solver reads it: blank and `#` comment lines removed.
pub fn solver_input(netlist: &str) -> String {
    netlist
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn component(kind: ComponentKind, raw_nodes: Vec<u32>, value: Option<&str>) -> DetectedComponent {
        DetectedComponent {
            id: 0,
            name: format!("{}_x", kind),
            label: kind.to_string(),
            kind,
            bbox: Rect::new(0.0, 0.0, 10.0, 10.0),
            raw_nodes,
            matched_value: value.map(str::to_string),
        }
    }

    fn node_map(ids: &[u32]) -> NodeMap {
        NodeMap::from_active(&ids.iter().copied().collect())
    }

    #[test]
    fn test_name_allocator_counts_per_kind() {
        let mut names = NameAllocator::new();
        assert_eq!(names.next_name(ComponentKind::Resistor), "R1");
        assert_eq!(names.next_name(ComponentKind::Capacitor), "C1");
        assert_eq!(names.next_name(ComponentKind::Resistor), "R2");
        assert_eq!(names.next_name(ComponentKind::Other), "X1");
        assert_eq!(names.next_name(ComponentKind::CurrentSource), "I1");
    }

    #[test]
    fn test_empty_netlist_is_header_only() {
        let netlist = NetlistSynthesizer::default().synthesize(&[], &NodeMap::default());
        assert_eq!(netlist.to_text(), format!("{}\n", NETLIST_HEADER));
    }

    #[test]
    fn test_lines_and_defaults() {
        let comps = vec![
            component(ComponentKind::VoltageSource, vec![2, 5], Some("9")),
            component(ComponentKind::Resistor, vec![2], None),
            component(ComponentKind::Capacitor, vec![], Some("10U")),
        ];
        let netlist = NetlistSynthesizer::default().synthesize(&comps, &node_map(&[2, 5]));
        let text = netlist.to_text();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], NETLIST_HEADER);
        assert_eq!(lines[1], "V1 1 0 9");
        assert_eq!(lines[2], "R1 1 0 1k");
        assert_eq!(lines[3], "C1 ? 0 10U");
        assert!(!netlist.entries[1].value_matched);
        assert_eq!(netlist.entries[1].magnitude, Some(1000.0));
    }

    #[test]
    fn test_report_sections() {
        let comps = vec![
            component(ComponentKind::Resistor, vec![1, 2], Some("10K")),
            component(ComponentKind::Inductor, vec![], None),
        ];
        let synth = NetlistSynthesizer::default();
        let netlist = synth.synthesize(&comps, &node_map(&[1, 2]));
        let texts = vec![DetectedText {
            text: "10k".into(),
            shape: Rect::new(0.0, 0.0, 5.0, 5.0).into(),
            confidence: 0.876,
        }];
        let report = synth.report(&netlist, &texts);
        assert!(report.contains("R1 (resistor_x) -> Nodes: [0, 1]"));
        assert!(report.contains("L1 (inductor_x) -> Nodes: [Not Connected]"));
        assert!(report.contains("R1 = 10K"));
        assert!(report.contains("1. 10k (Conf: 0.88)"));

        let empty = synth.report(&Netlist::default(), &[]);
        assert!(empty.contains("No values matched with correct units."));
        assert!(empty.contains("No text detected."));
    }

    #[test]
    fn test_solver_input_strips_comments() {
        let text = "# netsketch netlist\nR1 1 0 10K\n\n# note\nV1 1 0 9\n";
        assert_eq!(solver_input(text), "R1 1 0 10K\nV1 1 0 9");
    }
}
