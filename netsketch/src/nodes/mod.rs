//! Node extraction
//!
//! Electrical nodes are inferred from image geometry. Symbols and labels are
//! erased, the remaining strokes (wires) are thresholded and dilated so small
//! gaps close, and each connected region becomes a candidate node. A
//! component is attached to every large region that reaches into a margin
//! around its box.
//!
//! Node naming is positional: the active region with the highest raw label is
//! always called "0" (ground). No ground symbol detection is attempted.

pub mod mask;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::detection::{DetectedComponent, DetectedText};
use crate::geometry::Point;
pub use mask::LabelImage;

/// Name the netlist uses for ground.
pub const GROUND: &str = "0";

/// Gray level at or below which a pixel is a stroke.
pub const DEFAULT_BINARIZE_THRESHOLD: u8 = 200;
pub const DEFAULT_DILATE_KERNEL: u32 = 5;
pub const DEFAULT_DILATE_ITERATIONS: u32 = 3;
/// Padding (px) around a component box.
pub const DEFAULT_ROI_MARGIN: u32 = 15;
/// Regions must be strictly larger than this (px²) to count as nodes.
pub const DEFAULT_MIN_NODE_AREA: u32 = 300;

/// A connected wire region of the cleaned image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeRegion {
    /// Raw connected-component label (never 0).
    pub id: u32,
    pub pixel_area: u32,
    pub centroid: Point,
}

/// Canonical names for the active raw node labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMap {
    names: BTreeMap<u32, String>,
}

impl NodeMap {
    /// Name sorted ids "1", "2", ...; the last id is renamed to ground.
    pub fn from_active(active: &BTreeSet<u32>) -> Self {
        let ids: Vec<u32> = active.iter().copied().filter(|&id| id != 0).collect();
        let last = ids.last().copied();
        let mut names = BTreeMap::new();
        for (i, &id) in ids.iter().enumerate() {
            let name = if Some(id) == last {
                GROUND.to_string()
            } else {
                (i + 1).to_string()
            };
            names.insert(id, name);
        }
        Self { names }
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Raw label currently named ground.
    pub fn ground_id(&self) -> Option<u32> {
        self.names
            .iter()
            .find(|(_, name)| name.as_str() == GROUND)
            .map(|(&id, _)| id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.names.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.names.iter().map(|(&id, name)| (id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Everything node extraction produces for one image.
#[derive(Debug, Clone)]
pub struct NodeExtraction {
    /// Input with components and text erased.
    pub masked: RgbImage,
    pub labels: LabelImage,
    /// All labelled regions, by raw id.
    pub regions: BTreeMap<u32, NodeRegion>,
    pub node_map: NodeMap,
}

impl NodeExtraction {
    /// Regions that received a canonical name.
    pub fn active_regions(&self) -> impl Iterator<Item = &NodeRegion> {
        self.regions
            .values()
            .filter(|r| self.node_map.contains(r.id))
    }
}

/// Infers nodes from wire strokes and attaches them to components.
#[derive(Debug, Clone)]
pub struct NodeExtractor {
    pub binarize_threshold: u8,
    pub dilate_kernel: u32,
    pub dilate_iterations: u32,
    pub roi_margin: u32,
    pub min_node_area: u32,
}

impl Default for NodeExtractor {
    fn default() -> Self {
        Self {
            binarize_threshold: DEFAULT_BINARIZE_THRESHOLD,
            dilate_kernel: DEFAULT_DILATE_KERNEL,
            dilate_iterations: DEFAULT_DILATE_ITERATIONS,
            roi_margin: DEFAULT_ROI_MARGIN,
            min_node_area: DEFAULT_MIN_NODE_AREA,
        }
    }
}

impl NodeExtractor {
    /// Run extraction and fill `raw_nodes` on every component.
    pub fn extract(
        &self,
        image: &RgbImage,
        components: &mut [DetectedComponent],
        texts: &[DetectedText],
    ) -> NodeExtraction {
        let masked = mask::erase_regions(image, components, texts);
        let binary = mask::binarize(&masked, self.binarize_threshold);
        let dilated = mask::dilate(&binary, self.dilate_kernel, self.dilate_iterations);
        let labels = mask::label_regions(&dilated);
        let regions = region_stats(&labels);
        tracing::debug!("Labelled {} wire regions", regions.len());

        for component in components.iter_mut() {
            component.raw_nodes = self.touched_nodes(&labels, &regions, component);
            if component.raw_nodes.is_empty() {
                tracing::debug!("{} touches no node", component.name);
            }
        }

        let active = retain_touched(components);
        let node_map = NodeMap::from_active(&active);
        tracing::debug!("{} active nodes", node_map.len());

        NodeExtraction {
            masked,
            labels,
            regions,
            node_map,
        }
    }

    /// Labels with area above the minimum inside the padded component box,
    /// ascending.
    pub fn touched_nodes(
        &self,
        labels: &LabelImage,
        regions: &BTreeMap<u32, NodeRegion>,
        component: &DetectedComponent,
    ) -> Vec<u32> {
        if !component.bbox.is_finite() {
            return Vec::new();
        }
        let (width, height) = labels.dimensions();
        let (x1, y1, x2, y2) = component.bbox.to_pixels();
        let margin = i64::from(self.roi_margin);

        let x_start = (i64::from(x1) - margin).max(0);
        let y_start = (i64::from(y1) - margin).max(0);
        let x_end = (i64::from(x2) + margin).min(i64::from(width));
        let y_end = (i64::from(y2) + margin).min(i64::from(height));

        let mut found = BTreeSet::new();
        for y in y_start..y_end {
            for x in x_start..x_end {
                let id = labels.get_pixel(x as u32, y as u32)[0];
                if id != 0 {
                    found.insert(id);
                }
            }
        }

        found
            .into_iter()
            .filter(|id| {
                regions
                    .get(id)
                    .is_some_and(|r| r.pixel_area > self.min_node_area)
            })
            .collect()
    }
}

/// Area and centroid of every nonzero label.
pub fn region_stats(labels: &LabelImage) -> BTreeMap<u32, NodeRegion> {
    let mut acc: BTreeMap<u32, (u32, f64, f64)> = BTreeMap::new();
    for (x, y, pixel) in labels.enumerate_pixels() {
        let id = pixel[0];
        if id == 0 {
            continue;
        }
        let entry = acc.entry(id).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += f64::from(x);
        entry.2 += f64::from(y);
    }

    acc.into_iter()
        .map(|(id, (area, sx, sy))| {
            let n = f64::from(area);
            (
                id,
                NodeRegion {
                    id,
                    pixel_area: area,
                    centroid: Point::new(sx / n, sy / n),
                },
            )
        })
        .collect()
}

/// Keep raw nodes touched by at least one component and return the union.
///
/// Every raw node already comes from some component, so the count filter
/// never removes anything. It is kept so a stricter threshold (nodes shared by
/// two components) can be introduced here.
fn retain_touched(components: &mut [DetectedComponent]) -> BTreeSet<u32> {
    const MIN_TOUCHES: usize = 1;

    let mut touches: HashMap<u32, usize> = HashMap::new();
    for component in components.iter() {
        for &id in &component.raw_nodes {
            *touches.entry(id).or_insert(0) += 1;
        }
    }

    let mut active = BTreeSet::new();
    for component in components.iter_mut() {
        component
            .raw_nodes
            .retain(|id| touches.get(id).copied().unwrap_or(0) >= MIN_TOUCHES);
        active.extend(component.raw_nodes.iter().copied());
    }
    active
}
