//! Station label placement (spec.md §4.6).
//!
//! Candidate generation and scored selection follow a nearest-neighbor
//! spatial-index pattern: build an `RTree` once, then score a small
//! candidate set per query point against it.

use rstar::primitives::GeomWithData;
use rstar::RTree;
use rustc_hash::FxHashMap;

use crate::geo_kernel::{self, Aabb, Point};
use crate::layout::seed::EdgeRecord;
use crate::model::{LabelAnchor, LocalizedName, Station, StationLabel};

struct Template {
    dx_units: f64,
    dy_units: f64,
    anchor: LabelAnchor,
}

/// The 8 fixed candidate templates named in spec.md §4.6: four cardinal
/// offsets plus the two "wide" east/west variants used when a name is long
/// enough that a diagonal placement would overlap the station dot.
fn candidate_templates() -> [Template; 8] {
    [
        Template { dx_units: 1.0, dy_units: 0.0, anchor: LabelAnchor::Start }, // E
        Template { dx_units: 0.75, dy_units: 0.75, anchor: LabelAnchor::Start }, // SE
        Template { dx_units: -1.0, dy_units: 0.0, anchor: LabelAnchor::End }, // W
        Template { dx_units: -0.75, dy_units: 0.75, anchor: LabelAnchor::End }, // SW
        Template { dx_units: 0.0, dy_units: -1.0, anchor: LabelAnchor::Middle }, // N
        Template { dx_units: 0.0, dy_units: 1.0, anchor: LabelAnchor::Middle }, // S
        Template { dx_units: 1.4, dy_units: 0.0, anchor: LabelAnchor::Start }, // E2
        Template { dx_units: -1.4, dy_units: 0.0, anchor: LabelAnchor::End }, // W2
    ]
}

/// Rough glyph-count width estimate, counting characters in the CJK/fullwidth
/// ranges as two units wide and everything else as one (spec.md §4.6,
/// "wide-character-aware width estimate").
fn estimate_text_width(name: &LocalizedName) -> f64 {
    let text = if !name.primary.is_empty() {
        &name.primary
    } else {
        &name.secondary
    };
    let units: f64 = text
        .chars()
        .map(|c| {
            let cp = c as u32;
            let wide = (0x1100..=0x115F).contains(&cp)
                || (0x2E80..=0xA4CF).contains(&cp)
                || (0xAC00..=0xD7A3).contains(&cp)
                || (0xF900..=0xFAFF).contains(&cp)
                || (0xFF00..=0xFF60).contains(&cp)
                || (0x20000..=0x3FFFD).contains(&cp);
            if wide {
                2.0
            } else {
                1.0
            }
        })
        .sum();
    units.max(1.0) * 6.2
}

fn label_bbox(station: Point, tmpl: &Template, padding: f64, width: f64, height: f64) -> Aabb {
    let dx = tmpl.dx_units * (width * 0.55 + padding);
    let dy = tmpl.dy_units * (height * 0.8 + padding);
    let cx = station[0] + dx;
    let cy = station[1] + dy;
    let half_w = width / 2.0;
    let half_h = height / 2.0;
    Aabb::of_box([cx - half_w, cy - half_h], [cx + half_w, cy + half_h])
}

/// Score a candidate: lower is better. Penalizes incident edges that fall on
/// the label's side, box overlap with other placed labels, proximity to
/// other station centers, and intersection with edges not incident to this
/// station (spec.md §4.6, "Scoring").
fn score_candidate(
    bbox: &Aabb,
    tmpl: &Template,
    placed_boxes: &[Aabb],
    station_tree: &RTree<GeomWithData<[f64; 2], usize>>,
    this_station: usize,
    own_pos: Point,
    edges: &[EdgeRecord],
    positions: &[Point],
) -> f64 {
    let mut cost = 0.0;

    for e in edges {
        let other = if e.from == this_station {
            Some(e.to)
        } else if e.to == this_station {
            Some(e.from)
        } else {
            None
        };
        if let Some(other) = other {
            let dir = geo_kernel::sub(positions[other], own_pos);
            let dot = dir[0] * tmpl.dx_units + dir[1] * tmpl.dy_units;
            if dot > 0.0 {
                cost += 11.0;
            }
        }
    }

    for other in placed_boxes {
        let area = bbox.overlap_area(other);
        if area > 0.0 {
            cost += area * 0.34 + 180.0;
        }
    }

    let center = [
        (bbox.min[0] + bbox.max[0]) / 2.0,
        (bbox.min[1] + bbox.max[1]) / 2.0,
    ];
    for candidate in station_tree.nearest_neighbor_iter(&center).take(4) {
        if candidate.data == this_station {
            continue;
        }
        let d = geo_kernel::point_rect_distance(*candidate.geom(), bbox.min, bbox.max);
        if d < 8.5 {
            cost += (8.5 - d) * 12.0;
        }
    }

    for e in edges {
        if e.from == this_station || e.to == this_station {
            continue;
        }
        let seg_box = Aabb::of_segment(positions[e.from], positions[e.to]);
        if !seg_box.overlaps(bbox) {
            continue;
        }
        let corners = [
            bbox.min,
            bbox.max,
            [bbox.min[0], bbox.max[1]],
            [bbox.max[0], bbox.min[1]],
        ];
        let mut hits_edge = false;
        for w in corners.windows(2) {
            if geo_kernel::segments_intersect(w[0], w[1], positions[e.from], positions[e.to]) {
                hits_edge = true;
                break;
            }
        }
        if hits_edge {
            cost += 52.0;
        }
    }

    cost
}

/// Compute label placements for every station, in processing order:
/// interchanges first, then by degree (descending), then by name length
/// (descending), breaking remaining ties by station id (spec.md §4.6,
/// "Processing order").
pub fn place_labels(
    stations: &[Station],
    positions: &[Point],
    edges: &[EdgeRecord],
    degree: &[usize],
    config: &crate::model::LayoutConfig,
) -> (FxHashMap<String, StationLabel>, FxHashMap<String, Aabb>) {
    let mut order: Vec<usize> = (0..stations.len()).collect();
    order.sort_by(|&a, &b| {
        let ia = stations[a].is_interchange();
        let ib = stations[b].is_interchange();
        ib.cmp(&ia)
            .then(degree[b].cmp(&degree[a]))
            .then_with(|| {
                let la = stations[a].name.primary.chars().count();
                let lb = stations[b].name.primary.chars().count();
                lb.cmp(&la)
            })
            .then_with(|| stations[a].id.cmp(&stations[b].id))
    });

    let station_tree: RTree<GeomWithData<[f64; 2], usize>> = RTree::bulk_load(
        positions
            .iter()
            .enumerate()
            .map(|(i, &p)| GeomWithData::new(p, i))
            .collect(),
    );

    let templates = candidate_templates();
    let mut placed_boxes: Vec<Aabb> = Vec::with_capacity(stations.len());
    let mut result = FxHashMap::default();
    let mut boxes_by_station = FxHashMap::default();

    for idx in order {
        let width = estimate_text_width(&stations[idx].name);
        let height = 13.0;
        let mut best_cost = f64::INFINITY;
        let mut best_tmpl = 0usize;
        let mut best_box = label_bbox(positions[idx], &templates[0], config.label_padding, width, height);

        for (ti, tmpl) in templates.iter().enumerate() {
            let bbox = label_bbox(positions[idx], tmpl, config.label_padding, width, height);
            let cost = score_candidate(
                &bbox,
                tmpl,
                &placed_boxes,
                &station_tree,
                idx,
                positions[idx],
                edges,
                positions,
            );
            if cost < best_cost {
                best_cost = cost;
                best_tmpl = ti;
                best_box = bbox;
            }
        }

        boxes_by_station.insert(stations[idx].id.clone(), best_box);
        placed_boxes.push(best_box);
        let tmpl = &templates[best_tmpl];
        result.insert(
            stations[idx].id.clone(),
            StationLabel {
                dx: tmpl.dx_units * (width * 0.55 + config.label_padding),
                dy: tmpl.dy_units * (height * 0.8 + config.label_padding),
                anchor: tmpl.anchor,
            },
        );
    }

    (result, boxes_by_station)
}
