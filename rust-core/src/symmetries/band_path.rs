// Band path sampling between high symmetry anchors

use log::debug;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TbError};

/// Role of a point on a band path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathPointKind {
    /// The anchor with this index in the anchor list
    Anchor(usize),
    Interior,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub k: Vector3<f64>,
    /// Cumulative Euclidean distance from the first anchor
    pub arc_length: f64,
    pub kind: PathPointKind,
}

/// Ordered k-points through a sequence of anchors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandPath {
    points: Vec<PathPoint>,
    /// Interior points assigned to each anchor-to-anchor segment
    segment_points: Vec<usize>,
}

impl BandPath {
    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn k_points(&self) -> Vec<Vector3<f64>> {
        self.points.iter().map(|p| p.k).collect()
    }

    pub fn arc_lengths(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.arc_length).collect()
    }

    /// Position of each anchor within the path
    pub fn anchor_indices(&self) -> Vec<usize> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| matches!(p.kind, PathPointKind::Anchor(_)))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn segment_points(&self) -> &[usize] {
        &self.segment_points
    }

    pub fn total_length(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.arc_length)
    }
}

/// Largest-remainder allocation of `budget` interior points over segments.
///
/// Each segment receives the floor of its length-proportional share; the
/// leftover points go to the largest fractional remainders (lower index wins
/// ties). Afterwards every segment of non-zero length holds at least one point,
/// so the sum may exceed `budget`.
pub fn allocate_interior_points(lengths: &[f64], budget: usize) -> Vec<usize> {
    let total: f64 = lengths.iter().sum();
    let mut allocation = vec![0usize; lengths.len()];
    if lengths.is_empty() || total <= 0.0 {
        return allocation;
    }

    let quotas: Vec<f64> = lengths.iter().map(|l| budget as f64 * l / total).collect();
    for (slot, quota) in allocation.iter_mut().zip(&quotas) {
        *slot = quota.floor() as usize;
    }

    let assigned: usize = allocation.iter().sum();
    let mut by_remainder: Vec<usize> = (0..lengths.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = quotas[a] - quotas[a].floor();
        let rb = quotas[b] - quotas[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });
    for &index in by_remainder.iter().take(budget.saturating_sub(assigned)) {
        allocation[index] += 1;
    }

    for (slot, length) in allocation.iter_mut().zip(lengths) {
        if *length > 0.0 && *slot == 0 {
            *slot = 1;
        }
    }
    allocation
}

/// Sample a path through `anchors` with about `target_count` points in total.
///
/// Every anchor appears exactly once. Interior points of a segment with m
/// points sit at fractions j/(m+1), j = 1..m. The returned length may differ
/// from `target_count`.
pub fn build_path(anchors: &[Vector3<f64>], target_count: usize) -> Result<BandPath> {
    if anchors.is_empty() {
        return Err(TbError::InvalidPath("at least one anchor is required".to_string()));
    }
    if anchors.iter().any(|a| a.iter().any(|c| !c.is_finite())) {
        return Err(TbError::InvalidPath("anchor coordinates must be finite".to_string()));
    }

    let lengths: Vec<f64> = anchors.windows(2).map(|w| (w[1] - w[0]).norm()).collect();
    let budget = target_count.saturating_sub(anchors.len());
    let segment_points = allocate_interior_points(&lengths, budget);
    debug!("band path allocation {:?} over lengths {:?}", segment_points, lengths);

    let mut points = Vec::with_capacity(anchors.len() + segment_points.iter().sum::<usize>());
    let mut arc_length = 0.0;
    points.push(PathPoint {
        k: anchors[0],
        arc_length,
        kind: PathPointKind::Anchor(0),
    });

    for (segment, (&m, &length)) in segment_points.iter().zip(&lengths).enumerate() {
        let (start, end) = (anchors[segment], anchors[segment + 1]);
        for j in 1..=m {
            let t = j as f64 / (m + 1) as f64;
            points.push(PathPoint {
                k: start + (end - start) * t,
                arc_length: arc_length + length * t,
                kind: PathPointKind::Interior,
            });
        }
        arc_length += length;
        points.push(PathPoint {
            k: end,
            arc_length,
            kind: PathPointKind::Anchor(segment + 1),
        });
    }

    Ok(BandPath {
        points,
        segment_points,
    })
}
