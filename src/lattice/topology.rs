use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lattice::site::SiteId;

/// A neighboring site and its lattice distance (always >= 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: SiteId,
    pub distance: f64,
}

/// Read-only neighbor lookup used by the reaction core.
pub trait NeighborGraph: Send + Sync {
    /// Neighbors of `id` with their distances. Unknown ids have no neighbors.
    fn neighbors_of(&self, id: SiteId) -> &[Neighbor];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborhoodKind {
    /// Sites within Manhattan distance `radius`.
    VonNeumann,
    /// Sites within Chebyshev distance `radius`.
    Moore,
}

/// Adjacency-list neighbor graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborhoodGraph {
    adjacency: Vec<Vec<Neighbor>>,
}

impl NeighborhoodGraph {
    pub fn with_sites(site_count: usize) -> Self {
        NeighborhoodGraph {
            adjacency: vec![Vec::new(); site_count],
        }
    }

    /// Add a bidirectional edge. Existing edges between the same sites are kept.
    ///
    /// Distances are in lattice units and must be finite and at least 1.
    pub fn connect(&mut self, a: SiteId, b: SiteId, distance: f64) -> Result<()> {
        if !(distance.is_finite() && distance >= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "edge {}-{} has distance {}, must be >= 1",
                a, b, distance
            )));
        }
        let needed = a.max(b) as usize + 1;
        if self.adjacency.len() < needed {
            self.adjacency.resize(needed, Vec::new());
        }
        if a == b || self.adjacency[a as usize].iter().any(|n| n.id == b) {
            return Ok(());
        }
        self.adjacency[a as usize].push(Neighbor { id: b, distance });
        self.adjacency[b as usize].push(Neighbor { id: a, distance });
        Ok(())
    }
}

impl NeighborGraph for NeighborhoodGraph {
    fn neighbors_of(&self, id: SiteId) -> &[Neighbor] {
        self.adjacency
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Build a periodic square grid with the given neighborhood shape and radius.
///
/// Site ids are `row * width + col`. Distances are Euclidean in lattice units.
/// On grids smaller than the neighborhood, wrapped offsets that land on the
/// same site collapse into a single neighbor at the shortest distance.
///
/// # Panics
/// Panics if width, height or radius is zero, or if `width * height` does
/// not fit in a [SiteId].
pub fn square_grid(
    width: u32,
    height: u32,
    kind: NeighborhoodKind,
    radius: u32,
) -> NeighborhoodGraph {
    assert!(width >= 1, "Grid width must be at least 1");
    assert!(height >= 1, "Grid height must be at least 1");
    assert!(radius >= 1, "Neighborhood radius must be at least 1");
    let site_count = width
        .checked_mul(height)
        .unwrap_or_else(|| panic!("Grid {}x{} has more sites than SiteId can index", width, height));

    let offsets = neighborhood_offsets(kind, radius);
    let mut adjacency = Vec::with_capacity(site_count as usize);

    for row in 0..height {
        for col in 0..width {
            let id = row * width + col;
            let mut closest: BTreeMap<SiteId, f64> = BTreeMap::new();
            for &(dc, dr) in &offsets {
                let nc = (col as i64 + dc).rem_euclid(width as i64) as u32;
                let nr = (row as i64 + dr).rem_euclid(height as i64) as u32;
                let nid = nr * width + nc;
                if nid == id {
                    continue;
                }
                let distance = ((dc * dc + dr * dr) as f64).sqrt();
                closest
                    .entry(nid)
                    .and_modify(|d| *d = d.min(distance))
                    .or_insert(distance);
            }
            // BTreeMap iteration keeps neighbor order deterministic
            adjacency.push(
                closest
                    .into_iter()
                    .map(|(id, distance)| Neighbor { id, distance })
                    .collect(),
            );
        }
    }

    NeighborhoodGraph { adjacency }
}

fn neighborhood_offsets(kind: NeighborhoodKind, radius: u32) -> Vec<(i64, i64)> {
    let r = radius as i64;
    let mut offsets = Vec::new();
    for dr in -r..=r {
        for dc in -r..=r {
            if dc == 0 && dr == 0 {
                continue;
            }
            let inside = match kind {
                NeighborhoodKind::VonNeumann => dc.abs() + dr.abs() <= r,
                NeighborhoodKind::Moore => true,
            };
            if inside {
                offsets.push((dc, dr));
            }
        }
    }
    offsets
}
