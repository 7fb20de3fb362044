// Supercell expansion of a tight-binding unit cell

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::{Result, TbError};
use crate::interfaces::Dimension;
use crate::lattice::LatticeBasis;
use crate::model::hopping::HoppingRecord;
use crate::model::unit_cell::{Site, UnitCell};

/// Integer multipliers of the three basis vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupercellSpec {
    pub multipliers: [i64; 3],
}

impl SupercellSpec {
    pub fn new(n1: i64, n2: i64, n3: i64) -> Self {
        Self {
            multipliers: [n1, n2, n3],
        }
    }

    /// Multipliers as sizes; every value must be ≥ 1, and 1 along non-periodic axes
    pub fn validate(&self, dimension: Dimension) -> Result<[usize; 3]> {
        let mut sizes = [1usize; 3];
        for (axis, &value) in self.multipliers.iter().enumerate() {
            if value < 1 {
                return Err(TbError::InvalidMultiplier {
                    axis,
                    value,
                    reason: "multipliers must be at least 1".to_string(),
                });
            }
            if !dimension.is_periodic(axis) && value != 1 {
                return Err(TbError::InvalidMultiplier {
                    axis,
                    value,
                    reason: "axis is not periodic".to_string(),
                });
            }
            sizes[axis] = value as usize;
        }
        Ok(sizes)
    }

    /// Number of primitive cells in the supercell
    pub fn volume(&self) -> i64 {
        self.multipliers.iter().product()
    }
}

/// Expand a unit cell into an n1 × n2 × n3 supercell.
///
/// Image cells c are numbered c1·n2·n3 + c2·n3 + c3 and hold a copy of every
/// site; a state with index s in the primitive cell becomes image·S + s. A
/// hopping from cell 0 into cell d, seen from image c, lands in image
/// (c + d) mod n of supercell (c + d) div n.
pub fn expand(cell: &UnitCell, spec: &SupercellSpec) -> Result<UnitCell> {
    let basis = cell.basis();
    let dimension = basis.dimension();
    let sizes = spec.validate(dimension)?;

    let [a1, a2, a3] = basis.base_vectors();
    let scaled = [a1 * sizes[0] as f64, a2 * sizes[1] as f64, a3 * sizes[2] as f64];
    let super_basis = LatticeBasis::from_base_vectors(scaled[0], scaled[1], scaled[2], dimension)?;

    let images = image_cells(sizes);
    let state_count = cell.state_count();
    let image_index = |c: [i64; 3]| -> usize {
        (c[0] as usize * sizes[1] + c[1] as usize) * sizes[2] + c[2] as usize
    };

    let sites: Vec<Site> = images
        .iter()
        .flat_map(|c| {
            cell.sites().iter().map(move |site| {
                let fractional = [0usize, 1, 2]
                    .map(|axis| (c[axis] as f64 + site.fractional[axis]) / sizes[axis] as f64);
                Site {
                    name: format!("{}({},{},{})", site.name, c[0], c[1], c[2]),
                    fractional,
                    states: site.states.clone(),
                }
            })
        })
        .collect();

    let mut records = Vec::with_capacity(cell.hoppings().len() * images.len());
    for c in &images {
        let source_image = image_index(*c);
        for (key, amplitude) in cell.hoppings().iter() {
            let mut target = [0i64; 3];
            let mut quotient = [0i32; 3];
            for axis in 0..3 {
                let n = sizes[axis] as i64;
                let shifted = c[axis] + i64::from(key.displacement[axis]);
                target[axis] = shifted.rem_euclid(n);
                quotient[axis] = shifted.div_euclid(n) as i32;
            }
            records.push(HoppingRecord::new(
                source_image * state_count + key.state_i,
                image_index(target) * state_count + key.state_j,
                quotient,
                *amplitude,
            ));
        }
    }

    debug!(
        "supercell {:?}: {} sites, {} hoppings",
        sizes,
        sites.len(),
        records.len()
    );
    let name = format!("{} {}x{}x{}", cell.name, sizes[0], sizes[1], sizes[2]);
    UnitCell::from_parts(name, super_basis, sites, records)
}

// Image cell coordinates in c1-major order
fn image_cells(sizes: [usize; 3]) -> Vec<[i64; 3]> {
    let mut cells = Vec::with_capacity(sizes.iter().product());
    for c1 in 0..sizes[0] as i64 {
        for c2 in 0..sizes[1] as i64 {
            for c3 in 0..sizes[2] as i64 {
                cells.push([c1, c2, c3]);
            }
        }
    }
    cells
}
