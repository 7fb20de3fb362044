use log::debug;
use nalgebra::Vector3;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;

use crate::config::HERMITICITY_TOLERANCE;
use crate::errors::{Result, TbError};
use crate::lattice::lattice_algorithms::unimodular_inverse;
use crate::lattice::LatticeBasis;
use crate::model::hopping::{HoppingRecord, HoppingTable, NonHermitianWarning};

/// A quantum state; identity only. On-site energies are zero-displacement self-hoppings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A site with fractional coordinates in [0, 1)³ (cosmetic) and its states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub fractional: [f64; 3],
    pub states: Vec<State>,
}

impl Site {
    pub fn new(name: impl Into<String>, fractional: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            fractional: fractional.map(wrap_unit),
            states: Vec::new(),
        }
    }

    pub fn with_states<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.states.extend(names.into_iter().map(State::new));
        self
    }
}

/// Reference to a node of the unit cell tree (the "current selection")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    Cell,
    Site(usize),
    State { site: usize, state: usize },
}

/// A resolved node of the unit cell tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node<'a> {
    Cell(&'a UnitCell),
    Site(&'a Site),
    State(&'a State),
}

/// Tight-binding unit cell: lattice basis, sites with states, hopping table.
///
/// Every edit returns a new cell, so earlier snapshots stay valid for undo.
/// Deserialized snapshots go through [`UnitCell::from_parts`] validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UnitCellData")]
pub struct UnitCell {
    pub name: String,
    basis: LatticeBasis,
    sites: Vec<Site>,
    hoppings: HoppingTable,
}

// Unvalidated wire form of a unit cell
#[derive(Deserialize)]
struct UnitCellData {
    name: String,
    basis: LatticeBasis,
    sites: Vec<Site>,
    hoppings: Vec<HoppingRecord>,
}

impl TryFrom<UnitCellData> for UnitCell {
    type Error = TbError;

    fn try_from(data: UnitCellData) -> Result<Self> {
        UnitCell::from_parts(data.name, data.basis, data.sites, data.hoppings)
    }
}

impl UnitCell {
    pub fn new(name: impl Into<String>, basis: LatticeBasis) -> Self {
        Self {
            name: name.into(),
            basis,
            sites: Vec::new(),
            hoppings: HoppingTable::new(),
        }
    }

    /// Assemble a cell from parts; hoppings are validated against the states
    pub fn from_parts(
        name: impl Into<String>,
        basis: LatticeBasis,
        sites: Vec<Site>,
        hoppings: impl IntoIterator<Item = HoppingRecord>,
    ) -> Result<Self> {
        let cell = Self {
            name: name.into(),
            basis,
            sites,
            hoppings: HoppingTable::new(),
        };
        cell.with_hoppings(hoppings)
    }

    // ======================== ACCESSORS ========================

    pub fn basis(&self) -> &LatticeBasis {
        &self.basis
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn hoppings(&self) -> &HoppingTable {
        &self.hoppings
    }

    /// Total number of states over all sites
    pub fn state_count(&self) -> usize {
        self.sites.iter().map(|site| site.states.len()).sum()
    }

    /// Flat state indices of one site (site order, then state order)
    pub fn site_state_range(&self, site: usize) -> Result<Range<usize>> {
        let Some(target) = self.sites.get(site) else {
            return Err(TbError::UnknownNode(format!("site {}", site)));
        };
        let start: usize = self.sites[..site].iter().map(|s| s.states.len()).sum();
        Ok(start..start + target.states.len())
    }

    pub fn state_index(&self, site: usize, state: usize) -> Result<usize> {
        let range = self.site_state_range(site)?;
        if state >= range.len() {
            return Err(TbError::UnknownNode(format!("state {} of site {}", state, site)));
        }
        Ok(range.start + state)
    }

    /// "site.state" labels in flat index order
    pub fn state_labels(&self) -> Vec<String> {
        self.sites
            .iter()
            .flat_map(|site| {
                site.states
                    .iter()
                    .map(move |state| format!("{}.{}", site.name, state.name))
            })
            .collect()
    }

    /// Cartesian position of a site inside cell 0
    pub fn site_position(&self, site: usize) -> Result<Vector3<f64>> {
        let target = self
            .sites
            .get(site)
            .ok_or_else(|| TbError::UnknownNode(format!("site {}", site)))?;
        Ok(self.basis.frac_to_cart(Vector3::from(target.fractional)))
    }

    // ======================== NODE RESOLUTION ========================

    pub fn resolve(&self, node: &NodeRef) -> Result<Node<'_>> {
        match *node {
            NodeRef::Cell => Ok(Node::Cell(self)),
            NodeRef::Site(site) => self
                .sites
                .get(site)
                .map(Node::Site)
                .ok_or_else(|| TbError::UnknownNode(format!("site {}", site))),
            NodeRef::State { site, state } => self
                .sites
                .get(site)
                .and_then(|s| s.states.get(state))
                .map(Node::State)
                .ok_or_else(|| TbError::UnknownNode(format!("state {} of site {}", state, site))),
        }
    }

    /// Flat state indices below a node, used as a projection subset
    pub fn state_indices(&self, node: &NodeRef) -> Result<Vec<usize>> {
        match *node {
            NodeRef::Cell => Ok((0..self.state_count()).collect()),
            NodeRef::Site(site) => Ok(self.site_state_range(site)?.collect()),
            NodeRef::State { site, state } => Ok(vec![self.state_index(site, state)?]),
        }
    }

    // ======================== SNAPSHOT EDITS ========================

    pub fn with_basis(&self, basis: LatticeBasis) -> Self {
        let dimension = basis.dimension();
        let mut cell = self.clone();
        cell.basis = basis;
        cell.hoppings = self.hoppings.map_displacements(|mut d| {
            for (axis, component) in d.iter_mut().enumerate() {
                if !dimension.is_periodic(axis) {
                    *component = 0;
                }
            }
            d
        });
        cell
    }

    /// Change the number of periodic directions; displacements along axes that
    /// become non-periodic are dropped (colliding hoppings are summed)
    pub fn with_dimensionality(&self, n: usize) -> Result<Self> {
        let basis = self.basis.set_dimensionality(n)?;
        Ok(self.with_basis(basis))
    }

    pub fn with_site(&self, site: Site) -> Self {
        let mut cell = self.clone();
        cell.sites.push(site);
        cell
    }

    /// Append a state to a site. Flat indices of later sites shift up by one.
    pub fn with_state(&self, site: usize, name: impl Into<String>) -> Result<Self> {
        let range = self.site_state_range(site)?;
        let inserted = range.end;
        let mut cell = self.clone();
        cell.sites[site].states.push(State::new(name));
        cell.hoppings = HoppingTable::from(
            self.hoppings
                .to_records()
                .into_iter()
                .map(|mut record| {
                    if record.state_i >= inserted {
                        record.state_i += 1;
                    }
                    if record.state_j >= inserted {
                        record.state_j += 1;
                    }
                    record
                })
                .collect::<Vec<_>>(),
        );
        Ok(cell)
    }

    /// Remove a site, its states and every hopping touching them
    pub fn without_site(&self, site: usize) -> Result<Self> {
        let range = self.site_state_range(site)?;
        let mut cell = self.clone();
        for index in range.rev() {
            cell.hoppings = cell.hoppings.remove_state(index);
        }
        cell.sites.remove(site);
        Ok(cell)
    }

    /// Remove one state and every hopping touching it
    pub fn without_state(&self, site: usize, state: usize) -> Result<Self> {
        let index = self.state_index(site, state)?;
        let mut cell = self.clone();
        cell.hoppings = self.hoppings.remove_state(index);
        cell.sites[site].states.remove(state);
        Ok(cell)
    }

    /// Commit hopping records (duplicates summed). Fails without changes on a bad index.
    pub fn with_hoppings(&self, records: impl IntoIterator<Item = HoppingRecord>) -> Result<Self> {
        let hoppings = self
            .hoppings
            .commit(records, self.state_count(), self.basis.dimension())?;
        let mut cell = self.clone();
        cell.hoppings = hoppings;
        Ok(cell)
    }

    /// Replace all hoppings from state j into state i
    pub fn with_pair_hoppings(
        &self,
        state_i: usize,
        state_j: usize,
        hoppings: &[([i32; 3], Complex64)],
    ) -> Result<Self> {
        let table = self.hoppings.set_pair(
            state_i,
            state_j,
            hoppings,
            self.state_count(),
            self.basis.dimension(),
        )?;
        let mut cell = self.clone();
        cell.hoppings = table;
        Ok(cell)
    }

    // ======================== ANALYSIS ========================

    pub fn hermiticity_check(&self) -> Vec<NonHermitianWarning> {
        self.hoppings.hermiticity_check(HERMITICITY_TOLERANCE)
    }

    pub fn is_hermitian(&self) -> bool {
        self.hoppings.is_hermitian(HERMITICITY_TOLERANCE)
    }

    /// Reduce the lattice basis and carry the model along.
    ///
    /// With reduced = original · U, displacements become d' = U⁻¹ d and site
    /// coordinates f' = U⁻¹ f wrapped into [0, 1) on periodic axes, so the Bloch
    /// Hamiltonian is unchanged.
    pub fn reduce(&self) -> Result<Self> {
        let (basis, transform) = self.basis.reduce_with_transform()?;
        let inverse = unimodular_inverse(&transform).ok_or_else(|| {
            TbError::InvalidArgument("reduction produced a non-unimodular transform".to_string())
        })?;
        let dimension = basis.dimension();

        let mut displacements: HashMap<[i32; 3], [i32; 3]> = HashMap::new();
        for (key, _) in self.hoppings.iter() {
            let d = key.displacement.map(i64::from);
            let mut mapped = [0i32; 3];
            for (row, slot) in mapped.iter_mut().enumerate() {
                let value: i64 = (0..3).map(|col| inverse[(row, col)] * d[col]).sum();
                *slot = i32::try_from(value).map_err(|_| {
                    TbError::InvalidArgument(format!("displacement {} overflows after reduction", value))
                })?;
            }
            displacements.insert(key.displacement, mapped);
        }
        let hoppings = self
            .hoppings
            .map_displacements(|d| displacements.get(&d).copied().unwrap_or(d));

        let inverse_real = inverse.map(|v| v as f64);
        let sites = self
            .sites
            .iter()
            .map(|site| {
                let f = inverse_real * Vector3::from(site.fractional);
                let mut wrapped = site.clone();
                for axis in 0..3 {
                    wrapped.fractional[axis] = if dimension.is_periodic(axis) {
                        wrap_unit(f[axis])
                    } else {
                        f[axis]
                    };
                }
                wrapped
            })
            .collect();

        debug!("reduced unit cell '{}' with {} hoppings", self.name, hoppings.len());
        Ok(Self {
            name: self.name.clone(),
            basis,
            sites,
            hoppings,
        })
    }
}

// Wrap a fractional coordinate into [0, 1)
fn wrap_unit(c: f64) -> f64 {
    let wrapped = c.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}
