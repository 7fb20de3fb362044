use log::warn;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{Result, TbError};
use crate::interfaces::Dimension;

/// Unique key of a hopping: destination state i, source state j, integer cell displacement d
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HoppingKey {
    pub state_i: usize,
    pub state_j: usize,
    pub displacement: [i32; 3],
}

impl HoppingKey {
    pub fn new(state_i: usize, state_j: usize, displacement: [i32; 3]) -> Self {
        Self {
            state_i,
            state_j,
            displacement,
        }
    }

    /// Key of the Hermitian partner (j, i, -d)
    pub fn partner(&self) -> Self {
        Self {
            state_i: self.state_j,
            state_j: self.state_i,
            displacement: self.displacement.map(|d| -d),
        }
    }

    /// Zero-displacement self-hopping, i.e. an on-site energy
    pub fn is_onsite(&self) -> bool {
        self.state_i == self.state_j && self.displacement == [0, 0, 0]
    }
}

impl fmt::Display for HoppingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [d1, d2, d3] = self.displacement;
        write!(f, "({} <- {}, [{}, {}, {}])", self.state_i, self.state_j, d1, d2, d3)
    }
}

/// Interchange record of one hopping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoppingRecord {
    pub state_i: usize,
    pub state_j: usize,
    pub d1: i32,
    pub d2: i32,
    pub d3: i32,
    pub re: f64,
    pub im: f64,
}

impl HoppingRecord {
    pub fn new(state_i: usize, state_j: usize, displacement: [i32; 3], amplitude: Complex64) -> Self {
        let [d1, d2, d3] = displacement;
        Self {
            state_i,
            state_j,
            d1,
            d2,
            d3,
            re: amplitude.re,
            im: amplitude.im,
        }
    }

    pub fn key(&self) -> HoppingKey {
        HoppingKey::new(self.state_i, self.state_j, [self.d1, self.d2, self.d3])
    }

    pub fn amplitude(&self) -> Complex64 {
        Complex64::new(self.re, self.im)
    }
}

/// Kind of Hermiticity violation found for one hopping
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WarningKind {
    /// No hopping stored under the partner key
    MissingPartner,
    /// Partner present but not the complex conjugate
    ConjugateMismatch { expected: Complex64, found: Complex64 },
}

/// Advisory finding of [`HoppingTable::hermiticity_check`]; never fatal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NonHermitianWarning {
    pub key: HoppingKey,
    pub kind: WarningKind,
}

impl fmt::Display for NonHermitianWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            WarningKind::MissingPartner => {
                write!(f, "hopping {} has no partner {}", self.key, self.key.partner())
            }
            WarningKind::ConjugateMismatch { expected, found } => write!(
                f,
                "hopping {}: partner {} is {} but should be {}",
                self.key,
                self.key.partner(),
                found,
                expected
            ),
        }
    }
}

/// Hopping table keyed by (i, j, d), serialized as an unordered list of records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<HoppingRecord>", into = "Vec<HoppingRecord>")]
pub struct HoppingTable {
    entries: BTreeMap<HoppingKey, Complex64>,
}

impl HoppingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &HoppingKey) -> Option<Complex64> {
        self.entries.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HoppingKey, &Complex64)> {
        self.entries.iter()
    }

    /// All hoppings from state j into state i, ordered by displacement
    pub fn between(&self, state_i: usize, state_j: usize) -> Vec<([i32; 3], Complex64)> {
        self.entries
            .iter()
            .filter(|(key, _)| key.state_i == state_i && key.state_j == state_j)
            .map(|(key, amplitude)| (key.displacement, *amplitude))
            .collect()
    }

    /// Merge `records` into a copy of the table.
    ///
    /// Amplitudes of equal keys are summed, with each other and with stored
    /// entries. Displacement components along non-periodic axes are set to zero.
    /// Any invalid state index rejects the whole batch.
    pub fn commit<I>(&self, records: I, state_count: usize, dimension: Dimension) -> Result<Self>
    where
        I: IntoIterator<Item = HoppingRecord>,
    {
        let records: Vec<HoppingRecord> = records.into_iter().collect();
        for record in &records {
            for index in [record.state_i, record.state_j] {
                if index >= state_count {
                    return Err(TbError::UnknownState {
                        index,
                        count: state_count,
                    });
                }
            }
        }

        let mut table = self.clone();
        for record in records {
            let key = project_key(record.key(), dimension);
            *table.entries.entry(key).or_insert(Complex64::new(0.0, 0.0)) += record.amplitude();
        }
        Ok(table)
    }

    /// Replace every hopping from `state_j` into `state_i` by `hoppings`
    pub fn set_pair(
        &self,
        state_i: usize,
        state_j: usize,
        hoppings: &[([i32; 3], Complex64)],
        state_count: usize,
        dimension: Dimension,
    ) -> Result<Self> {
        let mut cleared = self.clone();
        cleared
            .entries
            .retain(|key, _| !(key.state_i == state_i && key.state_j == state_j));
        let records = hoppings
            .iter()
            .map(|(d, amplitude)| HoppingRecord::new(state_i, state_j, *d, *amplitude));
        cleared.commit(records, state_count, dimension)
    }

    /// Drop hoppings touching `index` and shift higher state indices down by one
    pub fn remove_state(&self, index: usize) -> Self {
        let shift = |i: usize| if i > index { i - 1 } else { i };
        let entries = self
            .entries
            .iter()
            .filter(|(key, _)| key.state_i != index && key.state_j != index)
            .map(|(key, amplitude)| {
                (
                    HoppingKey::new(shift(key.state_i), shift(key.state_j), key.displacement),
                    *amplitude,
                )
            })
            .collect();
        Self { entries }
    }

    /// Table with every displacement replaced by `map(d)`; colliding keys are summed
    pub fn map_displacements<F>(&self, map: F) -> Self
    where
        F: Fn([i32; 3]) -> [i32; 3],
    {
        let mut entries: BTreeMap<HoppingKey, Complex64> = BTreeMap::new();
        for (key, amplitude) in &self.entries {
            let mapped = HoppingKey::new(key.state_i, key.state_j, map(key.displacement));
            *entries.entry(mapped).or_insert(Complex64::new(0.0, 0.0)) += amplitude;
        }
        Self { entries }
    }

    pub fn to_records(&self) -> Vec<HoppingRecord> {
        self.entries
            .iter()
            .map(|(key, amplitude)| HoppingRecord::new(key.state_i, key.state_j, key.displacement, *amplitude))
            .collect()
    }

    /// Flag every hopping without a conjugate partner (j, i, -d).
    ///
    /// A missing partner is reported for the hopping that lacks it; a conjugate
    /// mismatch is reported once per pair.
    pub fn hermiticity_check(&self, tolerance: f64) -> Vec<NonHermitianWarning> {
        let mut warnings = Vec::new();
        for (key, amplitude) in &self.entries {
            let partner = key.partner();
            match self.entries.get(&partner) {
                None => warnings.push(NonHermitianWarning {
                    key: *key,
                    kind: WarningKind::MissingPartner,
                }),
                Some(found) if *key <= partner => {
                    let expected = amplitude.conj();
                    if (found - expected).norm() > tolerance * expected.norm().max(1.0) {
                        warnings.push(NonHermitianWarning {
                            key: *key,
                            kind: WarningKind::ConjugateMismatch {
                                expected,
                                found: *found,
                            },
                        });
                    }
                }
                Some(_) => {}
            }
        }

        for warning in &warnings {
            warn!("non-Hermitian hopping table: {}", warning);
        }
        warnings
    }

    pub fn is_hermitian(&self, tolerance: f64) -> bool {
        self.entries.iter().all(|(key, amplitude)| {
            self.entries
                .get(&key.partner())
                .map_or(false, |found| (found - amplitude.conj()).norm() <= tolerance * amplitude.norm().max(1.0))
        })
    }
}

impl From<Vec<HoppingRecord>> for HoppingTable {
    fn from(records: Vec<HoppingRecord>) -> Self {
        let mut entries: BTreeMap<HoppingKey, Complex64> = BTreeMap::new();
        for record in records {
            *entries.entry(record.key()).or_insert(Complex64::new(0.0, 0.0)) += record.amplitude();
        }
        Self { entries }
    }
}

impl From<HoppingTable> for Vec<HoppingRecord> {
    fn from(table: HoppingTable) -> Self {
        table.to_records()
    }
}

// Zero displacement components along non-periodic axes
fn project_key(key: HoppingKey, dimension: Dimension) -> HoppingKey {
    let mut displacement = key.displacement;
    for (axis, component) in displacement.iter_mut().enumerate() {
        if !dimension.is_periodic(axis) {
            *component = 0;
        }
    }
    HoppingKey { displacement, ..key }
}
