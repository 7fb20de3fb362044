// Definitions that are used throughout all modules

use serde::{Deserialize, Serialize};

use crate::errors::{Result, TbError};

// Enumeration for dimensionality (number of periodic basis vectors)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dimension {
    _0D,
    _1D,
    _2D,
    _3D,
}

impl Dimension {
    /// Number of periodic directions
    pub fn periodic_count(&self) -> usize {
        match self {
            Dimension::_0D => 0,
            Dimension::_1D => 1,
            Dimension::_2D => 2,
            Dimension::_3D => 3,
        }
    }

    /// Whether basis axis `axis` (0-based) is periodic
    pub fn is_periodic(&self, axis: usize) -> bool {
        axis < self.periodic_count()
    }

    pub fn from_count(n: usize) -> Result<Self> {
        match n {
            0 => Ok(Dimension::_0D),
            1 => Ok(Dimension::_1D),
            2 => Ok(Dimension::_2D),
            3 => Ok(Dimension::_3D),
            _ => Err(TbError::InvalidDimensionality {
                requested: n,
                reason: "dimensionality must be 0, 1, 2 or 3".to_string(),
            }),
        }
    }
}

// Enumeration to select the sampling mesh of a grid solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeshKind {
    /// Contains Γ; fractions (j - floor(n/2)) / n
    GammaCentered,
    /// Offset by half a step; fractions (j + 1/2) / n - 1/2
    MonkhorstPack,
}
