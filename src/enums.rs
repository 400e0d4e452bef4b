use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Voxel axis of a volume, in array order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("axis index {0} is out of range for a 3D volume")]
pub struct AxisOutOfRange(pub usize);

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Array axis index (0, 1 or 2)
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl TryFrom<usize> for Axis {
    type Error = AxisOutOfRange;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Axis::ALL.get(index).copied().ok_or(AxisOutOfRange(index))
    }
}

impl From<Axis> for ndarray::Axis {
    fn from(axis: Axis) -> Self {
        ndarray::Axis(axis.index())
    }
}

#[derive(Default)]
pub enum SortBy {
    /// Projection of ImagePositionPatient onto the slice normal
    #[default]
    ImagePositionPatient,
    InstanceNumber,
    None,
}
