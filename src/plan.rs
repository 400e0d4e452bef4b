//! Batch description of the low-resolution variants to simulate per subject.
//!
//! ```json
//! {
//!   "slice_axis": "z",
//!   "thick_slices": [3.0, 5.0],
//!   "inter_slice_gap": [{ "thickness": 2.0, "gap": 3.0 }],
//!   "in_plane_resolution": [2],
//!   "normalization": "zscore"
//! }
//! ```

use crate::degradation::{DegradationError, DegradationSimulator};
use crate::enums::Axis;
use crate::normalize::Normalization;
use crate::volume::Volume;

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse plan {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GapConfig {
    pub thickness: f64,
    pub gap: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationPlan {
    pub slice_axis: Axis,
    /// Slab thicknesses in mm
    pub thick_slices: Vec<f64>,
    pub inter_slice_gap: Vec<GapConfig>,
    /// Integer k-space downsampling factors
    pub in_plane_resolution: Vec<usize>,
    pub normalization: Normalization,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Variant {
    ThickSlices { thickness: f64 },
    InterSliceGap { thickness: f64, gap: f64 },
    InPlane { factor: usize },
}

impl Variant {
    /// File-name friendly tag, e.g. `thick_5mm`. Lengths are printed as
    /// given, never truncated: 2.5mm slabs are `thick_2.5mm`.
    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn simulate(
        &self,
        simulator: &DegradationSimulator,
        volume: &Volume,
    ) -> Result<Volume, DegradationError> {
        match *self {
            Variant::ThickSlices { thickness } => simulator.simulate_thick_slices(volume, thickness),
            Variant::InterSliceGap { thickness, gap } => {
                simulator.simulate_inter_slice_gap(volume, thickness, gap)
            }
            Variant::InPlane { factor } => simulator.simulate_in_plane_resolution(volume, factor),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::ThickSlices { thickness } => write!(f, "thick_{thickness}mm"),
            Variant::InterSliceGap { thickness, gap } => write!(f, "gap_th{thickness}_gap{gap}mm"),
            Variant::InPlane { factor } => write!(f, "inplane_ds{factor}"),
        }
    }
}

#[derive(Debug)]
pub struct SimulatedVariant {
    pub variant: Variant,
    pub result: Result<Volume, DegradationError>,
}

pub fn load_plan(path: impl AsRef<Path>) -> Result<SimulationPlan, PlanError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| PlanError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| PlanError::Parse {
        path: path.display().to_string(),
        source,
    })
}

impl SimulationPlan {
    pub fn simulator(&self) -> DegradationSimulator {
        DegradationSimulator::new(self.slice_axis)
    }

    /// Thick slices first, then gaps, then in-plane factors, each in file order
    pub fn variants(&self) -> Vec<Variant> {
        let thick = self
            .thick_slices
            .iter()
            .map(|&thickness| Variant::ThickSlices { thickness });
        let gaps = self.inter_slice_gap.iter().map(|g| Variant::InterSliceGap {
            thickness: g.thickness,
            gap: g.gap,
        });
        let in_plane = self
            .in_plane_resolution
            .iter()
            .map(|&factor| Variant::InPlane { factor });
        thick.chain(gaps).chain(in_plane).collect()
    }

    /// Simulate every variant of the plan from one high-resolution volume.
    ///
    /// Variants run in parallel. A failing variant does not stop the others;
    /// its error is kept in its own result.
    pub fn run(&self, volume: &Volume) -> Vec<SimulatedVariant> {
        let simulator = self.simulator();
        let normalization = self.normalization;
        self.variants()
            .into_par_iter()
            .map(|variant| {
                let result = variant
                    .simulate(&simulator, volume)
                    .map(|lr| normalization.apply(lr));
                match &result {
                    Ok(lr) => info!("Simulated {variant}: {:?}", lr.dim()),
                    Err(e) => warn!("Failed to simulate {variant}: {e}"),
                }
                SimulatedVariant { variant, result }
            })
            .collect()
    }
}
