//! Synthesis of low-resolution acquisitions from a high-resolution volume.
//!
//! Three acquisition effects are modelled:
//!
//!  - thick slices, as the detector integrating magnetization across a slab
//!    ([`slab_average`])
//!  - thick slices separated by inter-slice gaps whose signal is never
//!    acquired ([`gapped_slab_sample`])
//!  - a reduced in-plane acquisition matrix, as truncation of k-space
//!    ([`spectral_truncate`])
//!
//! Every operation takes an immutable [`Volume`] and returns a new one with
//! corrected spacing and origin, leaving the direction cosines untouched.

mod slab;
mod spectral;

pub use slab::{gapped_slab_sample, slab_average};
pub use spectral::spectral_truncate;

use crate::enums::Axis;
use crate::volume::Volume;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DegradationError {
    /// The request cannot be satisfied at the source resolution. Raised
    /// before any voxel is touched.
    #[error("Invalid parameter `{parameter}`: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },

    /// Valid parameters that leave no usable output sample.
    #[error("Degenerate result: {0}")]
    DegenerateResult(String),
}

impl DegradationError {
    pub(crate) fn invalid(parameter: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            parameter,
            reason: reason.into(),
        }
    }
}

/// Degradation front end with a fixed default slice axis.
///
/// Holds no volume and no mutable state, so one simulator can be shared
/// across threads and subjects.
#[derive(Clone, Copy, Debug, Default)]
pub struct DegradationSimulator {
    slice_axis: Axis,
}

impl DegradationSimulator {
    pub fn new(slice_axis: Axis) -> Self {
        Self { slice_axis }
    }

    pub fn slice_axis(&self) -> Axis {
        self.slice_axis
    }

    /// Thick-slice acquisition along the default slice axis
    pub fn simulate_thick_slices(
        &self,
        volume: &Volume,
        thickness_mm: f64,
    ) -> Result<Volume, DegradationError> {
        slab_average(volume, thickness_mm, self.slice_axis)
    }

    pub fn simulate_thick_slices_on(
        &self,
        volume: &Volume,
        thickness_mm: f64,
        axis: Axis,
    ) -> Result<Volume, DegradationError> {
        slab_average(volume, thickness_mm, axis)
    }

    /// Thick slices with discarded gaps along the default slice axis
    pub fn simulate_inter_slice_gap(
        &self,
        volume: &Volume,
        thickness_mm: f64,
        gap_mm: f64,
    ) -> Result<Volume, DegradationError> {
        gapped_slab_sample(volume, thickness_mm, gap_mm, self.slice_axis)
    }

    pub fn simulate_inter_slice_gap_on(
        &self,
        volume: &Volume,
        thickness_mm: f64,
        gap_mm: f64,
        axis: Axis,
    ) -> Result<Volume, DegradationError> {
        gapped_slab_sample(volume, thickness_mm, gap_mm, axis)
    }

    /// Smaller acquisition matrix on every axis, including the slice axis
    pub fn simulate_in_plane_resolution(
        &self,
        volume: &Volume,
        downsample_factor: usize,
    ) -> Result<Volume, DegradationError> {
        spectral_truncate(volume, downsample_factor)
    }
}
