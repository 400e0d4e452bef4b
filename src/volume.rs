use crate::enums::Axis;
use crate::geometry;

use image::GrayImage;
use image::ImageBuffer;
use nalgebra::{Matrix3, Vector3};
use ndarray::Array3;
use ndarray::ArrayView2;
use rayon::prelude::*;
use thiserror::Error;

const ORTHONORMAL_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum VolumeError {
    #[error("Volume has an empty axis: {0:?}")]
    Empty((usize, usize, usize)),

    #[error("Spacing on axis {axis} must be positive, got {value}")]
    NonPositiveSpacing { axis: usize, value: f64 },

    #[error("Direction matrix is not orthonormal")]
    NonOrthonormalDirection,
}

/// Dense 3D scalar volume anchored in patient space.
///
/// A volume never changes once built; every simulation produces a new one.
#[derive(Clone, Debug)]
pub struct Volume {
    data: Array3<f32>,
    spacing: Vector3<f64>,
    origin: Vector3<f64>,
    direction: Matrix3<f64>,
}

impl Volume {
    /// Build a volume, validating its geometry
    ///
    /// # Errors
    ///
    /// Returns error if an axis has zero length, a spacing is not strictly
    /// positive, or the direction matrix is not orthonormal
    pub fn new(
        data: Array3<f32>,
        spacing: Vector3<f64>,
        origin: Vector3<f64>,
        direction: Matrix3<f64>,
    ) -> Result<Self, VolumeError> {
        let dim = data.dim();
        if dim.0 == 0 || dim.1 == 0 || dim.2 == 0 {
            return Err(VolumeError::Empty(dim));
        }
        if let Some((axis, &value)) = spacing
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s > 0.0))
        {
            return Err(VolumeError::NonPositiveSpacing { axis, value });
        }
        if !geometry::is_orthonormal(&direction, ORTHONORMAL_TOLERANCE) {
            return Err(VolumeError::NonOrthonormalDirection);
        }
        Ok(Self {
            data,
            spacing,
            origin,
            direction,
        })
    }

    /// Volume with identity orientation and its origin at zero
    pub fn with_spacing(data: Array3<f32>, spacing: Vector3<f64>) -> Result<Self, VolumeError> {
        Self::new(data, spacing, Vector3::zeros(), Matrix3::identity())
    }

    /// Same orientation, new samples and sampling geometry. Callers guarantee
    /// that `data` is non-empty and `spacing` stays positive.
    pub(crate) fn resampled(
        &self,
        data: Array3<f32>,
        spacing: Vector3<f64>,
        origin: Vector3<f64>,
    ) -> Self {
        Self {
            data,
            spacing,
            origin,
            direction: self.direction,
        }
    }

    /// Get the dimensions of the volume along axes (x, y, z)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Number of voxels along `axis`
    pub fn len_of(&self, axis: Axis) -> usize {
        self.data.len_of(axis.into())
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    pub fn into_data(self) -> Array3<f32> {
        self.data
    }

    /// Voxel size in mm along each axis
    pub fn spacing(&self) -> &Vector3<f64> {
        &self.spacing
    }

    /// Physical position (mm) of voxel (0, 0, 0)
    pub fn origin(&self) -> &Vector3<f64> {
        &self.origin
    }

    /// Columns map voxel axes to patient axes
    pub fn direction(&self) -> &Matrix3<f64> {
        &self.direction
    }

    /// Physical position of a voxel index
    pub fn index_to_physical(&self, index: [usize; 3]) -> Vector3<f64> {
        let scaled = Vector3::new(
            index[0] as f64 * self.spacing[0],
            index[1] as f64 * self.spacing[1],
            index[2] as f64 * self.spacing[2],
        );
        self.origin + self.direction * scaled
    }

    pub fn get_slice_from_axis(&self, index: usize, axis: Axis) -> Option<ArrayView2<'_, f32>> {
        if index >= self.len_of(axis) {
            return None;
        }
        Some(self.data.index_axis(axis.into(), index))
    }

    /// 8-bit preview of one slice, windowed to the slice's own min/max
    pub fn slice_image(&self, index: usize, axis: Axis) -> Option<GrayImage> {
        let slice = self.get_slice_from_axis(index, axis)?;
        Self::slice_to_image(&slice)
    }

    fn slice_to_image(slice: &ArrayView2<'_, f32>) -> Option<GrayImage> {
        let (height, width) = slice.dim();
        let (min, max) = slice
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = if max > min { max - min } else { 1.0 };
        let pixel_data: Vec<u8> = slice
            .into_par_iter()
            .map(|&v| Self::normalize_to_u8(v, min, range))
            .collect();
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
    }

    #[inline]
    fn normalize_to_u8(value: f32, min: f32, range: f32) -> u8 {
        if !value.is_finite() {
            return 0;
        }
        (((value - min) / range) * 255.0).clamp(0.0, 255.0) as u8
    }
}
