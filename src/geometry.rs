//! Physical-space bookkeeping for resampled volumes.
//!
//! Volumes use voxel-corner indexing: the origin is the physical position of
//! voxel `(0, 0, 0)`. When `n` consecutive voxels along an axis are merged
//! into a single sample, the sample represents the centre of that block, so
//! the origin has to move by half the span of the merged block, expressed in
//! patient space through the direction cosines. Skipping this step leaves
//! simulated volumes with the right array size but a silent misregistration
//! against the high-resolution reference.

use nalgebra::{Matrix3, Vector3};

use crate::enums::Axis;

/// Origin of a volume after `n` voxels along `axis` collapse into one sample.
///
/// `spacing` is the spacing of the source volume, before merging.
pub fn shifted_origin(
    origin: &Vector3<f64>,
    spacing: &Vector3<f64>,
    direction: &Matrix3<f64>,
    axis: Axis,
    n: usize,
) -> Vector3<f64> {
    if n <= 1 {
        return *origin;
    }
    let mut shift = Vector3::zeros();
    shift[axis.index()] = (n - 1) as f64 * spacing[axis.index()] / 2.0;
    origin + direction * shift
}

/// Whether the columns of `direction` are unit length and mutually orthogonal.
pub fn is_orthonormal(direction: &Matrix3<f64>, tolerance: f64) -> bool {
    (direction.transpose() * direction - Matrix3::identity()).amax() <= tolerance
}
