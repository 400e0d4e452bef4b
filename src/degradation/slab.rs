use crate::degradation::DegradationError;
use crate::enums::Axis;
use crate::geometry::shifted_origin;
use crate::volume::Volume;

use log::{debug, info};
use ndarray::{Array3, Slice};
use rayon::prelude::*;

/// Number of source voxels covering `length_mm` on `axis`.
fn voxels_for(
    parameter: &'static str,
    length_mm: f64,
    spacing: f64,
) -> Result<usize, DegradationError> {
    if !length_mm.is_finite() || length_mm < 0.0 {
        return Err(DegradationError::invalid(
            parameter,
            format!("expected a finite, non-negative length in mm, got {length_mm}"),
        ));
    }
    Ok((length_mm / spacing).round() as usize)
}

/// Collapse the slabs `[start, start + width)` along `axis` to their mean,
/// one output sample per start, in order.
fn collapse_slabs(data: &Array3<f32>, axis: Axis, starts: &[usize], width: usize) -> Array3<f32> {
    let ax = ndarray::Axis::from(axis);
    let mut shape = data.raw_dim();
    shape[axis.index()] = starts.len();
    let mut out = Array3::<f32>::zeros(shape);
    let scale = 1.0 / width as f32;

    out.axis_iter_mut(ax)
        .into_par_iter()
        .zip(starts.par_iter())
        .for_each(|(mut sample, &start)| {
            let slab = data.slice_axis(ax, Slice::from(start..start + width));
            sample.assign(&slab.sum_axis(ax));
            sample.mapv_inplace(|v| v * scale);
        });
    out
}

/// Thick-slice simulation by block averaging along `axis`.
///
/// `factor = round(thickness_mm / spacing[axis])` contiguous voxels are
/// averaged into each output slice. Trailing voxels that do not fill a whole
/// block are dropped. A factor of one returns the input unchanged.
///
/// Output slices are computed on the rayon pool; the result does not depend
/// on scheduling.
///
/// # Errors
///
/// `InvalidParameter` if the thickness rounds to less than one source voxel,
/// `DegenerateResult` if the axis is shorter than one block.
pub fn slab_average(
    volume: &Volume,
    thickness_mm: f64,
    axis: Axis,
) -> Result<Volume, DegradationError> {
    let spacing = volume.spacing()[axis.index()];
    let factor = voxels_for("thickness_mm", thickness_mm, spacing)?;
    if factor < 1 {
        return Err(DegradationError::invalid(
            "thickness_mm",
            format!("{thickness_mm}mm is finer than the source spacing of {spacing}mm"),
        ));
    }
    if factor == 1 {
        info!(
            "Slab thickness {thickness_mm}mm matches source spacing {spacing}mm on {axis:?}, no degradation applied"
        );
        return Ok(volume.clone());
    }

    let length = volume.len_of(axis);
    let blocks = length / factor;
    if blocks == 0 {
        return Err(DegradationError::DegenerateResult(format!(
            "axis {axis:?} has {length} voxels, fewer than one slab of {factor}"
        )));
    }
    debug!(
        "Slab averaging on {axis:?}: factor {factor}, {blocks} slabs, {} trailing voxels dropped",
        length - blocks * factor
    );

    let starts: Vec<usize> = (0..blocks).map(|b| b * factor).collect();
    let data = collapse_slabs(volume.data(), axis, &starts, factor);

    let mut new_spacing = *volume.spacing();
    new_spacing[axis.index()] = spacing * factor as f64;
    let origin = shifted_origin(
        volume.origin(),
        volume.spacing(),
        volume.direction(),
        axis,
        factor,
    );
    Ok(volume.resampled(data, new_spacing, origin))
}

/// Thick slices separated by unacquired gaps along `axis`.
///
/// Slabs of `voxels_per_slice = round(thickness_mm / spacing)` voxels start
/// every `voxels_per_slice + round(gap_mm / spacing)` voxels, beginning at
/// index 0. Only whole strides are acquired: the output holds
/// `floor(length / stride)` slices and anything past the last full stride is
/// dropped. Gap voxels are discarded, and the output spacing is the
/// centre-to-centre distance `thickness_mm + gap_mm`. Slabs are averaged on
/// the rayon pool, as in [`slab_average`].
///
/// # Errors
///
/// `InvalidParameter` if the thickness rounds to less than one source voxel
/// or the gap is negative, `DegenerateResult` if the axis is shorter than
/// one stride.
pub fn gapped_slab_sample(
    volume: &Volume,
    thickness_mm: f64,
    gap_mm: f64,
    axis: Axis,
) -> Result<Volume, DegradationError> {
    let spacing = volume.spacing()[axis.index()];
    let voxels_per_slice = voxels_for("thickness_mm", thickness_mm, spacing)?;
    let voxels_gap = voxels_for("gap_mm", gap_mm, spacing)?;
    if voxels_per_slice < 1 {
        return Err(DegradationError::invalid(
            "thickness_mm",
            format!("{thickness_mm}mm is finer than the source spacing of {spacing}mm"),
        ));
    }
    let length = volume.len_of(axis);
    let stride = voxels_per_slice
        .checked_add(voxels_gap)
        .filter(|&stride| stride <= length)
        .ok_or_else(|| {
            DegradationError::DegenerateResult(format!(
                "axis {axis:?} has {length} voxels, fewer than one stride of \
                 {thickness_mm}mm slab plus {gap_mm}mm gap"
            ))
        })?;
    let starts: Vec<usize> = (0..length / stride).map(|s| s * stride).collect();
    debug!(
        "Gapped sampling on {axis:?}: {voxels_per_slice} voxels per slab, {voxels_gap} gap voxels, {} slabs",
        starts.len()
    );

    let data = collapse_slabs(volume.data(), axis, &starts, voxels_per_slice);

    let mut new_spacing = *volume.spacing();
    new_spacing[axis.index()] = thickness_mm + gap_mm;
    let origin = shifted_origin(
        volume.origin(),
        volume.spacing(),
        volume.direction(),
        axis,
        voxels_per_slice,
    );
    Ok(volume.resampled(data, new_spacing, origin))
}
