use crate::degradation::DegradationError;
use crate::volume::Volume;

use log::debug;
use ndarray::{Array3, Axis, Zip};
use num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

/// In-place 3D transform, one axis at a time. The inverse is unnormalized.
fn fft3d(buffer: &mut Array3<Complex64>, planner: &mut FftPlanner<f64>, direction: FftDirection) {
    for axis in 0..3 {
        let n = buffer.len_of(Axis(axis));
        let fft = planner.plan_fft(n, direction);
        Zip::from(buffer.lanes_mut(Axis(axis))).par_for_each(|mut lane| {
            let mut line = lane.to_vec();
            fft.process(&mut line);
            for (dst, src) in lane.iter_mut().zip(line) {
                *dst = src;
            }
        });
    }
}

/// Source bins kept when an axis of `n` bins is cropped to the `m` lowest
/// frequencies. Equivalent to shifting the zero frequency to the centre,
/// cropping a centred window of `m` bins and shifting back.
fn retained_bins(n: usize, m: usize) -> Vec<usize> {
    let non_negative = m - m / 2;
    (0..m)
        .map(|q| if q < non_negative { q } else { n - (m - q) })
        .collect()
}

/// Reduced acquisition matrix simulated by k-space truncation.
///
/// The volume is transformed, cropped to the central `dim / downsample_factor`
/// frequencies on every axis, transformed back, and the complex magnitude is
/// kept. Intensities are preserved (a constant volume stays constant); sharp
/// edges ring, as they do in a real acquisition. Spacing is multiplied by the
/// factor on every axis. Origin and direction are left as they are, which
/// assumes the truncation is centred on the field of view.
///
/// Lanes of each axis are transformed on the rayon pool; the result does not
/// depend on scheduling.
///
/// # Errors
///
/// `InvalidParameter` for a factor of zero, `DegenerateResult` if the factor
/// exceeds one of the dimensions.
pub fn spectral_truncate(
    volume: &Volume,
    downsample_factor: usize,
) -> Result<Volume, DegradationError> {
    if downsample_factor < 1 {
        return Err(DegradationError::invalid(
            "downsample_factor",
            format!("expected a factor of at least 1, got {downsample_factor}"),
        ));
    }
    let (nx, ny, nz) = volume.dim();
    let (mx, my, mz) = (
        nx / downsample_factor,
        ny / downsample_factor,
        nz / downsample_factor,
    );
    if mx == 0 || my == 0 || mz == 0 {
        return Err(DegradationError::DegenerateResult(format!(
            "factor {downsample_factor} leaves no samples for a {nx}x{ny}x{nz} volume"
        )));
    }
    debug!("K-space truncation {nx}x{ny}x{nz} -> {mx}x{my}x{mz}");

    let mut planner = FftPlanner::<f64>::new();
    let mut spectrum = volume.data().mapv(|v| Complex64::new(v as f64, 0.0));
    fft3d(&mut spectrum, &mut planner, FftDirection::Forward);

    let (bx, by, bz) = (
        retained_bins(nx, mx),
        retained_bins(ny, my),
        retained_bins(nz, mz),
    );
    let mut cropped =
        Array3::from_shape_fn((mx, my, mz), |(i, j, k)| spectrum[[bx[i], by[j], bz[k]]]);
    drop(spectrum);
    fft3d(&mut cropped, &mut planner, FftDirection::Inverse);

    // Normalizing by the source size keeps intensities on the input scale.
    let norm = (nx * ny * nz) as f64;
    let data = cropped.mapv(|c| (c.norm() / norm) as f32);

    let spacing = volume.spacing() * downsample_factor as f64;
    Ok(volume.resampled(data, spacing, *volume.origin()))
}
