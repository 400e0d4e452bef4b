use mri_degrade::Volume;
use nalgebra::{Matrix3, Vector3};
use ndarray::Array3;

/// Values unique per voxel and varying along every axis.
pub fn gradient_data(dim: (usize, usize, usize)) -> Array3<f32> {
    assert!(dim.0 > 0 && dim.1 > 0 && dim.2 > 0, "volume dimensions must be positive");
    Array3::from_shape_fn(dim, |(i, j, k)| (i * 400 + j * 20 + k) as f32 + 1.0)
}

/// Isotropic volume with identity orientation at the origin.
pub fn gradient_volume(dim: (usize, usize, usize), spacing: f64) -> Volume {
    Volume::with_spacing(gradient_data(dim), Vector3::new(spacing, spacing, spacing))
        .expect("synthetic volume has valid geometry")
}

/// Piecewise-constant phantom: a bright cube inside a dark background.
pub fn cube_phantom(n: usize, inner: usize) -> Volume {
    assert!(inner < n, "cube must fit inside the volume");
    let lo = (n - inner) / 2;
    let hi = lo + inner;
    let data = Array3::from_shape_fn((n, n, n), |(i, j, k)| {
        let inside = (lo..hi).contains(&i) && (lo..hi).contains(&j) && (lo..hi).contains(&k);
        if inside { 100.0 } else { 10.0 }
    });
    Volume::with_spacing(data, Vector3::new(1.0, 1.0, 1.0)).expect("phantom has valid geometry")
}

/// Oblique orientation: 30 degree rotation about patient z, axes flipped in y.
pub fn oblique_direction() -> Matrix3<f64> {
    let (s, c) = 30f64.to_radians().sin_cos();
    Matrix3::new(
        c, s, 0.0, //
        s, -c, 0.0, //
        0.0, 0.0, 1.0,
    )
}
