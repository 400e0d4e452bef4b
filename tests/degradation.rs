mod common;

use common::synthetic_volume::{cube_phantom, gradient_data, gradient_volume, oblique_direction};
use mri_degrade::degradation::{gapped_slab_sample, slab_average, spectral_truncate};
use mri_degrade::{Axis, DegradationError, DegradationSimulator, Volume};
use nalgebra::Vector3;
use ndarray::{Array3, Axis as ArrayAxis, Slice};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn max_abs_diff(a: &Array3<f32>, b: &Array3<f32>) -> f32 {
    assert_eq!(a.dim(), b.dim());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f32::max)
}

#[test]
fn thick_slices_on_twenty_slice_volume() {
    init_logger();
    let volume = gradient_volume((10, 10, 20), 1.0);
    let out = DegradationSimulator::new(Axis::Z)
        .simulate_thick_slices(&volume, 5.0)
        .expect("5mm slabs are valid");

    assert_eq!(out.dim(), (10, 10, 4));
    assert_eq!(*out.spacing(), Vector3::new(1.0, 1.0, 5.0));
    assert_eq!(out.direction(), volume.direction());
    assert!((out.origin() - Vector3::new(0.0, 0.0, 2.0)).amax() < 1e-12);
    // slab 1 covers k = 5..10, mean offset 7
    let expected = (3 * 400 + 4 * 20 + 7) as f32 + 1.0;
    assert!((out.data()[[3, 4, 1]] - expected).abs() < 1e-3);
}

#[test]
fn slab_average_shape_and_spacing_on_every_axis() {
    init_logger();
    let volume = Volume::with_spacing(gradient_data((13, 9, 7)), Vector3::new(0.5, 1.0, 2.0))
        .expect("valid volume");
    for axis in Axis::ALL {
        for factor in 2..=4usize {
            let spacing = volume.spacing()[axis.index()];
            let out = slab_average(&volume, spacing * factor as f64, axis)
                .expect("factor fits the axis");
            assert_eq!(out.len_of(axis), volume.len_of(axis) / factor);
            for other in Axis::ALL {
                if other != axis {
                    assert_eq!(out.len_of(other), volume.len_of(other));
                    assert_eq!(out.spacing()[other.index()], volume.spacing()[other.index()]);
                }
            }
            assert!((out.spacing()[axis.index()] - spacing * factor as f64).abs() < 1e-12);
            assert_eq!(out.direction(), volume.direction());
        }
    }
}

#[test]
fn slab_average_with_unit_factor_is_identity() {
    init_logger();
    let volume = gradient_volume((4, 5, 6), 1.5);
    let out = slab_average(&volume, 1.4, Axis::Z).expect("rounds to one voxel");
    assert_eq!(out.data(), volume.data());
    assert_eq!(out.spacing(), volume.spacing());
    assert_eq!(out.origin(), volume.origin());
}

#[test]
fn gapped_sampling_on_twenty_slice_volume() {
    init_logger();
    let volume = gradient_volume((10, 10, 20), 1.0);
    let out = DegradationSimulator::default()
        .simulate_inter_slice_gap(&volume, 2.0, 3.0)
        .expect("2mm slabs with 3mm gaps are valid");

    assert_eq!(out.dim(), (10, 10, 4));
    assert_eq!(out.spacing()[2], 5.0);
    assert!((out.origin() - Vector3::new(0.0, 0.0, 0.5)).amax() < 1e-12);
    for k in 0..4 {
        let slab = volume
            .data()
            .slice_axis(ArrayAxis(2), Slice::from(5 * k..5 * k + 2))
            .mean_axis(ArrayAxis(2))
            .expect("slab is not empty");
        let sample = out.data().index_axis(ArrayAxis(2), k);
        let diff = sample
            .iter()
            .zip(slab.iter())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0f32, f32::max);
        assert!(diff < 1e-3, "slice {k} differs by {diff}");
    }
}

#[test]
fn gapped_sampling_without_gap_matches_slab_average() {
    init_logger();
    let volume = gradient_volume((6, 7, 23), 1.0);
    for thickness in [2.0, 3.0, 5.0] {
        let slab = slab_average(&volume, thickness, Axis::Z).expect("valid slab");
        let gapped = gapped_slab_sample(&volume, thickness, 0.0, Axis::Z).expect("valid sampling");
        assert_eq!(gapped.data(), slab.data());
        assert_eq!(gapped.spacing(), slab.spacing());
        assert_eq!(gapped.origin(), slab.origin());
    }
}

#[test]
fn gapped_sampling_counts_whole_strides() {
    init_logger();
    for length in [7usize, 10, 14, 15, 19] {
        let volume = gradient_volume((2, 2, length), 1.0);
        let out = gapped_slab_sample(&volume, 3.0, 2.0, Axis::Z).expect("at least one stride");
        assert_eq!(out.len_of(Axis::Z), length / 5, "length {length}");
    }
    let short = gradient_volume((2, 2, 4), 1.0);
    assert!(matches!(
        gapped_slab_sample(&short, 3.0, 2.0, Axis::Z),
        Err(DegradationError::DegenerateResult(_))
    ));
}

#[test]
fn origin_shift_follows_oblique_orientation() {
    init_logger();
    let direction = oblique_direction();
    let origin = Vector3::new(-12.0, 40.0, 7.5);
    let volume = Volume::new(gradient_data((8, 8, 8)), Vector3::new(1.0, 1.0, 1.0), origin, direction)
        .expect("valid oblique volume");

    let out = slab_average(&volume, 4.0, Axis::X).expect("valid slab");
    let expected = origin + direction.column(0) * 1.5;
    assert!((out.origin() - expected).amax() < 1e-12);
    assert_eq!(out.direction(), &direction);

    // the first output sample sits at the centre of the first source block
    let block_centre =
        (volume.index_to_physical([0, 0, 0]) + volume.index_to_physical([3, 0, 0])) / 2.0;
    assert!((out.index_to_physical([0, 0, 0]) - block_centre).amax() < 1e-12);
}

#[test]
fn constant_volume_survives_kspace_truncation() {
    init_logger();
    let volume = Volume::with_spacing(Array3::ones((8, 8, 8)), Vector3::new(1.0, 1.0, 1.0))
        .expect("valid volume");
    let out = DegradationSimulator::default()
        .simulate_in_plane_resolution(&volume, 2)
        .expect("factor 2 is valid");

    assert_eq!(out.dim(), (4, 4, 4));
    assert_eq!(*out.spacing(), Vector3::new(2.0, 2.0, 2.0));
    assert_eq!(out.origin(), volume.origin());
    assert!(out.data().iter().all(|v| (v - 1.0).abs() < 1e-5));
}

#[test]
fn kspace_truncation_shape_and_spacing() {
    init_logger();
    let volume = Volume::with_spacing(gradient_data((9, 12, 7)), Vector3::new(0.8, 0.9, 1.2))
        .expect("valid volume");
    for factor in 1..=3usize {
        let out = spectral_truncate(&volume, factor).expect("factor fits every axis");
        assert_eq!(out.dim(), (9 / factor, 12 / factor, 7 / factor));
        for i in 0..3 {
            let expected = volume.spacing()[i] * factor as f64;
            assert!((out.spacing()[i] - expected).abs() < 1e-12);
        }
    }
}

#[test]
fn kspace_truncation_with_unit_factor_round_trips() {
    init_logger();
    let volume = gradient_volume((6, 5, 7), 1.0);
    let out = spectral_truncate(&volume, 1).expect("factor 1 is valid");
    assert!(max_abs_diff(out.data(), volume.data()) < 1e-2);
}

#[test]
fn kspace_truncation_rings_at_sharp_edges() {
    init_logger();
    let phantom = cube_phantom(16, 8);
    let out = spectral_truncate(&phantom, 2).expect("factor 2 is valid");
    let max = out.data().iter().copied().fold(f32::MIN, f32::max);
    let min = out.data().iter().copied().fold(f32::MAX, f32::min);
    assert!(max > 105.0, "expected overshoot above the cube intensity, got {max}");
    assert!(min < 9.0, "expected undershoot below the background, got {min}");
}

#[test]
fn independent_requests_run_concurrently() {
    init_logger();
    let volume = gradient_volume((8, 8, 24), 1.0);
    let simulator = DegradationSimulator::new(Axis::Z);
    let expected = simulator
        .simulate_thick_slices(&volume, 3.0)
        .expect("valid slab");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| simulator.simulate_thick_slices(&volume, 3.0)))
            .collect();
        for handle in handles {
            let out = handle
                .join()
                .expect("worker did not panic")
                .expect("valid slab");
            assert_eq!(out.data(), expected.data());
        }
    });
}
