//! # MRI degradation library
//!
//! This crate synthesizes realistic low-resolution MRI acquisitions from a
//! high-resolution volume, to build paired training data for
//! super-resolution models.
//!
//! Degradations follow the physics of slice selection rather than generic
//! blur and resampling:
//!  - Thick slices: contiguous slabs averaged into one sample, the detector
//!    integrating magnetization across the slab (partial volume effect)
//!  - Inter-slice gaps: thick slabs acquired at a stride, with the gap
//!    between slabs permanently lost
//!  - Reduced acquisition matrix: k-space truncated to its central
//!    frequencies, including the Gibbs ringing this causes
//!
//! Every operation takes an immutable [`Volume`] and returns a new one whose
//! spacing and origin are recomputed so it stays registered with the source
//! in patient space. Direction cosines are never changed.
//!
//! Volumes can be loaded from a DICOM series with [`VolumeLoader`], and a
//! set of degradations can be described as a JSON [`SimulationPlan`].
//!
//! # Examples
//!
//! ## Simulating 5mm slices from a 1mm volume
//!
//! ```
//! # use mri_degrade::{Axis, DegradationSimulator, Volume};
//! # use nalgebra::Vector3;
//! # use ndarray::Array3;
//! let volume = Volume::with_spacing(Array3::ones((10, 10, 20)), Vector3::new(1.0, 1.0, 1.0))
//!     .expect("valid geometry");
//! let simulator = DegradationSimulator::new(Axis::Z);
//! let thick = simulator
//!     .simulate_thick_slices(&volume, 5.0)
//!     .expect("5mm slabs fit in a 20mm volume");
//! assert_eq!(thick.dim(), (10, 10, 4));
//! assert_eq!(thick.spacing()[2], 5.0);
//! ```
//!
//! ## Running a plan on a DICOM series
//!
//! ```no_run
//! # use mri_degrade::{SortBy, VolumeLoader, load_plan};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::ImagePositionPatient)
//!     .expect("should have loaded files from directory");
//! let plan = load_plan("plan.json").expect("should have read the plan");
//! for simulated in plan.run(&volume) {
//!     println!("{}: {:?}", simulated.variant, simulated.result.map(|v| v.dim()));
//! }
//! ```

pub mod degradation;
pub mod enums;
pub mod geometry;
pub mod normalize;
pub mod plan;
pub mod volume;
pub mod volume_loader;

pub use crate::degradation::{DegradationError, DegradationSimulator};
pub use crate::enums::{Axis, SortBy};
pub use crate::plan::{SimulationPlan, Variant, load_plan};
pub use crate::volume::{Volume, VolumeError};
pub use crate::volume_loader::{VolumeLoader, VolumeLoaderError};
