use crate::{
    enums::SortBy,
    volume::{Volume, VolumeError},
};

use dicom::{
    object::{FileDicomObject, InMemDicomObject, open_file},
    pixeldata::{ConvertOptions, PixelDecoder, VoiLutOption},
};
use dicom_dictionary_std::tags;
use log::{debug, warn};
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array2, Array3, s};
use std::{fs, path::Path};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolumeLoaderError {
    #[error("No valid DICOM images found")]
    NoValidImages,

    #[error("Inconsistent image dimensions")]
    InconsistentDimensions,

    #[error("Missing spacing information")]
    MissingSpacing,

    #[error("Invalid volume geometry: {0}")]
    Volume(#[from] VolumeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DICOM error: {0}")]
    Dicom(#[from] dicom::object::ReadError),
}

type DicomFile = FileDicomObject<InMemDicomObject>;

/// Decoded slice with the attributes needed to place it in patient space
struct SliceRecord {
    order: Option<f64>,
    position: Option<Vector3<f64>>,
    pixels: Array2<f32>,
}

pub struct VolumeLoader;

impl VolumeLoader {
    /// Load a volume from DICOM objects of a single series
    ///
    /// The volume is laid out as (slice, row, column). Its origin is the
    /// ImagePositionPatient of the first slice after sorting and its direction
    /// columns are the slice normal, the column cosines and the row cosines.
    ///
    /// # Errors
    ///
    /// Returns error if no valid images found, dimensions are inconsistent or
    /// spacing cannot be determined
    pub fn load_from_dicom_objects(
        dicom_objects: &[DicomFile],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let orientation = dicom_objects.iter().find_map(Self::get_orientation);
        let normal = orientation.map(|(row, col)| row.cross(&col));

        let mut slices: Vec<_> = dicom_objects
            .iter()
            .filter_map(|dicom_object| Self::extract_slice(dicom_object, &sort_by, normal))
            .collect();

        if slices.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::sort_slices(&mut slices, &sort_by);
        Self::validate_dimensions(&slices)?;

        let data = Self::build_volume_array(&slices);
        let pixel_spacing =
            Self::get_pixel_spacing(dicom_objects).ok_or(VolumeLoaderError::MissingSpacing)?;
        let slice_spacing = Self::get_slice_spacing(&slices, dicom_objects)
            .ok_or(VolumeLoaderError::MissingSpacing)?;
        let spacing = Vector3::new(slice_spacing, pixel_spacing.0, pixel_spacing.1);

        let direction = match orientation {
            Some((row, col)) => {
                let delta = match (&slices[0].position, slices.get(1).and_then(|s| s.position)) {
                    (Some(first), Some(second)) => Some(second - first),
                    _ => None,
                };
                Self::direction_from_orientation(row, col, delta)
            }
            None => {
                warn!("ImageOrientationPatient missing, assuming identity orientation");
                Matrix3::identity()
            }
        };
        let origin = slices[0].position.unwrap_or_else(|| {
            warn!("ImagePositionPatient missing, placing origin at zero");
            Vector3::zeros()
        });
        debug!(
            "Loaded {:?} voxels, spacing {:?}, origin {:?}",
            data.dim(),
            spacing,
            origin
        );

        Ok(Volume::new(data, spacing, origin, direction)?)
    }

    /// Load a volume from file paths
    pub fn load_from_file_paths(
        paths: &[impl AsRef<Path>],
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let objects: Result<Vec<_>, _> =
            paths.iter().map(|path| open_file(path.as_ref())).collect();

        Self::load_from_dicom_objects(&objects?, sort_by)
    }

    /// Load a volume from a directory containing .dcm files
    pub fn load_from_directory(
        path: impl AsRef<Path>,
        sort_by: SortBy,
    ) -> Result<Volume, VolumeLoaderError> {
        let paths: Vec<_> = fs::read_dir(path.as_ref())?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|s| s.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("dcm"))
            })
            .collect();

        if paths.is_empty() {
            return Err(VolumeLoaderError::NoValidImages);
        }

        Self::load_from_file_paths(&paths, sort_by)
    }

    fn extract_slice(
        dicom_object: &DicomFile,
        sort_by: &SortBy,
        normal: Option<Vector3<f64>>,
    ) -> Option<SliceRecord> {
        let position = Self::get_position(dicom_object);
        let order = match sort_by {
            SortBy::ImagePositionPatient => match (position, normal) {
                (Some(p), Some(n)) => Some(p.dot(&n)),
                (Some(p), None) => Some(p.z),
                _ => None,
            },
            SortBy::InstanceNumber => dicom_object
                .element(tags::INSTANCE_NUMBER)
                .ok()?
                .to_int::<i32>()
                .ok()
                .map(f64::from),
            SortBy::None => Some(0.0),
        };
        let pixels = Self::decode_image(dicom_object)?;
        Some(SliceRecord {
            order,
            position,
            pixels,
        })
    }

    fn get_position(dicom_object: &DicomFile) -> Option<Vector3<f64>> {
        let pos = dicom_object
            .element(tags::IMAGE_POSITION_PATIENT)
            .ok()?
            .to_multi_float32()
            .ok()?;
        (pos.len() >= 3).then(|| Vector3::new(pos[0] as f64, pos[1] as f64, pos[2] as f64))
    }

    /// Row and column direction cosines
    fn get_orientation(dicom_object: &DicomFile) -> Option<(Vector3<f64>, Vector3<f64>)> {
        let iop = dicom_object
            .element(tags::IMAGE_ORIENTATION_PATIENT)
            .ok()?
            .to_multi_float32()
            .ok()?;
        if iop.len() < 6 {
            return None;
        }
        let row = Vector3::new(iop[0] as f64, iop[1] as f64, iop[2] as f64);
        let col = Vector3::new(iop[3] as f64, iop[4] as f64, iop[5] as f64);
        Some((row.try_normalize(1e-9)?, col.try_normalize(1e-9)?))
    }

    /// Direction matrix for (slice, row, column) array axes. The slice axis is
    /// the row/column normal, flipped to follow the slice order when the
    /// offset between the first two slices is known.
    pub(crate) fn direction_from_orientation(
        row: Vector3<f64>,
        col: Vector3<f64>,
        slice_delta: Option<Vector3<f64>>,
    ) -> Matrix3<f64> {
        let mut normal = row.cross(&col);
        if slice_delta.is_some_and(|d| d.dot(&normal) < 0.0) {
            normal = -normal;
        }
        Matrix3::from_columns(&[normal, col, row])
    }

    fn decode_image(dicom_object: &DicomFile) -> Option<Array2<f32>> {
        let pixel_data = dicom_object.decode_pixel_data().ok()?;
        let options = ConvertOptions::new().with_voi_lut(VoiLutOption::Identity);
        pixel_data
            .to_ndarray_with_options::<f32>(&options)
            .ok()
            .map(|arr| arr.slice_move(s![0, .., .., 0]))
    }

    fn sort_slices(slices: &mut [SliceRecord], sort_by: &SortBy) {
        if !matches!(sort_by, SortBy::None) {
            slices.sort_by(|a, b| {
                a.order
                    .partial_cmp(&b.order)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }

    fn validate_dimensions(slices: &[SliceRecord]) -> Result<(), VolumeLoaderError> {
        let first_dim = slices[0].pixels.dim();
        if slices.iter().any(|slice| slice.pixels.dim() != first_dim) {
            return Err(VolumeLoaderError::InconsistentDimensions);
        }
        Ok(())
    }

    fn build_volume_array(slices: &[SliceRecord]) -> Array3<f32> {
        let (height, width) = slices[0].pixels.dim();
        let depth = slices.len();
        let mut volume = Array3::<f32>::zeros((depth, height, width));

        for (i, slice) in slices.iter().enumerate() {
            volume.slice_mut(s![i, .., ..]).assign(&slice.pixels);
        }

        volume
    }

    /// (row spacing, column spacing)
    fn get_pixel_spacing(dicom_objects: &[DicomFile]) -> Option<(f64, f64)> {
        dicom_objects.iter().find_map(|dicom_object| {
            let pixel_spacing = dicom_object
                .element(tags::PIXEL_SPACING)
                .ok()?
                .to_multi_float32()
                .ok()?;
            match pixel_spacing.as_slice() {
                [row, col, ..] => Some((*row as f64, *col as f64)),
                _ => None,
            }
        })
    }

    /// Distance between the first two slice positions, else SliceThickness
    fn get_slice_spacing(slices: &[SliceRecord], dicom_objects: &[DicomFile]) -> Option<f64> {
        let from_positions = match (slices.first(), slices.get(1)) {
            (Some(a), Some(b)) => match (a.position, b.position) {
                (Some(pa), Some(pb)) => Some((pb - pa).norm()).filter(|d| *d > 0.0),
                _ => None,
            },
            _ => None,
        };
        from_positions.or_else(|| {
            dicom_objects.iter().find_map(|dicom_object| {
                dicom_object
                    .element(tags::SLICE_THICKNESS)
                    .ok()?
                    .to_float32()
                    .ok()
                    .map(f64::from)
                    .filter(|t| *t > 0.0)
            })
        })
    }
}
