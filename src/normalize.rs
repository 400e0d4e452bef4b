//! Intensity normalization applied to simulated volumes before they are
//! paired with the high-resolution reference.

use crate::volume::Volume;

use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Normalization {
    #[default]
    None,
    ZScore,
}

impl Normalization {
    pub fn apply(self, volume: Volume) -> Volume {
        match self {
            Normalization::None => volume,
            Normalization::ZScore => zscore(&volume),
        }
    }
}

/// Z-score over the foreground (voxels > 0). Background voxels become 0.
///
/// A volume without foreground is returned unchanged.
pub fn zscore(volume: &Volume) -> Volume {
    let (count, sum) = volume
        .data()
        .iter()
        .filter(|&&v| v > 0.0)
        .fold((0usize, 0.0f64), |(n, s), &v| (n + 1, s + v as f64));
    if count == 0 {
        warn!("Z-score normalization skipped: volume has no foreground voxels");
        return volume.clone();
    }
    let mean = sum / count as f64;
    let variance = volume
        .data()
        .iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / count as f64;
    let denom = variance.sqrt() + 1e-8;

    let data = volume
        .data()
        .mapv(|v| if v > 0.0 { ((v as f64 - mean) / denom) as f32 } else { 0.0 });
    volume.resampled(data, *volume.spacing(), *volume.origin())
}
