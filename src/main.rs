use std::{env, fs, path::PathBuf, process::ExitCode};

use log::{error, info};
use mri_degrade::{SortBy, VolumeLoader, load_plan};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (dicom_dir, plan_path) = match args.as_slice() {
        [dicom_dir, plan_path, ..] => (PathBuf::from(dicom_dir), PathBuf::from(plan_path)),
        _ => {
            eprintln!("usage: mri-degrade <dicom_dir> <plan.json> [output_dir]");
            return ExitCode::FAILURE;
        }
    };
    let output_dir = PathBuf::from(args.get(2).map_or("previews", String::as_str));

    match run(dicom_dir, plan_path, output_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    dicom_dir: PathBuf,
    plan_path: PathBuf,
    output_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let plan = load_plan(&plan_path)?;
    let volume = VolumeLoader::load_from_directory(&dicom_dir, SortBy::ImagePositionPatient)?;
    info!(
        "Loaded {} with dimensions {:?} and spacing {:?}",
        dicom_dir.display(),
        volume.dim(),
        volume.spacing()
    );
    fs::create_dir_all(&output_dir)?;

    let axis = plan.slice_axis;
    for simulated in plan.run(&volume) {
        let Ok(lr) = simulated.result else {
            continue;
        };
        let Some(image) = lr.slice_image(lr.len_of(axis) / 2, axis) else {
            continue;
        };
        let path = output_dir.join(format!("{}.png", simulated.variant.label()));
        image.save(&path)?;
        info!("Saved preview {}", path.display());
    }
    Ok(())
}
