use anyhow::{bail, Context, Result};
use bvh_motion_prep::config::Config;
use bvh_motion_prep::pipeline::{list_bvh_files, process_file};
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "motion_prep.toml";

fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_PATH.to_string());
    // the log filter lives in the config, so load errors are reported once logging is up
    let loaded = Config::load(&config_path);
    let config = loaded.as_ref().cloned().unwrap_or_default();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.filter))
        .context("Invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = &loaded {
        tracing::warn!("{}: {}, using default config", config_path, e);
    }

    tracing::info!("Input: {}", config.input.bvh_dir.display());
    tracing::info!("Output: {}", config.output.dir.display());
    tracing::info!(
        "Subset: {}, root relative: {}, hip: {}",
        config.processing.extract_subset,
        config.processing.root_relative,
        config.output.hip
    );

    std::fs::create_dir_all(&config.output.dir)
        .with_context(|| format!("Failed to create {}", config.output.dir.display()))?;
    let paths = list_bvh_files(&config.input.bvh_dir)
        .with_context(|| format!("Failed to list {}", config.input.bvh_dir.display()))?;
    if paths.is_empty() {
        tracing::warn!("No .bvh files in {}", config.input.bvh_dir.display());
        return Ok(());
    }

    let mut failed = 0;
    for path in paths.iter() {
        match process_file(path, &config) {
            Ok(summary) => tracing::info!(
                "{}: {} frames, {} joints -> {}",
                path.display(),
                summary.num_frames,
                summary.num_joints,
                summary.positions_path.display()
            ),
            Err(e) => {
                failed += 1;
                tracing::error!("{}: {}", path.display(), e);
            }
        }
    }

    tracing::info!("Processed {} of {} files", paths.len() - failed, paths.len());
    if failed == paths.len() {
        bail!("Every file failed");
    }
    Ok(())
}
