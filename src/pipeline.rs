//! Per-file processing: .bvh in, position and hip facing records out.

use crate::config::{Config, ProcessingConfig};
use crate::error::{Error, Result};
use crate::export::{self, hip_records, position_records};
use crate::fk;
use crate::parse::{self, Bvh};
use crate::standardize::translate_to_root;
use crate::types::Position;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct FileSummary {
    pub num_frames: usize,
    pub num_joints: usize,
    pub positions_path: PathBuf,
    pub hip_path: Option<PathBuf>,
    pub msgpack_paths: Vec<PathBuf>,
}

/// Global joint positions of every frame, reduced and translated as configured.
///
/// The subset is extracted first, so a root relative frame is relative to the first joint
/// of the subset (the hip for the default layout), not to joint 0 of the full rig.
pub fn prepare_positions(bvh: &Bvh, processing: &ProcessingConfig) -> Result<Vec<Vec<Position>>> {
    let motion = fk::evaluate_motion(&bvh.skeleton, &bvh.frames)?;
    motion
        .into_iter()
        .map(|positions| -> Result<Vec<Position>> {
            let positions = if processing.extract_subset {
                processing.subset.apply(&positions)?
            } else {
                positions
            };
            if processing.root_relative {
                Ok(translate_to_root(&positions)?)
            } else {
                Ok(positions)
            }
        })
        .collect()
}

/// All .bvh files directly inside `dir`, sorted by name.
pub fn list_bvh_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let io_err = |source: std::io::Error| Error::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "bvh") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Process one .bvh file and write `<stem>.json` (and `<stem>_hip.json`) into the output dir.
pub fn process_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<FileSummary> {
    let path = path.as_ref();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "motion".to_string());

    let bvh = parse::load_bvh_from_file(path)?;
    let positions = prepare_positions(&bvh, &config.processing)?;
    let records = position_records(&positions);

    let mut msgpack_paths = Vec::new();

    let positions_path = config.output.dir.join(format!("{}.json", stem));
    export::write_json(&positions_path, &records, config.output.pretty)?;
    if config.output.msgpack {
        let path = positions_path.with_extension("msgpack");
        export::write_msgpack(&path, &records)?;
        msgpack_paths.push(path);
    }

    let hip_path = if config.output.hip {
        let hip_path = config.output.dir.join(format!("{}_hip.json", stem));
        let hips = hip_records(&records, &config.landmarks)?;
        export::write_json(&hip_path, &hips, config.output.pretty)?;
        if config.output.msgpack {
            let path = hip_path.with_extension("msgpack");
            export::write_msgpack(&path, &hips)?;
            msgpack_paths.push(path);
        }
        Some(hip_path)
    } else {
        None
    };

    Ok(FileSummary {
        num_frames: records.len(),
        num_joints: positions.first().map_or(0, Vec::len),
        positions_path,
        hip_path,
        msgpack_paths,
    })
}
