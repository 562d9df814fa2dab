use crate::error::{Error, Result};
use crate::facing::LandmarkIndices;
use crate::standardize::JointSubset;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
    #[serde(default)]
    pub landmarks: LandmarkIndices,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// Directory scanned for .bvh files
    #[serde(default = "default_bvh_dir")]
    pub bvh_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub pretty: bool,
    /// Also write `<name>_hip.json` with one facing quaternion per frame
    #[serde(default = "default_true")]
    pub hip: bool,
    /// Write a `.msgpack` copy next to every `.json` output
    #[serde(default)]
    pub msgpack: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingConfig {
    /// Reduce every frame to `subset` before writing
    #[serde(default = "default_true")]
    pub extract_subset: bool,
    #[serde(default)]
    pub subset: JointSubset,
    /// Make positions relative to the root joint
    #[serde(default)]
    pub root_relative: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// tracing filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_bvh_dir() -> PathBuf {
    PathBuf::from("bvh/align/Aligned_BVH_Motion")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("bvh")
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bvh_dir: default_bvh_dir(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            pretty: false,
            hip: default_true(),
            msgpack: false,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            extract_subset: default_true(),
            subset: JointSubset::default(),
            root_relative: false,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        toml::from_str(content).map_err(|source| Error::Config {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }
}
