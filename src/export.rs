//! JSON records consumed by the dataset tooling.

use crate::error::{Error, Result};
use crate::facing::{compute_facing, LandmarkIndices};
use crate::types::Position;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    #[serde(rename = "Frame")]
    pub frame: usize,
    #[serde(rename = "Position")]
    pub position: Vec<[f64; 3]>,
}

impl PositionRecord {
    pub fn positions(&self) -> Vec<Position> {
        self.position.iter().map(|&p| Position::from(p)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HipRecord {
    #[serde(rename = "Frame")]
    pub frame: usize,
    /// `[x, y, z, w]`
    #[serde(rename = "HipRotationQuaternion")]
    pub hip_rotation_quaternion: [f64; 4],
}

pub fn position_records(frames: &[Vec<Position>]) -> Vec<PositionRecord> {
    frames
        .iter()
        .enumerate()
        .map(|(frame, positions)| PositionRecord {
            frame,
            position: positions.iter().map(|&p| p.into()).collect(),
        })
        .collect()
}

/// One facing quaternion per position record, keeping the record's frame number.
pub fn hip_records(
    records: &[PositionRecord],
    indices: &LandmarkIndices,
) -> Result<Vec<HipRecord>> {
    let mut degenerate = 0;
    let hips = records
        .iter()
        .map(|record| -> Result<HipRecord> {
            let facing = compute_facing(&record.positions(), indices)?;
            if facing.is_degenerate() {
                degenerate += 1;
            }
            Ok(HipRecord {
                frame: record.frame,
                hip_rotation_quaternion: facing.to_xyzw(),
            })
        })
        .collect::<Result<Vec<HipRecord>>>()?;
    if degenerate > 0 {
        tracing::warn!("{} of {} frames had degenerate hip landmarks", degenerate, records.len());
    }
    Ok(hips)
}

pub fn write_json<T: Serialize, P: AsRef<Path>>(path: P, value: &T, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let io_err = |source: std::io::Error| Error::Io {
        path: path.display().to_string(),
        source,
    };
    let json_err = |source: serde_json::Error| Error::Json {
        path: path.display().to_string(),
        source,
    };

    let mut writer = BufWriter::new(File::create(path).map_err(io_err)?);
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value).map_err(json_err)?;
    } else {
        serde_json::to_writer(&mut writer, value).map_err(json_err)?;
    }
    writer.flush().map_err(io_err)?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

/// Same records as `write_json`, packed as msgpack maps keyed by the JSON field names.
pub fn write_msgpack<T: Serialize, P: AsRef<Path>>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    rmp_serde::encode::write_named(&mut writer, value).map_err(|source| Error::Msgpack {
        path: path.display().to_string(),
        source,
    })?;
    writer.flush().map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    tracing::debug!("Wrote {}", path.display());
    Ok(())
}

pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::Json {
        path: path.display().to_string(),
        source,
    })
}

pub fn read_position_records<P: AsRef<Path>>(path: P) -> Result<Vec<PositionRecord>> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_record_field_names() {
        let records = position_records(&[vec![Position::new(1.0, 2.0, 3.0)]]);
        let json = serde_json::to_string(&records).unwrap();
        assert_eq!(json, r#"[{"Frame":0,"Position":[[1.0,2.0,3.0]]}]"#);
    }

    #[test]
    fn hip_record_field_names() {
        let record = HipRecord {
            frame: 7,
            hip_rotation_quaternion: [0.0, 0.0, 0.0, 1.0],
        };
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"Frame":7,"HipRotationQuaternion":[0.0,0.0,0.0,1.0]}"#);
    }

    #[test]
    fn hip_records_keep_frame_numbers() {
        let indices = LandmarkIndices {
            hip: 0,
            upper_spine: 1,
            left_shoulder: 2,
            right_shoulder: 3,
        };
        let records = vec![
            PositionRecord {
                frame: 4,
                position: vec![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-1.0, 1.0, 0.0], [1.0, 1.0, 0.0]],
            },
            PositionRecord {
                frame: 5,
                position: vec![[0.0; 3]; 4],
            },
        ];
        let hips = hip_records(&records, &indices).unwrap();
        assert_eq!(hips.len(), 2);
        assert_eq!(hips[0].frame, 4);
        assert!((hips[0].hip_rotation_quaternion[3].abs() - 1.0).abs() < 1e-12);
        assert_eq!(hips[1].hip_rotation_quaternion, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn hip_records_reject_short_frames() {
        let records = vec![PositionRecord {
            frame: 0,
            position: vec![[0.0; 3]; 3],
        }];
        assert!(matches!(
            hip_records(&records, &LandmarkIndices::default()),
            Err(Error::Facing(_))
        ));
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir()
            .join(format!("bvh_motion_prep_export_{}.json", std::process::id()));
        let records = position_records(&[vec![Position::new(0.5, -1.0, 2.0); 2]]);
        write_json(&path, &records, true).unwrap();
        let loaded = read_position_records(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, records);
    }

    #[test]
    fn msgpack_keeps_field_names() {
        let path = std::env::temp_dir()
            .join(format!("bvh_motion_prep_export_{}.msgpack", std::process::id()));
        let hips = vec![HipRecord {
            frame: 3,
            hip_rotation_quaternion: [0.0, 0.5, 0.0, 0.5],
        }];
        write_msgpack(&path, &hips).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        let loaded: Vec<HipRecord> = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(loaded, hips);
        let key = b"HipRotationQuaternion";
        assert!(bytes.windows(key.len()).any(|window| window == key));
    }
}
