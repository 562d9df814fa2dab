use crate::error::ParseError;
use crate::types::*;
use regex::Regex;
use std::path::Path;
use std::str::Lines;

/// A parsed .bvh file: the static skeleton and the raw motion frames.
#[derive(Debug, Clone)]
pub struct Bvh {
    pub skeleton: Skeleton,
    /// One flat list of channel values per frame, in pre-order channel order.
    pub frames: Vec<Vec<f64>>,
    pub frame_time: f64,
    pub fps: u32,
}

impl Bvh {
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// What the next closing brace ends.
enum Scope {
    Joint(JointNode),
    EndSite,
}

fn __parse_number(token: &str, line: usize) -> Result<f64, ParseError> {
    token.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        line,
        token: token.to_string(),
    })
}

fn __parse_offset(values: &str, line: usize) -> Result<Position, ParseError> {
    let offset = values
        .split_whitespace()
        .map(|s| __parse_number(s, line))
        .collect::<Result<Vec<f64>, _>>()?;
    if offset.len() != 3 {
        return Err(ParseError::BadOffset {
            line,
            found: offset.len(),
        });
    }
    Ok(Position::new(offset[0], offset[1], offset[2]))
}

fn __parse_channels(declared: &str, names: &str, line: usize) -> Result<Vec<Channel>, ParseError> {
    let declared = declared
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidNumber {
            line,
            token: declared.to_string(),
        })?;
    let channels = names
        .split_whitespace()
        .map(|name| {
            Channel::from_name(name).ok_or_else(|| ParseError::UnknownChannel {
                line,
                name: name.to_string(),
            })
        })
        .collect::<Result<Vec<Channel>, _>>()?;
    if channels.len() != declared {
        return Err(ParseError::ChannelCountMismatch {
            line,
            declared,
            listed: channels.len(),
        });
    }
    Ok(channels)
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn parse_bvh(lines: Lines) -> Result<Bvh, ParseError> {
    let re_joint = Regex::new(r"^(ROOT|JOINT)\s+(\S+)").expect("valid regex");
    let re_offset = Regex::new(r"^OFFSET\s+(.+)").expect("valid regex");
    let re_channels = Regex::new(r"^CHANNELS\s+(\d+)\s*(.*)").expect("valid regex");

    let mut stack: Vec<Scope> = Vec::new();
    let mut root: Option<JointNode> = None;
    let mut pending: Option<Scope> = None;
    let mut parsing_motion = false;
    let mut declared_frames: Option<usize> = None;

    //// PARSING HIERARCHY LINE BY LINE
    let mut it = lines.enumerate();
    let frame_time = loop {
        let (i, line) = match it.next() {
            Some(next) => next,
            None if parsing_motion => return Err(ParseError::MissingFrameTime),
            None => return Err(ParseError::UnexpectedEof),
        };
        let line_no = i + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with("HIERARCHY") {
            continue;
        } else if let Some(captures) = re_joint.captures(line) {
            //// Create joint, it becomes a scope on the following "{"
            let misplaced = if &captures[1] == "ROOT" {
                root.is_some() || !stack.is_empty()
            } else {
                stack.is_empty()
            };
            if misplaced {
                return Err(ParseError::UnexpectedLine {
                    line: line_no,
                    content: line.to_string(),
                });
            }
            let joint = JointNode::new(&captures[2], Position::new(0.0, 0.0, 0.0));
            pending = Some(Scope::Joint(joint));
        } else if line.to_lowercase().starts_with("end") {
            //// Create endsite
            pending = Some(Scope::EndSite);
        } else if line == "{" {
            let scope = pending.take().ok_or_else(|| ParseError::UnexpectedLine {
                line: line_no,
                content: line.to_string(),
            })?;
            stack.push(scope);
        } else if line == "}" {
            //// Close the innermost scope and hand a finished joint to its parent
            match stack.pop() {
                Some(Scope::EndSite) => {}
                Some(Scope::Joint(joint)) => match stack.last_mut() {
                    Some(Scope::Joint(parent)) => parent.children.push(joint),
                    Some(Scope::EndSite) => return Err(ParseError::UnbalancedBraces),
                    None => root = Some(joint),
                },
                None => return Err(ParseError::UnbalancedBraces),
            }
        } else if let Some(captures) = re_offset.captures(line) {
            //// Parse offset
            let offset = __parse_offset(&captures[1], line_no)?;
            let mut parents = stack.iter_mut().rev();
            match parents.next() {
                Some(Scope::Joint(joint)) => joint.offset = offset,
                Some(Scope::EndSite) => match parents.next() {
                    Some(Scope::Joint(joint)) => joint.end_site = Some(offset),
                    _ => return Err(ParseError::UnbalancedBraces),
                },
                None => {
                    return Err(ParseError::UnexpectedLine {
                        line: line_no,
                        content: line.to_string(),
                    })
                }
            }
        } else if let Some(captures) = re_channels.captures(line) {
            //// Parse channels
            let channels = __parse_channels(&captures[1], &captures[2], line_no)?;
            match stack.last_mut() {
                Some(Scope::Joint(joint)) => joint.channels = channels,
                _ => {
                    return Err(ParseError::UnexpectedLine {
                        line: line_no,
                        content: line.to_string(),
                    })
                }
            }
        } else if line.starts_with("MOTION") {
            if !stack.is_empty() || pending.is_some() {
                return Err(ParseError::UnbalancedBraces);
            }
            if root.is_none() {
                return Err(ParseError::MissingHierarchy);
            }
            parsing_motion = true;
        } else if line.starts_with("Frames:") {
            //// Parse number of frames
            let token = line.trim_start_matches("Frames:").trim();
            declared_frames = Some(token.parse::<usize>().map_err(|_| ParseError::InvalidNumber {
                line: line_no,
                token: token.to_string(),
            })?);
        } else if line.starts_with("Frame Time:") {
            //// Parse frame time
            let token = line.trim_start_matches("Frame Time:").trim();
            break __parse_number(token, line_no)?; // jump to parsing Motion
        } else {
            return Err(ParseError::UnexpectedLine {
                line: line_no,
                content: line.to_string(),
            });
        }
    };

    let root = root.ok_or(ParseError::MissingHierarchy)?;
    let skeleton = Skeleton::new(root);

    /////////////////////////////////// PARSING MOTION ///////////////////////////////////

    let mut frames: Vec<Vec<f64>> = Vec::new();
    for (i, line) in it {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame = line
            .split_whitespace()
            .map(|s| __parse_number(s, i + 1))
            .collect::<Result<Vec<f64>, _>>()?;
        if frame.len() != skeleton.num_channels() {
            tracing::warn!(
                "Frame {} has {} values, skeleton has {} channels",
                frames.len(),
                frame.len(),
                skeleton.num_channels()
            );
        }
        frames.push(frame);
    }

    if let Some(declared) = declared_frames {
        if declared != frames.len() {
            tracing::warn!("Header declares {} frames, found {}", declared, frames.len());
        }
    }

    let fps = if frame_time > 0.0 {
        (1.0 / frame_time).round() as u32
    } else {
        0
    };

    tracing::debug!(
        joints = skeleton.num_joints(),
        channels = skeleton.num_channels(),
        frames = frames.len(),
        fps,
        "Parsed bvh"
    );

    Ok(Bvh {
        skeleton,
        frames,
        frame_time,
        fps,
    })
}

//////////////////////////////////////////////////////////////// PUBLIC ///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// load a bvh file from a file path
pub fn load_bvh_from_file<P: AsRef<Path>>(file_path: P) -> Result<Bvh, ParseError> {
    let contents = std::fs::read_to_string(file_path)?;
    parse_bvh(contents.lines())
}

/// load a bvh file from a string
pub fn load_bvh_from_str(bvh_string: &str) -> Result<Bvh, ParseError> {
    parse_bvh(bvh_string.lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RIG: &str = "HIERARCHY
ROOT Hips
{
  OFFSET 0.0 0.0 0.0
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT Spine
  {
    OFFSET 0.0 10.0 0.0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0.0 5.0 0.0
    }
  }
  JOINT LeftUpLeg
  {
    OFFSET 3.0 -1.0 0.0
    CHANNELS 3 Zrotation Xrotation Yrotation
    JOINT LeftLeg
    {
      OFFSET 0.0 -8.0 0.0
      CHANNELS 3 Zrotation Xrotation Yrotation
      End Site
      {
        OFFSET 0.0 -8.0 0.0
      }
    }
  }
}
MOTION
Frames: 2
Frame Time: 0.0333333
0.0 90.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0
1.0 90.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 0.0 90.0 0.0 0.0 0.0
";

    #[test]
    fn parses_hierarchy() {
        let bvh = load_bvh_from_str(RIG).unwrap();
        let skeleton = &bvh.skeleton;
        assert_eq!(skeleton.joint_names(), vec!["Hips", "Spine", "LeftUpLeg", "LeftLeg"]);
        assert_eq!(skeleton.num_channels(), 15);

        let root = skeleton.root();
        assert_eq!(root.channels.len(), 6);
        assert_eq!(root.channels[3], Channel::Zrotation);
        assert_eq!(root.children[0].end_site, Some(Position::new(0.0, 5.0, 0.0)));
        assert_eq!(root.children[1].offset, Position::new(3.0, -1.0, 0.0));
        assert_eq!(root.children[1].end_site, None);
        assert_eq!(root.children[1].children[0].end_site, Some(Position::new(0.0, -8.0, 0.0)));
    }

    #[test]
    fn parses_motion() {
        let bvh = load_bvh_from_str(RIG).unwrap();
        assert_eq!(bvh.num_frames(), 2);
        assert_eq!(bvh.fps, 30);
        assert!((bvh.frame_time - 0.0333333).abs() < 1e-12);
        assert_eq!(bvh.frames[1][0], 1.0);
        assert_eq!(bvh.frames[1][11], 90.0);
    }

    #[test]
    fn rejects_unknown_channel() {
        let text = RIG.replace(
            "CHANNELS 3 Zrotation Xrotation Yrotation\n    End",
            "CHANNELS 3 Zrotation Wrotation Yrotation\n    End",
        );
        assert!(matches!(
            load_bvh_from_str(&text),
            Err(ParseError::UnknownChannel { line: 9, .. })
        ));
    }

    #[test]
    fn rejects_channel_count_mismatch() {
        let text = RIG.replace("CHANNELS 6", "CHANNELS 5");
        assert!(matches!(
            load_bvh_from_str(&text),
            Err(ParseError::ChannelCountMismatch {
                declared: 5,
                listed: 6,
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_motion_value() {
        let text = RIG.replace("1.0 90.0", "1.0 ninety");
        assert!(matches!(
            load_bvh_from_str(&text),
            Err(ParseError::InvalidNumber { line: 34, .. })
        ));
    }

    #[test]
    fn oversized_frame_count_keeps_listed_frames() {
        let text = RIG.replace("Frames: 2", "Frames: 18446744073709551615");
        let bvh = load_bvh_from_str(&text).unwrap();
        assert_eq!(bvh.num_frames(), 2);
    }

    #[test]
    fn rejects_missing_frame_time() {
        let text = RIG.split("Frame Time").next().unwrap().to_string();
        assert!(matches!(
            load_bvh_from_str(&text),
            Err(ParseError::MissingFrameTime)
        ));
    }

    #[test]
    fn rejects_truncated_hierarchy() {
        let text = RIG.split("MOTION").next().unwrap().to_string();
        assert!(matches!(
            load_bvh_from_str(&text),
            Err(ParseError::UnexpectedEof)
        ));
    }

    #[test]
    fn rejects_joint_outside_root() {
        let text = RIG.replacen("ROOT Hips", "JOINT Hips", 1);
        assert!(matches!(
            load_bvh_from_str(&text),
            Err(ParseError::UnexpectedLine { line: 2, .. })
        ));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let text = RIG.replacen("}\n  JOINT LeftUpLeg", "JOINT LeftUpLeg", 1);
        assert!(load_bvh_from_str(&text).is_err());
    }

    #[test]
    fn rejects_empty_hierarchy() {
        assert!(matches!(
            load_bvh_from_str("HIERARCHY\nMOTION\nFrames: 0\nFrame Time: 0.01\n"),
            Err(ParseError::MissingHierarchy)
        ));
    }
}
