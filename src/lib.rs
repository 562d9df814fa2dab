//! Forward kinematics and hip facing extraction for preparing .bvh dance motion data.
//!
//! ```no_run
//! use bvh_motion_prep::{facing, fk, parse};
//!
//! let bvh = parse::load_bvh_from_file("dance.bvh").unwrap();
//! let positions = fk::evaluate_motion(&bvh.skeleton, &bvh.frames).unwrap();
//! let hip = facing::compute_facing_quaternion(&positions[0]);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod facing;
pub mod fk;
pub mod parse;
pub mod pipeline;
pub mod standardize;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
