//! sizeup-core: single-shot size estimation from object detections
//!
//! Turns a detection (a labelled pixel bounding box, or a remote vision
//! report with physical dimensions) into an approximate distance and
//! volume. Everything here is synchronous and side-effect free.

pub mod error;
pub mod geometry;
pub mod normalize;
pub mod present;
pub mod priors;
pub mod types;

pub use error::NormalizeError;
pub use geometry::{distance_from_height, estimate, resolve_reference_height, volume_from_bounding_box};
pub use normalize::{normalize_local, normalize_remote, parse_remote_report, RemoteReport, TargetSelector};
pub use present::{format_distance, format_volume, render, VolumeDisplay};
pub use priors::{ObjectSizePrior, DEFAULT_PRIOR};
pub use types::{Analysis, BoundingBox, CalibrationInput, Detection, EstimationResult, Shape, SourceKind};
