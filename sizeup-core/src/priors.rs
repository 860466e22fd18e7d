//! Typical real-world sizes of detectable objects

use serde::Serialize;

/// Typical height and width of an object class, in meters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ObjectSizePrior {
    pub height: f64,
    pub width: f64,
}

/// Used for any label missing from the table
pub const DEFAULT_PRIOR: ObjectSizePrior = ObjectSizePrior {
    height: 0.3,
    width: 0.3,
};

const fn prior(height: f64, width: f64) -> ObjectSizePrior {
    ObjectSizePrior { height, width }
}

/// Labels follow the COCO class names local detectors report, plus the
/// waste-container names remote models tend to answer with.
const PRIORS: &[(&str, ObjectSizePrior)] = &[
    ("bottle", prior(0.25, 0.07)),
    ("cup", prior(0.12, 0.08)),
    ("wine glass", prior(0.2, 0.08)),
    ("bowl", prior(0.08, 0.16)),
    ("vase", prior(0.3, 0.15)),
    ("cell phone", prior(0.15, 0.07)),
    ("book", prior(0.24, 0.17)),
    ("laptop", prior(0.25, 0.35)),
    ("keyboard", prior(0.03, 0.45)),
    ("mouse", prior(0.04, 0.06)),
    ("remote", prior(0.18, 0.05)),
    ("clock", prior(0.3, 0.3)),
    ("teddy bear", prior(0.35, 0.25)),
    ("backpack", prior(0.45, 0.3)),
    ("handbag", prior(0.3, 0.35)),
    ("suitcase", prior(0.65, 0.45)),
    ("potted plant", prior(0.5, 0.3)),
    ("chair", prior(0.9, 0.5)),
    ("couch", prior(0.85, 2.0)),
    ("tv", prior(0.6, 1.0)),
    ("microwave", prior(0.3, 0.5)),
    ("oven", prior(0.85, 0.6)),
    ("toaster", prior(0.2, 0.3)),
    ("sink", prior(0.2, 0.6)),
    ("refrigerator", prior(1.8, 0.7)),
    ("toilet", prior(0.75, 0.4)),
    ("bicycle", prior(1.0, 1.7)),
    ("person", prior(1.7, 0.5)),
    ("dog", prior(0.6, 0.8)),
    ("cat", prior(0.3, 0.45)),
    ("car", prior(1.5, 4.5)),
    ("trash bin", prior(1.0, 0.6)),
    ("trash can", prior(1.0, 0.6)),
    ("container", prior(1.0, 0.6)),
    ("bin", prior(1.0, 0.6)),
];

impl ObjectSizePrior {
    /// Table entry for a label; case and surrounding whitespace are ignored
    pub fn lookup(label: &str) -> Option<ObjectSizePrior> {
        let key = label.trim().to_lowercase();
        PRIORS
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, prior)| *prior)
    }

    /// Table entry for a label, falling back to [`DEFAULT_PRIOR`]
    pub fn for_label(label: &str) -> ObjectSizePrior {
        Self::lookup(label).unwrap_or(DEFAULT_PRIOR)
    }

    pub fn all() -> impl Iterator<Item = (&'static str, ObjectSizePrior)> {
        PRIORS.iter().copied()
    }
}
