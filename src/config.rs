//! Runtime options of a [`Targeter`](crate::targeter::Targeter).
//!
//! The time span a broadcast rotation may stand for is not a targeter option: the
//! targeter always broadcasts the rotation of a single body epoch. It is set on
//! [`FrameTransformer::with_broadcast_tolerance`](crate::frame_transform::FrameTransformer::with_broadcast_tolerance)
//! for callers that broadcast over several epochs themselves.
//!
//! ```rust
//! use targeter::config::TargeterConfig;
//! use targeter::solutions::Branch;
//!
//! let config = TargeterConfig::default().with_branch(Branch::Farside);
//! assert_eq!(config.branch, Branch::Farside);
//! ```

use crate::solutions::Branch;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargeterConfig {
    /// Root of the ray–sphere quadratic used when solutions are built from a radius.
    pub branch: Branch,
}

impl TargeterConfig {
    pub fn with_branch(mut self, branch: Branch) -> Self {
        self.branch = branch;
        self
    }
}
