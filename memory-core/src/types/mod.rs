//! Core data model: [`Memory`], [`Trace`], [`TrajectoryStep`], [`Workspace`],
//! and the LLM-level [`CacheEntry`].
//!
//! # Examples
//!
//! ```
//! use memory_core::types::{Memory, Difficulty, Outcome};
//!
//! let m = Memory::new(
//!     "ws_0123456789abcdef".to_string(),
//!     "binary search off-by-one".to_string(),
//!     "loop bound must be inclusive".to_string(),
//!     "use `lo <= hi`, not `lo < hi`".to_string(),
//!     vec![0.1, 0.2, 0.3],
//!     Difficulty::Simple,
//!     "algorithms".to_string(),
//!     Outcome::Success,
//! );
//! assert!(m.validate().is_ok());
//! ```

mod memory;
mod trace;

pub use memory::{Difficulty, ErrorContext, Memory, Outcome};
pub use trace::{CacheEntry, Trace, TrajectoryKind, TrajectoryStep};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_rejects_empty_required_fields() {
        let m = Memory::new(
            "ws".into(),
            String::new(),
            "d".into(),
            "c".into(),
            vec![0.0],
            Difficulty::Simple,
            "dom".into(),
            Outcome::Success,
        );
        assert!(m.validate().is_err());
    }
}
