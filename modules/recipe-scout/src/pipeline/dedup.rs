use std::collections::HashSet;

use crate::pipeline::Rejection;

/// Skip any id already in the sink snapshot or written earlier this run.
pub fn check(video_id: &str, existing: &HashSet<String>) -> Result<(), Rejection> {
    if existing.contains(video_id) {
        Err(Rejection::Duplicate)
    } else {
        Ok(())
    }
}
