use serde::Serialize;

use crate::error::StatsError;
use crate::level::{MAX_LEVEL, experience_for_level, level_from_experience, validate_experience};

/// Position of an experience value within its level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub level: u32,
    /// Experience earned since reaching `level`.
    pub current_xp: f64,
    /// Width of the current level, i.e. experience between `level` and `level + 1`.
    pub xp_to_next: f64,
    /// Experience still missing before the next level.
    pub xp_remaining: f64,
    /// Completion of the current level, 0..=100.
    pub percent: f64,
}

impl Progress {
    pub fn is_maxed(&self) -> bool {
        self.level >= MAX_LEVEL
    }
}

pub fn progress(xp: f64) -> Result<Progress, StatsError> {
    let xp = validate_experience(xp)?;
    let level = level_from_experience(xp)?;
    let floor = experience_for_level(level).ok_or(StatsError::InvalidLevel(level))?;
    let current_xp = (xp - floor).max(0.0);

    // No threshold exists past the last level.
    let Some(next) = experience_for_level(level + 1) else {
        return Ok(Progress {
            level,
            current_xp,
            xp_to_next: 0.0,
            xp_remaining: 0.0,
            percent: 100.0,
        });
    };

    let xp_to_next = next - floor;
    let percent = (current_xp / xp_to_next * 100.0).clamp(0.0, 100.0);
    Ok(Progress {
        level,
        current_xp,
        xp_to_next,
        xp_remaining: (xp_to_next - current_xp).max(0.0),
        percent,
    })
}
