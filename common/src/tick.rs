use serde::{Deserialize, Serialize};

use crate::{config::DEFAULT_TICK_OFFSET, error::ValidationError};

// Target tick for a transaction built while the network is at `current`
// Saturates at u32::MAX instead of wrapping around
pub fn target_tick(current: u32, offset: u32) -> u32 {
    current.saturating_add(offset)
}

// Tick observed from the network and the tick chosen as validity marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickWindow {
    pub observed_tick: u32,
    pub target_tick: u32,
}

impl TickWindow {
    pub fn new(observed_tick: u32, offset: u32) -> Self {
        Self {
            observed_tick,
            target_tick: target_tick(observed_tick, offset),
        }
    }

    pub fn with_default_offset(observed_tick: u32) -> Self {
        Self::new(observed_tick, DEFAULT_TICK_OFFSET)
    }

    // A window is only usable if the target lies strictly after the observed tick
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.target_tick <= self.observed_tick {
            return Err(ValidationError::StaleTick {
                field: "tick".to_owned(),
                target: self.target_tick,
                observed: self.observed_tick,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_is_after_current() {
        for current in [0, 1, 1_000, 15_000_000, u32::MAX - 11, u32::MAX - 1] {
            assert!(target_tick(current, DEFAULT_TICK_OFFSET) > current);
            assert!(TickWindow::with_default_offset(current).validate().is_ok());
        }
    }

    #[test]
    fn test_saturation() {
        assert_eq!(target_tick(u32::MAX - 3, 10), u32::MAX);
        let window = TickWindow::new(u32::MAX, 10);
        assert_eq!(window.target_tick, u32::MAX);
        assert!(matches!(window.validate(), Err(ValidationError::StaleTick { .. })));
    }

    #[test]
    fn test_zero_offset_is_stale() {
        let window = TickWindow::new(500, 0);
        assert_eq!(
            window.validate(),
            Err(ValidationError::StaleTick {
                field: "tick".to_owned(),
                target: 500,
                observed: 500
            })
        );
    }
}
