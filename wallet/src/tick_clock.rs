use log::debug;
use std::sync::Arc;
use tickwire_common::{
    config::DEFAULT_TICK_OFFSET,
    tick::{target_tick, TickWindow},
};

use crate::{error::NetworkError, node_api::NodeClient};

// Reads the network tick and derives validity windows from it
#[derive(Clone)]
pub struct TickClock {
    node: Arc<dyn NodeClient>,
    offset: u32,
}

impl TickClock {
    pub fn new(node: Arc<dyn NodeClient>, offset: u32) -> Self {
        Self { node, offset }
    }

    pub fn with_default_offset(node: Arc<dyn NodeClient>) -> Self {
        Self::new(node, DEFAULT_TICK_OFFSET)
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    // Single network read
    pub async fn current_tick(&self) -> Result<u32, NetworkError> {
        self.node.current_tick().await
    }

    pub fn target_tick(&self, current: u32) -> u32 {
        target_tick(current, self.offset)
    }

    // Fetch the tick and compute the target for a transaction built now
    pub async fn window(&self) -> Result<TickWindow, NetworkError> {
        let observed = self.current_tick().await?;
        let window = TickWindow::new(observed, self.offset);
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "tick window: observed {} target {}",
                window.observed_tick, window.target_tick
            );
        }
        Ok(window)
    }
}
