//! Automated participant identities and pacing.

use rand::Rng;
use std::time::Duration;
use uuid::Uuid;

use crate::game::entities::Participant;

/// Display names handed out to automated participants, in order.
pub const BOT_NAMES: [&str; 8] = [
    "Marlin", "Pike", "Grouper", "Trout", "Perch", "Snapper", "Carp", "Minnow",
];

/// Builds `count` automated participants with fresh unique ids. Append
/// them after the human roster.
#[must_use]
pub fn spawn_bots(count: usize) -> Vec<Participant> {
    (0..count)
        .map(|i| {
            let name = BOT_NAMES[i % BOT_NAMES.len()];
            Participant::automated(format!("bot-{}", Uuid::new_v4()), name)
        })
        .collect()
}

/// Human-like pacing for automated turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotPacing {
    /// Average thinking time in milliseconds (base)
    pub base_think_time_ms: u64,

    /// Random variance in thinking time (±milliseconds)
    pub think_time_variance_ms: u64,
}

impl BotPacing {
    #[must_use]
    pub const fn new(base_think_time_ms: u64, think_time_variance_ms: u64) -> Self {
        Self {
            base_think_time_ms,
            think_time_variance_ms,
        }
    }

    /// Base time plus a uniformly random jitter within the variance.
    pub fn think_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.think_time_variance_ms == 0 {
            return Duration::from_millis(self.base_think_time_ms);
        }
        let low = self
            .base_think_time_ms
            .saturating_sub(self.think_time_variance_ms);
        let high = self.base_think_time_ms + self.think_time_variance_ms;
        Duration::from_millis(rng.random_range(low..=high))
    }
}
