//! Aggregate counters. Every update overwrites; nothing is merged.

use serde::Serialize;

use crate::net::types::{StatsResponse, SystemStats};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub online_users: u32,
    pub total_messages: u64,
    pub visible_messages: u64,
    pub viewport_message_count: u64,
}

impl Stats {
    /// Apply a `SYSTEM_STATS_UPDATED` push. An absent `visibleMessages`
    /// leaves the current value in place.
    pub fn apply_system(&mut self, stats: SystemStats) {
        self.online_users = stats.online_count;
        self.total_messages = stats.total_messages;
        if let Some(visible) = stats.visible_messages {
            self.visible_messages = visible;
        }
    }

    pub fn apply_response(&mut self, stats: StatsResponse) {
        self.online_users = stats.online_users;
        self.total_messages = stats.total_messages;
        self.visible_messages = stats.visible_messages;
    }
}
