//! Per-participant one-shot timers.
//!
//! A timer is a spawned task that sleeps and then calls back into the hub with its own id.
//! The hub keeps the id in the participant's slot; a callback whose id no longer matches the
//! slot is stale and does nothing.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;

use connect4_domain::ConnectionId;

use super::Hub;

/// Which deadline a timer enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerKind {
    /// Waiting player gets a bot opponent
    MatchmakingFallback,
    /// Disconnected player's seat goes to the bot
    BotTakeover,
    /// Disconnected player's session is torn down
    Teardown,
}

#[derive(Debug)]
pub(crate) struct ArmedTimer {
    pub(crate) id: u64,
    handle: JoinHandle<()>,
}

impl ArmedTimer {
    pub(crate) fn spawn(
        hub: Weak<Hub>,
        connection_id: ConnectionId,
        kind: TimerKind,
        id: u64,
        delay: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(hub) = hub.upgrade() {
                hub.fire_timer(connection_id, kind, id).await;
            }
        });
        Self { id, handle }
    }

    /// Abort the sleeping task. Never called from the timer's own callback.
    pub(crate) fn cancel(self) {
        self.handle.abort();
    }
}
