//! Reconciliation of a fresh live batch against the previous snapshot.
//!
//! [`reconcile`] is a pure function: it takes the previous [`WatchState`]
//! by reference and returns the next one together with the went-live
//! transitions it detected. The caller publishes the returned state as a
//! whole, so the status map and the alerted set always change together.

use std::collections::{HashMap, HashSet};

use twitch_client::ChannelStatus;

/// Status map plus alerted set, published as one snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchState {
    /// Lowercase channel name → status (display name in original casing).
    pub statuses: HashMap<String, ChannelStatus>,
    /// Lowercase names already alerted during their current live streak.
    pub alerted: HashSet<String>,
}

impl WatchState {
    pub fn status(&self, channel: &str) -> Option<&ChannelStatus> {
        self.statuses.get(&channel.to_lowercase())
    }

    pub fn is_alerted(&self, channel: &str) -> bool {
        self.alerted.contains(&channel.to_lowercase())
    }

    /// Live statuses in tracked-list order.
    pub fn live_channels(&self, tracked: &[String]) -> Vec<&ChannelStatus> {
        let mut seen = HashSet::new();
        tracked
            .iter()
            .map(|name| name.to_lowercase())
            .filter(|key| seen.insert(key.clone()))
            .filter_map(|key| self.statuses.get(&key))
            .filter(|status| status.is_live)
            .collect()
    }

    pub fn live_count(&self) -> usize {
        self.statuses.values().filter(|s| s.is_live).count()
    }
}

/// A channel that flipped to live and has not been alerted for this streak.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WentLive {
    pub name: String,
    pub title: Option<String>,
    pub game: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Reconciled {
    pub state: WatchState,
    pub went_live: Vec<WentLive>,
}

/// Merge a fresh batch of live channels into the previous snapshot.
///
/// `live` holds only channels Twitch reports as live; every tracked channel
/// missing from it is offline. A channel with no previous entry that is
/// live on its first observation counts as a transition and alerts.
/// Channels no longer tracked drop out of both the map and the alerted set.
pub fn reconcile(
    prev: &WatchState,
    tracked: &[String],
    live: Vec<ChannelStatus>,
    now: i64,
) -> Reconciled {
    let mut fresh: HashMap<String, ChannelStatus> = live
        .into_iter()
        .map(|status| (status.name.to_lowercase(), status))
        .collect();

    let mut statuses = HashMap::with_capacity(tracked.len());
    let mut alerted = HashSet::new();
    let mut went_live = Vec::new();

    for display_name in tracked {
        let key = display_name.to_lowercase();
        // Case variants of one channel share a key; the first spelling wins.
        if statuses.contains_key(&key) {
            continue;
        }

        let previous = prev.statuses.get(&key);
        let was_live = previous.is_some_and(|p| p.is_live);

        let status = match fresh.remove(&key) {
            Some(entry) => {
                let already_alerted = prev.alerted.contains(&key);
                if !was_live && !already_alerted {
                    tracing::info!(channel = %display_name, "Channel went live");
                    went_live.push(WentLive {
                        name: display_name.clone(),
                        title: entry.title.clone(),
                        game: entry.game.clone(),
                    });
                    alerted.insert(key.clone());
                } else if already_alerted {
                    alerted.insert(key.clone());
                }

                let last_changed = match previous {
                    Some(p) if p.is_live => p.last_changed,
                    _ => now,
                };
                ChannelStatus {
                    name: display_name.clone(),
                    is_live: true,
                    last_checked: now,
                    last_changed,
                    ..entry
                }
            }
            None => {
                let last_changed = match previous {
                    Some(p) if p.is_live => {
                        tracing::info!(channel = %display_name, "Channel went offline");
                        now
                    }
                    Some(p) => p.last_changed,
                    None => now,
                };
                ChannelStatus::offline(display_name.clone(), now, last_changed)
            }
        };

        statuses.insert(key, status);
    }

    Reconciled {
        state: WatchState { statuses, alerted },
        went_live,
    }
}
