use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

const DEFAULT_HISTORY_CAP: usize = 16;

/// One recorded publish.
#[derive(Debug, Clone, Serialize)]
pub struct PublishRecord {
    pub at: DateTime<Utc>,
    pub payload_bytes: usize,
}

#[derive(Debug)]
struct ChannelTrail {
    count: u64,
    last: PublishRecord,
    history: VecDeque<PublishRecord>,
}

/// Caller-owned registry of what has been published where.
///
/// Shared explicitly (typically by `Arc`) between the owner and any
/// publishers that should report into it; there is no process-global
/// instance. Per-channel history is bounded.
#[derive(Debug)]
pub struct PublishRegistry {
    inner: Mutex<HashMap<String, ChannelTrail>>,
    history_cap: usize,
}

impl Default for PublishRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishRegistry {
    pub fn new() -> Self {
        Self::with_history(DEFAULT_HISTORY_CAP)
    }

    /// `history_cap` is the number of *previous* records retained per
    /// channel, on top of the latest one.
    pub fn with_history(history_cap: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
            history_cap,
        }
    }

    pub fn track(&self, channel: &str, payload_bytes: usize) {
        let record = PublishRecord {
            at: Utc::now(),
            payload_bytes,
        };

        let mut g = self.inner.lock().expect("publish registry mutex poisoned");

        match g.get_mut(channel) {
            None => {
                g.insert(
                    channel.to_string(),
                    ChannelTrail {
                        count: 1,
                        last: record,
                        history: VecDeque::new(),
                    },
                );
            }
            Some(trail) => {
                trail.count += 1;
                let previous = std::mem::replace(&mut trail.last, record);
                trail.history.push_back(previous);
                while trail.history.len() > self.history_cap {
                    trail.history.pop_front();
                }
            }
        }
    }

    pub fn stats(&self) -> RegistryStats {
        let g = self.inner.lock().expect("publish registry mutex poisoned");

        let channels = g
            .iter()
            .map(|(channel, trail)| {
                (
                    channel.clone(),
                    ChannelStats {
                        count: trail.count,
                        last: trail.last.clone(),
                        history: trail.history.iter().cloned().collect(),
                    },
                )
            })
            .collect::<HashMap<_, _>>();

        RegistryStats {
            total: channels.len(),
            channels,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelStats {
    pub count: u64,
    pub last: PublishRecord,
    pub history: Vec<PublishRecord>,
}

/// Serializable snapshot, e.g. for dumping to an ops endpoint or log.
#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total: usize,
    pub channels: HashMap<String, ChannelStats>,
}
