//! Album debouncing.
//!
//! Telegram delivers an album as separate messages sharing a media group id.
//! [`MediaGroupCollector`] buffers them and hands the whole group to a flush
//! callback once no new member has arrived for the debounce delay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use keep_core::MessageUnit;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default quiet period before an album is flushed.
pub const DEFAULT_MEDIA_GROUP_DELAY: Duration = Duration::from_secs(2);

/// Callback receiving a flushed group id and its members in arrival order.
pub type FlushFn = Arc<dyn Fn(String, Vec<MessageUnit>) + Send + Sync>;

struct PendingGroup {
    units: Vec<MessageUnit>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

struct Inner {
    delay: Duration,
    on_flush: FlushFn,
    groups: Mutex<HashMap<String, PendingGroup>>,
}

impl Inner {
    fn groups(&self) -> MutexGuard<'_, HashMap<String, PendingGroup>> {
        self.groups.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Buffers media group members and flushes each group exactly once.
#[derive(Clone)]
pub struct MediaGroupCollector {
    inner: Arc<Inner>,
}

impl MediaGroupCollector {
    /// Create a collector. A zero `delay` falls back to the default.
    pub fn new(delay: Duration, on_flush: FlushFn) -> Self {
        let delay = if delay.is_zero() {
            DEFAULT_MEDIA_GROUP_DELAY
        } else {
            delay
        };
        Self {
            inner: Arc::new(Inner {
                delay,
                on_flush,
                groups: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Buffer `unit` and restart its group's timer.
    ///
    /// Returns `false` without buffering when the unit has no media group id.
    /// Must be called from within a Tokio runtime.
    pub fn collect(&self, unit: MessageUnit) -> bool {
        let Some(group_id) = unit.media_group_id.clone().filter(|id| !id.is_empty()) else {
            return false;
        };

        let mut groups = self.inner.groups();
        let group = groups.entry(group_id.clone()).or_insert_with(|| PendingGroup {
            units: Vec::new(),
            generation: 0,
            timer: None,
        });

        group.units.push(unit);
        group.generation += 1;
        if let Some(timer) = group.timer.take() {
            timer.abort();
        }

        let inner = Arc::clone(&self.inner);
        let generation = group.generation;
        let delay = self.inner.delay;
        let id = group_id.clone();
        group.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            flush(&inner, id, generation);
        }));

        debug!(
            group_id = %group_id,
            members = group.units.len(),
            "Buffered media group member"
        );
        true
    }

    /// Number of groups still waiting for their timer.
    pub fn pending_groups(&self) -> usize {
        self.inner.groups().len()
    }
}

fn flush(inner: &Inner, group_id: String, generation: u64) {
    let units = {
        let mut groups = inner.groups();
        match groups.get(&group_id) {
            Some(group) if group.generation == generation => {}
            _ => return,
        }
        match groups.remove(&group_id) {
            Some(group) => group.units,
            None => return,
        }
    };

    if units.is_empty() {
        return;
    }
    debug!(group_id = %group_id, members = units.len(), "Flushing media group");
    (inner.on_flush)(group_id, units);
}
