use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use switchboard_core::config::MemorySettings;
use tracing::{debug, info};

use crate::thread::{ConversationThread, Role, ThreadMessage};

const SHARD_COUNT: usize = 16;

/// In-process conversational state, sharded by thread key so concurrent
/// dispatches on unrelated threads never contend on one lock, and the sweep
/// only stalls one shard at a time.
pub struct ThreadStore {
    shards: Vec<RwLock<HashMap<String, ConversationThread>>>,
    ttl: Duration,
    max_messages: usize,
}

impl ThreadStore {
    pub fn new(settings: &MemorySettings) -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            ttl: Duration::seconds(settings.ttl_secs as i64),
            max_messages: settings.max_messages,
        }
    }

    fn shard(&self, thread_id: &str) -> &RwLock<HashMap<String, ConversationThread>> {
        // FNV-1a; stable across runs so tests can reason about placement
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in thread_id.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x100_0000_01b3);
        }
        &self.shards[(hash % SHARD_COUNT as u64) as usize]
    }

    /// Load the thread, creating it on first contact. Always refreshes
    /// last-activity. Returns a snapshot; the stored copy stays private.
    pub fn get_or_create(
        &self,
        thread_id: &str,
        channel_id: &str,
        user_id: &str,
    ) -> ConversationThread {
        let now = Utc::now();
        let mut shard = self.shard(thread_id).write().unwrap();
        let thread = shard.entry(thread_id.to_string()).or_insert_with(|| {
            debug!(thread_id, channel_id, "Creating thread state");
            ConversationThread::new(thread_id, channel_id, user_id, now)
        });
        thread.last_activity = now;
        thread.clone()
    }

    /// Append a message. Deliberately a no-op when the thread does not exist:
    /// callers are expected to `get_or_create` first, but the store never
    /// throws for a miss.
    pub fn append_message(&self, thread_id: &str, role: Role, text: &str, agent_id: Option<&str>) {
        let now = Utc::now();
        let mut shard = self.shard(thread_id).write().unwrap();
        if let Some(thread) = shard.get_mut(thread_id) {
            thread.push(
                ThreadMessage {
                    role,
                    text: text.to_string(),
                    agent_id: agent_id.map(str::to_string),
                    timestamp: now,
                },
                self.max_messages,
            );
            thread.last_activity = now;
        }
    }

    /// Snapshot of the retained message sequence, oldest first.
    pub fn messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        let shard = self.shard(thread_id).read().unwrap();
        shard
            .get(thread_id)
            .map(|t| t.messages.clone())
            .unwrap_or_default()
    }

    pub fn snapshot(&self, thread_id: &str) -> Option<ConversationThread> {
        let shard = self.shard(thread_id).read().unwrap();
        shard.get(thread_id).cloned()
    }

    pub fn set_current_agent(&self, thread_id: &str, agent_id: &str) {
        let mut shard = self.shard(thread_id).write().unwrap();
        if let Some(thread) = shard.get_mut(thread_id) {
            thread.current_agent = Some(agent_id.to_string());
        }
    }

    pub fn set_scratch(&self, thread_id: &str, agent_id: &str, key: &str, value: Value) {
        let mut shard = self.shard(thread_id).write().unwrap();
        if let Some(thread) = shard.get_mut(thread_id) {
            let mut payload = Map::new();
            payload.insert(key.to_string(), value);
            thread.merge_scratch(agent_id, payload);
        }
    }

    pub fn get_scratch(&self, thread_id: &str, agent_id: &str) -> Option<Map<String, Value>> {
        let shard = self.shard(thread_id).read().unwrap();
        shard
            .get(thread_id)
            .and_then(|t| t.scratch.get(agent_id))
            .cloned()
    }

    /// Merge a whole payload into the agent's scratch bag (handoff context).
    pub fn merge_scratch(&self, thread_id: &str, agent_id: &str, payload: Map<String, Value>) {
        let mut shard = self.shard(thread_id).write().unwrap();
        if let Some(thread) = shard.get_mut(thread_id) {
            thread.merge_scratch(agent_id, payload);
        }
    }

    /// Eagerly delete one thread (user-requested reset).
    pub fn clear(&self, thread_id: &str) -> bool {
        let mut shard = self.shard(thread_id).write().unwrap();
        shard.remove(thread_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().unwrap().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delete every thread idle longer than the TTL. Returns the number
    /// removed. Locks shard-by-shard so unrelated dispatches keep flowing.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut removed = 0;
        for shard in &self.shards {
            let mut map = shard.write().unwrap();
            let before = map.len();
            map.retain(|_, thread| thread.idle_duration(now) <= self.ttl);
            removed += before - map.len();
        }
        if removed > 0 {
            info!(removed, "Swept expired threads");
        }
        removed
    }

    /// Spawn the periodic TTL sweep on the given interval.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let store = self;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately; skip it so a fresh store isn't
            // swept before anything happens.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                store.sweep(Utc::now());
            }
        })
    }
}
