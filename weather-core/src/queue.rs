//! Offline request queue.
//!
//! Lookups submitted while offline are appended to a persisted queue and
//! replayed, one at a time and in submission order, once connectivity
//! returns. A drain always empties the queue: entries whose replay fails are
//! reported in the [`DrainReport`] and then dropped.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    error::{StorageError, WeatherError},
    model::QueueEntry,
    storage::{KeyValueStore, QUEUE_KEY, get_json, set_json},
};

/// Something that can re-issue a queued lookup.
#[async_trait]
pub trait Replay: Send {
    async fn replay(&mut self, city: &str) -> Result<(), WeatherError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayOutcome {
    Ok,
    Failed(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub outcomes: Vec<(QueueEntry, ReplayOutcome)>,
}

impl DrainReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == ReplayOutcome::Ok).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&QueueEntry, &str)> {
        self.outcomes.iter().filter_map(|(entry, outcome)| match outcome {
            ReplayOutcome::Failed(reason) => Some((entry, reason.as_str())),
            ReplayOutcome::Ok => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Handle to the persisted queue. Cloning shares the same store.
#[derive(Debug, Clone)]
pub struct OfflineQueue {
    store: Arc<dyn KeyValueStore>,
}

impl OfflineQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Entries currently waiting, oldest first.
    pub fn pending(&self) -> Result<Vec<QueueEntry>, StorageError> {
        Ok(get_json(self.store.as_ref(), QUEUE_KEY)?.unwrap_or_default())
    }

    /// Append a lookup stamped with the current time. The queue is written
    /// back before returning.
    pub fn enqueue(&self, city_name: &str) -> Result<QueueEntry, StorageError> {
        self.enqueue_at(city_name, Utc::now().timestamp_millis())
    }

    pub fn enqueue_at(&self, city_name: &str, timestamp: i64) -> Result<QueueEntry, StorageError> {
        let mut queue = self.pending()?;
        let entry = QueueEntry { city_name: city_name.to_string(), timestamp };
        queue.push(entry.clone());
        set_json(self.store.as_ref(), QUEUE_KEY, &queue)?;

        tracing::info!(city = city_name, pending = queue.len(), "queued lookup for later");
        Ok(entry)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(QUEUE_KEY)
    }

    /// Replay every pending entry through `replayer`, awaiting each before
    /// starting the next, then clear the queue regardless of outcomes.
    pub async fn drain_and_replay<R>(&self, replayer: &mut R) -> Result<DrainReport, StorageError>
    where
        R: Replay + ?Sized,
    {
        let queue = self.pending()?;
        let mut report = DrainReport::default();

        if !queue.is_empty() {
            tracing::info!(pending = queue.len(), "replaying queued lookups");
        }

        for entry in queue {
            let outcome = match replayer.replay(&entry.city_name).await {
                Ok(()) => ReplayOutcome::Ok,
                Err(err) => {
                    tracing::warn!(city = %entry.city_name, error = %err, "queued lookup failed; dropping");
                    ReplayOutcome::Failed(err.to_string())
                }
            };
            report.outcomes.push((entry, outcome));
        }

        self.clear()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
        fail: Vec<&'static str>,
    }

    #[async_trait]
    impl Replay for Recorder {
        async fn replay(&mut self, city: &str) -> Result<(), WeatherError> {
            self.calls.push(city.to_string());
            if self.fail.iter().any(|f| *f == city) {
                Err(WeatherError::NotFound { query: city.to_string() })
            } else {
                Ok(())
            }
        }
    }

    fn queue() -> (OfflineQueue, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (OfflineQueue::new(store.clone()), store)
    }

    #[test]
    fn enqueue_persists_immediately_in_order() {
        let (queue, store) = queue();

        queue.enqueue_at("Paris", 1).unwrap();
        assert_eq!(
            store.get(QUEUE_KEY).unwrap().as_deref(),
            Some(r#"[{"cityName":"Paris","timestamp":1}]"#)
        );

        queue.enqueue_at("Berlin", 2).unwrap();
        let pending = queue.pending().unwrap();
        assert_eq!(
            pending,
            vec![
                QueueEntry { city_name: "Paris".into(), timestamp: 1 },
                QueueEntry { city_name: "Berlin".into(), timestamp: 2 },
            ]
        );
    }

    #[test]
    fn duplicates_and_empty_names_are_kept() {
        let (queue, _) = queue();
        queue.enqueue("Paris").unwrap();
        queue.enqueue("Paris").unwrap();
        queue.enqueue("").unwrap();

        let names: Vec<_> = queue.pending().unwrap().into_iter().map(|e| e.city_name).collect();
        assert_eq!(names, vec!["Paris", "Paris", ""]);
    }

    #[test]
    fn enqueue_stamps_current_time() {
        let (queue, _) = queue();
        let before = Utc::now().timestamp_millis();
        let entry = queue.enqueue("Oslo").unwrap();
        let after = Utc::now().timestamp_millis();
        assert!(entry.timestamp >= before && entry.timestamp <= after);
    }

    #[tokio::test]
    async fn drain_replays_in_submission_order_and_empties() {
        let (queue, store) = queue();
        queue.enqueue_at("Paris", 1).unwrap();
        queue.enqueue_at("Berlin", 2).unwrap();
        queue.enqueue_at("Rome", 3).unwrap();

        let mut recorder = Recorder { fail: vec!["Berlin"], ..Default::default() };
        let report = queue.drain_and_replay(&mut recorder).await.unwrap();

        assert_eq!(recorder.calls, vec!["Paris", "Berlin", "Rome"]);
        assert_eq!(report.attempted(), 3);
        assert_eq!(report.succeeded(), 2);
        let failed: Vec<_> = report.failures().map(|(e, _)| e.city_name.as_str()).collect();
        assert_eq!(failed, vec!["Berlin"]);

        assert!(queue.pending().unwrap().is_empty());
        assert_eq!(store.get(QUEUE_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn draining_empty_queue_calls_nothing() {
        let (queue, _) = queue();
        let mut recorder = Recorder::default();

        let report = queue.drain_and_replay(&mut recorder).await.unwrap();

        assert!(report.is_empty());
        assert!(recorder.calls.is_empty());
    }

    #[test]
    fn clear_is_idempotent() {
        let (queue, _) = queue();
        queue.clear().unwrap();
        queue.clear().unwrap();
        assert!(queue.pending().unwrap().is_empty());
    }

    #[test]
    fn corrupt_queue_reads_as_empty() {
        let (queue, store) = queue();
        store.set(QUEUE_KEY, "oops").unwrap();

        assert!(queue.pending().unwrap().is_empty());
        queue.enqueue_at("Lima", 7).unwrap();
        assert_eq!(queue.pending().unwrap().len(), 1);
    }
}
