//! Shared read cache for the recommendation engine.
//!
//! The cache holds one immutable [`CacheSnapshot`]: the item-item similarity
//! table over the full event log plus content vectors for every catalog item.
//! A refresh builds a complete new snapshot off the async runtime and then
//! replaces the pointer. Readers clone the `Arc` and never observe a partially
//! built snapshot; the lock is held only for the clone or the swap.
//!
//! ## Usage Pattern
//!
//! ```ignore
//! let cache = Arc::new(RecommendationCache::new(settings.cache_ttl()));
//! cache.refresh(&stores, &settings.interaction).await?;
//! let refresher = Arc::clone(&cache).spawn_refresher(stores, settings.interaction, every);
//! let engine = RecommendationEngine::new(stores, settings).with_cache(cache);
//! ```

use crate::error::SignalSource;
use crate::profile::{item_vectors, ContentVector};
use crate::recommend::SimilarityTable;
use crate::signals::{CandidateItem, ItemKind, Stores};
use crate::usage::build_matrix;
use anyhow::{Context, Result};
use mentora_state::{InteractionWeights, RecommendSettings};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// One immutable build of the shared recommendation state.
#[derive(Debug)]
pub struct CacheSnapshot {
    /// Monotonic build number, starting at 1.
    pub version: u64,
    pub built_at: Instant,
    pub similarity: SimilarityTable,
    /// Catalog items by id; mentors enriched from their profiles.
    pub items: HashMap<String, CandidateItem>,
    pub item_vectors: HashMap<String, ContentVector>,
    pub events_aggregated: usize,
}

impl CacheSnapshot {
    pub fn age(&self) -> Duration {
        self.built_at.elapsed()
    }
}

/// TTL-gated holder of the current [`CacheSnapshot`].
#[derive(Debug)]
pub struct RecommendationCache {
    snapshot: RwLock<Option<Arc<CacheSnapshot>>>,
    ttl: Duration,
    versions: AtomicU64,
}

impl RecommendationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            snapshot: RwLock::new(None),
            ttl,
            versions: AtomicU64::new(0),
        }
    }

    pub fn from_settings(settings: &RecommendSettings) -> Self {
        Self::new(settings.cache_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The snapshot, if one exists and is younger than the TTL.
    pub fn current(&self) -> Option<Arc<CacheSnapshot>> {
        let snapshot = self.snapshot.read().clone()?;
        if snapshot.age() < self.ttl {
            Some(snapshot)
        } else {
            tracing::debug!(
                target: "mentora::cache",
                version = snapshot.version,
                age_ms = snapshot.age().as_millis() as u64,
                "snapshot expired"
            );
            None
        }
    }

    /// The most recent snapshot regardless of age.
    pub fn latest(&self) -> Option<Arc<CacheSnapshot>> {
        self.snapshot.read().clone()
    }

    /// Drop the current snapshot; requests fall back to per-request reads.
    pub fn invalidate(&self) {
        let previous = self.snapshot.write().take();
        drop(previous);
    }

    /// Install `next` and return the snapshot it replaced.
    ///
    /// The replaced snapshot is handed back so its last reference is dropped
    /// after the write guard is released.
    fn swap(&self, next: Arc<CacheSnapshot>) -> Option<Arc<CacheSnapshot>> {
        std::mem::replace(&mut *self.snapshot.write(), Some(next))
    }

    /// Rebuild the snapshot from the stores and swap it in.
    ///
    /// Any read failure aborts the refresh and leaves the previous snapshot
    /// in place.
    pub async fn refresh(
        &self,
        stores: &Stores,
        weights: &InteractionWeights,
    ) -> Result<Arc<CacheSnapshot>> {
        let started = Instant::now();
        let (events, materials, mentors) = tokio::join!(
            stores.interactions.all_events(),
            stores.catalog.candidates(ItemKind::Material),
            stores.catalog.candidates(ItemKind::Mentor),
        );
        let events = events.with_context(|| format!("refresh: {}", SignalSource::Interactions))?;
        let materials = materials.with_context(|| format!("refresh: {}", SignalSource::Catalog))?;
        let mut mentors = mentors.with_context(|| format!("refresh: {}", SignalSource::Catalog))?;

        let mentor_ids: Vec<String> = mentors.iter().map(|m| m.id.clone()).collect();
        let profiles = stores
            .profiles
            .mentor_profiles(&mentor_ids)
            .await
            .with_context(|| format!("refresh: {}", SignalSource::MentorProfiles))?;
        let profiles: HashMap<&str, _> =
            profiles.iter().map(|p| (p.mentor_id.as_str(), p)).collect();
        for mentor in &mut mentors {
            if let Some(profile) = profiles.get(mentor.id.as_str()) {
                mentor.enrich_from(profile);
            }
        }

        let weights = *weights;
        let version = self.versions.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = tokio::task::spawn_blocking(move || {
            let matrix = build_matrix(&events, &weights);
            let similarity = SimilarityTable::build(&matrix);
            let items: HashMap<String, CandidateItem> = materials
                .into_iter()
                .chain(mentors)
                .map(|item| (item.id.clone(), item))
                .collect();
            let vectors = item_vectors(items.values());
            CacheSnapshot {
                version,
                built_at: Instant::now(),
                similarity,
                items,
                item_vectors: vectors,
                events_aggregated: matrix.events_aggregated,
            }
        })
        .await
        .context("snapshot build task failed")?;

        let snapshot = Arc::new(snapshot);
        let previous = self.swap(Arc::clone(&snapshot));
        drop(previous);
        tracing::info!(
            target: "mentora::cache",
            version,
            items = snapshot.items.len(),
            similarity_entries = snapshot.similarity.entry_count(),
            events = snapshot.events_aggregated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot refreshed"
        );
        Ok(snapshot)
    }

    /// Refresh on a fixed interval until the returned handle is aborted.
    ///
    /// The first refresh runs immediately. Failures are logged and the
    /// previous snapshot keeps serving.
    pub fn spawn_refresher(
        self: Arc<Self>,
        stores: Stores,
        weights: InteractionWeights,
        every: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.refresh(&stores, &weights).await {
                    tracing::warn!(
                        target: "mentora::cache",
                        error = %format!("{e:#}"),
                        "snapshot refresh failed; keeping previous snapshot"
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{MarketplaceSnapshot, MemoryStore};
    use mentora_test_utils::sample_snapshot;

    fn sample_stores() -> (Arc<MemoryStore>, Stores) {
        let snapshot: MarketplaceSnapshot = serde_json::from_value(sample_snapshot()).unwrap();
        let store = Arc::new(MemoryStore::new(snapshot));
        let stores = Stores::shared(Arc::clone(&store));
        (store, stores)
    }

    #[tokio::test]
    async fn refresh_builds_and_swaps_snapshot() {
        let (_, stores) = sample_stores();
        let cache = RecommendationCache::new(Duration::from_secs(60));
        assert!(cache.current().is_none());

        let first = cache
            .refresh(&stores, &InteractionWeights::default())
            .await
            .unwrap();
        assert_eq!(first.version, 1);
        assert!(!first.similarity.is_empty());
        assert!(first.item_vectors.contains_key("mat-docker-intro"));
        // mentors carry skills from their profiles
        assert!(first.item_vectors["mentor-kim"].get("kubernetes") > 0.0);

        let second = cache
            .refresh(&stores, &InteractionWeights::default())
            .await
            .unwrap();
        assert_eq!(second.version, 2);
        assert_eq!(cache.current().unwrap().version, 2);
        // readers holding the old snapshot keep a consistent view
        assert_eq!(first.version, 1);
    }

    #[tokio::test]
    async fn zero_ttl_snapshot_is_never_current() {
        let (_, stores) = sample_stores();
        let cache = RecommendationCache::new(Duration::ZERO);
        cache
            .refresh(&stores, &InteractionWeights::default())
            .await
            .unwrap();
        assert!(cache.current().is_none());
        assert!(cache.latest().is_some());
    }

    #[tokio::test]
    async fn invalidate_clears_snapshot() {
        let (_, stores) = sample_stores();
        let cache = RecommendationCache::new(Duration::from_secs(60));
        cache
            .refresh(&stores, &InteractionWeights::default())
            .await
            .unwrap();
        cache.invalidate();
        assert!(cache.latest().is_none());
    }

    #[tokio::test]
    async fn refresh_replaces_snapshot_held_by_reader() {
        let (_, stores) = sample_stores();
        let cache = RecommendationCache::new(Duration::from_secs(60));
        let weights = InteractionWeights::default();
        let first = cache.refresh(&stores, &weights).await.unwrap();
        let held = cache.current().unwrap();
        assert_eq!(Arc::strong_count(&first), 3);

        let second = cache.refresh(&stores, &weights).await.unwrap();
        assert_eq!(second.version, first.version + 1);
        assert_eq!(cache.latest().unwrap().version, second.version);
        // The reader's copy outlives the swap untouched.
        assert_eq!(held.version, first.version);
        assert_eq!(Arc::strong_count(&first), 2);
    }

    #[tokio::test]
    async fn refresher_picks_up_new_events() {
        let (store, stores) = sample_stores();
        let cache = Arc::new(RecommendationCache::new(Duration::from_secs(60)));
        let handle = Arc::clone(&cache).spawn_refresher(
            stores,
            InteractionWeights::default(),
            Duration::from_millis(20),
        );

        let mut waited = 0;
        while cache.latest().is_none() && waited < 200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        let before = cache.latest().unwrap();
        assert_eq!(before.similarity.similarity("mat-sourdough", "mat-rust-own"), 0.0);

        for (item, minute) in [("mat-sourdough", 1), ("mat-rust-own", 2)] {
            store
                .append_event(crate::signals::InteractionEvent {
                    subject_id: "mentee-cho".into(),
                    item_id: item.into(),
                    kind: crate::signals::InteractionKind::View,
                    weight: 0.0,
                    occurred_at: chrono::DateTime::parse_from_rfc3339(&format!(
                        "2026-03-10T00:0{minute}:00Z"
                    ))
                    .unwrap()
                    .into(),
                })
                .await;
        }

        let mut waited = 0;
        loop {
            let snap = cache.latest().unwrap();
            if snap.similarity.similarity("mat-sourdough", "mat-rust-own") > 0.0 {
                break;
            }
            assert!(waited < 200, "refresher never saw the new events");
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        handle.abort();
    }
}
