//! In-memory signal stores backed by a marketplace snapshot.

use super::{
    Booking, CandidateItem, CatalogStore, InteractionEvent, InteractionStore, ItemKind,
    MenteeProfile, MentorProfile, ProfileStore,
};
use crate::error::Result;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;

/// Point-in-time export of the collaborator stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceSnapshot {
    #[serde(default)]
    pub events: Vec<InteractionEvent>,
    #[serde(default)]
    pub mentees: Vec<MenteeProfile>,
    #[serde(default)]
    pub mentors: Vec<MentorProfile>,
    #[serde(default)]
    pub items: Vec<CandidateItem>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}

impl MarketplaceSnapshot {
    /// Load a snapshot from a JSON file.
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }
}

/// Serves all three read traits from one snapshot.
///
/// Appends are supported so callers can simulate new activity between
/// cache refreshes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<MarketplaceSnapshot>,
}

impl MemoryStore {
    pub fn new(snapshot: MarketplaceSnapshot) -> Self {
        Self {
            inner: RwLock::new(snapshot),
        }
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let snapshot = MarketplaceSnapshot::from_path(path)?;
        tracing::debug!(
            target: "mentora::signals",
            path = %path.display(),
            events = snapshot.events.len(),
            items = snapshot.items.len(),
            "loaded marketplace snapshot"
        );
        Ok(Self::new(snapshot))
    }

    pub async fn append_event(&self, event: InteractionEvent) {
        self.inner.write().await.events.push(event);
    }
}

#[async_trait]
impl InteractionStore for MemoryStore {
    async fn events_for_subject(&self, subject_id: &str) -> Result<Vec<InteractionEvent>> {
        let guard = self.inner.read().await;
        Ok(guard
            .events
            .iter()
            .filter(|e| e.subject_id == subject_id)
            .cloned()
            .collect())
    }

    async fn events_for_items(&self, item_ids: &[String]) -> Result<Vec<InteractionEvent>> {
        let wanted: HashSet<&str> = item_ids.iter().map(String::as_str).collect();
        let guard = self.inner.read().await;
        Ok(guard
            .events
            .iter()
            .filter(|e| wanted.contains(e.item_id.as_str()))
            .cloned()
            .collect())
    }

    async fn events_for_subjects(&self, subject_ids: &[String]) -> Result<Vec<InteractionEvent>> {
        let wanted: HashSet<&str> = subject_ids.iter().map(String::as_str).collect();
        let guard = self.inner.read().await;
        Ok(guard
            .events
            .iter()
            .filter(|e| wanted.contains(e.subject_id.as_str()))
            .cloned()
            .collect())
    }

    async fn all_events(&self) -> Result<Vec<InteractionEvent>> {
        Ok(self.inner.read().await.events.clone())
    }

    async fn booking_counts(&self, mentee_id: &str) -> Result<HashMap<String, u32>> {
        let guard = self.inner.read().await;
        let mut counts: HashMap<String, u32> = HashMap::new();
        for booking in guard.bookings.iter().filter(|b| b.mentee_id == mentee_id) {
            let count = counts.entry(booking.mentor_id.clone()).or_insert(0);
            *count = count.saturating_add(booking.count);
        }
        Ok(counts)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn mentee_profile(&self, mentee_id: &str) -> Result<Option<MenteeProfile>> {
        let guard = self.inner.read().await;
        Ok(guard
            .mentees
            .iter()
            .find(|m| m.mentee_id == mentee_id)
            .cloned())
    }

    async fn mentor_profiles(&self, mentor_ids: &[String]) -> Result<Vec<MentorProfile>> {
        let wanted: HashSet<&str> = mentor_ids.iter().map(String::as_str).collect();
        let guard = self.inner.read().await;
        Ok(guard
            .mentors
            .iter()
            .filter(|m| wanted.contains(m.mentor_id.as_str()))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn candidates(&self, kind: ItemKind) -> Result<Vec<CandidateItem>> {
        let guard = self.inner.read().await;
        Ok(guard
            .items
            .iter()
            .filter(|i| i.kind == kind)
            .cloned()
            .collect())
    }

    async fn items_by_ids(&self, ids: &[String]) -> Result<Vec<CandidateItem>> {
        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let guard = self.inner.read().await;
        Ok(guard
            .items
            .iter()
            .filter(|i| wanted.contains(i.id.as_str()))
            .cloned()
            .collect())
    }
}
