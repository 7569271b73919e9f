//! Request orchestration for `get_recommendations`.
//!
//! Each request validates its filters, issues the independent collaborator
//! reads concurrently (each under the configured timeout), then scores,
//! ranks and explains on local data. A read that fails or times out is
//! treated as an empty signal and reported in `degraded_sources`; only
//! invalid filters fail the request.

use crate::cache::{CacheSnapshot, RecommendationCache};
use crate::error::{RecommendError, Result, SignalSource};
use crate::profile::{item_vector, item_vectors, mentee_vector, ContentVector};
use crate::recommend::blend::ScoreBlender;
use crate::recommend::collaborative::{normalize_min_max, raw_score, top_anchors};
use crate::recommend::content::content_score;
use crate::recommend::rank::{sort_results, Eligibility};
use crate::recommend::{
    generate_explanation, summarize_recommendations, Pagination, Recommendation,
    RecommendationFilters, RecommendationPage, RecommendationSignal, ScoredResult,
    SimilarityTable,
};
use crate::signals::{
    CandidateItem, InteractionEvent, ItemKind, MenteeProfile, MentorProfile, Stores,
};
use crate::types::Score;
use crate::usage::{build_matrix, top_neighbors_by_recency, InteractionMatrix};
use chrono::{DateTime, Utc};
use mentora_state::RecommendSettings;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Items created within this many days carry a freshness signal.
const FRESH_WITHIN_DAYS: i64 = 14;
/// History items named in a "similar mentees" explanation.
const MAX_ANCHORS: usize = 2;
/// Shared tokens named in a "shared interests" explanation.
const MAX_MATCHED_TOKENS: usize = 3;

/// Inbound `get_recommendations` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub mentee_id: String,
    pub kind: ItemKind,
    #[serde(default)]
    pub filters: RecommendationFilters,
    #[serde(default)]
    pub page_number: Option<i64>,
    #[serde(default)]
    pub page_size: Option<i64>,
    /// Reference time for freshness; defaults to now.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

impl RecommendationRequest {
    pub fn new(mentee_id: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            mentee_id: mentee_id.into(),
            kind,
            filters: RecommendationFilters::default(),
            page_number: None,
            page_size: None,
            as_of: None,
        }
    }

    #[must_use]
    pub fn with_filters(mut self, filters: RecommendationFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub fn with_page(mut self, page_number: i64, page_size: i64) -> Self {
        self.page_number = Some(page_number);
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn as_of(mut self, at: DateTime<Utc>) -> Self {
        self.as_of = Some(at);
        self
    }
}

/// Signal sources that failed during one request.
#[derive(Debug, Default)]
struct Degraded(BTreeSet<SignalSource>);

impl Degraded {
    /// Unwrap a read, substituting an empty value on failure.
    fn absorb<T: Default>(&mut self, signal: SignalSource, result: Result<T>) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(
                    target: "mentora::recommend",
                    signal = %signal,
                    error = %e,
                    "signal source unavailable; treating as empty"
                );
                self.0.insert(signal);
                T::default()
            }
        }
    }

    fn into_vec(self) -> Vec<SignalSource> {
        self.0.into_iter().collect()
    }
}

/// Run one collaborator read under `limit`.
async fn timed_read<T>(
    signal: SignalSource,
    limit: Duration,
    read: impl Future<Output = Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, read).await {
        Ok(result) => result,
        Err(_) => Err(RecommendError::unavailable(
            signal,
            format!("timed out after {}ms", limit.as_millis()),
        )),
    }
}

/// Hybrid recommendation engine.
///
/// Holds no per-request state; one engine serves any number of concurrent
/// requests. The optional cache supplies a prebuilt similarity table and
/// catalog vectors.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    stores: Stores,
    settings: RecommendSettings,
    blender: ScoreBlender,
    cache: Option<Arc<RecommendationCache>>,
}

impl RecommendationEngine {
    pub fn new(stores: Stores, settings: RecommendSettings) -> Self {
        let blender = ScoreBlender::from_settings(&settings);
        Self {
            stores,
            settings,
            blender,
            cache: None,
        }
    }

    #[must_use]
    pub fn with_cache(mut self, cache: Arc<RecommendationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Attach a cache sized by `cache_ttl_ms` and refreshed every
    /// `refresh_interval_ms` in the background.
    ///
    /// Must be called within a Tokio runtime. Until the first refresh lands
    /// requests take the uncached path. Abort the returned handle to stop
    /// refreshing.
    #[must_use]
    pub fn with_refreshing_cache(self) -> (Self, JoinHandle<()>) {
        let cache = Arc::new(RecommendationCache::from_settings(&self.settings));
        let refresher = Arc::clone(&cache).spawn_refresher(
            self.stores.clone(),
            self.settings.interaction,
            self.settings.refresh_interval(),
        );
        tracing::debug!(
            target: "mentora::cache",
            ttl_ms = self.settings.cache_ttl_ms,
            refresh_interval_ms = self.settings.refresh_interval_ms,
            "started snapshot refresher"
        );
        (self.with_cache(cache), refresher)
    }

    pub fn settings(&self) -> &RecommendSettings {
        &self.settings
    }

    pub fn cache(&self) -> Option<&Arc<RecommendationCache>> {
        self.cache.as_ref()
    }

    /// Rank materials or mentors for one mentee and return the requested page.
    ///
    /// Fails only with [`RecommendError::InvalidFilter`].
    pub async fn get_recommendations(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RecommendationPage> {
        let started = Instant::now();
        let filters = request.filters.validate(self.settings.max_search_len)?;
        if request.kind == ItemKind::Mentor && !filters.types.is_empty() {
            tracing::debug!(
                target: "mentora::recommend",
                "type filter does not apply to mentor recommendations; ignoring"
            );
        }
        let pagination = Pagination::clamp(
            request.page_number,
            request.page_size,
            self.settings.default_page_size,
            self.settings.max_page_size,
        );
        let limit = self.settings.read_timeout();
        let mentee_id = request.mentee_id.as_str();
        let mut degraded = Degraded::default();

        let (events, profile, candidates, bookings) = tokio::join!(
            timed_read(
                SignalSource::Interactions,
                limit,
                self.stores.interactions.events_for_subject(mentee_id),
            ),
            timed_read(
                SignalSource::Profile,
                limit,
                self.stores.profiles.mentee_profile(mentee_id),
            ),
            timed_read(
                SignalSource::Catalog,
                limit,
                self.stores.catalog.candidates(request.kind),
            ),
            timed_read(
                SignalSource::Bookings,
                limit,
                self.stores.interactions.booking_counts(mentee_id),
            ),
        );
        let events: Vec<InteractionEvent> = degraded.absorb(SignalSource::Interactions, events);
        let profile = degraded
            .absorb(SignalSource::Profile, profile)
            .unwrap_or_else(|| MenteeProfile::anonymous(mentee_id));
        let mut candidates = degraded.absorb(SignalSource::Catalog, candidates);
        let bookings: HashMap<String, u32> = degraded.absorb(SignalSource::Bookings, bookings);

        let mentee_matrix = build_matrix(&events, &self.settings.interaction);
        let history: BTreeMap<String, f64> = mentee_matrix
            .weights_for(mentee_id)
            .cloned()
            .unwrap_or_default();
        let history_ids: Vec<String> = history.keys().cloned().collect();
        let snapshot = self.cache.as_ref().and_then(|cache| cache.current());

        let missing_items: Vec<String> = match &snapshot {
            Some(snap) => history_ids
                .iter()
                .filter(|id| !snap.items.contains_key(*id))
                .cloned()
                .collect(),
            None => history_ids.clone(),
        };
        let (neighbor_events, interacted) = tokio::join!(
            self.neighbor_events(mentee_id, &history_ids, snapshot.is_some(), limit),
            async {
                if missing_items.is_empty() {
                    Ok(Vec::new())
                } else {
                    timed_read(
                        SignalSource::InteractedItems,
                        limit,
                        self.stores.catalog.items_by_ids(&missing_items),
                    )
                    .await
                }
            },
        );
        let neighbor_events = degraded.absorb(SignalSource::Neighbors, neighbor_events);
        let mut interacted: Vec<CandidateItem> =
            degraded.absorb(SignalSource::InteractedItems, interacted);

        let mentor_ids: Vec<String> = candidates
            .iter()
            .chain(interacted.iter())
            .filter(|item| item.kind == ItemKind::Mentor)
            .map(|item| item.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if !mentor_ids.is_empty() {
            let profiles: Vec<MentorProfile> = degraded.absorb(
                SignalSource::MentorProfiles,
                timed_read(
                    SignalSource::MentorProfiles,
                    limit,
                    self.stores.profiles.mentor_profiles(&mentor_ids),
                )
                .await,
            );
            let by_id: HashMap<&str, &MentorProfile> =
                profiles.iter().map(|p| (p.mentor_id.as_str(), p)).collect();
            for item in candidates.iter_mut().chain(interacted.iter_mut()) {
                if item.kind == ItemKind::Mentor {
                    if let Some(profile) = by_id.get(item.id.as_str()) {
                        item.enrich_from(profile);
                    }
                }
            }
        }

        let local_table;
        let table: &SimilarityTable = match &snapshot {
            Some(snap) => &snap.similarity,
            None => {
                local_table = neighbor_similarity(&mentee_matrix, &neighbor_events, &self.settings);
                &local_table
            }
        };

        let (history_vectors, history_titles) =
            history_context(&history_ids, snapshot.as_deref(), &interacted);
        let mentee_vec = mentee_vector(
            &profile,
            Some(&history),
            &history_vectors,
            &self.settings.profile,
        );

        let eligibility = Eligibility {
            mentee_id,
            mentor_profile_id: profile.mentor_profile_id.as_deref(),
            prior_engagements: prior_engagements(&mentee_matrix, mentee_id, &bookings),
            repeat_interaction_limit: self.settings.repeat_interaction_limit,
        };
        let mut eligible: Vec<CandidateItem> = candidates
            .into_iter()
            .filter(|item| eligibility.allows(item) && filters.matches(item))
            .collect();
        eligible.sort_by(|a, b| a.id.cmp(&b.id));
        eligible.dedup_by(|a, b| a.id == b.id);

        let candidate_vectors = item_vectors(eligible.iter());
        let raw: Vec<f64> = eligible
            .iter()
            .map(|item| {
                raw_score(&item.id, &history, table).unwrap_or_else(|e| {
                    tracing::warn!(target: "mentora::recommend", error = %e, "scoring 0");
                    0.0
                })
            })
            .collect();
        let collaborative = normalize_min_max(&raw);
        let components: Vec<(String, Score, Score)> = eligible
            .iter()
            .zip(collaborative)
            .map(|(item, collab)| {
                let content = candidate_vectors
                    .get(&item.id)
                    .map(|vector| content_score(&item.id, &mentee_vec, vector))
                    .unwrap_or(Ok(Score::zero()))
                    .unwrap_or_else(|e| {
                        tracing::warn!(target: "mentora::recommend", error = %e, "scoring 0");
                        Score::zero()
                    });
                (item.id.clone(), collab, content)
            })
            .collect();

        let (mut results, cold_start) = self.blender.blend_all(components);
        sort_results(&mut results);
        let total_count = results.len();

        let by_id: HashMap<&str, &CandidateItem> =
            eligible.iter().map(|item| (item.id.as_str(), item)).collect();
        let as_of = request.as_of.unwrap_or_else(Utc::now);
        let explain = Explain {
            history: &history,
            table,
            titles: &history_titles,
            mentee: &mentee_vec,
            vectors: &candidate_vectors,
            as_of,
            cold_start,
        };
        let items: Vec<Recommendation> = pagination
            .slice(&results)
            .iter()
            .filter_map(|scored| {
                let item = by_id.get(scored.item_id.as_str())?;
                Some(explain.recommendation(scored.clone(), item))
            })
            .collect();

        let degraded_sources = degraded.into_vec();
        let summary = summarize_recommendations(total_count, cold_start, &degraded_sources);
        tracing::info!(
            target: "mentora::recommend",
            mentee = %mentee_id,
            kind = %request.kind,
            total = total_count,
            page = pagination.page_number,
            cold_start,
            degraded = degraded_sources.len(),
            cached = snapshot.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ranked recommendations"
        );

        Ok(RecommendationPage {
            items,
            total_count,
            page_number: pagination.page_number,
            page_size: pagination.page_size,
            total_pages: pagination.total_pages(total_count),
            cold_start,
            degraded_sources,
            summary,
        })
    }

    /// Events of the top-K most recent neighbors sharing an item with the mentee.
    ///
    /// Skipped when a cached similarity table is available or the mentee has
    /// no history.
    async fn neighbor_events(
        &self,
        mentee_id: &str,
        history_ids: &[String],
        cached: bool,
        limit: Duration,
    ) -> Result<Vec<InteractionEvent>> {
        if cached || history_ids.is_empty() {
            return Ok(Vec::new());
        }
        let shared = timed_read(
            SignalSource::Neighbors,
            limit,
            self.stores.interactions.events_for_items(history_ids),
        )
        .await?;
        let neighbors = top_neighbors_by_recency(mentee_id, &shared, self.settings.max_neighbors);
        if neighbors.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(
            target: "mentora::recommend",
            mentee = %mentee_id,
            neighbors = neighbors.len(),
            "selected neighbor mentees"
        );
        timed_read(
            SignalSource::Neighbors,
            limit,
            self.stores.interactions.events_for_subjects(&neighbors),
        )
        .await
    }
}

/// Item-item table over the mentee and their neighbors.
fn neighbor_similarity(
    mentee_matrix: &InteractionMatrix,
    neighbor_events: &[InteractionEvent],
    settings: &RecommendSettings,
) -> SimilarityTable {
    if neighbor_events.is_empty() {
        return SimilarityTable::default();
    }
    let mut matrix = build_matrix(neighbor_events, &settings.interaction);
    // The mentee's own rows come from the direct read.
    matrix.merge(mentee_matrix.clone());
    SimilarityTable::build(&matrix)
}

/// Content vectors and display titles for the mentee's history items.
fn history_context(
    history_ids: &[String],
    snapshot: Option<&CacheSnapshot>,
    fetched: &[CandidateItem],
) -> (HashMap<String, ContentVector>, HashMap<String, String>) {
    let mut vectors = HashMap::new();
    let mut titles = HashMap::new();
    if let Some(snap) = snapshot {
        for id in history_ids {
            if let (Some(item), Some(vector)) = (snap.items.get(id), snap.item_vectors.get(id)) {
                vectors.insert(id.clone(), vector.clone());
                titles.insert(id.clone(), item.title.clone());
            }
        }
    }
    for item in fetched {
        vectors.insert(item.id.clone(), item_vector(item));
        titles.insert(item.id.clone(), item.title.clone());
    }
    (vectors, titles)
}

/// Reviews written plus sessions booked, per item.
fn prior_engagements(
    matrix: &InteractionMatrix,
    mentee_id: &str,
    bookings: &HashMap<String, u32>,
) -> HashMap<String, u32> {
    let mut prior: HashMap<String, u32> = bookings.clone();
    if let Some(reviews) = matrix.review_counts.get(mentee_id) {
        for (item, &count) in reviews {
            let entry = prior.entry(item.clone()).or_insert(0);
            *entry = entry.saturating_add(count);
        }
    }
    prior
}

/// Per-request context for building explanations.
struct Explain<'a> {
    history: &'a BTreeMap<String, f64>,
    table: &'a SimilarityTable,
    titles: &'a HashMap<String, String>,
    mentee: &'a ContentVector,
    vectors: &'a HashMap<String, ContentVector>,
    as_of: DateTime<Utc>,
    cold_start: bool,
}

impl Explain<'_> {
    fn signals(&self, scored: &ScoredResult, item: &CandidateItem) -> Vec<RecommendationSignal> {
        let mut signals = Vec::new();
        if self.cold_start {
            signals.push(RecommendationSignal::ColdStart);
        } else if !scored.collaborative_score.is_zero() {
            let anchors = top_anchors(&item.id, self.history, self.table, MAX_ANCHORS)
                .into_iter()
                .map(|id| self.titles.get(&id).cloned().unwrap_or(id))
                .collect();
            signals.push(RecommendationSignal::SimilarMentees { anchors });
        }
        if let Some(vector) = self.vectors.get(&item.id) {
            let matched = self.mentee.top_overlap(vector, MAX_MATCHED_TOKENS);
            if !matched.is_empty() {
                signals.push(RecommendationSignal::SharedInterests { matched });
            }
        }
        let days = (self.as_of - item.created_at).num_days();
        if (0..=FRESH_WITHIN_DAYS).contains(&days) {
            signals.push(RecommendationSignal::Fresh { days });
        }
        signals
    }

    fn recommendation(&self, scores: ScoredResult, item: &CandidateItem) -> Recommendation {
        let signals = self.signals(&scores, item);
        Recommendation {
            explanation: generate_explanation(&signals),
            signals,
            scores,
            kind: item.kind,
            title: item.title.clone(),
            description: item.description.clone(),
            owner_id: item.owner_id.clone(),
            tags: item.tags.clone(),
            item_type: item.item_type.clone(),
            experience_years: item.experience_years,
            created_at: item.created_at,
        }
    }
}
