//! Hybrid recommendations for a mentorship marketplace.
//!
//! This crate provides:
//! - Read traits over the interaction, profile and catalog stores, plus an in-memory store
//! - Interaction aggregation and item-based collaborative filtering
//! - Content profiles and content-based scoring
//! - Score blending with a cold-start fallback, filtering, ranking and pagination
//! - A snapshot cache refreshed in the background
//! - [`RecommendationEngine`], which ties the pipeline together per request

pub mod cache;
pub mod engine;
pub mod error;
pub mod profile;
pub mod recommend;
pub mod signals;
pub mod types;
pub mod usage;

pub use cache::{CacheSnapshot, RecommendationCache};
pub use engine::{RecommendationEngine, RecommendationRequest};
pub use error::{RecommendError, Result, SignalSource};
pub use profile::ContentVector;
pub use recommend::{
    MatchedField, Pagination, Recommendation, RecommendationFilters, RecommendationPage,
    RecommendationSignal, ScoreBlender, ScoredResult, SearchMode, SimilarityTable,
};
pub use signals::{
    Booking, CandidateItem, CatalogStore, Industry, InteractionEvent, InteractionKind,
    InteractionStore, ItemKind, MarketplaceSnapshot, MemoryStore, MenteeProfile, MentorProfile,
    ProfileStore, Stores,
};
pub use types::{Score, MAX_SCORE};
pub use usage::{InteractionMatrix, TimeRange};
