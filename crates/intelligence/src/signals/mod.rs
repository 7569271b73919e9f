//! Read-only adapters over the marketplace's interaction, profile and catalog stores.
//!
//! The engine never writes through these traits. Implementations are expected
//! to be thin: no scoring or filtering logic lives here.

mod memory;

pub use memory::{MarketplaceSnapshot, MemoryStore};

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Kind of recorded mentee action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    View,
    Like,
    /// Explicit rating; the event weight carries the 1-5 rating.
    Review,
}

/// A single mentee action against a material or mentor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// Mentee who performed the action.
    pub subject_id: String,
    /// Material or mentor acted upon.
    pub item_id: String,
    pub kind: InteractionKind,
    /// Rating for reviews; informational for views and likes.
    #[serde(default)]
    pub weight: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Which catalog a candidate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Material,
    Mentor,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Material => f.write_str("material"),
            Self::Mentor => f.write_str("mentor"),
        }
    }
}

impl FromStr for ItemKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "material" | "materials" => Ok(Self::Material),
            "mentor" | "mentors" => Ok(Self::Mentor),
            other => Err(format!("unknown item kind `{other}`")),
        }
    }
}

/// Industry a mentee, mentor or material is associated with.
///
/// Category membership is an explicit set of these values rather than a
/// bit mask, so adding industries never truncates existing profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Industry {
    Software,
    Fintech,
    Healthcare,
    Education,
    Ecommerce,
    Gaming,
    Telecommunications,
    Automotive,
    Media,
    Government,
    Energy,
    Consulting,
}

impl Industry {
    pub const ALL: [Industry; 12] = [
        Self::Software,
        Self::Fintech,
        Self::Healthcare,
        Self::Education,
        Self::Ecommerce,
        Self::Gaming,
        Self::Telecommunications,
        Self::Automotive,
        Self::Media,
        Self::Government,
        Self::Energy,
        Self::Consulting,
    ];

    /// Stable lowercase token used in content vectors and on the wire.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::Fintech => "fintech",
            Self::Healthcare => "healthcare",
            Self::Education => "education",
            Self::Ecommerce => "ecommerce",
            Self::Gaming => "gaming",
            Self::Telecommunications => "telecommunications",
            Self::Automotive => "automotive",
            Self::Media => "media",
            Self::Government => "government",
            Self::Energy => "energy",
            Self::Consulting => "consulting",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Industry {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|i| i.slug() == needle)
            .ok_or_else(|| format!("unknown industry `{}`", s.trim()))
    }
}

/// A material or mentor that may be recommended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    pub kind: ItemKind,
    /// Mentor who authored the material, or the mentor's own id.
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub programming_languages: BTreeSet<String>,
    #[serde(default)]
    pub industries: BTreeSet<Industry>,
    /// Material format (article, video, ...). Unset for mentors.
    #[serde(default)]
    pub item_type: Option<String>,
    /// Mentor seniority. Unset for materials.
    #[serde(default)]
    pub experience_years: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl CandidateItem {
    /// Fill mentor-only fields from the mentor's profile.
    pub fn enrich_from(&mut self, profile: &MentorProfile) {
        self.skills.extend(profile.skills.iter().cloned());
        self.programming_languages
            .extend(profile.programming_languages.iter().cloned());
        self.industries.extend(profile.industries.iter().copied());
        if self.experience_years.is_none() {
            self.experience_years = profile.experience_years;
        }
    }
}

/// Declared interests of a mentee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenteeProfile {
    pub mentee_id: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub programming_languages: BTreeSet<String>,
    #[serde(default)]
    pub industries: BTreeSet<Industry>,
    /// Set when the mentee also offers mentoring under this mentor id.
    #[serde(default)]
    pub mentor_profile_id: Option<String>,
}

impl MenteeProfile {
    /// Empty profile for a mentee the profile store does not know.
    pub fn anonymous(mentee_id: &str) -> Self {
        Self {
            mentee_id: mentee_id.to_string(),
            ..Self::default()
        }
    }
}

/// Expertise a mentor offers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MentorProfile {
    pub mentor_id: String,
    #[serde(default)]
    pub skills: BTreeSet<String>,
    #[serde(default)]
    pub programming_languages: BTreeSet<String>,
    #[serde(default)]
    pub industries: BTreeSet<Industry>,
    #[serde(default)]
    pub experience_years: Option<u32>,
}

/// Sessions a mentee has booked with a mentor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub mentee_id: String,
    pub mentor_id: String,
    #[serde(default = "one")]
    pub count: u32,
}

fn one() -> u32 {
    1
}

/// Interaction events and booking counts.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Every event recorded for one mentee.
    async fn events_for_subject(&self, subject_id: &str) -> Result<Vec<InteractionEvent>>;
    /// Every event, from any mentee, touching one of `item_ids`.
    async fn events_for_items(&self, item_ids: &[String]) -> Result<Vec<InteractionEvent>>;
    /// Every event recorded for any of `subject_ids`.
    async fn events_for_subjects(&self, subject_ids: &[String]) -> Result<Vec<InteractionEvent>>;
    /// Full event log, used by the background similarity refresh.
    async fn all_events(&self) -> Result<Vec<InteractionEvent>>;
    /// Booking counts for one mentee, keyed by mentor id.
    async fn booking_counts(&self, mentee_id: &str) -> Result<HashMap<String, u32>>;
}

/// Mentee and mentor profile data.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn mentee_profile(&self, mentee_id: &str) -> Result<Option<MenteeProfile>>;
    async fn mentor_profiles(&self, mentor_ids: &[String]) -> Result<Vec<MentorProfile>>;
}

/// Recommendable materials and mentors.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn candidates(&self, kind: ItemKind) -> Result<Vec<CandidateItem>>;
    async fn items_by_ids(&self, ids: &[String]) -> Result<Vec<CandidateItem>>;
}

/// The read collaborators, shared by the engine and the cache refresher.
#[derive(Clone)]
pub struct Stores {
    pub interactions: Arc<dyn InteractionStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub catalog: Arc<dyn CatalogStore>,
}

impl Stores {
    pub fn new(
        interactions: Arc<dyn InteractionStore>,
        profiles: Arc<dyn ProfileStore>,
        catalog: Arc<dyn CatalogStore>,
    ) -> Self {
        Self {
            interactions,
            profiles,
            catalog,
        }
    }

    /// Serve all three reads from one backing store.
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: InteractionStore + ProfileStore + CatalogStore + 'static,
    {
        Self {
            interactions: store.clone(),
            profiles: store.clone(),
            catalog: store,
        }
    }
}

impl fmt::Debug for Stores {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_round_trip_through_slug() {
        for industry in Industry::ALL {
            assert_eq!(industry.slug().parse::<Industry>(), Ok(industry));
        }
        assert_eq!(" FinTech ".parse::<Industry>(), Ok(Industry::Fintech));
        assert!("agriculture".parse::<Industry>().is_err());
    }

    #[test]
    fn test_industry_serde_uses_slug() {
        let json = serde_json::to_string(&Industry::Telecommunications).unwrap();
        assert_eq!(json, "\"telecommunications\"");
    }

    #[test]
    fn test_item_kind_parse() {
        assert_eq!("Mentor".parse::<ItemKind>(), Ok(ItemKind::Mentor));
        assert_eq!("materials".parse::<ItemKind>(), Ok(ItemKind::Material));
        assert!("course".parse::<ItemKind>().is_err());
    }

    #[test]
    fn test_candidate_defaults_from_minimal_json() {
        let item: CandidateItem = serde_json::from_str(
            r#"{"id":"m1","kind":"material","owner_id":"t1","title":"T","created_at":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(item.tags.is_empty());
        assert_eq!(item.description, "");
        assert_eq!(item.experience_years, None);
    }

    #[test]
    fn test_enrich_from_mentor_profile() {
        let mut item: CandidateItem = serde_json::from_str(
            r#"{"id":"t1","kind":"mentor","owner_id":"t1","title":"T","tags":["devops"],"created_at":"2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let profile = MentorProfile {
            mentor_id: "t1".into(),
            skills: ["docker".to_string()].into(),
            programming_languages: ["go".to_string()].into(),
            industries: [Industry::Software].into(),
            experience_years: Some(8),
        };
        item.enrich_from(&profile);
        assert!(item.skills.contains("docker"));
        assert!(item.programming_languages.contains("go"));
        assert!(item.industries.contains(&Industry::Software));
        assert_eq!(item.experience_years, Some(8));
    }

    #[test]
    fn test_booking_count_defaults_to_one() {
        let booking: Booking =
            serde_json::from_str(r#"{"mentee_id":"a","mentor_id":"b"}"#).unwrap();
        assert_eq!(booking.count, 1);
    }
}
