//! Candidate eligibility, caller filters, ordering and pagination.

use super::similarity::{match_item, MatchedField, DEFAULT_THRESHOLD};
use super::ScoredResult;
use crate::error::{RecommendError, Result};
use crate::profile::normalize_token;
use crate::signals::{CandidateItem, Industry, ItemKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// How the search term is matched against title and description.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Case-insensitive substring match.
    #[default]
    Substring,
    /// Substring match, or trigram similarity above the default threshold.
    Fuzzy,
}

/// Filters as supplied by the caller, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationFilters {
    pub search: Option<String>,
    pub search_mode: SearchMode,
    /// Material formats to keep (article, video, ...).
    pub types: Vec<String>,
    /// Tags every result must carry.
    pub tags: Vec<String>,
    /// Industry slug.
    pub industry: Option<String>,
    /// Minimum mentor experience in years.
    pub min_experience_years: Option<i32>,
}

/// Filters after validation and normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedFilters {
    pub search: Option<String>,
    pub search_mode: SearchMode,
    pub types: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub industry: Option<Industry>,
    pub min_experience_years: Option<u32>,
}

impl RecommendationFilters {
    /// Validate and normalize. Malformed values are reported, never clamped.
    pub fn validate(&self, max_search_len: usize) -> Result<ValidatedFilters> {
        let search = match self.search.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(term) if term.chars().count() > max_search_len => {
                return Err(RecommendError::invalid_filter(
                    "search",
                    format!("longer than {max_search_len} characters"),
                ));
            }
            Some(term) => Some(term.to_lowercase()),
        };

        let types = normalize_list("types", &self.types)?;
        let tags = normalize_list("tags", &self.tags)?;

        let industry = match self.industry.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<Industry>()
                    .map_err(|e| RecommendError::invalid_filter("industry", e))?,
            ),
        };

        let min_experience_years = match self.min_experience_years {
            None => None,
            Some(years) if years < 0 => {
                return Err(RecommendError::invalid_filter(
                    "min_experience_years",
                    format!("must not be negative (got {years})"),
                ));
            }
            Some(years) => Some(years as u32),
        };

        Ok(ValidatedFilters {
            search,
            search_mode: self.search_mode,
            types,
            tags,
            industry,
            min_experience_years,
        })
    }
}

fn normalize_list(field: &'static str, values: &[String]) -> Result<BTreeSet<String>> {
    values
        .iter()
        .map(|raw| {
            normalize_token(raw)
                .ok_or_else(|| RecommendError::invalid_filter(field, "entries must not be blank"))
        })
        .collect()
}

impl ValidatedFilters {
    /// Whether `item` passes every caller-supplied filter.
    ///
    /// Type filters apply to materials and the experience floor to mentors;
    /// each is ignored for the other kind.
    pub fn matches(&self, item: &CandidateItem) -> bool {
        if let Some(term) = &self.search {
            let Some(field) = self.search_field(term, item) else {
                return false;
            };
            tracing::trace!(target: "mentora::recommend", item = %item.id, ?field, "search matched");
        }

        if item.kind == ItemKind::Material && !self.types.is_empty() {
            let item_type = item.item_type.as_deref().and_then(normalize_token);
            if !item_type.is_some_and(|t| self.types.contains(&t)) {
                return false;
            }
        }

        if !self.tags.is_empty() {
            let item_tags: BTreeSet<String> =
                item.tags.iter().filter_map(|t| normalize_token(t)).collect();
            if !self.tags.is_subset(&item_tags) {
                return false;
            }
        }

        if let Some(industry) = self.industry {
            if !item.industries.contains(&industry) {
                return false;
            }
        }

        if item.kind == ItemKind::Mentor {
            if let Some(min) = self.min_experience_years {
                if item.experience_years.unwrap_or(0) < min {
                    return false;
                }
            }
        }

        true
    }

    /// Field that satisfied the search term, or `None` when the item misses it.
    ///
    /// Substring hits win; fuzzy mode falls back to trigram similarity.
    fn search_field(&self, term: &str, item: &CandidateItem) -> Option<MatchedField> {
        let in_title = item.title.to_lowercase().contains(term);
        let in_description = item.description.to_lowercase().contains(term);
        match (in_title, in_description) {
            (true, true) => return Some(MatchedField::Both),
            (true, false) => return Some(MatchedField::Title),
            (false, true) => return Some(MatchedField::Description),
            (false, false) => {}
        }
        match self.search_mode {
            SearchMode::Substring => None,
            SearchMode::Fuzzy => {
                let (score, field) = match_item(term, &item.title, Some(&item.description));
                (score >= DEFAULT_THRESHOLD).then_some(field)
            }
        }
    }
}

/// Rules that remove a candidate regardless of caller filters.
#[derive(Debug, Clone)]
pub struct Eligibility<'a> {
    pub mentee_id: &'a str,
    /// The mentee's own mentor id when they also mentor.
    pub mentor_profile_id: Option<&'a str>,
    /// Prior reviews plus bookings per item.
    pub prior_engagements: HashMap<String, u32>,
    pub repeat_interaction_limit: u32,
}

impl Eligibility<'_> {
    fn is_self(&self, id: &str) -> bool {
        id == self.mentee_id || self.mentor_profile_id == Some(id)
    }

    pub fn allows(&self, item: &CandidateItem) -> bool {
        if self.is_self(&item.owner_id) {
            return false;
        }
        if item.kind == ItemKind::Mentor && self.is_self(&item.id) {
            return false;
        }
        let prior = self.prior_engagements.get(&item.id).copied().unwrap_or(0);
        prior <= self.repeat_interaction_limit
    }
}

/// Ranking order: final score desc, then content score desc, then id asc.
pub fn compare_results(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| b.content_based_score.total_cmp(&a.content_based_score))
        .then_with(|| a.item_id.cmp(&b.item_id))
}

/// Sort in ranking order. Stable, and total thanks to the id tie-break.
pub fn sort_results(results: &mut [ScoredResult]) {
    results.sort_by(compare_results);
}

/// Clamped page coordinates (1-based page number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page_number: usize,
    pub page_size: usize,
}

impl Pagination {
    /// Clamp caller values: page >= 1, 1 <= size <= `max_page_size`.
    pub fn clamp(
        page_number: Option<i64>,
        page_size: Option<i64>,
        default_page_size: usize,
        max_page_size: usize,
    ) -> Self {
        let max_page_size = max_page_size.max(1);
        let page_number = page_number.unwrap_or(1).max(1) as usize;
        let page_size = match page_size {
            None => default_page_size,
            Some(size) => size.max(1) as usize,
        }
        .clamp(1, max_page_size);
        Self {
            page_number,
            page_size,
        }
    }

    pub fn offset(&self) -> usize {
        (self.page_number - 1).saturating_mul(self.page_size)
    }

    pub fn total_pages(&self, total_count: usize) -> usize {
        total_count.div_ceil(self.page_size)
    }

    /// The slice of `items` on this page; empty past the last page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}
