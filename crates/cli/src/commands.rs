//! Handlers for `mentora` subcommands.

use crate::cli::{OutputFormat, RecommendArgs};
use anyhow::{Context, Result};
use mentora_intelligence::{
    MemoryStore, RecommendationEngine, RecommendationFilters, RecommendationPage,
    RecommendationRequest, SearchMode, Stores,
};
use mentora_state::{load_settings, Config};
use std::sync::Arc;

impl RecommendArgs {
    fn filters(&self) -> RecommendationFilters {
        RecommendationFilters {
            search: self.search.clone(),
            search_mode: if self.fuzzy {
                SearchMode::Fuzzy
            } else {
                SearchMode::Substring
            },
            types: self.types.clone(),
            tags: self.tags.clone(),
            industry: self.industry.clone(),
            min_experience_years: self.min_experience,
        }
    }

    fn request(&self) -> RecommendationRequest {
        RecommendationRequest {
            mentee_id: self.mentee.clone(),
            kind: self.kind.into(),
            filters: self.filters(),
            page_number: self.page,
            page_size: self.page_size,
            as_of: None,
        }
    }
}

/// Handle the `recommend` command.
pub(crate) fn handle_recommend_command(args: RecommendArgs) -> Result<()> {
    let settings = load_settings()?;
    tracing::debug!(
        target: "mentora::config",
        max_page_size = settings.max_page_size,
        read_timeout_ms = settings.read_timeout_ms,
        "loaded settings"
    );
    let store = MemoryStore::from_path(&args.snapshot)?;
    let engine = RecommendationEngine::new(Stores::shared(Arc::new(store)), settings);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let page = rt
        .block_on(engine.get_recommendations(&args.request()))
        .with_context(|| format!("cannot rank recommendations for `{}`", args.mentee))?;

    print_page(&page, args.format)
}

fn print_page(page: &RecommendationPage, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }
    print!("{}", render_text(page));
    Ok(())
}

fn render_text(page: &RecommendationPage) -> String {
    let mut out = format!(
        "{} (page {}/{}, {} total)\n",
        page.summary,
        page.page_number,
        page.total_pages.max(1),
        page.total_count
    );
    let offset = page.page_number.saturating_sub(1) * page.page_size;
    for (i, rec) in page.items.iter().enumerate() {
        out.push_str(&format!(
            "{:>3}. {} [{}] final {} (collaborative {}, content {})\n     {}\n",
            offset + i + 1,
            rec.title,
            rec.scores.item_id,
            rec.scores.final_score,
            rec.scores.collaborative_score,
            rec.scores.content_based_score,
            rec.explanation,
        ));
    }
    out
}

/// Handle the `settings` command.
pub(crate) fn handle_settings_command() -> Result<()> {
    let config = Config {
        recommend: load_settings()?,
    };
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
