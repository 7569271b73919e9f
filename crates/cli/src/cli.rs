use clap::{Parser, Subcommand, ValueEnum};
use mentora_intelligence::ItemKind;
use std::path::PathBuf;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable ranked list.
    #[default]
    Text,
    /// The full recommendation page as JSON.
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Which catalog to rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum KindArg {
    #[default]
    Material,
    Mentor,
}

impl From<KindArg> for ItemKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Material => ItemKind::Material,
            KindArg::Mentor => ItemKind::Mentor,
        }
    }
}

/// Command-line interface for the `mentora` application.
#[derive(Debug, Parser)]
#[command(
    name = "mentora",
    version,
    about = "Rank learning materials and mentors for mentees"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available `mentora` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ranks materials or mentors for one mentee from a marketplace snapshot.
    Recommend(RecommendArgs),
    /// Prints the effective settings (defaults, config file and env overrides) as TOML.
    Settings,
}

#[derive(Debug, clap::Args)]
pub struct RecommendArgs {
    /// Marketplace snapshot (JSON) to read events, profiles and catalog from.
    #[arg(long, value_name = "FILE", env = "MENTORA_SNAPSHOT")]
    pub snapshot: PathBuf,
    /// Mentee to rank for.
    #[arg(long, value_name = "ID")]
    pub mentee: String,
    /// Catalog to rank.
    #[arg(long, value_enum, default_value = "material")]
    pub kind: KindArg,
    /// Substring matched against title and description.
    #[arg(long)]
    pub search: Option<String>,
    /// Tolerate typos in the search term (trigram similarity).
    #[arg(long, default_value_t = false)]
    pub fuzzy: bool,
    /// Material format to keep (repeatable).
    #[arg(long = "type", value_name = "TYPE")]
    pub types: Vec<String>,
    /// Tag every result must carry (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    /// Industry slug, e.g. `fintech`.
    #[arg(long)]
    pub industry: Option<String>,
    /// Minimum mentor experience in years.
    #[arg(long, value_name = "YEARS", allow_negative_numbers = true)]
    pub min_experience: Option<i32>,
    /// Page number, starting at 1.
    #[arg(long, allow_negative_numbers = true)]
    pub page: Option<i64>,
    /// Results per page.
    #[arg(long, allow_negative_numbers = true)]
    pub page_size: Option<i64>,
    /// Output format: text or json.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_recommend_parses_repeatable_filters() {
        let cli = Cli::try_parse_from([
            "mentora",
            "recommend",
            "--snapshot",
            "market.json",
            "--mentee",
            "mentee-ana",
            "--kind",
            "mentor",
            "--tag",
            "docker",
            "--tag",
            "kubernetes",
            "--min-experience",
            "5",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Recommend(args) = cli.command else {
            panic!("expected recommend");
        };
        assert_eq!(args.kind, KindArg::Mentor);
        assert_eq!(args.tags, vec!["docker", "kubernetes"]);
        assert_eq!(args.min_experience, Some(5));
        assert!(args.format.is_json());
        assert!(!args.fuzzy);
    }

    #[test]
    fn test_recommend_requires_mentee() {
        let err = Cli::try_parse_from(["mentora", "recommend", "--snapshot", "m.json"]);
        assert!(err.is_err());
    }
}
