pub mod file_config;

pub use file_config::AppConfig;

#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "cloudview-baseline")]
#[command(about = "Maps the Qualys CloudView AWS connector listing onto the baseline schema")]
pub struct CliConfig {
    #[arg(long, help = "Path to a TOML or YAML config file")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Query the live API instead of the bundled sample page")]
    pub live: bool,

    #[arg(long, default_value = "0", help = "Zero-based page to start from")]
    pub page: u32,

    #[arg(long, help = "Records per page (overrides api.default_page_size)")]
    pub per_page: Option<u32>,

    #[arg(long, help = "Follow pagination until the last page")]
    pub all: bool,

    #[arg(long, help = "Directory for baseline_output.zip; prints JSON when omitted")]
    pub output_path: Option<String>,

    #[arg(long, help = "Print the raw API page without mapping", conflicts_with = "drift")]
    pub raw: bool,

    #[arg(long, help = "Report schema drift for the fetched page")]
    pub drift: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Command-line flags win over file and environment values.
    pub fn apply_to(&self, config: &mut AppConfig) {
        if let Some(per_page) = self.per_page {
            config.api.default_page_size = per_page;
        }
        if let Some(output_path) = &self.output_path {
            config.output.path = output_path.clone();
        }
    }

    /// Page cap for this run: one page unless `--all` was given.
    pub fn max_pages(&self, config: &AppConfig) -> Option<u32> {
        if self.all {
            config.api.max_pages
        } else {
            Some(1)
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use crate::core::ConfigProvider;

    #[test]
    fn test_defaults_parse() {
        let cli = CliConfig::parse_from(["cloudview-baseline"]);
        assert!(!cli.live);
        assert_eq!(cli.page, 0);
        assert!(cli.per_page.is_none());
        assert_eq!(cli.max_pages(&AppConfig::default()), Some(1));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = CliConfig::parse_from([
            "cloudview-baseline",
            "--live",
            "--all",
            "--per-page",
            "100",
            "--output-path",
            "/tmp/baseline",
        ]);
        let mut config = AppConfig::default();
        config.api.max_pages = Some(9);
        cli.apply_to(&mut config);

        assert_eq!(config.page_size(), 100);
        assert_eq!(config.output_path(), "/tmp/baseline");
        assert_eq!(cli.max_pages(&config), Some(9));
    }

    #[test]
    fn test_raw_and_drift_conflict() {
        assert!(CliConfig::try_parse_from(["cloudview-baseline", "--raw", "--drift"]).is_err());
    }
}
