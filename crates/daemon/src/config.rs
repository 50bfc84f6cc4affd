// Environment-driven configuration

use jobscout_core::application::normalizer::DataMode;
use jobscout_core::application::orchestrator::ScrapeConfig;
use jobscout_core::util::split_csv_list;

pub const DEFAULT_DB_PATH: &str = "~/.jobscout/jobs.db";

/// Build a [`ScrapeConfig`] from `JOBSCOUT_*` variables via the given
/// lookup (injected so tests avoid process-global env state).
pub fn scrape_config_from(lookup: impl Fn(&str) -> Option<String>) -> ScrapeConfig {
    let defaults = ScrapeConfig::default();
    let list = |key: &str| lookup(key).map(|v| split_csv_list(&v)).unwrap_or_default();
    let number = |key: &str, fallback: u32| {
        lookup(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(fallback)
    };

    ScrapeConfig {
        titles: list("JOBSCOUT_TITLES"),
        locations: list("JOBSCOUT_LOCATIONS"),
        sites: {
            let sites = list("JOBSCOUT_SITES");
            if sites.is_empty() { defaults.sites } else { sites }
        },
        country: lookup("JOBSCOUT_COUNTRY").unwrap_or(defaults.country),
        include_keywords: list("JOBSCOUT_INCLUDE_KEYWORDS"),
        exclude_keywords: list("JOBSCOUT_EXCLUDE_KEYWORDS"),
        results_per_site: number("JOBSCOUT_RESULTS_PER_SITE", defaults.results_per_site),
        hours_old: number("JOBSCOUT_HOURS_OLD", defaults.hours_old),
        data_mode: lookup("JOBSCOUT_DATA_MODE")
            .map(|v| DataMode::parse(&v))
            .unwrap_or(defaults.data_mode),
    }
}

pub fn scrape_config_from_env() -> ScrapeConfig {
    scrape_config_from(|key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = scrape_config_from(|_| None);
        assert!(config.titles.is_empty());
        assert_eq!(config.sites, vec!["linkedin".to_string()]);
        assert_eq!(config.results_per_site, 20);
        assert_eq!(config.hours_old, 72);
        assert_eq!(config.data_mode, DataMode::Compact);
    }

    #[test]
    fn test_env_overrides() {
        let config = scrape_config_from(lookup(&[
            ("JOBSCOUT_TITLES", "Rust Engineer, Backend Engineer"),
            ("JOBSCOUT_LOCATIONS", "Pune"),
            ("JOBSCOUT_SITES", "linkedin,indeed"),
            ("JOBSCOUT_COUNTRY", "usa"),
            ("JOBSCOUT_EXCLUDE_KEYWORDS", "intern, junior"),
            ("JOBSCOUT_RESULTS_PER_SITE", "40"),
            ("JOBSCOUT_HOURS_OLD", "24"),
            ("JOBSCOUT_DATA_MODE", "full"),
        ]));
        assert_eq!(config.titles, vec!["Rust Engineer", "Backend Engineer"]);
        assert_eq!(config.sites, vec!["linkedin", "indeed"]);
        assert_eq!(config.country, "usa");
        assert_eq!(config.exclude_keywords, vec!["intern", "junior"]);
        assert_eq!(config.results_per_site, 40);
        assert_eq!(config.hours_old, 24);
        assert_eq!(config.data_mode, DataMode::Full);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = scrape_config_from(lookup(&[("JOBSCOUT_RESULTS_PER_SITE", "lots")]));
        assert_eq!(config.results_per_site, 20);
    }
}
