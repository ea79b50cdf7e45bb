//! Configuration module for audit runs
//!
//! This module provides the `AuditConfig` struct and its type-safe builder
//! with validation and sensible defaults, plus plan entitlements.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod plan;
pub mod types;

// Re-exports for public API
pub use builder::{AuditConfigBuilder, WithSeedUrl};
pub use plan::Plan;
pub use types::AuditConfig;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let config = AuditConfig::builder().seed_url("example.com").build()?;
        assert_eq!(config.seed_url(), "https://example.com");
        assert_eq!(config.page_budget(), 10);
        assert_eq!(config.viewport(), (1280, 800));
        assert_eq!(config.page_load_timeout_secs(), 30);
        assert_eq!(config.settle_delay().as_millis(), 2000);
        assert!(config.headless());
        assert!(config.fail_on_empty_crawl());
        assert!(config.chrome_data_dir().is_none());
        assert!(config.chrome_executable().is_none());
        Ok(())
    }

    #[test]
    fn test_plan_sets_budget() -> anyhow::Result<()> {
        let config = AuditConfig::builder()
            .plan(Plan::Pro)
            .seed_url("https://example.com/")
            .build()?;
        assert_eq!(config.page_budget(), 30);
        assert_eq!(Plan::Free.page_limit(), 3);
        assert_eq!(Plan::Team.page_limit(), 75);
        assert_eq!("Starter".parse::<Plan>(), Ok(Plan::Starter));
        Ok(())
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let result = AuditConfig::builder()
            .seed_url("https://example.com/")
            .page_budget(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_non_http_seed_is_rejected() {
        assert!(AuditConfig::builder().seed_url("https://").build().is_err());
        assert!(AuditConfig::builder().seed_url("http://exa mple.com").build().is_err());
    }
}
