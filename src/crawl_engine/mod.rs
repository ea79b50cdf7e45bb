//! Crawl Engine Module
//!
//! Breadth-first, budget-bounded crawl of a single site. The frontier is a
//! run-scoped value owned by [`crawler::crawl_site`]; each dequeued URL goes
//! through the [`page_processor::PageProcessor`], which contains every
//! per-page fault.

pub mod cleanup;
pub mod crawl_types;
pub mod crawler;
pub mod frontier;
pub mod link_processor;
pub mod page_processor;
pub mod page_timeout;

pub use crawl_types::{AuditError, AuditResult, CrawlSummary};
pub use crawler::crawl_site;
pub use frontier::CrawlFrontier;
pub use link_processor::select_frontier_links;
pub use page_processor::{PageOutcome, PageProcessor, PageStage};
