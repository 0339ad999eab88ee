//! Insights view: fetching, aggregation and headline statistics.

pub mod aggregator;
pub mod fetch;
pub mod keywords;
pub mod stats;

pub use aggregator::aggregate;
pub use fetch::fetch_page_data;
pub use stats::summary_stats;
