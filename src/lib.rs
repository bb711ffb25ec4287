//! Solar site assessment: per-region sensor loading, data-quality reporting,
//! cleaning, regional statistics, cleaning-event impact and site
//! recommendations.
pub mod aggregate;
pub mod cleaner;
pub mod config;
pub mod errors;
pub mod impact;
pub mod loader;
pub mod output;
pub mod quality;
pub mod recommend;
pub mod summary;
pub mod types;
pub mod util;
