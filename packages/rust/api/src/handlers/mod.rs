pub mod blogs;
pub mod enrich;
pub mod health;
pub mod scrape;

pub use blogs::{post_rewrite_all, post_rewrite_single};
pub use enrich::{enrich_method_not_allowed, post_enrich};
pub use health::health;
pub use scrape::{get_scraper_input, post_scraper_output};

use crate::error::ApiError;

/// Fallback for routes without a custom 405 body.
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}
