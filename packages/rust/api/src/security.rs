//! Security-related HTTP response headers setup

use axum::{
    Router,
    http::header::{HeaderName, HeaderValue},
};
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

/// Default security headers for every response.
pub fn add_security_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("cache-control"),
                HeaderValue::from_static("no-cache"),
            )),
    )
}

/// Keep webhook responses out of search indexes and caches.
pub fn add_no_store_headers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("x-robots-tag"),
                HeaderValue::from_static("noindex, nofollow"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static("cache-control"),
                HeaderValue::from_static("no-store, must-revalidate"),
            )),
    )
}
