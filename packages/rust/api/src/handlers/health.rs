/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}
