use async_trait::async_trait;
use reqwest::{Request, Response};

/// Sends a fully built request. The executor only talks to this seam, so
/// callers own the client's construction and lifetime.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
