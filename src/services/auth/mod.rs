pub mod cached;
pub mod client_credentials;

use async_trait::async_trait;

use crate::models::AccessToken;

pub use cached::CachedTokenProvider;
pub use client_credentials::ClientCredentialsProvider;

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> anyhow::Result<AccessToken>;

    /// Forget any cached token so the next call authenticates again.
    async fn invalidate(&self) {}
}
