use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::Connection;

use super::TokenProvider;
use crate::db::{self, queries};
use crate::models::AccessToken;

/// Keeps one token in memory and in the token store, asking `inner` for a
/// new one only when neither holds a fresh token.
pub struct CachedTokenProvider {
    inner: Box<dyn TokenProvider>,
    db: Arc<Mutex<Connection>>,
    cache: tokio::sync::Mutex<Option<AccessToken>>,
}

impl CachedTokenProvider {
    pub fn new(inner: Box<dyn TokenProvider>, db: Arc<Mutex<Connection>>) -> Self {
        Self {
            inner,
            db,
            cache: tokio::sync::Mutex::new(None),
        }
    }
}

#[async_trait]
impl TokenProvider for CachedTokenProvider {
    async fn access_token(&self) -> anyhow::Result<AccessToken> {
        let now = Utc::now().naive_utc();

        // Held across the refresh so concurrent callers share one exchange.
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.clone());
        }

        let stored = {
            let conn = db::lock(&self.db)?;
            queries::get_token(&conn, queries::AUTH_TOKEN_KEY)?
        };
        if let Some(token) = stored.filter(|t| t.is_fresh(now)) {
            tracing::debug!("using stored token");
            *cache = Some(token.clone());
            return Ok(token);
        }

        let token = self.inner.access_token().await?;
        {
            let conn = db::lock(&self.db)?;
            queries::save_token(&conn, queries::AUTH_TOKEN_KEY, &token)?;
        }
        *cache = Some(token.clone());

        Ok(token)
    }

    async fn invalidate(&self) {
        *self.cache.lock().await = None;

        let deleted = db::lock(&self.db)
            .and_then(|conn| queries::delete_token(&conn, queries::AUTH_TOKEN_KEY));
        match deleted {
            Ok(_) => tracing::info!("cached token invalidated"),
            Err(e) => tracing::error!(error = %e, "failed to clear stored token"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        lifetime: Option<Duration>,
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn access_token(&self) -> anyhow::Result<AccessToken> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AccessToken {
                access_token: format!("tok-{n}"),
                token_type: "Bearer".to_string(),
                expires_at: self.lifetime.map(|d| Utc::now().naive_utc() + d),
            })
        }
    }

    struct FailingProvider;

    #[async_trait]
    impl TokenProvider for FailingProvider {
        async fn access_token(&self) -> anyhow::Result<AccessToken> {
            anyhow::bail!("identity provider unreachable")
        }
    }

    fn counting(lifetime: Option<Duration>) -> (Box<dyn TokenProvider>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
            lifetime,
        };
        (Box::new(provider), calls)
    }

    fn memory_db() -> Arc<Mutex<Connection>> {
        Arc::new(Mutex::new(db::init_db(":memory:").unwrap()))
    }

    #[tokio::test]
    async fn test_reuses_fresh_token() {
        let (inner, calls) = counting(Some(Duration::hours(1)));
        let provider = CachedTokenProvider::new(inner, memory_db());

        let first = provider.access_token().await.unwrap();
        let second = provider.access_token().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_refreshes_token_near_expiry() {
        let (inner, calls) = counting(Some(Duration::seconds(30)));
        let provider = CachedTokenProvider::new(inner, memory_db());

        let first = provider.access_token().await.unwrap();
        let second = provider.access_token().await.unwrap();

        assert_eq!(first.access_token, "tok-1");
        assert_eq!(second.access_token, "tok-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_persists_fresh_token() {
        let db = memory_db();
        let (inner, _) = counting(None);
        let provider = CachedTokenProvider::new(inner, Arc::clone(&db));

        provider.access_token().await.unwrap();

        let conn = db.lock().unwrap();
        let stored = queries::get_token(&conn, queries::AUTH_TOKEN_KEY).unwrap();
        assert_eq!(stored.unwrap().access_token, "tok-1");
    }

    #[tokio::test]
    async fn test_uses_stored_token_without_authenticating() {
        let db = memory_db();
        {
            let conn = db.lock().unwrap();
            let token = AccessToken {
                access_token: "stored".to_string(),
                token_type: "Bearer".to_string(),
                expires_at: None,
            };
            queries::save_token(&conn, queries::AUTH_TOKEN_KEY, &token).unwrap();
        }

        let provider = CachedTokenProvider::new(Box::new(FailingProvider), db);
        let token = provider.access_token().await.unwrap();
        assert_eq!(token.access_token, "stored");
    }

    #[tokio::test]
    async fn test_token_survives_reopening_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.db");
        let path = path.to_str().unwrap();

        {
            let db = Arc::new(Mutex::new(db::init_db(path).unwrap()));
            let (inner, _) = counting(Some(Duration::hours(1)));
            CachedTokenProvider::new(inner, db)
                .access_token()
                .await
                .unwrap();
        }

        let db = Arc::new(Mutex::new(db::init_db(path).unwrap()));
        let provider = CachedTokenProvider::new(Box::new(FailingProvider), db);
        assert_eq!(provider.access_token().await.unwrap().access_token, "tok-1");
    }

    #[tokio::test]
    async fn test_invalidate_forces_new_exchange() {
        let db = memory_db();
        let (inner, calls) = counting(None);
        let provider = CachedTokenProvider::new(inner, Arc::clone(&db));

        provider.access_token().await.unwrap();
        provider.invalidate().await;
        {
            let conn = db.lock().unwrap();
            assert!(queries::get_token(&conn, queries::AUTH_TOKEN_KEY)
                .unwrap()
                .is_none());
        }

        let token = provider.access_token().await.unwrap();
        assert_eq!(token.access_token, "tok-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_propagates() {
        let provider = CachedTokenProvider::new(Box::new(FailingProvider), memory_db());
        let err = provider.access_token().await.unwrap_err();
        assert!(err.to_string().contains("unreachable"));
    }
}
