use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::auth::TokenProvider;
use crate::services::backend::BookingBackend;
use crate::services::booking_flow::BookingSession;

pub struct AppState {
    pub config: AppConfig,
    pub tokens: Arc<dyn TokenProvider>,
    pub backend: Box<dyn BookingBackend>,
    pub sessions: Mutex<HashMap<Uuid, BookingSession>>,
    /// Set once a bearer token has been obtained; booking endpoints refuse
    /// to run without it.
    pub ready: AtomicBool,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        tokens: Arc<dyn TokenProvider>,
        backend: Box<dyn BookingBackend>,
    ) -> Self {
        Self {
            config,
            tokens,
            backend,
            sessions: Mutex::new(HashMap::new()),
            ready: AtomicBool::new(false),
        }
    }

    /// Obtains the startup token. On failure the booking flow stays
    /// disabled until the process is restarted.
    pub async fn initialize(&self) -> bool {
        match self.tokens.access_token().await {
            Ok(_) => {
                tracing::info!("token retrieved successfully");
                self.ready.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "initialization error");
                self.ready.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    pub fn ensure_ready(&self) -> Result<(), AppError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Initialization)
        }
    }

    pub fn sessions(&self) -> Result<MutexGuard<'_, HashMap<Uuid, BookingSession>>, AppError> {
        self.sessions
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("session store lock poisoned")))
    }
}
