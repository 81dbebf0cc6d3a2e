use std::env;

use chrono::{Duration, NaiveTime};
use secrecy::Secret;

use crate::errors::AppError;
use crate::services::scheduling::SlotSchedule;

#[derive(Clone, Debug, PartialEq)]
pub enum BackendMode {
    Mock,
    Http,
}

impl BackendMode {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "http" => BackendMode::Http,
            _ => BackendMode::Mock,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub auth_api_base_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
    pub api_base_url: String,
    pub tenant_id: String,
    pub location_id: String,
    pub backend: BackendMode,
    pub mock_latency: bool,
    pub slot_availability: f64,
    pub business_name: String,
    pub business_address: String,
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub slot_interval_minutes: u32,
    /// Idle booking sessions are dropped after this many minutes.
    pub session_ttl_minutes: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "glowwax.db".to_string()),
            auth_api_base_url: env::var("AUTH_API_BASE_URL").unwrap_or_default(),
            client_id: env::var("CLIENT_ID").unwrap_or_default(),
            client_secret: Secret::new(env::var("CLIENT_SECRET").unwrap_or_default()),
            api_base_url: env::var("API_BASE_URL").unwrap_or_default(),
            tenant_id: env::var("TENANT_ID").unwrap_or_default(),
            location_id: env::var("LOCATION_ID").unwrap_or_default(),
            backend: BackendMode::parse(&env::var("BACKEND").unwrap_or_default()),
            mock_latency: env::var("MOCK_LATENCY")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            slot_availability: env::var("SLOT_AVAILABILITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.7),
            business_name: env::var("BUSINESS_NAME")
                .unwrap_or_else(|_| "GlowWax Studio".to_string()),
            business_address: env::var("BUSINESS_ADDRESS")
                .unwrap_or_else(|_| "123 Beauty Lane, New York, NY 10001".to_string()),
            opening_hour: env::var("OPENING_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(9),
            closing_hour: env::var("CLOSING_HOUR")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(18),
            slot_interval_minutes: env::var("SLOT_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            session_ttl_minutes: env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.session_ttl_minutes))
    }

    /// Slot grid derived from the configured business hours. Start times stop
    /// an hour before closing.
    pub fn slot_schedule(&self) -> Result<SlotSchedule, AppError> {
        let opening = NaiveTime::from_hms_opt(self.opening_hour, 0, 0)
            .ok_or_else(|| AppError::Config(format!("invalid OPENING_HOUR: {}", self.opening_hour)))?;
        let closing = NaiveTime::from_hms_opt(self.closing_hour, 0, 0)
            .ok_or_else(|| AppError::Config(format!("invalid CLOSING_HOUR: {}", self.closing_hour)))?;
        if closing <= opening {
            return Err(AppError::Config(
                "CLOSING_HOUR must be later than OPENING_HOUR".to_string(),
            ));
        }
        if self.slot_interval_minutes == 0 {
            return Err(AppError::Config(
                "SLOT_INTERVAL_MINUTES must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.slot_availability) {
            return Err(AppError::Config(format!(
                "SLOT_AVAILABILITY must be between 0 and 1, got {}",
                self.slot_availability
            )));
        }

        // Last start time sits one hour before closing, as in the 9:00-16:30 grid.
        let open_minutes = (self.closing_hour - self.opening_hour) * 60;
        let slots_per_day = open_minutes.saturating_sub(60) / self.slot_interval_minutes;

        Ok(SlotSchedule {
            opening,
            closing,
            interval_minutes: self.slot_interval_minutes,
            slots_per_day: slots_per_day.max(1),
        })
    }
}
