use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::{
    Appointment, BookingStep, CustomerInfo, Professional, Service, StepKind, TimeSlot,
    TransitionError, ValidationErrors,
};
use crate::services::scheduling::{date_options, within_window, DATE_WINDOW_DAYS};
use crate::state::AppState;

/// One customer's pass through the wizard.
#[derive(Debug, Clone)]
pub struct BookingSession {
    pub id: Uuid,
    pub step: BookingStep,
    /// Slots most recently shown on the datetime step.
    pub offered: Option<OfferedSlots>,
    pub created_at: NaiveDateTime,
    /// Last time a request loaded or changed the session.
    pub touched_at: NaiveDateTime,
}

impl BookingSession {
    pub fn new() -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            step: BookingStep::Service,
            offered: None,
            created_at: now,
            touched_at: now,
        }
    }
}

impl Default for BookingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OfferedSlots {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSummary {
    pub confirmation_code: String,
    pub service: String,
    pub professional: String,
    pub date: String,
    pub time: String,
    pub business_name: String,
    pub business_address: String,
}

impl ConfirmationSummary {
    pub fn new(
        appointment: &Appointment,
        service: &Service,
        professional: &Professional,
        config: &AppConfig,
    ) -> Self {
        Self {
            confirmation_code: appointment.confirmation_code().unwrap_or_default().to_string(),
            service: service.name.clone(),
            professional: professional.name.clone(),
            date: appointment.date.format("%A, %B %-d, %Y").to_string(),
            time: appointment.start_time.format("%-I:%M %p").to_string(),
            business_name: config.business_name.clone(),
            business_address: config.business_address.clone(),
        }
    }
}

/// What a step offers the customer to choose from.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<Vec<Service>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub professionals: Option<Vec<Professional>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<Vec<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offered: Option<OfferedSlots>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ConfirmationSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub step: BookingStep,
    #[serde(flatten)]
    pub options: StepOptions,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("booking session {id}"))
}

/// Drops sessions that have been idle for longer than `ttl`.
fn prune_expired(
    sessions: &mut HashMap<Uuid, BookingSession>,
    now: NaiveDateTime,
    ttl: Duration,
) {
    let Some(cutoff) = now.checked_sub_signed(ttl) else {
        return;
    };
    let before = sessions.len();
    sessions.retain(|_, session| session.touched_at >= cutoff);
    let expired = before - sessions.len();
    if expired > 0 {
        tracing::debug!(expired, remaining = sessions.len(), "pruned idle booking sessions");
    }
}

/// Returns a snapshot of the session and marks it as touched.
fn load(state: &AppState, id: Uuid) -> Result<BookingSession, AppError> {
    let now = Utc::now().naive_utc();
    let mut sessions = state.sessions()?;
    prune_expired(&mut sessions, now, state.config.session_ttl());

    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    session.touched_at = now;
    Ok(session.clone())
}

/// Writes `session` back, provided the stored step is still `seen`.
fn commit(state: &AppState, seen: &BookingStep, session: BookingSession) -> Result<(), AppError> {
    let mut sessions = state.sessions()?;
    let current = sessions
        .get_mut(&session.id)
        .ok_or_else(|| session_not_found(session.id))?;
    if current.step != *seen {
        tracing::warn!(session_id = %session.id, step = %current.step.kind(), "concurrent update rejected");
        return Err(TransitionError::SessionChanged.into());
    }

    *current = BookingSession {
        touched_at: Utc::now().naive_utc(),
        ..session
    };
    Ok(())
}

/// Keeps slots fetched while rendering, unless the session moved on or was
/// offered other slots meanwhile.
fn remember_offered(
    state: &AppState,
    id: Uuid,
    step: &BookingStep,
    offered: OfferedSlots,
) -> Result<(), AppError> {
    let mut sessions = state.sessions()?;
    if let Some(current) = sessions.get_mut(&id) {
        if current.step == *step && current.offered.is_none() {
            current.offered = Some(offered);
        }
    }
    Ok(())
}

fn window_error() -> AppError {
    let mut fields = ValidationErrors::new();
    fields.insert(
        "date".to_string(),
        format!("Date must be within the next {DATE_WINDOW_DAYS} days"),
    );
    AppError::Validation(fields)
}

async fn fetch_slots(state: &AppState, session: &mut BookingSession, date: NaiveDate) {
    let (Some(service), Some(professional)) = (session.step.service(), session.step.professional())
    else {
        return;
    };

    let slots = match state
        .backend
        .list_time_slots(&professional.id, date, &service.id)
        .await
    {
        Ok(slots) => slots,
        Err(e) => {
            tracing::error!(error = %e, %date, "failed to fetch time slots");
            Vec::new()
        }
    };
    session.offered = Some(OfferedSlots { date, slots });
}

/// Loads the choices for the session's step. Fetch failures leave the list
/// empty; the customer sees an empty state rather than an error.
async fn load_options(state: &AppState, session: &mut BookingSession) -> StepOptions {
    match session.step.kind() {
        StepKind::Service => {
            let services = state.backend.list_services().await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to fetch services");
                Vec::new()
            });
            StepOptions {
                services: Some(services),
                ..Default::default()
            }
        }
        StepKind::Professional => {
            let service_id = session.step.service().map(|s| s.id.clone()).unwrap_or_default();
            let professionals = state
                .backend
                .list_professionals(&service_id)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, service_id = %service_id, "failed to fetch professionals");
                    Vec::new()
                });
            StepOptions {
                professionals: Some(professionals),
                ..Default::default()
            }
        }
        StepKind::DateTime => {
            let today = today();
            if session.offered.is_none() {
                fetch_slots(state, session, today).await;
            }
            StepOptions {
                dates: Some(date_options(today, DATE_WINDOW_DAYS)),
                offered: session.offered.clone(),
                ..Default::default()
            }
        }
        StepKind::Checkout => StepOptions::default(),
        StepKind::Confirmation => {
            let summary = match &session.step {
                BookingStep::Confirmation {
                    service,
                    professional,
                    appointment,
                    ..
                } => Some(ConfirmationSummary::new(
                    appointment,
                    service,
                    professional,
                    &state.config,
                )),
                _ => None,
            };
            StepOptions {
                summary,
                ..Default::default()
            }
        }
    }
}

async fn render(state: &AppState, mut session: BookingSession) -> Result<BookingView, AppError> {
    let had_offer = session.offered.is_some();
    let options = load_options(state, &mut session).await;
    if !had_offer {
        if let Some(offered) = &session.offered {
            remember_offered(state, session.id, &session.step, offered.clone())?;
        }
    }

    Ok(BookingView {
        session_id: session.id,
        step: session.step,
        options,
    })
}

pub async fn start_session(state: &Arc<AppState>) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let session = BookingSession::new();
    {
        let mut sessions = state.sessions()?;
        prune_expired(&mut sessions, session.created_at, state.config.session_ttl());
        sessions.insert(session.id, session.clone());
    }
    tracing::info!(session_id = %session.id, "booking session started");
    render(state, session).await
}

pub async fn current_view(state: &Arc<AppState>, id: Uuid) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let session = load(state, id)?;
    render(state, session).await
}

pub async fn choose_service(
    state: &Arc<AppState>,
    id: Uuid,
    service_id: &str,
) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let mut session = load(state, id)?;
    if session.step.kind() != StepKind::Service {
        return Err(TransitionError::InvalidTransition {
            step: session.step.kind(),
            action: "select a service",
        }
        .into());
    }

    let service = state
        .backend
        .list_services()
        .await?
        .into_iter()
        .find(|s| s.id == service_id)
        .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))?;

    let seen = session.step.clone();
    session.step = session.step.select_service(service)?;
    commit(state, &seen, session.clone())?;
    tracing::info!(session_id = %id, service_id, "service selected");
    render(state, session).await
}

pub async fn choose_professional(
    state: &Arc<AppState>,
    id: Uuid,
    professional_id: &str,
) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let mut session = load(state, id)?;
    let Some(service) = session.step.service().filter(|_| session.step.kind() == StepKind::Professional)
    else {
        return Err(TransitionError::InvalidTransition {
            step: session.step.kind(),
            action: "select a professional",
        }
        .into());
    };

    let professional = state
        .backend
        .list_professionals(&service.id)
        .await?
        .into_iter()
        .find(|p| p.id == professional_id)
        .ok_or_else(|| AppError::NotFound(format!("professional {professional_id}")))?;

    let seen = session.step.clone();
    session.step = session.step.select_professional(professional)?;
    session.offered = None;
    commit(state, &seen, session.clone())?;
    tracing::info!(session_id = %id, professional_id, "professional selected");
    render(state, session).await
}

/// Fetches the slots for `date` and remembers them as the ones the customer
/// may pick from.
pub async fn offer_time_slots(
    state: &Arc<AppState>,
    id: Uuid,
    date: NaiveDate,
) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let mut session = load(state, id)?;
    if session.step.kind() != StepKind::DateTime {
        return Err(TransitionError::InvalidTransition {
            step: session.step.kind(),
            action: "list time slots",
        }
        .into());
    }
    if !within_window(today(), date) {
        return Err(window_error());
    }

    let seen = session.step.clone();
    fetch_slots(state, &mut session, date).await;
    commit(state, &seen, session.clone())?;
    render(state, session).await
}

pub async fn choose_time_slot(
    state: &Arc<AppState>,
    id: Uuid,
    date: NaiveDate,
    slot_id: &str,
) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let mut session = load(state, id)?;
    if session.step.kind() != StepKind::DateTime {
        return Err(TransitionError::InvalidTransition {
            step: session.step.kind(),
            action: "select a time slot",
        }
        .into());
    }
    if !within_window(today(), date) {
        return Err(window_error());
    }

    let slot = session
        .offered
        .as_ref()
        .filter(|offered| offered.date == date)
        .and_then(|offered| offered.slots.iter().find(|s| s.id == slot_id))
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("time slot {slot_id} on {date}")))?;

    let seen = session.step.clone();
    session.step = session.step.select_time_slot(date, slot)?;
    commit(state, &seen, session.clone())?;
    tracing::info!(session_id = %id, %date, slot_id, "time slot selected");
    render(state, session).await
}

/// Submits the appointment. On failure the session stays on checkout so the
/// customer can retry.
pub async fn checkout(
    state: &Arc<AppState>,
    id: Uuid,
    customer: CustomerInfo,
) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let mut session = load(state, id)?;
    let BookingStep::Checkout {
        service,
        professional,
        date,
        time_slot,
    } = &session.step
    else {
        return Err(TransitionError::InvalidTransition {
            step: session.step.kind(),
            action: "confirm an appointment",
        }
        .into());
    };

    customer.validate().map_err(AppError::Validation)?;

    let request = Appointment::request(service, professional, *date, time_slot, &customer);
    let created = match state.backend.create_appointment(&request).await {
        Ok(created) => created,
        Err(e) => {
            tracing::error!(error = %e, session_id = %id, "failed to book appointment");
            return Err(AppError::BookingFailed);
        }
    };

    tracing::info!(
        session_id = %id,
        appointment_id = created.id.as_deref().unwrap_or("unknown"),
        status = created.status.map(|s| s.as_str()).unwrap_or("unknown"),
        "appointment booked"
    );
    let seen = session.step.clone();
    session.step = session.step.confirm(created)?;
    commit(state, &seen, session.clone())?;
    render(state, session).await
}

pub async fn go_back(state: &Arc<AppState>, id: Uuid) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let mut session = load(state, id)?;
    let seen = session.step.clone();
    session.step = session.step.back();
    if session.step.kind() != StepKind::DateTime {
        session.offered = None;
    }
    commit(state, &seen, session.clone())?;
    render(state, session).await
}

pub async fn book_another(state: &Arc<AppState>, id: Uuid) -> Result<BookingView, AppError> {
    state.ensure_ready()?;
    let mut session = load(state, id)?;
    let seen = session.step.clone();
    session.step = session.step.book_another()?;
    session.offered = None;
    commit(state, &seen, session.clone())?;
    tracing::info!(session_id = %id, "booking session reset");
    render(state, session).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::NaiveDate;

    fn config() -> AppConfig {
        AppConfig {
            port: 3000,
            database_url: ":memory:".to_string(),
            auth_api_base_url: String::new(),
            client_id: String::new(),
            client_secret: secrecy::Secret::new(String::new()),
            api_base_url: String::new(),
            tenant_id: String::new(),
            location_id: String::new(),
            backend: crate::config::BackendMode::Mock,
            mock_latency: false,
            slot_availability: 1.0,
            business_name: "GlowWax Studio".to_string(),
            business_address: "123 Beauty Lane, New York, NY 10001".to_string(),
            opening_hour: 9,
            closing_hour: 18,
            slot_interval_minutes: 30,
            session_ttl_minutes: 30,
        }
    }

    #[test]
    fn test_confirmation_summary_formatting() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 16).unwrap();
        let start = date.and_hms_opt(14, 30, 0).unwrap();
        let appointment = Appointment {
            id: Some("app-42".to_string()),
            service_id: "s2".to_string(),
            professional_id: "p1".to_string(),
            date,
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_phone: "5551234567".to_string(),
            status: Some(AppointmentStatus::Booked),
            created_at: None,
        };
        let service = crate::services::backend::mock::default_services()
            .into_iter()
            .find(|s| s.id == "s2")
            .unwrap();
        let professional = crate::services::backend::mock::default_professionals()
            .into_iter()
            .find(|p| p.id == "p1")
            .unwrap();

        let summary = ConfirmationSummary::new(&appointment, &service, &professional, &config());

        assert_eq!(summary.confirmation_code, "app-42");
        assert_eq!(summary.service, "Brazilian Wax");
        assert_eq!(summary.professional, "Emma Johnson");
        assert_eq!(summary.date, "Monday, June 16, 2025");
        assert_eq!(summary.time, "2:30 PM");
        assert_eq!(summary.business_name, "GlowWax Studio");
    }

    #[test]
    fn test_view_flattens_step_and_options() {
        let view = BookingView {
            session_id: Uuid::nil(),
            step: BookingStep::Service,
            options: StepOptions {
                services: Some(Vec::new()),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["step"], "service");
        assert_eq!(json["sessionId"], "00000000-0000-0000-0000-000000000000");
        assert!(json["services"].as_array().unwrap().is_empty());
        assert!(json.get("professionals").is_none());
    }

    #[test]
    fn test_new_session_starts_at_service() {
        let session = BookingSession::new();
        assert_eq!(session.step, BookingStep::Service);
        assert!(session.offered.is_none());
        assert_eq!(session.touched_at, session.created_at);
    }

    #[test]
    fn test_prune_drops_idle_sessions() {
        let now = Utc::now().naive_utc();
        let fresh = BookingSession::new();
        let mut idle = BookingSession::new();
        idle.touched_at = now - Duration::minutes(45);

        let mut sessions = HashMap::new();
        sessions.insert(fresh.id, fresh.clone());
        sessions.insert(idle.id, idle.clone());

        prune_expired(&mut sessions, now, Duration::minutes(30));

        assert!(sessions.contains_key(&fresh.id));
        assert!(!sessions.contains_key(&idle.id));
    }

    #[test]
    fn test_prune_with_unbounded_ttl_keeps_everything() {
        let mut idle = BookingSession::new();
        idle.touched_at = NaiveDateTime::MIN;
        let mut sessions = HashMap::new();
        sessions.insert(idle.id, idle);

        prune_expired(&mut sessions, Utc::now().naive_utc(), Duration::MAX);

        assert_eq!(sessions.len(), 1);
    }
}
