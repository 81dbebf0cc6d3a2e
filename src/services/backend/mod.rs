pub mod http;
pub mod mock;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::AppError;
use crate::models::{Appointment, Professional, Service, TimeSlot};

pub use http::HttpBackend;
pub use mock::MockBackend;

/// The domain data boundary: catalog lookups, slot availability and
/// appointment creation.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn list_services(&self) -> Result<Vec<Service>, AppError>;

    async fn list_professionals(&self, service_id: &str) -> Result<Vec<Professional>, AppError>;

    async fn list_time_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
        service_id: &str,
    ) -> Result<Vec<TimeSlot>, AppError>;

    /// Returns the appointment as stored, with id, status and creation time
    /// filled in.
    async fn create_appointment(&self, appointment: &Appointment)
        -> Result<Appointment, AppError>;
}
