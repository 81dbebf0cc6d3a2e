use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{CustomerInfo, Professional, Service, TimeSlot};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub service_id: String,
    pub professional_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Booked,
    Confirmed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl Appointment {
    /// Builds the request body for a checkout; id, status and creation time
    /// are left for the backend to assign.
    pub fn request(
        service: &Service,
        professional: &Professional,
        date: NaiveDate,
        slot: &TimeSlot,
        customer: &CustomerInfo,
    ) -> Self {
        Self {
            id: None,
            service_id: service.id.clone(),
            professional_id: professional.id.clone(),
            date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            customer_name: customer.name.trim().to_string(),
            customer_email: customer.email.trim().to_string(),
            customer_phone: customer.phone.trim().to_string(),
            status: None,
            created_at: None,
        }
    }

    /// Confirmation code shown to the customer.
    pub fn confirmation_code(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
