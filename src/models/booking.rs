use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Appointment, Professional, Service, TimeSlot};

/// The booking wizard. Each step carries exactly the selections made before
/// it, so a step can never be reached with a selection missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "step", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BookingStep {
    #[default]
    Service,
    Professional {
        service: Service,
    },
    #[serde(rename = "datetime")]
    DateTime {
        service: Service,
        professional: Professional,
    },
    Checkout {
        service: Service,
        professional: Professional,
        date: NaiveDate,
        time_slot: TimeSlot,
    },
    Confirmation {
        service: Service,
        professional: Professional,
        date: NaiveDate,
        time_slot: TimeSlot,
        appointment: Appointment,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Service,
    Professional,
    #[serde(rename = "datetime")]
    DateTime,
    Checkout,
    Confirmation,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::Service => "service",
            StepKind::Professional => "professional",
            StepKind::DateTime => "datetime",
            StepKind::Checkout => "checkout",
            StepKind::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} on the {step} step")]
    InvalidTransition { step: StepKind, action: &'static str },

    #[error("{professional} does not offer {service}")]
    ProfessionalMismatch { professional: String, service: String },

    #[error("time slot {0} is not available")]
    SlotUnavailable(String),

    #[error("time slot {slot} does not start on {date}")]
    SlotDateMismatch { slot: String, date: NaiveDate },

    /// Another request moved the session on while this one was in flight.
    #[error("booking session changed, reload and try again")]
    SessionChanged,
}

impl BookingStep {
    pub fn kind(&self) -> StepKind {
        match self {
            BookingStep::Service => StepKind::Service,
            BookingStep::Professional { .. } => StepKind::Professional,
            BookingStep::DateTime { .. } => StepKind::DateTime,
            BookingStep::Checkout { .. } => StepKind::Checkout,
            BookingStep::Confirmation { .. } => StepKind::Confirmation,
        }
    }

    pub fn service(&self) -> Option<&Service> {
        match self {
            BookingStep::Service => None,
            BookingStep::Professional { service }
            | BookingStep::DateTime { service, .. }
            | BookingStep::Checkout { service, .. }
            | BookingStep::Confirmation { service, .. } => Some(service),
        }
    }

    pub fn professional(&self) -> Option<&Professional> {
        match self {
            BookingStep::DateTime { professional, .. }
            | BookingStep::Checkout { professional, .. }
            | BookingStep::Confirmation { professional, .. } => Some(professional),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            BookingStep::Checkout { date, .. } | BookingStep::Confirmation { date, .. } => {
                Some(*date)
            }
            _ => None,
        }
    }

    pub fn time_slot(&self) -> Option<&TimeSlot> {
        match self {
            BookingStep::Checkout { time_slot, .. }
            | BookingStep::Confirmation { time_slot, .. } => Some(time_slot),
            _ => None,
        }
    }

    pub fn appointment(&self) -> Option<&Appointment> {
        match self {
            BookingStep::Confirmation { appointment, .. } => Some(appointment),
            _ => None,
        }
    }

    fn invalid(&self, action: &'static str) -> TransitionError {
        TransitionError::InvalidTransition {
            step: self.kind(),
            action,
        }
    }

    pub fn select_service(&self, service: Service) -> Result<BookingStep, TransitionError> {
        match self {
            BookingStep::Service => Ok(BookingStep::Professional { service }),
            _ => Err(self.invalid("select a service")),
        }
    }

    pub fn select_professional(
        &self,
        professional: Professional,
    ) -> Result<BookingStep, TransitionError> {
        let BookingStep::Professional { service } = self else {
            return Err(self.invalid("select a professional"));
        };

        if !professional.offers(&service.id) {
            return Err(TransitionError::ProfessionalMismatch {
                professional: professional.name,
                service: service.name.clone(),
            });
        }

        Ok(BookingStep::DateTime {
            service: service.clone(),
            professional,
        })
    }

    pub fn select_time_slot(
        &self,
        date: NaiveDate,
        time_slot: TimeSlot,
    ) -> Result<BookingStep, TransitionError> {
        let BookingStep::DateTime {
            service,
            professional,
        } = self
        else {
            return Err(self.invalid("select a time slot"));
        };

        if !time_slot.available {
            return Err(TransitionError::SlotUnavailable(time_slot.id));
        }
        if !time_slot.starts_on(date) {
            return Err(TransitionError::SlotDateMismatch {
                slot: time_slot.id,
                date,
            });
        }

        Ok(BookingStep::Checkout {
            service: service.clone(),
            professional: professional.clone(),
            date,
            time_slot,
        })
    }

    /// Moves a checkout to confirmation once the backend accepted the
    /// appointment.
    pub fn confirm(&self, appointment: Appointment) -> Result<BookingStep, TransitionError> {
        let BookingStep::Checkout {
            service,
            professional,
            date,
            time_slot,
        } = self
        else {
            return Err(self.invalid("confirm an appointment"));
        };

        Ok(BookingStep::Confirmation {
            service: service.clone(),
            professional: professional.clone(),
            date: *date,
            time_slot: time_slot.clone(),
            appointment,
        })
    }

    /// One step back. Selections made before the target step survive; the
    /// target step's own selection and everything after it is dropped.
    pub fn back(&self) -> BookingStep {
        match self {
            BookingStep::Service | BookingStep::Professional { .. } => BookingStep::Service,
            BookingStep::DateTime { service, .. } => BookingStep::Professional {
                service: service.clone(),
            },
            BookingStep::Checkout {
                service,
                professional,
                ..
            } => BookingStep::DateTime {
                service: service.clone(),
                professional: professional.clone(),
            },
            BookingStep::Confirmation {
                service,
                professional,
                date,
                time_slot,
                ..
            } => BookingStep::Checkout {
                service: service.clone(),
                professional: professional.clone(),
                date: *date,
                time_slot: time_slot.clone(),
            },
        }
    }

    pub fn book_another(&self) -> Result<BookingStep, TransitionError> {
        match self {
            BookingStep::Confirmation { .. } => Ok(BookingStep::Service),
            _ => Err(self.invalid("book another appointment")),
        }
    }
}
