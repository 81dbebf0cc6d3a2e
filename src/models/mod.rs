pub mod appointment;
pub mod booking;
pub mod catalog;
pub mod customer;
pub mod time_slot;
pub mod token;

pub use appointment::{Appointment, AppointmentStatus};
pub use booking::{BookingStep, StepKind, TransitionError};
pub use catalog::{Professional, Service};
pub use customer::{CustomerInfo, ValidationErrors};
pub use time_slot::TimeSlot;
pub use token::AccessToken;
