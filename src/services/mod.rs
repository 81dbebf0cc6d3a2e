pub mod auth;
pub mod backend;
pub mod booking_flow;
pub mod scheduling;
