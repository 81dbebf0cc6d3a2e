use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::Rng;

use super::BookingBackend;
use crate::errors::AppError;
use crate::models::{Appointment, AppointmentStatus, Professional, Service, TimeSlot};
use crate::services::scheduling::SlotSchedule;

/// Simulated round-trip times.
#[derive(Debug, Clone)]
pub struct MockLatency {
    pub services: Duration,
    pub professionals: Duration,
    pub slots: Duration,
    pub appointment: Duration,
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            services: Duration::from_millis(500),
            professionals: Duration::from_millis(500),
            slots: Duration::from_millis(700),
            appointment: Duration::from_millis(1000),
        }
    }
}

impl MockLatency {
    pub fn none() -> Self {
        Self {
            services: Duration::ZERO,
            professionals: Duration::ZERO,
            slots: Duration::ZERO,
            appointment: Duration::ZERO,
        }
    }
}

/// In-memory studio catalog. Slot availability is a coin flip per slot and
/// nothing stops the same slot from being booked twice.
pub struct MockBackend {
    services: Vec<Service>,
    professionals: Vec<Professional>,
    schedule: SlotSchedule,
    availability: f64,
    latency: MockLatency,
}

impl MockBackend {
    pub fn new(schedule: SlotSchedule) -> Self {
        Self {
            services: default_services(),
            professionals: default_professionals(),
            schedule,
            availability: 0.7,
            latency: MockLatency::default(),
        }
    }

    pub fn with_latency(mut self, latency: MockLatency) -> Self {
        self.latency = latency;
        self
    }

    /// Probability that a generated slot is bookable, clamped to `0..=1`.
    pub fn with_availability(mut self, probability: f64) -> Self {
        self.availability = probability.clamp(0.0, 1.0);
        self
    }

    fn generate_slots(&self, date: NaiveDate, duration: u32) -> Vec<TimeSlot> {
        let mut rng = rand::rng();
        self.schedule
            .generate(date, duration, || rng.random_bool(self.availability))
    }
}

async fn simulate(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

#[async_trait]
impl BookingBackend for MockBackend {
    async fn list_services(&self) -> Result<Vec<Service>, AppError> {
        simulate(self.latency.services).await;
        Ok(self.services.clone())
    }

    async fn list_professionals(&self, service_id: &str) -> Result<Vec<Professional>, AppError> {
        simulate(self.latency.professionals).await;
        Ok(self
            .professionals
            .iter()
            .filter(|p| p.offers(service_id))
            .cloned()
            .collect())
    }

    async fn list_time_slots(
        &self,
        professional_id: &str,
        date: NaiveDate,
        service_id: &str,
    ) -> Result<Vec<TimeSlot>, AppError> {
        let duration = self
            .services
            .iter()
            .find(|s| s.id == service_id)
            .map(|s| s.duration)
            .ok_or_else(|| AppError::NotFound(format!("service {service_id}")))?;

        simulate(self.latency.slots).await;

        let slots = self.generate_slots(date, duration);
        tracing::debug!(
            professional_id,
            service_id,
            %date,
            count = slots.len(),
            "generated time slots"
        );
        Ok(slots)
    }

    async fn create_appointment(
        &self,
        appointment: &Appointment,
    ) -> Result<Appointment, AppError> {
        tracing::info!(
            service_id = %appointment.service_id,
            professional_id = %appointment.professional_id,
            date = %appointment.date,
            "creating appointment"
        );
        simulate(self.latency.appointment).await;

        Ok(Appointment {
            id: Some(format!("app-{}", uuid::Uuid::new_v4().simple())),
            status: Some(AppointmentStatus::Booked),
            created_at: Some(Utc::now().naive_utc()),
            ..appointment.clone()
        })
    }
}

fn service(id: &str, name: &str, description: &str, price: u32, duration: u32) -> Service {
    Service {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        duration,
        image_url: Some("/placeholder.svg".to_string()),
    }
}

fn professional(id: &str, name: &str, title: &str, bio: &str, service_ids: &[&str]) -> Professional {
    Professional {
        id: id.to_string(),
        name: name.to_string(),
        title: title.to_string(),
        image_url: Some("/placeholder.svg".to_string()),
        bio: Some(bio.to_string()),
        service_ids: service_ids.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn default_services() -> Vec<Service> {
    vec![
        service(
            "s1",
            "Full Leg Wax",
            "Complete waxing treatment for both legs, from ankle to upper thigh.",
            65,
            45,
        ),
        service(
            "s2",
            "Brazilian Wax",
            "Complete hair removal from the entire intimate area, front to back.",
            75,
            30,
        ),
        service(
            "s3",
            "Underarm Wax",
            "Quick and effective hair removal from the underarm area.",
            25,
            15,
        ),
        service(
            "s4",
            "Eyebrow Wax",
            "Sculpt and define your eyebrows with precise waxing.",
            20,
            15,
        ),
        service(
            "s5",
            "Full Arm Wax",
            "Complete hair removal from fingers to shoulders.",
            45,
            30,
        ),
        service(
            "s6",
            "Bikini Line Wax",
            "Hair removal along the bikini line for a clean appearance.",
            35,
            20,
        ),
        service(
            "s7",
            "Full Body Wax",
            "Complete hair removal treatment for the entire body.",
            180,
            120,
        ),
        service(
            "s8",
            "Back & Shoulders Wax",
            "Hair removal treatment for the back and shoulder areas.",
            50,
            30,
        ),
    ]
}

pub fn default_professionals() -> Vec<Professional> {
    vec![
        professional(
            "p1",
            "Emma Johnson",
            "Senior Wax Specialist",
            "With 8 years of experience, Emma specializes in Brazilian and full body waxing with a gentle touch.",
            &["s1", "s2", "s3", "s5", "s6", "s7"],
        ),
        professional(
            "p2",
            "Michael Chen",
            "Wax Technician",
            "Michael is known for his quick and painless technique, specializing in men's waxing services.",
            &["s1", "s3", "s5", "s8"],
        ),
        professional(
            "p3",
            "Sofia Rodriguez",
            "Esthetician",
            "Sofia is our facial waxing expert, with special expertise in eyebrow shaping and facial hair removal.",
            &["s3", "s4", "s6"],
        ),
        professional(
            "p4",
            "David Kim",
            "Advanced Wax Specialist",
            "David combines waxing with skincare knowledge for an exceptional experience. He specializes in full body treatments.",
            &["s1", "s2", "s5", "s7", "s8"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> MockBackend {
        MockBackend::new(SlotSchedule::default()).with_latency(MockLatency::none())
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 16).unwrap()
    }

    fn request() -> Appointment {
        let start = date().and_hms_opt(10, 0, 0).unwrap();
        Appointment {
            id: Some("client-chosen".to_string()),
            service_id: "s2".to_string(),
            professional_id: "p1".to_string(),
            date: date(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(30),
            customer_name: "Jane Doe".to_string(),
            customer_email: "jane@example.com".to_string(),
            customer_phone: "5551234567".to_string(),
            status: Some(AppointmentStatus::Cancelled),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_lists_catalog() {
        let services = backend().list_services().await.unwrap();
        assert_eq!(services.len(), 8);
        let brazilian = services.iter().find(|s| s.name == "Brazilian Wax").unwrap();
        assert_eq!(brazilian.price, 75);
        assert_eq!(brazilian.duration, 30);
    }

    #[tokio::test]
    async fn test_professionals_filtered_by_service() {
        let pros = backend().list_professionals("s2").await.unwrap();
        let names: Vec<_> = pros.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Emma Johnson", "David Kim"]);

        let pros = backend().list_professionals("s4").await.unwrap();
        assert_eq!(pros.len(), 1);
        assert_eq!(pros[0].name, "Sofia Rodriguez");

        assert!(backend().list_professionals("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_slots_respect_closing_time() {
        let slots = backend().list_time_slots("p1", date(), "s7").await.unwrap();
        let closing = date().and_hms_opt(18, 0, 0).unwrap();
        assert!(!slots.is_empty());
        assert!(slots.iter().all(|s| s.end_time <= closing));
        assert!(slots
            .iter()
            .all(|s| s.end_time - s.start_time == chrono::Duration::minutes(120)));
    }

    #[tokio::test]
    async fn test_slot_availability_probability() {
        let all = backend()
            .with_availability(1.0)
            .list_time_slots("p1", date(), "s2")
            .await
            .unwrap();
        assert!(all.iter().all(|s| s.available));

        let none = backend()
            .with_availability(0.0)
            .list_time_slots("p1", date(), "s2")
            .await
            .unwrap();
        assert!(none.iter().all(|s| !s.available));
    }

    #[tokio::test]
    async fn test_slots_for_unknown_service() {
        let err = backend()
            .list_time_slots("p1", date(), "s99")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_create_appointment_assigns_backend_fields() {
        let created = backend().create_appointment(&request()).await.unwrap();

        let id = created.id.as_deref().unwrap();
        assert!(id.starts_with("app-"));
        assert_ne!(id, "client-chosen");
        assert_eq!(created.status, Some(AppointmentStatus::Booked));
        assert!(created.created_at.is_some());
        assert_eq!(created.customer_name, "Jane Doe");
        assert_eq!(created.start_time, request().start_time);
    }

    #[tokio::test]
    async fn test_same_slot_can_be_booked_twice() {
        let backend = backend();
        let first = backend.create_appointment(&request()).await.unwrap();
        let second = backend.create_appointment(&request()).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_simulated_latency() {
        let backend = MockBackend::new(SlotSchedule::default());
        let started = tokio::time::Instant::now();
        backend.list_services().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }
}
