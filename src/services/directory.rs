use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::models::{Booking, Doctor, PatientInfo, Slot};

#[derive(Debug, Clone, Default)]
pub struct DoctorQuery {
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub modality: Option<String>,
    pub limit: usize,
}

/// Read side of the doctor data. The flow only ever issues a handful of
/// sequential reads per turn; implementations decide where the data
/// actually lives.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn list_doctors(&self, query: &DoctorQuery) -> anyhow::Result<Vec<Doctor>>;

    async fn get_doctor_by_id(&self, id: &str) -> anyhow::Result<Option<Doctor>>;

    /// Open availability as date -> ascending times, already excluding
    /// booked slots. Dates with nothing open are omitted.
    async fn get_availability(
        &self,
        id: &str,
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> anyhow::Result<BTreeMap<String, Vec<String>>>;

    async fn get_available_slots(&self, id: &str, date: &str) -> anyhow::Result<Vec<Slot>>;
}

/// Write side. `book_slot` must be all-or-nothing and guarantee at most
/// one booking wins per (doctor, date, time): `Ok(None)` means somebody
/// else got there first and no record was created.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn book_slot(
        &self,
        doctor_id: &str,
        date: &str,
        time: &str,
        patient: &PatientInfo,
    ) -> anyhow::Result<Option<Booking>>;
}
