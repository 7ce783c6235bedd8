use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub booking_id: String,
    pub doctor_id: String,
    pub date: String,
    pub time: String,
    pub patient: PatientInfo,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
}

/// Contact details collected on the final turn. A booking requires a name
/// plus at least one of email or phone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl PatientInfo {
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && (self.email.is_some() || self.phone.is_some())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Confirmed,
        }
    }
}
