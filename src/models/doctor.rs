use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A doctor record from the directory. The availability map is keyed by
/// ISO date; the BTreeMap keeps dates ascending and times within a date
/// are stored ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub city: String,
    pub clinic: String,
    pub modality: String,
    pub availability: BTreeMap<String, Vec<String>>,
}

impl Doctor {
    /// Earliest open (date, time) pair, if any.
    pub fn next_available(&self) -> Option<(&str, &str)> {
        self.availability
            .iter()
            .find(|(_, times)| !times.is_empty())
            .map(|(date, times)| (date.as_str(), times[0].as_str()))
    }
}

/// The slice of a doctor that gets offered to the user and echoed back
/// through the session parameters. Positional order inside an offer list
/// is significant: "number 2" must keep meaning the same doctor on the
/// next turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorOffer {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub city: String,
    pub clinic: String,
    pub next_available: Option<String>,
}

impl From<&Doctor> for DoctorOffer {
    fn from(doctor: &Doctor) -> Self {
        Self {
            id: doctor.id.clone(),
            name: doctor.name.clone(),
            specialty: doctor.specialty.clone(),
            city: doctor.city.clone(),
            clinic: doctor.clinic.clone(),
            next_available: doctor
                .next_available()
                .map(|(date, time)| format!("{date} {time}")),
        }
    }
}

/// A concrete bookable (doctor, date, time) tuple. Derived from the
/// availability map on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub slot_id: String,
    pub date: String,
    pub time: String,
    pub datetime_iso: String,
    pub available: bool,
}

impl Slot {
    pub fn new(doctor_id: &str, date: &str, time: &str) -> Self {
        Self {
            slot_id: format!("{doctor_id}-{date}-{time}"),
            date: date.to_string(),
            time: time.to_string(),
            datetime_iso: format!("{date}T{time}:00"),
            available: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doctor_with_availability(entries: &[(&str, &[&str])]) -> Doctor {
        let availability = entries
            .iter()
            .map(|(date, times)| {
                (
                    date.to_string(),
                    times.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Doctor {
            id: "den-001".to_string(),
            name: "Dr Emily Carter, BDS".to_string(),
            specialty: "dentist".to_string(),
            city: "London".to_string(),
            clinic: "London Dental Clinic".to_string(),
            modality: "in_person".to_string(),
            availability,
        }
    }

    #[test]
    fn test_next_available_takes_earliest_date() {
        let doctor = doctor_with_availability(&[
            ("2025-09-02", &["10:00", "11:00"]),
            ("2025-09-01", &["09:00"]),
        ]);
        assert_eq!(doctor.next_available(), Some(("2025-09-01", "09:00")));
    }

    #[test]
    fn test_next_available_skips_empty_dates() {
        let doctor =
            doctor_with_availability(&[("2025-09-01", &[]), ("2025-09-02", &["14:00"])]);
        assert_eq!(doctor.next_available(), Some(("2025-09-02", "14:00")));
    }

    #[test]
    fn test_next_available_none_when_fully_booked() {
        let doctor = doctor_with_availability(&[]);
        assert_eq!(doctor.next_available(), None);
    }

    #[test]
    fn test_slot_id_and_datetime_shape() {
        let slot = Slot::new("den-001", "2025-09-01", "09:30");
        assert_eq!(slot.slot_id, "den-001-2025-09-01-09:30");
        assert_eq!(slot.datetime_iso, "2025-09-01T09:30:00");
        assert!(slot.available);
    }
}
