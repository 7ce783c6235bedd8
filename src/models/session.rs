use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{DoctorOffer, Slot};

/// The caller-owned key-value bag threaded across turns. This service
/// keeps no copy of it between calls: all conversational continuity lives
/// in what the caller echoes back on the next request.
pub type SessionParams = Map<String, Value>;

pub fn get_str<'a>(params: &'a SessionParams, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str())
}

pub fn get_typed<T: DeserializeOwned>(params: &SessionParams, key: &str) -> Option<T> {
    params
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

pub fn set<T: Serialize>(params: &mut SessionParams, key: &str, value: T) {
    if let Ok(v) = serde_json::to_value(value) {
        params.insert(key.to_string(), v);
    }
}

/// The flow stage recorded in the parameter bag, parsed into a tagged
/// shape so each transition handler works with the fields its stage
/// guarantees instead of poking at a flat map by convention.
///
/// Candidate lists (`offer_doctors`, `available_dates`, `available_slots`)
/// round-trip through the bag in their original order — ordinal selection
/// depends on it.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowStage {
    SymptomIntake,
    SpecialtySuggested,
    AdviceGiven,
    OfferDoctors {
        doctors: Vec<DoctorOffer>,
    },
    NoDoctors,
    DoctorSelected {
        doctor: DoctorOffer,
        available_dates: Vec<String>,
    },
    DateSelected {
        doctor: DoctorOffer,
        selected_date: String,
        available_slots: Vec<Slot>,
    },
    TimeSelected {
        doctor: DoctorOffer,
        selected_slot: Slot,
    },
    Booked {
        booking_id: String,
    },
    Emergency,
}

/// A stage tag was present but its companion parameters were missing or
/// malformed — the caller echoed back a corrupted bag.
#[derive(Debug, Clone, PartialEq)]
pub struct BadStageShape {
    pub stage: &'static str,
    pub missing: &'static str,
}

impl FlowStage {
    pub fn name(&self) -> &'static str {
        match self {
            FlowStage::SymptomIntake => "SYMPTOM_INTAKE",
            FlowStage::SpecialtySuggested => "SPECIALTY_SUGGESTED",
            FlowStage::AdviceGiven => "ADVICE_GIVEN",
            FlowStage::OfferDoctors { .. } => "OFFER_DOCTORS",
            FlowStage::NoDoctors => "NO_DOCTORS",
            FlowStage::DoctorSelected { .. } => "DOCTOR_SELECTED",
            FlowStage::DateSelected { .. } => "DATE_SELECTED",
            FlowStage::TimeSelected { .. } => "TIME_SELECTED",
            FlowStage::Booked { .. } => "BOOKED",
            FlowStage::Emergency => "EMERGENCY",
        }
    }

    /// Parse the stage out of the flat bag. An absent or unrecognized
    /// `next_action` means the conversation has not started.
    pub fn from_params(params: &SessionParams) -> Result<FlowStage, BadStageShape> {
        let stage = match get_str(params, "next_action").unwrap_or("") {
            "SPECIALTY_SUGGESTED" => FlowStage::SpecialtySuggested,
            "ADVICE_GIVEN" => FlowStage::AdviceGiven,
            "OFFER_DOCTORS" => FlowStage::OfferDoctors {
                doctors: get_typed(params, "offer_doctors").ok_or(BadStageShape {
                    stage: "OFFER_DOCTORS",
                    missing: "offer_doctors",
                })?,
            },
            "NO_DOCTORS" => FlowStage::NoDoctors,
            "DOCTOR_SELECTED" => FlowStage::DoctorSelected {
                doctor: get_typed(params, "selected_doctor").ok_or(BadStageShape {
                    stage: "DOCTOR_SELECTED",
                    missing: "selected_doctor",
                })?,
                available_dates: get_typed(params, "available_dates").ok_or(BadStageShape {
                    stage: "DOCTOR_SELECTED",
                    missing: "available_dates",
                })?,
            },
            "DATE_SELECTED" => FlowStage::DateSelected {
                doctor: get_typed(params, "selected_doctor").ok_or(BadStageShape {
                    stage: "DATE_SELECTED",
                    missing: "selected_doctor",
                })?,
                selected_date: get_typed(params, "selected_date").ok_or(BadStageShape {
                    stage: "DATE_SELECTED",
                    missing: "selected_date",
                })?,
                available_slots: get_typed(params, "available_slots").ok_or(BadStageShape {
                    stage: "DATE_SELECTED",
                    missing: "available_slots",
                })?,
            },
            "TIME_SELECTED" => FlowStage::TimeSelected {
                doctor: get_typed(params, "selected_doctor").ok_or(BadStageShape {
                    stage: "TIME_SELECTED",
                    missing: "selected_doctor",
                })?,
                selected_slot: get_typed(params, "selected_slot").ok_or(BadStageShape {
                    stage: "TIME_SELECTED",
                    missing: "selected_slot",
                })?,
            },
            "BOOKED" => FlowStage::Booked {
                booking_id: get_typed(params, "booking_id").ok_or(BadStageShape {
                    stage: "BOOKED",
                    missing: "booking_id",
                })?,
            },
            "EMERGENCY" => FlowStage::Emergency,
            _ => FlowStage::SymptomIntake,
        };
        Ok(stage)
    }

    /// Write the stage tag and its companion shapes back into the flat
    /// bag. Presentation extras (symptoms, advice flags) stay with the
    /// transition handlers; everything positional goes through here.
    pub fn apply(&self, params: &mut SessionParams) {
        set(params, "next_action", self.name());
        match self {
            FlowStage::OfferDoctors { doctors } => {
                set(params, "offer_doctors", doctors);
            }
            FlowStage::DoctorSelected {
                doctor,
                available_dates,
            } => {
                set(params, "selected_doctor", doctor);
                set(params, "available_dates", available_dates);
            }
            FlowStage::DateSelected {
                doctor,
                selected_date,
                available_slots,
            } => {
                set(params, "selected_doctor", doctor);
                set(params, "selected_date", selected_date);
                set(params, "available_slots", available_slots);
            }
            FlowStage::TimeSelected {
                doctor,
                selected_slot,
            } => {
                set(params, "selected_doctor", doctor);
                set(params, "selected_slot", selected_slot);
            }
            FlowStage::Booked { booking_id } => {
                set(params, "booking_id", booking_id);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn offer() -> DoctorOffer {
        DoctorOffer {
            id: "den-001".to_string(),
            name: "Dr Emily Carter, BDS".to_string(),
            specialty: "dentist".to_string(),
            city: "London".to_string(),
            clinic: "London Dental Clinic".to_string(),
            next_available: Some("2025-09-01 09:00".to_string()),
        }
    }

    #[test]
    fn test_empty_bag_parses_as_intake() {
        let params = SessionParams::new();
        assert_eq!(FlowStage::from_params(&params), Ok(FlowStage::SymptomIntake));
    }

    #[test]
    fn test_unknown_next_action_parses_as_intake() {
        let mut params = SessionParams::new();
        set(&mut params, "next_action", "SOMETHING_ELSE");
        assert_eq!(FlowStage::from_params(&params), Ok(FlowStage::SymptomIntake));
    }

    #[test]
    fn test_offer_doctors_round_trip_preserves_order() {
        let mut a = offer();
        let mut b = offer();
        a.id = "gp-005".to_string();
        b.id = "gp-012".to_string();
        let stage = FlowStage::OfferDoctors {
            doctors: vec![a.clone(), b.clone()],
        };

        let mut params = SessionParams::new();
        stage.apply(&mut params);
        match FlowStage::from_params(&params).unwrap() {
            FlowStage::OfferDoctors { doctors } => {
                assert_eq!(doctors[0].id, "gp-005");
                assert_eq!(doctors[1].id, "gp-012");
            }
            other => panic!("unexpected stage: {other:?}"),
        }
    }

    #[test]
    fn test_stage_tag_without_companion_shape_is_rejected() {
        let mut params = SessionParams::new();
        set(&mut params, "next_action", "OFFER_DOCTORS");
        let err = FlowStage::from_params(&params).unwrap_err();
        assert_eq!(err.missing, "offer_doctors");
    }

    #[test]
    fn test_malformed_companion_shape_is_rejected() {
        let mut params = SessionParams::new();
        set(&mut params, "next_action", "OFFER_DOCTORS");
        params.insert("offer_doctors".to_string(), json!("not a list"));
        assert!(FlowStage::from_params(&params).is_err());
    }

    #[test]
    fn test_collect_contact_round_trip() {
        let stage = FlowStage::TimeSelected {
            doctor: offer(),
            selected_slot: Slot::new("den-001", "2025-09-01", "09:00"),
        };
        let mut params = SessionParams::new();
        stage.apply(&mut params);
        let parsed = FlowStage::from_params(&params).unwrap();
        assert_eq!(parsed, stage);
    }
}
