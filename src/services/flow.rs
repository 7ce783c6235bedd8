use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::AppError;
use crate::models::session::{get_str, get_typed, set};
use crate::models::{DoctorOffer, FlowStage, PatientInfo, SessionParams, Slot, Trigger};
use crate::services::classifier::{lexicon, Classification};
use crate::services::directory::DoctorQuery;
use crate::services::reply::TurnOutcome;
use crate::services::{advice, emergency, extract, selection};
use crate::state::AppState;

const APOLOGY: &str = "Sorry, I'm having trouble right now. Please try again in a moment.";
const EMERGENCY_TEXT: &str = "This could be an emergency. Please call your local emergency \
                              number now or go to the nearest emergency department.";
const FALLBACK_TEXT: &str =
    "I can help you find healthcare services. Try describing your symptoms.";

static MENU_ADVICE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^1$|^advice$|get.*advice|medical.*advice").unwrap());
static MENU_DOCTORS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^2$|^doctors?$|show.*doctor|available.*doctor|find.*doctor|book").unwrap()
});
static YES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(yes|yeah|yep|ok|okay|sure|please)\b").unwrap());

/// One conversational turn: a pure function of (trigger, parameter bag,
/// utterance) given fixed collaborator responses. Never fails — every
/// error is folded into a reply that leaves the caller's parameters in a
/// resumable state.
pub async fn handle_turn(
    state: &AppState,
    trigger: Trigger,
    params: SessionParams,
    utterance: &str,
) -> TurnOutcome {
    let original = params.clone();

    tracing::info!(
        trigger = ?trigger,
        stage = get_str(&params, "next_action").unwrap_or("SYMPTOM_INTAKE"),
        "processing turn"
    );

    match dispatch(state, trigger, params, utterance).await {
        Ok(outcome) => outcome,
        Err(AppError::Validation(guidance)) => TurnOutcome::new(guidance, original),
        Err(AppError::NotFound(what)) => {
            tracing::warn!(what = %what, "stale selection, re-offering doctors");
            let mut params = original;
            set(&mut params, "next_action", "OFFER_DOCTORS");
            TurnOutcome::new(
                "I couldn't find that doctor's details anymore. Let's look at the list \
                 again — which doctor would you like?",
                params,
            )
        }
        Err(err) => {
            tracing::error!(error = %err, "turn failed, state unchanged");
            TurnOutcome::new(APOLOGY, original)
        }
    }
}

async fn dispatch(
    state: &AppState,
    trigger: Trigger,
    params: SessionParams,
    utterance: &str,
) -> Result<TurnOutcome, AppError> {
    // The screener pre-empts everything, from any state.
    if emergency::is_emergency(utterance) {
        return Ok(emergency_outcome(params));
    }

    let text = utterance.trim().to_lowercase();

    match trigger {
        Trigger::DescribeSymptom => intake(state, params, utterance).await,
        Trigger::ProvideAdvice => give_advice(params),
        Trigger::ShowDoctors => show_doctors(state, params).await,
        Trigger::ConfirmYes => match parse_stage(&params)? {
            FlowStage::AdviceGiven => show_doctors(state, params).await,
            FlowStage::Booked { booking_id } => Ok(booked_ack(params, &booking_id)),
            _ => Ok(TurnOutcome::new(FALLBACK_TEXT, params)),
        },
        Trigger::ChooseDoctor => match parse_stage(&params)? {
            FlowStage::OfferDoctors { doctors } => {
                choose_doctor(state, params, doctors, &text).await
            }
            _ => Ok(TurnOutcome::new(FALLBACK_TEXT, params)),
        },
        Trigger::ChooseDate | Trigger::ChooseTime => match parse_stage(&params)? {
            FlowStage::DoctorSelected {
                doctor,
                available_dates,
            } => choose_date(state, params, doctor, available_dates, &text).await,
            FlowStage::DateSelected {
                doctor,
                available_slots,
                ..
            } => choose_time(params, doctor, available_slots, &text),
            // After a lost booking race the slot list is still in the bag,
            // so the user can pick a different time without going back.
            FlowStage::TimeSelected { doctor, .. } => {
                let slots: Vec<Slot> =
                    get_typed(&params, "available_slots").unwrap_or_default();
                choose_time(params, doctor, slots, &text)
            }
            _ => Ok(TurnOutcome::new(FALLBACK_TEXT, params)),
        },
        Trigger::ProvideContact => match parse_stage(&params)? {
            FlowStage::TimeSelected {
                doctor,
                selected_slot,
            } => provide_contact(state, params, doctor, selected_slot, utterance).await,
            FlowStage::DateSelected { .. } => Err(AppError::Validation(
                "I don't have a selected time yet. Please pick a time from the list first."
                    .to_string(),
            )),
            _ => Ok(TurnOutcome::new(FALLBACK_TEXT, params)),
        },
        Trigger::Numeric(n) => numeric_reply(state, params, n).await,
        Trigger::Unknown => unknown(state, params, utterance).await,
    }
}

fn parse_stage(params: &SessionParams) -> Result<FlowStage, AppError> {
    FlowStage::from_params(params).map_err(|bad| {
        tracing::warn!(stage = bad.stage, missing = bad.missing, "corrupt session shape");
        AppError::Validation(
            "I'm sorry, I lost track of our conversation. Could you describe your \
             symptoms again?"
                .to_string(),
        )
    })
}

// ── Transition handlers ──

async fn intake(
    state: &AppState,
    mut params: SessionParams,
    utterance: &str,
) -> Result<TurnOutcome, AppError> {
    let symptoms = if utterance.trim().is_empty() {
        get_str(&params, "symptoms").unwrap_or_default().to_string()
    } else {
        utterance.trim().to_string()
    };

    if symptoms.is_empty() {
        return Err(AppError::Validation(
            "Could you describe your symptoms? For example: \"I have a toothache\"."
                .to_string(),
        ));
    }

    // Heuristic extraction only fills fields structured input left empty.
    let criteria = extract::extract_criteria(&symptoms);
    if get_str(&params, "location").is_none() {
        if let Some(city) = &criteria.location {
            set(&mut params, "location", city);
        }
    }
    if get_str(&params, "preferred_date").is_none() {
        if let Some(date) = &criteria.date {
            set(&mut params, "preferred_date", date);
        }
    }

    let classification = match (get_str(&params, "specialty"), &criteria.specialty) {
        (Some(specialty), _) => Classification {
            specialty: specialty.to_string(),
            display_name: get_str(&params, "specialty_display_name")
                .unwrap_or(lexicon::display_name_for(specialty))
                .to_string(),
        },
        (None, Some(specialty)) => Classification {
            specialty: specialty.clone(),
            display_name: lexicon::display_name_for(specialty).to_string(),
        },
        (None, None) => match state.classifier.classify(&symptoms).await {
            Ok(classification) => classification,
            Err(err) => {
                tracing::warn!(error = %err, "classifier failed, using lexicon fallback");
                lexicon::classify_text(&symptoms)
            }
        },
    };

    set(&mut params, "symptoms", &symptoms);
    set(&mut params, "specialty", &classification.specialty);
    set(
        &mut params,
        "specialty_display_name",
        &classification.display_name,
    );
    FlowStage::SpecialtySuggested.apply(&mut params);

    let display = &classification.display_name;
    let text = format!(
        "I understand you have symptoms related to {}. Based on this, {display} would be \
         appropriate.\n\nWhat would you like me to help you with?\n\n1. Get medical advice \
         for your symptoms\n2. Show available {display} for an appointment\n\nPlease \
         choose 1 or 2, or tell me \"advice\" or \"doctors\".",
        symptoms.to_lowercase()
    );
    Ok(TurnOutcome::new(text, params))
}

fn give_advice(mut params: SessionParams) -> Result<TurnOutcome, AppError> {
    let specialty = get_str(&params, "specialty").unwrap_or("gp").to_string();
    let symptoms = get_str(&params, "symptoms")
        .unwrap_or("your symptoms")
        .to_string();

    let advice = advice::advice_for(&specialty);
    set(&mut params, "advice_given", true);
    FlowStage::AdviceGiven.apply(&mut params);

    let text = format!(
        "Here's some advice for {symptoms}:\n\n{advice}\n\nImportant: This is general \
         information only. Please consult with a healthcare professional for proper \
         medical advice.\n\nWould you still like to see available doctors for an \
         appointment?"
    );
    Ok(TurnOutcome::new(text, params))
}

async fn show_doctors(
    state: &AppState,
    mut params: SessionParams,
) -> Result<TurnOutcome, AppError> {
    let specialty = get_str(&params, "specialty").unwrap_or("gp").to_string();
    let display = get_str(&params, "specialty_display_name")
        .unwrap_or(lexicon::display_name_for(&specialty))
        .to_string();
    let location = get_str(&params, "location").map(str::to_string);

    let query = DoctorQuery {
        specialty: Some(specialty),
        location: location.clone(),
        modality: None,
        limit: 5,
    };
    let doctors = state
        .directory
        .list_doctors(&query)
        .await
        .map_err(|e| AppError::Collaborator(format!("doctor directory: {e}")))?;

    if doctors.is_empty() {
        FlowStage::NoDoctors.apply(&mut params);
        return Ok(TurnOutcome::new(
            format!(
                "I couldn't find any {display} available right now. Would you like me to \
                 search for a different specialty?"
            ),
            params,
        ));
    }

    let offers: Vec<DoctorOffer> = doctors.iter().map(DoctorOffer::from).collect();
    let lines = offers
        .iter()
        .enumerate()
        .map(|(i, d)| match &d.next_available {
            Some(when) => format!(
                "{}. {} — {}. Next available: {}",
                i + 1,
                d.name,
                d.clinic,
                format_when(when)
            ),
            None => format!("{}. {} — {}", i + 1, d.name, d.clinic),
        })
        .collect::<Vec<_>>()
        .join("\n");

    let place = location.map(|l| format!(" in {l}")).unwrap_or_default();
    FlowStage::OfferDoctors { doctors: offers }.apply(&mut params);

    let text = format!(
        "Here are available {display}{place}:\n\n{lines}\n\nWhich doctor would you like \
         to book with? (You can say the number or the name.)"
    );
    Ok(TurnOutcome::new(text, params))
}

async fn choose_doctor(
    state: &AppState,
    mut params: SessionParams,
    doctors: Vec<DoctorOffer>,
    text: &str,
) -> Result<TurnOutcome, AppError> {
    let Some(chosen) = selection::resolve_doctor(text, &doctors) else {
        // NO_MATCH: re-ask against the identical list.
        return Ok(TurnOutcome::new(
            "I couldn't match that doctor. Please say the number from the list or the \
             doctor's name.",
            params,
        ));
    };
    let chosen = chosen.clone();

    let doctor = state
        .directory
        .get_doctor_by_id(&chosen.id)
        .await
        .map_err(|e| AppError::Collaborator(format!("doctor directory: {e}")))?
        .ok_or_else(|| AppError::NotFound(format!("doctor {}", chosen.id)))?;

    let availability = state
        .directory
        .get_availability(&doctor.id, None, None)
        .await
        .map_err(|e| AppError::Collaborator(format!("doctor directory: {e}")))?;

    let available_dates: Vec<String> = availability
        .iter()
        .filter(|(_, times)| !times.is_empty())
        .map(|(date, _)| date.clone())
        .collect();

    if available_dates.is_empty() {
        FlowStage::OfferDoctors { doctors }.apply(&mut params);
        return Ok(TurnOutcome::new(
            format!(
                "No open times for {} right now. Would you like to book with another \
                 doctor from the list?",
                doctor.name
            ),
            params,
        ));
    }

    let lines = available_dates
        .iter()
        .enumerate()
        .map(|(i, date)| format!("{}. {}", i + 1, format_date(date)))
        .collect::<Vec<_>>()
        .join("\n");

    set(&mut params, "availability", &availability);
    FlowStage::DoctorSelected {
        doctor: chosen.clone(),
        available_dates,
    }
    .apply(&mut params);

    let text = format!(
        "Selected: {}. Here are the available days:\n\n{lines}\n\nWhich day works for \
         you? (Say the number or the day.)",
        chosen.name
    );
    Ok(TurnOutcome::new(text, params))
}

async fn choose_date(
    state: &AppState,
    mut params: SessionParams,
    doctor: DoctorOffer,
    available_dates: Vec<String>,
    text: &str,
) -> Result<TurnOutcome, AppError> {
    let Some(date) = selection::resolve_date(text, &available_dates) else {
        return Ok(TurnOutcome::new(
            "I couldn't match that day. Please say the number from the list or the day \
             of the week.",
            params,
        ));
    };
    let date = date.clone();

    let slots = state
        .directory
        .get_available_slots(&doctor.id, &date)
        .await
        .map_err(|e| AppError::Collaborator(format!("doctor directory: {e}")))?;

    if slots.is_empty() {
        // Stay on the date list; the offered days are unchanged.
        return Ok(TurnOutcome::new(
            format!(
                "No open times on {}. Please pick another day.",
                format_date(&date)
            ),
            params,
        ));
    }

    let lines = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| format!("{}. {}", i + 1, slot.time))
        .collect::<Vec<_>>()
        .join("\n");

    let day = format_date(&date);
    FlowStage::DateSelected {
        doctor,
        selected_date: date,
        available_slots: slots,
    }
    .apply(&mut params);

    let text = format!(
        "Here are the available times on {day}:\n\n{lines}\n\nWhich time works for you?"
    );
    Ok(TurnOutcome::new(text, params))
}

fn choose_time(
    mut params: SessionParams,
    doctor: DoctorOffer,
    available_slots: Vec<Slot>,
    text: &str,
) -> Result<TurnOutcome, AppError> {
    let Some(slot) = selection::resolve_time(text, &available_slots) else {
        return Ok(TurnOutcome::new(
            "I couldn't match that time. Please say the number from the list or the \
             exact time.",
            params,
        ));
    };
    let slot = slot.clone();

    let text = format!(
        "Great — {} on {}. I just need your full name and a phone number or email to \
         confirm the booking.",
        slot.time,
        format_date(&slot.date)
    );
    FlowStage::TimeSelected {
        doctor,
        selected_slot: slot,
    }
    .apply(&mut params);
    Ok(TurnOutcome::new(text, params))
}

async fn provide_contact(
    state: &AppState,
    mut params: SessionParams,
    doctor: DoctorOffer,
    slot: Slot,
    utterance: &str,
) -> Result<TurnOutcome, AppError> {
    let patient = contact_from(&params, utterance);
    if !patient.is_valid() {
        return Err(AppError::Validation(
            "Please provide your full name and a phone number or email.".to_string(),
        ));
    }

    let booked = state
        .store
        .book_slot(&doctor.id, &slot.date, &slot.time, &patient)
        .await
        .map_err(|e| AppError::Collaborator(format!("booking store: {e}")))?;

    match booked {
        // Lost the race: nothing was written, the slot list is still in
        // the bag, and the stage stays at contact collection.
        None => Ok(TurnOutcome::new(
            "I'm sorry, that time was just taken. Would you like to pick a different \
             time from the list?",
            params,
        )),
        Some(booking) => {
            set(&mut params, "booking_status", booking.status.as_str());
            set(&mut params, "doctor_name", &doctor.name);
            set(&mut params, "appointment_date", &slot.date);
            set(&mut params, "appointment_time", &slot.time);
            FlowStage::Booked {
                booking_id: booking.booking_id.clone(),
            }
            .apply(&mut params);

            tracing::info!(
                booking_id = %booking.booking_id,
                doctor_id = %doctor.id,
                "booking confirmed"
            );
            Ok(TurnOutcome::new(
                format!(
                    "All set! Your appointment with {} on {} at {} is confirmed. \
                     Reference: {}.",
                    doctor.name,
                    format_date(&slot.date),
                    slot.time,
                    booking.booking_id
                ),
                params,
            ))
        }
    }
}

async fn numeric_reply(
    state: &AppState,
    params: SessionParams,
    n: u8,
) -> Result<TurnOutcome, AppError> {
    match parse_stage(&params)? {
        FlowStage::SpecialtySuggested | FlowStage::AdviceGiven => match n {
            1 => give_advice(params),
            2 => show_doctors(state, params).await,
            _ => Ok(menu_reprompt(params)),
        },
        FlowStage::OfferDoctors { doctors } => {
            choose_doctor(state, params, doctors, &n.to_string()).await
        }
        FlowStage::DoctorSelected {
            doctor,
            available_dates,
        } => choose_date(state, params, doctor, available_dates, &n.to_string()).await,
        FlowStage::DateSelected {
            doctor,
            available_slots,
            ..
        } => choose_time(params, doctor, available_slots, &n.to_string()),
        // A time was already picked but the slot list is still in the bag
        // (lost booking race), so a digit re-selects a time.
        FlowStage::TimeSelected { doctor, .. } => {
            let slots: Vec<Slot> = get_typed(&params, "available_slots").unwrap_or_default();
            choose_time(params, doctor, slots, &n.to_string())
        }
        _ => Ok(TurnOutcome::new(FALLBACK_TEXT, params)),
    }
}

/// No recognizable trigger: the utterance is interpreted against whatever
/// the active stage is waiting for. Selection is state-scoped on purpose,
/// so a bare "1" never collides between the advice/doctors menu and a
/// candidate list.
async fn unknown(
    state: &AppState,
    params: SessionParams,
    utterance: &str,
) -> Result<TurnOutcome, AppError> {
    // Matching is case-insensitive, but contact details keep the
    // original casing the user typed.
    let text = &utterance.trim().to_lowercase();
    match parse_stage(&params)? {
        FlowStage::SpecialtySuggested => {
            if MENU_ADVICE.is_match(text) {
                give_advice(params)
            } else if MENU_DOCTORS.is_match(text) {
                show_doctors(state, params).await
            } else {
                Ok(menu_reprompt(params))
            }
        }
        FlowStage::AdviceGiven => {
            if YES.is_match(text) || MENU_DOCTORS.is_match(text) {
                show_doctors(state, params).await
            } else {
                Ok(TurnOutcome::new(
                    "Would you like to see available doctors for an appointment? \
                     (yes/no)",
                    params,
                ))
            }
        }
        FlowStage::OfferDoctors { doctors } => choose_doctor(state, params, doctors, text).await,
        FlowStage::DoctorSelected {
            doctor,
            available_dates,
        } => choose_date(state, params, doctor, available_dates, text).await,
        FlowStage::DateSelected {
            doctor,
            available_slots,
            ..
        } => choose_time(params, doctor, available_slots, text),
        FlowStage::TimeSelected {
            doctor,
            selected_slot,
        } => provide_contact(state, params, doctor, selected_slot, utterance).await,
        FlowStage::Booked { booking_id } => Ok(booked_ack(params, &booking_id)),
        FlowStage::Emergency => Ok(emergency_outcome(params)),
        FlowStage::SymptomIntake | FlowStage::NoDoctors => {
            if MENU_DOCTORS.is_match(text) {
                show_doctors(state, params).await
            } else if MENU_ADVICE.is_match(text) {
                give_advice(params)
            } else {
                Ok(TurnOutcome::new(FALLBACK_TEXT, params))
            }
        }
    }
}

// ── Shared outcomes & helpers ──

fn emergency_outcome(mut params: SessionParams) -> TurnOutcome {
    FlowStage::Emergency.apply(&mut params);
    let mut outcome = TurnOutcome::new(EMERGENCY_TEXT, params);
    outcome.target_page = Some("emergency".to_string());
    outcome
}

fn menu_reprompt(params: SessionParams) -> TurnOutcome {
    TurnOutcome::new(
        "Please choose either:\n\n1. Get medical advice for your symptoms\n2. Show \
         available doctors for an appointment\n\nYou can type '1', '2', 'advice', or \
         'doctors'.",
        params,
    )
}

/// A finished booking is immutable from this side: later turns only ever
/// acknowledge it.
fn booked_ack(params: SessionParams, booking_id: &str) -> TurnOutcome {
    TurnOutcome::new(
        format!(
            "You're all set — booking {booking_id} is confirmed. If you need anything \
             else, just describe your symptoms."
        ),
        params,
    )
}

/// Build patient contact details: structured parameters win, free text
/// fills in the gaps.
fn contact_from(params: &SessionParams, utterance: &str) -> PatientInfo {
    let (name, email, phone) = parse_contact(utterance);
    PatientInfo {
        name: get_str(params, "patient_name")
            .map(str::to_string)
            .or(name)
            .unwrap_or_default(),
        email: get_str(params, "patient_email").map(str::to_string).or(email),
        phone: get_str(params, "patient_phone").map(str::to_string).or(phone),
    }
}

/// Pull {name, email, phone} out of a free-text reply like
/// "Jane Doe, jane@x.com" or "John Smith 07700 900123".
fn parse_contact(utterance: &str) -> (Option<String>, Option<String>, Option<String>) {
    const LEAD_INS: &[&str] = &["my", "name", "is", "i'm", "im", "it's", "its", "this", "and"];

    let mut email = None;
    let mut phone: Option<String> = None;
    let mut name_words: Vec<&str> = Vec::new();

    for raw in utterance.split([',', ';']).flat_map(str::split_whitespace) {
        let token = raw.trim_matches(|c: char| c == '.' || c == ',');
        if token.is_empty() {
            continue;
        }

        if token.contains('@') {
            if email.is_none() {
                email = Some(token.to_string());
            }
            continue;
        }

        // Glue a split phone number ("07700 900123", "+44 7700 900123")
        // back together. A leading '+' only counts on the first fragment.
        let digits: String = token.chars().filter(|c| c.is_ascii_digit()).collect();
        let bare = token.strip_prefix('+').unwrap_or(token);
        if !digits.is_empty() && digits.len() == bare.len() {
            match &mut phone {
                Some(p) => p.push_str(&digits),
                None if token.starts_with('+') => phone = Some(format!("+{digits}")),
                None => phone = Some(digits),
            }
            continue;
        }
        // Punctuated numbers ("0770-900-1234") arrive as one token.
        if digits.len() >= 7 {
            if phone.is_none() {
                let cleaned: String = token
                    .chars()
                    .filter(|c| c.is_ascii_digit() || *c == '+')
                    .collect();
                phone = Some(cleaned);
            }
            continue;
        }

        if !LEAD_INS.contains(&token.to_lowercase().as_str())
            && token.chars().any(|c| c.is_alphabetic())
        {
            name_words.push(token);
        }
    }

    // A short digit fragment on its own is not a phone number.
    if phone.as_deref().map(|p| p.trim_start_matches('+').len() < 7) == Some(true) {
        phone = None;
    }

    let name = if name_words.is_empty() {
        None
    } else {
        Some(name_words.join(" "))
    };
    (name, email, phone)
}

fn format_date(date: &str) -> String {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%A %-d %B").to_string())
        .unwrap_or_else(|_| date.to_string())
}

fn format_when(when: &str) -> String {
    chrono::NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M")
        .map(|dt| dt.format("%a %-d %b, %H:%M").to_string())
        .unwrap_or_else(|_| when.to_string())
}
