/// Canonical identifier of the detected intent for the current turn.
/// Derived from the raw webhook payload on every call, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    DescribeSymptom,
    ProvideAdvice,
    ShowDoctors,
    ChooseDoctor,
    ChooseDate,
    ChooseTime,
    ProvideContact,
    ConfirmYes,
    /// A bare numeric reply the upstream NLU misrouted as a date/time
    /// intent. Resolved against the active flow stage, never globally.
    Numeric(u8),
    Unknown,
}

/// The only place raw tags are allowed to map onto canonical triggers.
/// Alias, typo, and hyphen variants are enumerated explicitly — no fuzzy
/// matching, so a new upstream spelling fails loudly as Unknown instead
/// of silently misrouting.
fn canonical(tag: &str) -> Option<Trigger> {
    let trigger = match tag {
        "DESCRIBE_SYMPTOM" | "DESCRIBE_SYMPTOM_IR" | "DESCRIBE_SYMTOM" | "DESCRIBE_SYMTOM_IR"
        | "DESCRIBE-SYMTOM_IR" => Trigger::DescribeSymptom,
        "PROVIDE_ADVICE" | "ASK_ADVICE" | "ASK_ADVICE_IR" | "GIVE_ADVICE" => {
            Trigger::ProvideAdvice
        }
        "SHOW_DOCTORS" | "CHOOSE_DOCTORS" | "CHOOSE_SPECIALIST" | "CHOOSE_SPECIALIST_IR"
        | "FIND_DOCTORS" => Trigger::ShowDoctors,
        "CHOOSE_DOCTOR" | "CHOOSE_DOCTOR_IR" => Trigger::ChooseDoctor,
        "CHOOSE_DATE" | "CHOOSE_DATE_IR" | "PROVIDE_DATE" | "PROVIDE_DATE_TIME" => {
            Trigger::ChooseDate
        }
        "CHOOSE_TIME" | "CHOOSE_TIME_IR" | "CHOOSE_TIMESLOT" | "CHOOSE_TIMESLOT_IR" => {
            Trigger::ChooseTime
        }
        "PROVIDE_CONTACT" | "PROVIDE_CONTACT_IR" => Trigger::ProvideContact,
        "CONFIRM_YES" | "CONFIRM" => Trigger::ConfirmYes,
        _ => return None,
    };
    Some(trigger)
}

impl Trigger {
    /// Map the raw payload fields to a canonical [`Trigger`].
    ///
    /// A `fulfillmentInfo.tag` wins over `intentInfo.displayName`. Tags
    /// arrive with stray quotes and whitespace from the console, so they
    /// are cleaned before lookup. A `PROVIDE_DATE_TIME` tag whose literal
    /// utterance is exactly "1" or "2" is a misfired numeric menu reply
    /// and is reported as such; the state machine decides what the digit
    /// means for the active stage.
    pub fn normalize(tag: Option<&str>, display_name: Option<&str>, utterance: &str) -> Trigger {
        if let Some(raw) = tag {
            let cleaned = raw.replace(['\'', '"'], "").trim().to_uppercase();
            if cleaned == "PROVIDE_DATE_TIME" {
                match utterance.trim() {
                    "1" => return Trigger::Numeric(1),
                    "2" => return Trigger::Numeric(2),
                    _ => {}
                }
            }
            return canonical(&cleaned).unwrap_or(Trigger::Unknown);
        }

        if let Some(name) = display_name {
            return canonical(&name.trim().to_uppercase()).unwrap_or(Trigger::Unknown);
        }

        Trigger::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_describe_symptom_spellings_normalize_identically() {
        for tag in [
            "DESCRIBE_SYMPTOM",
            "DESCRIBE_SYMPTOM_IR",
            "DESCRIBE_SYMTOM",
            "DESCRIBE_SYMTOM_IR",
            "DESCRIBE-SYMTOM_IR",
        ] {
            assert_eq!(
                Trigger::normalize(Some(tag), None, "I have a toothache"),
                Trigger::DescribeSymptom,
                "tag {tag} did not normalize"
            );
        }
    }

    #[test]
    fn test_tag_is_cleaned_before_lookup() {
        assert_eq!(
            Trigger::normalize(Some("  \"describe_symptom\" "), None, ""),
            Trigger::DescribeSymptom
        );
        assert_eq!(
            Trigger::normalize(Some("'PROVIDE_CONTACT'"), None, ""),
            Trigger::ProvideContact
        );
    }

    #[test]
    fn test_misfired_date_time_tag_with_bare_numeric_reply() {
        assert_eq!(
            Trigger::normalize(Some("PROVIDE_DATE_TIME"), None, "1"),
            Trigger::Numeric(1)
        );
        assert_eq!(
            Trigger::normalize(Some("PROVIDE_DATE_TIME"), None, " 2 "),
            Trigger::Numeric(2)
        );
        // Anything else keeps the tag's date/time meaning.
        assert_eq!(
            Trigger::normalize(Some("PROVIDE_DATE_TIME"), None, "next monday"),
            Trigger::ChooseDate
        );
    }

    #[test]
    fn test_display_name_fallback_when_no_tag() {
        assert_eq!(
            Trigger::normalize(None, Some("show_doctors"), ""),
            Trigger::ShowDoctors
        );
    }

    #[test]
    fn test_unknown_when_neither_present() {
        assert_eq!(Trigger::normalize(None, None, "hello"), Trigger::Unknown);
    }

    #[test]
    fn test_unrecognized_tag_is_unknown_not_fuzzy_matched() {
        assert_eq!(Trigger::normalize(Some("DESCRIBE_SYMPTOMS_V2"), None, ""), Trigger::Unknown);
    }

    #[test]
    fn test_advice_aliases() {
        for tag in ["PROVIDE_ADVICE", "ASK_ADVICE", "ASK_ADVICE_IR", "GIVE_ADVICE"] {
            assert_eq!(Trigger::normalize(Some(tag), None, ""), Trigger::ProvideAdvice);
        }
    }
}
