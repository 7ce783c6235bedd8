use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{DoctorOffer, Slot};

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Resolve the first run of digits in the utterance as a 1-based index
/// into a candidate list of `len` items. Returns the 0-based index.
/// Ordinal selection always wins over fuzzy matching.
pub fn resolve_index(utterance: &str, len: usize) -> Option<usize> {
    let run = DIGIT_RUN.find(utterance)?;
    let n: usize = run.as_str().parse().ok()?;
    if n >= 1 && n <= len {
        Some(n - 1)
    } else {
        None
    }
}

/// Match an utterance against an offered doctor list: ordinal first, then
/// any whitespace token of a candidate's name appearing in the utterance.
/// `None` means NO_MATCH — the caller must re-ask with the same list.
pub fn resolve_doctor<'a>(utterance: &str, candidates: &'a [DoctorOffer]) -> Option<&'a DoctorOffer> {
    let text = utterance.to_lowercase();

    if let Some(idx) = resolve_index(&text, candidates.len()) {
        return Some(&candidates[idx]);
    }

    candidates.iter().find(|doctor| {
        doctor
            .name
            .to_lowercase()
            .split_whitespace()
            .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()))
            .any(|token| !token.is_empty() && text.contains(token))
    })
}

/// Match against offered ISO dates: ordinal first, then the literal date,
/// then the long or short weekday name.
pub fn resolve_date<'a>(utterance: &str, candidates: &'a [String]) -> Option<&'a String> {
    let text = utterance.to_lowercase();

    if let Some(idx) = resolve_index(&text, candidates.len()) {
        return Some(&candidates[idx]);
    }

    candidates.iter().find(|date| {
        if text.contains(date.as_str()) {
            return true;
        }
        let Ok(parsed) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
            return false;
        };
        let long = parsed.format("%A").to_string().to_lowercase();
        let short = parsed.format("%a").to_string().to_lowercase();
        text.contains(&long) || text.contains(&short)
    })
}

/// Match against offered time slots: ordinal first, then the literal
/// "HH:MM" or its digit-only form ("14:30" / "1430").
pub fn resolve_time<'a>(utterance: &str, candidates: &'a [Slot]) -> Option<&'a Slot> {
    let text = utterance.to_lowercase();

    if let Some(idx) = resolve_index(&text, candidates.len()) {
        return Some(&candidates[idx]);
    }

    candidates.iter().find(|slot| {
        let compact = slot.time.replace(':', "");
        text.contains(&slot.time) || text.contains(&compact)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offers(names: &[&str]) -> Vec<DoctorOffer> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| DoctorOffer {
                id: format!("doc-{i}"),
                name: name.to_string(),
                specialty: "gp".to_string(),
                city: "London".to_string(),
                clinic: "Test Clinic".to_string(),
                next_available: None,
            })
            .collect()
    }

    fn slots(times: &[&str]) -> Vec<Slot> {
        times
            .iter()
            .map(|t| Slot::new("doc-0", "2025-09-01", t))
            .collect()
    }

    #[test]
    fn test_every_in_bounds_ordinal_resolves() {
        for len in 1..=5 {
            for k in 1..=len {
                assert_eq!(resolve_index(&k.to_string(), len), Some(k - 1));
            }
        }
    }

    #[test]
    fn test_out_of_bounds_ordinal_is_no_match() {
        assert_eq!(resolve_index("0", 3), None);
        assert_eq!(resolve_index("4", 3), None);
        assert_eq!(resolve_index("17", 3), None);
    }

    #[test]
    fn test_no_digits_is_no_match() {
        assert_eq!(resolve_index("the first one", 3), None);
    }

    #[test]
    fn test_first_digit_run_wins() {
        // "number 2 of 3" — the 2 is what counts.
        assert_eq!(resolve_index("number 2 of 3", 3), Some(1));
    }

    #[test]
    fn test_doctor_by_ordinal_beats_name() {
        let list = offers(&["Dr Emily Carter, BDS", "Dr James Walker, BDS"]);
        // "1" picks Carter even though the utterance also mentions Walker.
        let chosen = resolve_doctor("1 not walker", &list).unwrap();
        assert_eq!(chosen.name, "Dr Emily Carter, BDS");
    }

    #[test]
    fn test_doctor_by_name_token() {
        let list = offers(&["Dr Emily Carter, BDS", "Dr James Walker, BDS"]);
        let chosen = resolve_doctor("walker please", &list).unwrap();
        assert_eq!(chosen.name, "Dr James Walker, BDS");
    }

    #[test]
    fn test_doctor_name_token_punctuation_stripped() {
        let list = offers(&["Dr Emily Carter, BDS"]);
        assert!(resolve_doctor("carter", &list).is_some());
    }

    #[test]
    fn test_doctor_no_match_returns_none() {
        let list = offers(&["Dr Emily Carter, BDS"]);
        assert!(resolve_doctor("someone else entirely", &list).is_none());
    }

    #[test]
    fn test_date_by_weekday_name() {
        // 2025-09-01 is a Monday, 2025-09-02 a Tuesday.
        let dates = vec!["2025-09-01".to_string(), "2025-09-02".to_string()];
        assert_eq!(resolve_date("monday works", &dates), Some(&dates[0]));
        assert_eq!(resolve_date("tue please", &dates), Some(&dates[1]));
    }

    #[test]
    fn test_date_by_literal() {
        let dates = vec!["2025-09-01".to_string()];
        assert_eq!(resolve_date("2025-09-01", &dates), Some(&dates[0]));
    }

    #[test]
    fn test_time_by_literal_and_compact_form() {
        let list = slots(&["09:00", "14:30"]);
        assert_eq!(resolve_time("14:30 please", &list), Some(&list[1]));
        assert_eq!(resolve_time("how about 1430", &list), Some(&list[1]));
    }

    #[test]
    fn test_time_ordinal_wins_over_literal() {
        let list = slots(&["09:00", "14:30"]);
        // "1" is an ordinal for the first slot, not part of a time.
        assert_eq!(resolve_time("1", &list), Some(&list[0]));
    }

    #[test]
    fn test_time_no_match() {
        let list = slots(&["09:00"]);
        assert!(resolve_time("half past nine", &list).is_none());
    }
}
