use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::ParsedCriteria;

/// Ordered specialty lexicon. The scan takes the first term that appears
/// as a literal substring, so overlapping terms are tie-broken by
/// position — "dentist" must come before "ent", which it contains.
const SPECIALTY_LEXICON: &[&str] = &[
    "cardiologist",
    "dermatologist",
    "ophthalmologist",
    "physiotherapist",
    "neurologist",
    "psychiatrist",
    "dentist",
    "gp",
    "ent",
];

/// City lexicon in display form; matching is done on the folded text but
/// the canonical spelling is what gets returned.
const CITY_LEXICON: &[&str] = &[
    "London",
    "Manchester",
    "Edinburgh",
    "Birmingham",
    "Glasgow",
    "Leeds",
    "Liverpool",
    "Bristol",
    "Cambridge",
    "Oxford",
];

static DATE_DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})\.(\d{1,2})\.(\d{4})\b").unwrap());
static DATE_SLASHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").unwrap());
static DATE_ISO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").unwrap());
static DATE_MONTH_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{1,2})(?:st|nd|rd|th)?\b",
    )
    .unwrap()
});

/// Recover {specialty, location, date} from a free-text utterance.
///
/// Only called when structured parameters are missing — structured input
/// always takes precedence over anything scraped out of the text. Fields
/// with no match come back as None; this never fails.
pub fn extract_criteria(utterance: &str) -> ParsedCriteria {
    let text = utterance.to_lowercase();

    let specialty = SPECIALTY_LEXICON
        .iter()
        .find(|term| text.contains(*term))
        .map(|term| term.to_string());

    let location = CITY_LEXICON
        .iter()
        .find(|city| text.contains(&city.to_lowercase()))
        .map(|city| city.to_string());

    let date = extract_date(&text);

    ParsedCriteria {
        specialty,
        location,
        date,
    }
}

/// Literal "today"/"tomorrow" first, then the fixed grammar set in order:
/// DD.MM.YYYY, DD/MM/YYYY, YYYY-MM-DD, "Month DDth". Numeric forms are
/// normalized to ISO; the month form keeps its spoken shape.
fn extract_date(text: &str) -> Option<String> {
    if text.contains("today") {
        return Some("today".to_string());
    }
    if text.contains("tomorrow") {
        return Some("tomorrow".to_string());
    }

    for (re, day_idx, month_idx, year_idx) in [
        (&*DATE_DOTTED, 1, 2, 3),
        (&*DATE_SLASHED, 1, 2, 3),
        (&*DATE_ISO, 3, 2, 1),
    ] {
        if let Some(caps) = re.captures(text) {
            let day: u32 = caps[day_idx].parse().ok()?;
            let month: u32 = caps[month_idx].parse().ok()?;
            let year: i32 = caps[year_idx].parse().ok()?;
            if day >= 1 && day <= 31 && month >= 1 && month <= 12 {
                return Some(format!("{year:04}-{month:02}-{day:02}"));
            }
        }
    }

    if let Some(caps) = DATE_MONTH_DAY.captures(text) {
        let month = capitalize(&caps[1]);
        let day = &caps[2];
        return Some(format!("{month} {day}"));
    }

    None
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().to_string() + chars.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_specialty_city_and_relative_date() {
        let criteria = extract_criteria("cardiologist in London for tomorrow");
        assert_eq!(criteria.specialty.as_deref(), Some("cardiologist"));
        assert_eq!(criteria.location.as_deref(), Some("London"));
        assert_eq!(criteria.date.as_deref(), Some("tomorrow"));
    }

    #[test]
    fn test_month_day_grammar() {
        let criteria = extract_criteria("Dermatologist, September 6th, Manchester");
        assert_eq!(criteria.specialty.as_deref(), Some("dermatologist"));
        assert_eq!(criteria.location.as_deref(), Some("Manchester"));
        assert_eq!(criteria.date.as_deref(), Some("September 6"));
    }

    #[test]
    fn test_dotted_date_normalizes_to_iso() {
        let criteria = extract_criteria("any dentist on 6.9.2025 please");
        assert_eq!(criteria.date.as_deref(), Some("2025-09-06"));
    }

    #[test]
    fn test_slashed_date_normalizes_to_iso() {
        assert_eq!(
            extract_criteria("book me for 06/09/2025").date.as_deref(),
            Some("2025-09-06")
        );
    }

    #[test]
    fn test_iso_date_passes_through() {
        assert_eq!(
            extract_criteria("2025-09-06 works for me").date.as_deref(),
            Some("2025-09-06")
        );
    }

    #[test]
    fn test_today_beats_pattern_grammars() {
        assert_eq!(
            extract_criteria("today or 2025-09-06").date.as_deref(),
            Some("today")
        );
    }

    #[test]
    fn test_dentist_wins_over_its_ent_substring() {
        assert_eq!(
            extract_criteria("I need a dentist").specialty.as_deref(),
            Some("dentist")
        );
    }

    #[test]
    fn test_nothing_recognized_yields_all_none() {
        let criteria = extract_criteria("my head hurts");
        assert_eq!(criteria, ParsedCriteria::default());
    }

    #[test]
    fn test_out_of_range_numeric_date_is_ignored() {
        assert_eq!(extract_criteria("on 45.13.2025").date, None);
    }
}
