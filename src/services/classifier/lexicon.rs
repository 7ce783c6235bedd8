use async_trait::async_trait;

use super::{Classification, SpecialtyClassifier};

/// Ordered keyword table. First matching row wins, so more specific
/// terms must precede the ones they contain ("dentist" holds "ent").
const KEYWORD_TABLE: &[(&[&str], &str)] = &[
    (&["tooth", "teeth", "gum", "dent"], "dentist"),
    (&["skin", "rash", "acne", "derma", "eczema"], "dermatologist"),
    (&["eye", "vision", "ophthal", "blurry"], "ophthalmologist"),
    (
        &["heart", "palpitation", "cardio", "cardiac"],
        "cardiologist",
    ),
    (
        &["ear", "nose", "throat", "sinus", "hearing", "runny nose"],
        "ent",
    ),
];

pub fn display_name_for(specialty: &str) -> &'static str {
    match specialty {
        "dentist" => "Dentists",
        "dermatologist" => "Dermatologists",
        "ophthalmologist" => "Ophthalmologists",
        "cardiologist" => "Cardiologists",
        "physiotherapist" => "Physiotherapists",
        "neurologist" => "Neurologists",
        "psychiatrist" => "Psychiatrists",
        "ent" => "ENT Specialists",
        _ => "General Practitioners",
    }
}

/// Deterministic fallback classifier. Anything the table does not
/// recognize goes to a GP.
pub fn classify_text(symptom_text: &str) -> Classification {
    let text = symptom_text.to_lowercase();

    for (keywords, specialty) in KEYWORD_TABLE {
        if keywords.iter().any(|kw| text.contains(kw)) {
            return Classification {
                specialty: specialty.to_string(),
                display_name: display_name_for(specialty).to_string(),
            };
        }
    }

    Classification {
        specialty: "gp".to_string(),
        display_name: display_name_for("gp").to_string(),
    }
}

pub struct LexiconClassifier;

#[async_trait]
impl SpecialtyClassifier for LexiconClassifier {
    async fn classify(&self, symptom_text: &str) -> anyhow::Result<Classification> {
        Ok(classify_text(symptom_text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toothache_maps_to_dentist() {
        let c = classify_text("I have a toothache");
        assert_eq!(c.specialty, "dentist");
        assert_eq!(c.display_name, "Dentists");
    }

    #[test]
    fn test_skin_rash_maps_to_dermatologist() {
        assert_eq!(classify_text("itchy skin rash").specialty, "dermatologist");
    }

    #[test]
    fn test_unknown_symptoms_default_to_gp() {
        let c = classify_text("I feel generally unwell");
        assert_eq!(c.specialty, "gp");
        assert_eq!(c.display_name, "General Practitioners");
    }

    #[test]
    fn test_hearing_problems_map_to_ent() {
        assert_eq!(classify_text("hearing problems").specialty, "ent");
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(classify_text("TOOTH PAIN").specialty, "dentist");
    }
}
