/// Critical-symptom lexicon. A hit pre-empts the whole flow from any
/// state, so entries err on the side of matching broadly (the "suicid"
/// stem covers suicide/suicidal).
const CRITICAL_SYMPTOMS: &[&str] = &[
    "chest pain",
    "can't breathe",
    "cant breathe",
    "cannot breathe",
    "difficulty breathing",
    "severe breathing",
    "uncontrolled bleeding",
    "severe bleeding",
    "suicid",
    "unconscious",
    "not breathing",
    "heart attack",
    "stroke",
    "overdose",
    "anaphyla",
];

pub fn is_emergency(utterance: &str) -> bool {
    let text = utterance.to_lowercase();
    CRITICAL_SYMPTOMS.iter().any(|term| text.contains(term))
}
