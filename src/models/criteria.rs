/// Booking criteria recovered from a free-text utterance. Ephemeral —
/// produced by the slot extractor when structured parameters are missing,
/// consumed within the same turn, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCriteria {
    pub specialty: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
}
