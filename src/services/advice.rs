/// Canned self-care advice per specialty. Deliberately static: the
/// wording is not medical guidance this service vouches for, it only has
/// to be deterministic and safe.
pub fn advice_for(specialty: &str) -> &'static str {
    match specialty {
        "dentist" => {
            "For dental issues:\n\
             • Rinse with warm salt water\n\
             • Take over-the-counter pain relief if needed\n\
             • Avoid very hot or cold foods\n\
             • See a dentist as soon as possible for proper treatment"
        }
        "ent" => {
            "For ear, nose, and throat symptoms:\n\
             • Stay hydrated\n\
             • Use a humidifier or steam inhalation\n\
             • Rest your voice if you have throat issues\n\
             • Consider over-the-counter decongestants if appropriate\n\
             • See a doctor if symptoms persist or worsen"
        }
        "dermatologist" => {
            "For skin issues:\n\
             • Keep the area clean and dry\n\
             • Avoid scratching\n\
             • Use gentle, fragrance-free products\n\
             • Consider cool compresses for irritation\n\
             • See a dermatologist for persistent or concerning skin changes"
        }
        "ophthalmologist" => {
            "For eye problems:\n\
             • Avoid rubbing your eyes\n\
             • Use clean hands when touching your eye area\n\
             • Consider artificial tears for dryness\n\
             • Protect your eyes from bright light\n\
             • Seek immediate care for sudden vision changes"
        }
        "cardiologist" => {
            "For heart-related concerns:\n\
             • Rest and avoid strenuous activity until assessed\n\
             • Note when symptoms occur and what brings them on\n\
             • Avoid caffeine and smoking\n\
             • Seek immediate care for chest pain, breathlessness, or fainting"
        }
        _ => {
            "General health advice:\n\
             • Rest and stay hydrated\n\
             • Monitor your symptoms\n\
             • Take your temperature if you feel unwell\n\
             • Consider over-the-counter medications if appropriate\n\
             • Contact a healthcare provider if symptoms worsen or persist"
        }
    }
}
