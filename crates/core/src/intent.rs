use crate::domain::lead::Intent;

const TRAVEL_KEYWORDS: &[&str] = &["ticket", "flight", "travel", "visa", "trip", "airline"];
const HEALTH_KEYWORDS: &[&str] = &["health", "medicine", "pain", "doctor", "clinic"];

/// Deterministic keyword classifier over lower-cased input. Travel is
/// checked before health; anything unmatched falls back to `General`.
/// Total: always returns a category.
pub fn classify_intent(text: &str) -> Intent {
    let normalized = text.to_lowercase();

    if TRAVEL_KEYWORDS.iter().any(|word| normalized.contains(word)) {
        return Intent::Travel;
    }
    if HEALTH_KEYWORDS.iter().any(|word| normalized.contains(word)) {
        return Intent::Health;
    }
    Intent::General
}

#[cfg(test)]
mod tests {
    use super::classify_intent;
    use crate::domain::lead::Intent;

    #[test]
    fn travel_keywords_classify_as_travel() {
        for text in
            ["I want to travel", "need a FLIGHT to rome", "visa question", "book me a ticket"]
        {
            assert_eq!(classify_intent(text), Intent::Travel, "text: {text}");
        }
    }

    #[test]
    fn health_keywords_classify_as_health() {
        for text in ["I have back pain", "need medicine", "Health checkup"] {
            assert_eq!(classify_intent(text), Intent::Health, "text: {text}");
        }
    }

    #[test]
    fn travel_wins_ties_over_health() {
        assert_eq!(classify_intent("travel for health treatment"), Intent::Travel);
    }

    #[test]
    fn unmatched_text_falls_back_to_general() {
        assert_eq!(classify_intent("hello there"), Intent::General);
        assert_eq!(classify_intent(""), Intent::General);
    }
}
