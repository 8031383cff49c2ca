/// Minimum trimmed length for a message to be considered meaningful.
const MIN_MEANINGFUL_CHARS: usize = 5;

/// Input-quality gate. Low-information text ("ok", "1234", whitespace) must
/// never reach the extractor and must never mutate intent or slots, so the
/// agent cannot hallucinate structured data out of noise.
pub fn is_low_information(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_MEANINGFUL_CHARS {
        return true;
    }
    // is_numeric rather than is_ascii_digit: phone keypads and copied
    // numbers arrive in non-ASCII digit scripts too.
    trimmed.chars().all(char::is_numeric)
}
