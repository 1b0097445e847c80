pub const PROMPT_SUGGESTIONS: [&str; 5] = [
    "A cyberpunk cityscape at night with neon lights",
    "A futuristic robot with glowing elements",
    "A neon-lit street scene in the rain",
    "A digital abstract artwork with vibrant colors",
    "A sci-fi portal with energy effects",
];

const LABEL_CHARS: usize = 50;

pub fn suggestions() -> &'static [&'static str] {
    &PROMPT_SUGGESTIONS
}

/// Display label for a suggestion, cut to 50 characters plus an ellipsis.
pub fn suggestion_label(suggestion: &str) -> String {
    if suggestion.chars().count() > LABEL_CHARS {
        let head: String = suggestion.chars().take(LABEL_CHARS).collect();
        format!("{}...", head)
    } else {
        suggestion.to_string()
    }
}
