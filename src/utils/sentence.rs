/// Sentence-ending punctuation, including fullwidth variants.
const TERMINATORS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

fn is_terminator(c: char) -> bool {
    TERMINATORS.contains(&c)
}

/// Truncate text to at most `max` sentences, keeping the punctuation.
///
/// A terminator only closes a sentence when followed by whitespace or the
/// end of input, so decimals and version numbers stay intact.
pub fn truncate_sentences(text: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }

    let mut result = String::new();
    let mut count = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        result.push(c);
        if is_terminator(c) {
            let boundary = match chars.peek() {
                None => true,
                Some(next) => next.is_whitespace(),
            };
            if boundary {
                count += 1;
                if count >= max {
                    break;
                }
            }
        }
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_at_most_three() {
        let text = "Un. Deux. Trois. Quatre. Cinq.";
        let out = truncate_sentences(text, 3);
        assert_eq!(out, "Un. Deux. Trois.");
    }

    #[test]
    fn test_truncate_short_text_untouched() {
        let text = "Une seule phrase.";
        assert_eq!(truncate_sentences(text, 3), text);
    }

    #[test]
    fn test_truncate_does_not_split_decimals() {
        let text = "GPT-4.5 est sorti. Deuxième phrase. Troisième phrase. Quatrième.";
        let out = truncate_sentences(text, 3);
        assert_eq!(out, "GPT-4.5 est sorti. Deuxième phrase. Troisième phrase.");
    }
}
