/* === Definitions === */

const UNITS: [(&str, i64); 10] = [
    ("zero", 0),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
];

const TEENS: [(&str, i64); 10] = [
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("thirteen", 13),
    ("fourteen", 14),
    ("fifteen", 15),
    ("sixteen", 16),
    ("seventeen", 17),
    ("eighteen", 18),
    ("nineteen", 19),
];

const TENS: [(&str, i64); 8] = [
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("fifty", 50),
    ("sixty", 60),
    ("seventy", 70),
    ("eighty", 80),
    ("ninety", 90),
];

/// Recognizer slips that usually stand for a number word.
const HOMOPHONES: [(&str, &str); 3] = [("to", "two"), ("too", "two"), ("for", "four")];

enum NumberWord {
    Unit(i64),
    Teen(i64),
    Tens(i64),
}

/* === Implementations === */

/// Extracts a spoken target temperature from a transcript.
///
/// Heuristic and lossy, not a grammar: tokens are lowercased and
/// homophone-normalized, then number words are grouped (a tens word
/// followed by a unit combines, the last group wins). Transcripts without
/// number words fall back to concatenating every literal digit.
pub fn extract_target(text: &str) -> Option<i64> {
    let text = text.to_lowercase();

    from_words(&text).or_else(|| from_digits(&text))
}

fn from_words(text: &str) -> Option<i64> {
    let mut groups = Vec::new();
    let mut pending_tens: Option<i64> = None;

    for token in tokens(text) {
        let Some(word) = number_word(normalize(token)) else {
            // A non-number word breaks tens/unit adjacency
            if let Some(tens) = pending_tens.take() {
                groups.push(tens);
            }

            continue;
        };

        match word {
            NumberWord::Tens(tens) => {
                if let Some(previous) = pending_tens.replace(tens) {
                    groups.push(previous);
                }
            }

            NumberWord::Unit(unit) => match pending_tens.take() {
                Some(tens) => groups.push(tens + unit),
                None => groups.push(unit),
            },

            NumberWord::Teen(value) => {
                if let Some(tens) = pending_tens.take() {
                    groups.push(tens);
                }

                groups.push(value);
            }
        }
    }

    if let Some(tens) = pending_tens {
        groups.push(tens);
    }

    groups.last().copied()
}

fn from_digits(text: &str) -> Option<i64> {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();

    match digits.is_empty() {
        true => None,
        false => digits.parse().ok(),
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|token| !token.is_empty())
}

fn normalize(token: &str) -> &str {
    HOMOPHONES
        .iter()
        .find(|(from, _)| *from == token)
        .map_or(token, |(_, to)| *to)
}

fn number_word(token: &str) -> Option<NumberWord> {
    let lookup = |table: &[(&str, i64)]| {
        table
            .iter()
            .find(|(word, _)| *word == token)
            .map(|(_, value)| *value)
    };

    lookup(&UNITS)
        .map(NumberWord::Unit)
        .or_else(|| lookup(&TEENS).map(NumberWord::Teen))
        .or_else(|| lookup(&TENS).map(NumberWord::Tens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoken_numbers() {
        let cases = [
            ("set to seventy two", Some(72)),
            ("make it 2 5", Some(25)),
            ("twenty", Some(20)),
            ("set it for forty five please", Some(45)),
            ("too thirty", Some(30)),
            ("nineteen", Some(19)),
            ("zero", Some(0)),
            ("make it colder", None),
            ("", None),
        ];

        for (text, expected) in cases {
            assert_eq!(extract_target(text), expected, "transcript {text:?}");
        }
    }

    #[test]
    fn test_last_group_wins() {
        assert_eq!(extract_target("no twenty yes thirty five"), Some(35));
        assert_eq!(extract_target("two seventy"), Some(70));
        assert_eq!(extract_target("fifteen sixteen"), Some(16));
    }

    #[test]
    fn test_digit_fallback_concatenates() {
        assert_eq!(extract_target("set 7 0"), Some(70));
        assert_eq!(extract_target("temperature 2.5 degrees"), Some(25));
    }

    #[test]
    fn test_number_words_shadow_digits() {
        // Word parsing succeeds, so the stray digit never concatenates
        assert_eq!(extract_target("twenty 5"), Some(20));
    }

    #[test]
    fn test_homophones_normalize_whole_tokens_only() {
        assert_eq!(extract_target("to"), Some(2));
        assert_eq!(extract_target("forty"), Some(40));
        assert_eq!(extract_target("fourteen"), Some(14));
    }

    #[test]
    fn test_case_and_punctuation() {
        assert_eq!(extract_target("Set To Seventy-Two!"), Some(72));
        assert_eq!(extract_target("TWENTY EIGHT."), Some(28));
    }
}
