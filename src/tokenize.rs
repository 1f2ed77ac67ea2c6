use regex::Regex;
use unicode_normalization::UnicodeNormalization;

///Word pattern used by the compound corrector: runs of word characters,
///with a single internal apostrophe allowed ("couldn't" stays one token)
pub const WORD_PATTERN: &str = r"([^\W_]+['’][^\W_]+|[^\W_]+)";

///Token pattern for corpus ingestion: Unicode letters only, digits and
///punctuation never form tokens
pub const CORPUS_TOKEN_PATTERN: &str = r"[^\W\d_]+";

///Split a phrase into tokens. By default the word pattern does the work on a
///lowercased copy; `preserve_case` keeps the original casing (needed for
///acronym detection) and `split_by_space` falls back to plain whitespace
///splitting.
pub fn parse_words(
    pattern: &Regex,
    phrase: &str,
    preserve_case: bool,
    split_by_space: bool,
) -> Vec<String> {
    if split_by_space {
        return phrase
            .split_whitespace()
            .map(|token| {
                if preserve_case {
                    token.to_string()
                } else {
                    token.to_lowercase()
                }
            })
            .collect();
    }
    let haystack = if preserve_case {
        phrase.to_string()
    } else {
        phrase.to_lowercase()
    };
    pattern
        .find_iter(&haystack)
        .map(|hit| hit.as_str().to_string())
        .collect()
}

///An acronym is at least two characters long and made of nothing but
///uppercase letters and digits ("NASA", "MP3")
pub fn is_acronym(word: &str) -> bool {
    let mut length = 0;
    for c in word.chars() {
        if !(c.is_uppercase() || c.is_numeric()) {
            return false;
        }
        length += 1;
    }
    length >= 2
}

///Tokens that are nothing but an integer pass through compound correction
pub fn parse_integer(word: &str) -> Option<i64> {
    word.parse::<i64>().ok()
}

///NFKC normalization, folding ligatures ("ﬁ" becomes "fi") before a part is
///scored by the segmenter
pub fn normalize_ligatures(part: &str) -> String {
    part.nfkc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word_pattern() -> Regex {
        Regex::new(WORD_PATTERN).unwrap()
    }

    #[test]
    fn parse_words_lowercases_and_keeps_apostrophes() {
        let tokens = parse_words(&word_pattern(), "Can't stop, won't stop!", false, false);
        assert_eq!(tokens, vec!["can't", "stop", "won't", "stop"]);
    }

    #[test]
    fn parse_words_preserve_case() {
        let tokens = parse_words(&word_pattern(), "NASA launch 2024", true, false);
        assert_eq!(tokens, vec!["NASA", "launch", "2024"]);
    }

    #[test]
    fn parse_words_by_space() {
        let tokens = parse_words(&word_pattern(), "in  the Park", false, true);
        assert_eq!(tokens, vec!["in", "the", "park"]);
    }

    #[test]
    fn acronym_detection() {
        assert!(is_acronym("NASA"));
        assert!(is_acronym("MP3"));
        assert!(!is_acronym("No"));
        assert!(!is_acronym("A"));
        assert!(!is_acronym("nasa"));
    }

    #[test]
    fn integer_detection() {
        assert_eq!(parse_integer("123"), Some(123));
        assert_eq!(parse_integer("-4"), Some(-4));
        assert_eq!(parse_integer("12a"), None);
    }

    #[test]
    fn ligatures_fold() {
        assert_eq!(normalize_ligatures("ﬁsh"), "fish");
        assert_eq!(normalize_ligatures("plain"), "plain");
    }
}
