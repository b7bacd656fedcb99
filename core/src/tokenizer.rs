use lazy_static::lazy_static;
use regex::Regex;

/// Pad character for q-grams. `normalize` strips every non-word character, so
/// it never occurs inside a normalized string.
pub const PAD: char = '$';

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("valid regex");
}

/// Split on runs of non-word characters (anything but letters, digits and `_`),
/// lowercase, drop empty pieces.
pub fn tokenize(text: &str) -> Vec<String> {
    NON_WORD
        .split(text)
        .filter(|piece| !piece.is_empty())
        .map(|piece| piece.to_lowercase())
        .collect()
}

/// Remove all non-word characters and lowercase what is left: "Bana." -> "bana".
pub fn normalize(text: &str) -> String {
    NON_WORD.replace_all(text, "").to_lowercase()
}

/// All q-grams of `s` after left-padding it with `q - 1` pad characters, so a
/// string of n characters yields exactly n q-grams.
pub fn qgrams(s: &str, q: usize) -> Vec<String> {
    if q == 0 {
        return Vec::new();
    }
    let padded: Vec<char> = std::iter::repeat(PAD).take(q - 1).chain(s.chars()).collect();
    padded.windows(q).map(|w| w.iter().collect()).collect()
}
