//! Text normalization and tokenization for the search index.
//!
//! Documents and queries go through the same pipeline, so a query term and
//! an indexed token are always comparable.

use crate::config::{CaseFolding, IndexOptions, Tokenization};
use once_cell::sync::Lazy;
use regex::Regex;

static STRICT_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\p{L}\p{M}\p{N}_]+").expect("valid token regex"));

/// Applies case folding to `text`.
pub fn fold(text: &str, mode: CaseFolding) -> String {
    match mode {
        CaseFolding::Preserve => text.to_string(),
        CaseFolding::Simple => text.to_lowercase(),
        CaseFolding::ExtendedLatin => {
            let lowered = text.to_lowercase();
            let mut folded = String::with_capacity(lowered.len());
            for ch in lowered.chars() {
                if is_combining_mark(ch) {
                    continue;
                }
                match fold_latin_char(ch) {
                    Some(replacement) => folded.push_str(replacement),
                    None => folded.push(ch),
                }
            }
            folded
        }
    }
}

/// Splits `text` into normalized tokens, in document order.
pub fn tokenize(text: &str, options: &IndexOptions) -> Vec<String> {
    let folded = fold(text, options.case_folding);
    match options.tokenization {
        Tokenization::Strict => STRICT_TOKEN_RE
            .find_iter(&folded)
            .map(|token| token.as_str().to_string())
            .collect(),
        Tokenization::Whitespace => folded.split_whitespace().map(str::to_string).collect(),
    }
}

// Combining Diacritical Marks block, as found in decomposed (NFD) text.
fn is_combining_mark(ch: char) -> bool {
    matches!(ch, '\u{0300}'..='\u{036F}')
}

// Input is already lowercase.
fn fold_latin_char(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'ĉ' | 'ċ' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ĕ' | 'ė' | 'ę' | 'ě' => "e",
        'ĝ' | 'ğ' | 'ġ' | 'ģ' => "g",
        'ĥ' | 'ħ' => "h",
        'ì' | 'í' | 'î' | 'ï' | 'ĩ' | 'ī' | 'ĭ' | 'į' | 'ı' => "i",
        'ĳ' => "ij",
        'ĵ' => "j",
        'ķ' => "k",
        'ĺ' | 'ļ' | 'ľ' | 'ŀ' | 'ł' => "l",
        'ñ' | 'ń' | 'ņ' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ŏ' | 'ő' => "o",
        'œ' => "oe",
        'ŕ' | 'ŗ' | 'ř' => "r",
        'ś' | 'ŝ' | 'ş' | 'š' | 'ș' => "s",
        'ß' => "ss",
        'ţ' | 'ť' | 'ŧ' | 'ț' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ũ' | 'ū' | 'ŭ' | 'ů' | 'ű' | 'ų' => "u",
        'ŵ' => "w",
        'ý' | 'ÿ' | 'ŷ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(folded)
}
