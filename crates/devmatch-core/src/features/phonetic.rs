//! Phonetic codes for catching spelling variants of names

use rphonetic::{Encoder, Metaphone};
use unicode_normalization::UnicodeNormalization;

/// American Soundex: first letter plus three consonant-class digits
///
/// Vowels (and any non-letter) separate repeated classes; `H` and `W` do not.
/// Empty input encodes to an empty string.
pub fn soundex(s: &str) -> String {
    let chars: Vec<char> = s.nfkd().flat_map(char::to_uppercase).collect();
    let Some(&first) = chars.first() else {
        return String::new();
    };

    let mut code = String::with_capacity(4);
    code.push(first);
    let mut count = 1;
    let mut last = soundex_digit(first);

    for &c in &chars[1..] {
        if count == 4 {
            break;
        }
        match soundex_digit(c) {
            Some(digit) => {
                if Some(digit) != last {
                    code.push(digit);
                    count += 1;
                }
                last = Some(digit);
            }
            None => {
                if c != 'H' && c != 'W' {
                    last = None;
                }
            }
        }
    }

    while count < 4 {
        code.push('0');
        count += 1;
    }
    code
}

fn soundex_digit(c: char) -> Option<char> {
    match c {
        'B' | 'F' | 'P' | 'V' => Some('1'),
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => Some('2'),
        'D' | 'T' => Some('3'),
        'L' => Some('4'),
        'M' | 'N' => Some('5'),
        'R' => Some('6'),
        _ => None,
    }
}

/// Longest Metaphone code kept; far above any single name token
const METAPHONE_MAX_LEN: usize = 64;

/// Fold to lowercase ASCII letters separated by single spaces
fn fold_for_phonetic(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.nfkd() {
        if c.is_ascii_alphabetic() {
            out.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() && !out.is_empty() && !out.ends_with(' ') {
            out.push(' ');
        }
    }
    out.trim_end().to_string()
}

/// Metaphone pronunciation code (uppercase; `0` stands for "th")
///
/// Accents are stripped and other non-letters dropped before encoding.
/// Empty input encodes to an empty string.
pub fn metaphone(s: &str) -> String {
    let folded = fold_for_phonetic(s);
    if folded.is_empty() {
        return String::new();
    }
    Metaphone::new(METAPHONE_MAX_LEN).encode(&folded)
}

/// 1.0 when Soundex and Metaphone both agree, 0.5 when one does, else 0.0
pub fn phonetic_similarity(a: &str, b: &str) -> f64 {
    let same_soundex = soundex(a) == soundex(b);
    let same_metaphone = metaphone(a) == metaphone(b);
    match (same_soundex, same_metaphone) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        (false, false) => 0.0,
    }
}
