//! The practice sequence: uppercase, then lowercase, then digits.

use serde::{Deserialize, Serialize};

pub const UPPERCASE: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
    'V', 'W', 'X', 'Y', 'Z',
];

pub const LOWERCASE: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u',
    'v', 'w', 'x', 'y', 'z',
];

pub const NUMBERS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Every practised character, in order.
pub const ALL_CHARS: [char; 62] = {
    let mut all = ['\0'; 62];
    let mut i = 0;
    while i < 26 {
        all[i] = UPPERCASE[i];
        all[26 + i] = LOWERCASE[i];
        i += 1;
    }
    let mut d = 0;
    while d < 10 {
        all[52 + d] = NUMBERS[d];
        d += 1;
    }
    all
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharCategory {
    Uppercase,
    Lowercase,
    Numbers,
}

/// Anything outside `A-Z` and `a-z` is filed under numbers.
pub fn category_of(ch: char) -> CharCategory {
    match ch {
        'A'..='Z' => CharCategory::Uppercase,
        'a'..='z' => CharCategory::Lowercase,
        _ => CharCategory::Numbers,
    }
}

pub fn chars_for_category(category: CharCategory) -> &'static [char] {
    match category {
        CharCategory::Uppercase => &UPPERCASE,
        CharCategory::Lowercase => &LOWERCASE,
        CharCategory::Numbers => &NUMBERS,
    }
}

/// The character after `current`, or `None` at the end of the sequence
/// (or for characters outside it).
pub fn next_char(current: char) -> Option<char> {
    let idx = ALL_CHARS.iter().position(|&c| c == current)?;
    ALL_CHARS.get(idx + 1).copied()
}

pub fn is_last_char(ch: char) -> bool {
    ALL_CHARS.last() == Some(&ch)
}
