use std::fmt;
use thiserror::Error;

pub const MIN_WORD_LEN: usize = 3;
pub const MAX_WORD_LEN: usize = 9;
pub const DEFAULT_WORD_LEN: usize = 5;

pub const MIN_TRIES: u32 = 1;
pub const MAX_TRIES: u32 = 10;
pub const DEFAULT_TRIES: u32 = 6;

pub const DEFAULT_ANSWERS_PATH: &str = "default-answers.txt";
pub const DEFAULT_GUESSES_PATH: &str = "default-guesses.txt";

/// Character shown in a hint for a letter that scores nothing.
pub const ABSENT_MARKER: char = '-';

/// Classification of one guessed letter against the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterMark {
    /// Right letter in the right position.
    Correct,
    /// Letter occurs elsewhere in the answer.
    Present,
    Absent,
}

/// Per-letter result of scoring one guess.
///
/// Renders on the wire as a single line: uppercase for `Correct`, lowercase
/// for `Present` and `-` for `Absent`, e.g. `cRA-E`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    letters: Vec<char>,
    marks: Vec<LetterMark>,
}

impl Hint {
    pub fn marks(&self) -> &[LetterMark] {
        &self.marks
    }
}

impl fmt::Display for Hint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, mark) in self.letters.iter().zip(&self.marks) {
            match mark {
                LetterMark::Correct => {
                    for upper in letter.to_uppercase() {
                        write!(f, "{}", upper)?;
                    }
                }
                LetterMark::Present => write!(f, "{}", letter)?,
                LetterMark::Absent => write!(f, "{}", ABSENT_MARKER)?,
            }
        }
        Ok(())
    }
}

/// Scores `guess` against `answer` over the first `length` letters of the guess.
///
/// Exact matches are marked first. Remaining positions are then scanned left
/// to right, and a letter is only marked `Present` while the number of
/// positions already showing it is below its count in the answer. Repeated
/// letters therefore never score more often than they occur in the answer,
/// with exact matches and then earlier positions taking priority.
///
/// Answer positions past the end of `answer` never match.
pub fn score(guess: &str, answer: &str, length: usize) -> Hint {
    let letters: Vec<char> = guess.chars().take(length).collect();
    let answer: Vec<char> = answer.chars().collect();
    let mut marks: Vec<Option<LetterMark>> = vec![None; letters.len()];

    for (i, letter) in letters.iter().enumerate() {
        if answer.get(i) == Some(letter) {
            marks[i] = Some(LetterMark::Correct);
        }
    }

    for i in 0..letters.len() {
        if marks[i].is_some() {
            continue;
        }
        let letter = letters[i];
        let letter_count = answer.iter().filter(|c| **c == letter).count();
        let displayed_count = letters
            .iter()
            .zip(&marks)
            .filter(|(l, m)| {
                **l == letter && matches!(m, Some(LetterMark::Correct | LetterMark::Present))
            })
            .count();

        marks[i] = Some(if displayed_count < letter_count {
            LetterMark::Present
        } else {
            LetterMark::Absent
        });
    }

    Hint {
        letters,
        marks: marks
            .into_iter()
            .map(|m| m.unwrap_or(LetterMark::Absent))
            .collect(),
    }
}

/// Why a submitted guess was rejected. The `Display` text is sent to the player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuessError {
    #[error("Words must contain only letters - try again.")]
    NonLetter,
    #[error("Words must be {expected} letters long - try again.")]
    WrongLength { expected: usize },
}

/// Strips one trailing `\n` (and a `\r` before it).
pub fn trim_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Normalises a raw guess line into a lowercase word of exactly `length` letters.
///
/// The letter check runs before the length check, so `"h3"` is reported as
/// a non-letter even though it is also too short.
pub fn validate_guess(raw: &str, length: usize) -> Result<String, GuessError> {
    let word = trim_line_ending(raw);
    if !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(GuessError::NonLetter);
    }
    if word.len() != length {
        return Err(GuessError::WrongLength { expected: length });
    }
    Ok(word.to_ascii_lowercase())
}

/// Normalises a word-list entry. Returns `None` for blank lines or entries
/// containing anything but ASCII letters.
pub fn is_word(line: &str) -> Option<String> {
    let word = trim_line_ending(line);
    if word.is_empty() || !word.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(word.to_ascii_lowercase())
}

/// Parses an integer the way C's `strtol(s, _, 0)` does, requiring the whole
/// input to be consumed.
///
/// Leading whitespace and a sign are accepted, `0x` selects hexadecimal and a
/// leading `0` octal. Out-of-range values saturate to the `i32` bounds.
pub fn parse_int(input: &str) -> Option<i32> {
    let s = input.trim_start();
    let (negative, s) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, hex)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..])
    } else {
        (10, s)
    };

    if digits.is_empty() {
        return None;
    }

    let mut value: i64 = 0;
    for c in digits.chars() {
        let digit = c.to_digit(radix)?;
        value = value
            .saturating_mul(i64::from(radix))
            .saturating_add(i64::from(digit));
    }
    if negative {
        value = -value;
    }

    Some(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
}
