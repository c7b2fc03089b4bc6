use crate::words::WordRepository;
use wordle_shared::{score, validate_guess, GuessError, Hint};

/// What became of one submitted line during a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessVerdict {
    /// Not a well-formed guess. No try is used.
    Rejected(GuessError),
    /// Well-formed but not in the guesses dictionary. No try is used.
    NotInDictionary,
    /// Scored against the answer. One try is used.
    Scored(Hint),
    Solved,
}

/// How a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Won,
    Lost,
    /// The peer went away mid-round. Counted as a loss.
    Disconnected,
}

impl RoundOutcome {
    pub fn is_win(self) -> bool {
        self == RoundOutcome::Won
    }
}

/// One play-through from answer selection to win or loss.
#[derive(Debug)]
pub struct Round {
    answer: String,
    word_length: usize,
    tries_left: u32,
}

impl Round {
    pub fn new(answer: String, word_length: usize, tries: u32) -> Self {
        Self {
            answer,
            word_length,
            tries_left: tries,
        }
    }

    pub fn tries_left(&self) -> u32 {
        self.tries_left
    }

    pub fn is_exhausted(&self) -> bool {
        self.tries_left == 0
    }

    /// Consumes the round, handing back the answer for the reveal.
    pub fn into_answer(self) -> String {
        self.answer
    }

    /// Prompt for the next guess, or `None` once no tries remain.
    pub fn prompt(&self) -> Option<String> {
        if self.is_exhausted() {
            return None;
        }
        match self.tries_left {
            1 => Some(format!(
                "Enter a {} letter word (last attempt):\n",
                self.word_length
            )),
            n => Some(format!(
                "Enter a {} letter word ({} attempts remaining):\n",
                self.word_length, n
            )),
        }
    }

    /// Judges one raw input line.
    ///
    /// A guess equal to the answer wins even if the dictionary lacks it.
    pub fn submit(&mut self, line: &str, words: &WordRepository) -> GuessVerdict {
        let guess = match validate_guess(line, self.word_length) {
            Ok(guess) => guess,
            Err(e) => return GuessVerdict::Rejected(e),
        };

        if guess == self.answer {
            return GuessVerdict::Solved;
        }

        if !words.contains(&guess) {
            return GuessVerdict::NotInDictionary;
        }

        self.tries_left = self.tries_left.saturating_sub(1);
        GuessVerdict::Scored(score(&guess, &self.answer, self.word_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::words::WordList;

    fn test_words() -> WordRepository {
        WordRepository::new(
            WordList::from_words(["trace"]),
            WordList::from_words(["crane", "slate", "trace", "adieu", "pious"]),
        )
    }

    #[test]
    fn test_round_creation() {
        let round = Round::new("trace".to_string(), 5, 6);
        assert_eq!(round.tries_left(), 6);
        assert!(!round.is_exhausted());
    }

    #[test]
    fn test_prompt_wording() {
        let round = Round::new("trace".to_string(), 5, 3);
        assert_eq!(
            round.prompt().as_deref(),
            Some("Enter a 5 letter word (3 attempts remaining):\n")
        );

        let round = Round::new("trace".to_string(), 5, 1);
        assert_eq!(
            round.prompt().as_deref(),
            Some("Enter a 5 letter word (last attempt):\n")
        );

        let round = Round::new("trace".to_string(), 5, 0);
        assert_eq!(round.prompt(), None);
    }

    #[test]
    fn test_submit_solved() {
        let words = test_words();
        let mut round = Round::new("trace".to_string(), 5, 6);
        assert_eq!(round.submit("TRACE\n", &words), GuessVerdict::Solved);
        assert_eq!(round.tries_left(), 6);
    }

    #[test]
    fn test_submit_answer_outside_dictionary_still_wins() {
        let words = test_words();
        let mut round = Round::new("zzzzz".to_string(), 5, 2);
        assert_eq!(round.submit("zzzzz", &words), GuessVerdict::Solved);
    }

    #[test]
    fn test_submit_scored_uses_try() {
        let words = test_words();
        let mut round = Round::new("trace".to_string(), 5, 6);

        match round.submit("crane", &words) {
            GuessVerdict::Scored(hint) => assert_eq!(hint.to_string(), "cRA-E"),
            other => panic!("Unexpected verdict: {:?}", other),
        }
        assert_eq!(round.tries_left(), 5);
    }

    #[test]
    fn test_invalid_guesses_keep_tries() {
        let words = test_words();
        let mut round = Round::new("trace".to_string(), 5, 6);

        assert_eq!(
            round.submit("h3llo", &words),
            GuessVerdict::Rejected(GuessError::NonLetter)
        );
        assert_eq!(
            round.submit("hi", &words),
            GuessVerdict::Rejected(GuessError::WrongLength { expected: 5 })
        );
        assert_eq!(round.submit("qwert", &words), GuessVerdict::NotInDictionary);
        assert_eq!(round.tries_left(), 6);
    }

    #[test]
    fn test_round_exhausts_after_configured_tries() {
        let words = test_words();
        for tries in 1..=10 {
            let mut round = Round::new("trace".to_string(), 5, tries);
            let mut scored = 0;
            while !round.is_exhausted() {
                match round.submit("slate", &words) {
                    GuessVerdict::Scored(_) => scored += 1,
                    other => panic!("Unexpected verdict: {:?}", other),
                }
            }
            assert_eq!(scored, tries);
            assert_eq!(round.tries_left(), 0);
            assert_eq!(round.prompt(), None);
            assert_eq!(round.into_answer(), "trace");
        }
    }

    #[test]
    fn test_pinned_answer_with_capitals_is_unwinnable() {
        let words = test_words();
        let mut round = Round::new("Trace".to_string(), 5, 1);
        match round.submit("trace", &words) {
            GuessVerdict::Scored(hint) => assert_eq!(hint.to_string(), "-RACE"),
            other => panic!("Unexpected verdict: {:?}", other),
        }
        assert!(round.is_exhausted());
    }

    #[test]
    fn test_round_outcome_is_win() {
        assert!(RoundOutcome::Won.is_win());
        assert!(!RoundOutcome::Lost.is_win());
        assert!(!RoundOutcome::Disconnected.is_win());
    }
}
