//! Per-connection menu and round protocol
//!
//! Each accepted connection runs one [`Session`] to completion on its own
//! task. The session owns its settings outright; the only state it shares
//! with other sessions is the read-only [`WordRepository`] and the
//! [`StatsRegistry`].
//!
//! The protocol is strictly request-response over `\n`-terminated lines:
//! every prompt is flushed before the next line is read, and a round runs to
//! completion inside a single menu iteration.

use crate::game::{GuessVerdict, Round, RoundOutcome};
use crate::stats::StatsRegistry;
use crate::words::WordRepository;
use log::{debug, info};
use std::io;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
    BufWriter,
};
use wordle_shared::{
    parse_int, trim_line_ending, DEFAULT_TRIES, DEFAULT_WORD_LEN, MAX_TRIES, MAX_WORD_LEN,
    MIN_TRIES, MIN_WORD_LEN,
};

/// Longest line accepted from a peer, terminator included.
pub const MAX_LINE_LEN: usize = 4096;

pub const WELCOME_BANNER: &str = concat!(
    "Welcome to...\n",
    " _    _               _ _      \n",
    "| |  | |             | | |     \n",
    "| |  | | ___  _ __ __| | | ___ \n",
    "| |/\\| |/ _ \\| '__/ _` | |/ _ \\\n",
    "\\  /\\  / (_) | | | (_| | |  __/\n",
    " \\/  \\/ \\___/|_|  \\__,_|_|\\___|\n",
    "\n",
);

pub const GOODBYE: &str = "Goodbye...\n";

/// Menu entries, numbered as on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    Play,
    WordLength,
    Tries,
    Cheat,
    Exit,
}

impl MenuOption {
    /// Parses a menu reply. Anything that is not one of the five option
    /// numbers yields `None`.
    pub fn from_line(line: &str) -> Option<Self> {
        match parse_int(trim_line_ending(line))? {
            1 => Some(MenuOption::Play),
            2 => Some(MenuOption::WordLength),
            3 => Some(MenuOption::Tries),
            4 => Some(MenuOption::Cheat),
            5 => Some(MenuOption::Exit),
            _ => None,
        }
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client chose "exit".
    Exited,
    /// The stream closed or failed.
    Disconnected,
}

/// Round parameters and history owned by one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub word_length: usize,
    pub tries: u32,
    pub streak: u32,
    /// Answer for the next round, set through the cheat option.
    pub pinned_answer: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            word_length: DEFAULT_WORD_LEN,
            tries: DEFAULT_TRIES,
            streak: 0,
            pinned_answer: None,
        }
    }
}

impl SessionSettings {
    /// Pins `line` as the next answer, or clears the pin when it is empty.
    ///
    /// The answer is taken verbatim; the word length follows its character
    /// count.
    pub fn pin_answer(&mut self, line: &str) {
        if line.is_empty() {
            self.pinned_answer = None;
            self.word_length = DEFAULT_WORD_LEN;
        } else {
            self.word_length = line.chars().count();
            self.pinned_answer = Some(line.to_string());
        }
    }

    /// Updates the streak after a round and returns the new value.
    pub fn record_outcome(&mut self, won: bool) -> u32 {
        self.streak = if won { self.streak + 1 } else { 0 };
        self.streak
    }
}

/// Stands in for the answer in the menu until one is pinned.
const HIDDEN_ANSWER: &str = "?????";

pub fn render_menu(settings: &SessionSettings) -> String {
    format!(
        "Select one of the following:\n\
         1. Play game (word length: {}, tries: {}, answer: {})\n\
         2. Change word length\n\
         3. Change number of tries\n\
         4. Cheat and set the answer\n\
         5. Exit\n",
        settings.word_length,
        settings.tries,
        settings.pinned_answer.as_deref().unwrap_or(HIDDEN_ANSWER)
    )
}

/// One client's menu/round state machine over a buffered line stream.
pub struct Session<R, W> {
    reader: R,
    writer: W,
    settings: SessionSettings,
    words: Arc<WordRepository>,
    stats: Arc<StatsRegistry>,
    peer: String,
}

impl<R, W> Session<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(
        reader: R,
        writer: W,
        words: Arc<WordRepository>,
        stats: Arc<StatsRegistry>,
        peer: impl Into<String>,
    ) -> Self {
        Self {
            reader,
            writer,
            settings: SessionSettings::default(),
            words,
            stats,
            peer: peer.into(),
        }
    }

    /// Runs the session until the client exits or the stream goes away.
    pub async fn run(&mut self) -> SessionEnd {
        match self.menu_loop().await {
            Ok(end) => end,
            Err(e) => {
                debug!("Session {} stream error: {}", self.peer, e);
                SessionEnd::Disconnected
            }
        }
    }

    async fn menu_loop(&mut self) -> io::Result<SessionEnd> {
        self.send(WELCOME_BANNER).await?;

        loop {
            let menu = render_menu(&self.settings);
            self.send(&menu).await?;

            let Some(line) = self.read_line().await? else {
                return Ok(SessionEnd::Disconnected);
            };
            let Some(option) = MenuOption::from_line(&line) else {
                continue;
            };

            match option {
                MenuOption::Play => {
                    if self.play().await? == Some(RoundOutcome::Disconnected) {
                        return Ok(SessionEnd::Disconnected);
                    }
                }
                MenuOption::WordLength => {
                    let Some(length) = self
                        .read_bounded("Enter the word length", MIN_WORD_LEN as i32, MAX_WORD_LEN as i32)
                        .await?
                    else {
                        return Ok(SessionEnd::Disconnected);
                    };
                    self.settings.word_length = length as usize;
                }
                MenuOption::Tries => {
                    let Some(tries) = self
                        .read_bounded("Enter the number of tries", MIN_TRIES as i32, MAX_TRIES as i32)
                        .await?
                    else {
                        return Ok(SessionEnd::Disconnected);
                    };
                    self.settings.tries = tries as u32;
                }
                MenuOption::Cheat => {
                    self.send("Enter the answer word:\n").await?;
                    let Some(line) = self.read_line().await? else {
                        return Ok(SessionEnd::Disconnected);
                    };
                    self.settings.pin_answer(&line);
                    debug!("Session {} pinned an answer", self.peer);
                }
                MenuOption::Exit => {
                    self.send(GOODBYE).await?;
                    return Ok(SessionEnd::Exited);
                }
            }
        }
    }

    /// Menu option 1: runs one round and books its result.
    ///
    /// Returns `None` when no answer could be drawn and no round was played.
    async fn play(&mut self) -> io::Result<Option<RoundOutcome>> {
        let word_length = self.settings.word_length;
        let answer = match self.settings.pinned_answer.take() {
            Some(answer) => answer,
            None => match self.words.random_word(word_length) {
                Some(answer) => answer,
                None => {
                    self.send(&format!("No {} letter words are available.\n", word_length))
                        .await?;
                    return Ok(None);
                }
            },
        };

        let round = Round::new(answer, word_length, self.settings.tries);
        let outcome = match self.play_round(round).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("Session {} lost its stream mid-round: {}", self.peer, e);
                RoundOutcome::Disconnected
            }
        };

        self.stats.record_round(outcome.is_win());
        let streak = self.settings.record_outcome(outcome.is_win());
        info!("Session {} finished a round: {:?}", self.peer, outcome);

        if outcome != RoundOutcome::Disconnected {
            self.send(&format!("Win Streak: {}\n\n", streak)).await?;
        }
        Ok(Some(outcome))
    }

    async fn play_round(&mut self, mut round: Round) -> io::Result<RoundOutcome> {
        while let Some(prompt) = round.prompt() {
            self.send(&prompt).await?;

            let Some(line) = self.read_line().await? else {
                return Ok(RoundOutcome::Disconnected);
            };

            match round.submit(&line, &self.words) {
                GuessVerdict::Solved => {
                    self.send("Correct!\n").await?;
                    return Ok(RoundOutcome::Won);
                }
                GuessVerdict::Scored(hint) => {
                    debug!("Session {} has {} tries left", self.peer, round.tries_left());
                    self.write(&format!("{}\n", hint)).await?
                }
                GuessVerdict::NotInDictionary => {
                    self.write("Word not found in the dictionary - try again.\n")
                        .await?
                }
                GuessVerdict::Rejected(reason) => self.write(&format!("{}\n", reason)).await?,
            }
        }

        let reveal = format!("Bad luck - the word is \"{}\".\n", round.into_answer());
        self.send(&reveal).await?;
        Ok(RoundOutcome::Lost)
    }

    /// Prompts until the peer sends an integer in `[min, max]`.
    ///
    /// Returns `None` if the stream closes first.
    async fn read_bounded(&mut self, message: &str, min: i32, max: i32) -> io::Result<Option<i32>> {
        let prompt = format!("{} ({} to {}):\n", message, min, max);
        loop {
            self.send(&prompt).await?;
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };
            if let Some(value) = parse_int(&line).filter(|v| (min..=max).contains(v)) {
                return Ok(Some(value));
            }
        }
    }

    /// Reads one line without its terminator. `None` means end of stream.
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        read_bounded_line(&mut self.reader).await
    }

    async fn write(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await
    }

    async fn send(&mut self, text: &str) -> io::Result<()> {
        self.write(text).await?;
        self.writer.flush().await
    }
}

/// Reads up to the next `\n`, capped at [`MAX_LINE_LEN`] bytes.
///
/// A final line without a terminator is still returned. Invalid UTF-8 is
/// replaced rather than rejected.
pub async fn read_bounded_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader
        .take(MAX_LINE_LEN as u64)
        .read_until(b'\n', &mut buf)
        .await?;

    if n == 0 {
        return Ok(None);
    }
    if buf.last() != Some(&b'\n') && n == MAX_LINE_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {} bytes", MAX_LINE_LEN),
        ));
    }

    let line = String::from_utf8_lossy(&buf);
    Ok(Some(trim_line_ending(&line).to_string()))
}

/// Runs a full session over a split stream, keeping it counted as connected
/// for as long as it runs.
pub async fn serve<R, W>(
    reader: R,
    writer: W,
    words: Arc<WordRepository>,
    stats: Arc<StatsRegistry>,
    peer: impl Into<String>,
) -> SessionEnd
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let _presence = stats.enter_session();
    let mut session = Session::new(
        BufReader::new(reader),
        BufWriter::new(writer),
        words,
        Arc::clone(&stats),
        peer,
    );
    session.run().await
}
