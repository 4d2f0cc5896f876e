//! Interactive search: the query is re-run on every keystroke.
//!
//! The text typed at the prompt is split like a shell command line and
//! parsed with the `play` grammar ([`LiveQuery`]), so `rock -n -l 5` works
//! the same as on the command line. Flags and terms given to
//! `music play --live` itself act as defaults for every typed query: a
//! typed value wins, switches are combined, and base terms or tags apply
//! while none are typed.
//!
//! Keys (raw bytes from stdin):
//!
//! | key         | effect                       |
//! |-------------|------------------------------|
//! | Ctrl-C      | quit without playing         |
//! | Backspace   | delete one character         |
//! | Ctrl-U      | clear the query              |
//! | Ctrl-W      | delete the last word         |
//! | Enter       | play the current results     |
//! | printable   | append to the query          |

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::cursor::{MoveToColumn, MoveUp};
use crossterm::queue;
use crossterm::terminal::{self, Clear, ClearType};
use log::{debug, warn};
use std::io::{self, Read, Write};
use std::thread;
use std::time::Duration;

use crate::cli::{LiveQuery, PlayArgs};
use crate::config::Settings;
use crate::editor::SongListEditor;
use crate::player::{self, PlaybackFlags, Player};
use crate::request::QueryRequest;
use crate::selection;

/// Results shown below the prompt.
pub const DISPLAY_LIMIT: usize = 20;

/// Time the player gets to detach before the process exits.
pub const EXIT_GRACE: Duration = Duration::from_millis(1200);

const PROMPT: &str = "Search: ";
const CTRL_C: u8 = 0x03;
const BACKSPACE: u8 = 0x08;
const CTRL_U: u8 = 0x15;
const CTRL_W: u8 = 0x17;
const DELETE: u8 = 0x7f;

/// What one chunk of input did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The query changed and has to be evaluated again.
    Changed,
    /// Nothing to do.
    Unchanged,
    /// Play the last results.
    Commit,
    /// Quit without playing.
    Interrupt,
}

/// What the screen shows below the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Results(Vec<String>),
    Error(String),
}

impl View {
    fn lines(&self) -> Vec<&str> {
        match self {
            View::Results(songs) => songs.iter().take(DISPLAY_LIMIT).map(String::as_str).collect(),
            View::Error(message) => message.lines().collect(),
        }
    }
}

/// What Enter does with the last results.
#[derive(Debug)]
pub enum Commit<'a> {
    NothingSelected,
    Play {
        player: Player,
        flags: PlaybackFlags,
        request: &'a QueryRequest,
        songs: &'a [String],
    },
}

/// The live search state machine.
#[derive(Debug, Clone, Default)]
pub struct LiveSession {
    query: String,
    base: PlayArgs,
    last_results: Vec<String>,
    last_args: Option<PlayArgs>,
    last_request: Option<QueryRequest>,
}

/// Never used: the editor flag is dropped from live queries.
struct NoEditor;

impl SongListEditor for NoEditor {
    fn edit(&self, songs: &[String]) -> Result<Vec<String>> {
        Ok(songs.to_vec())
    }
}

impl LiveSession {
    /// `base` holds the flags `music play --live` was started with.
    pub fn new(base: PlayArgs) -> Self {
        Self {
            base,
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn last_results(&self) -> &[String] {
        &self.last_results
    }

    pub fn last_request(&self) -> Option<&QueryRequest> {
        self.last_request.as_ref()
    }

    /// Apply one chunk read from the terminal.
    pub fn handle_input(&mut self, chunk: &[u8]) -> KeyOutcome {
        let before = self.query.clone();

        match chunk {
            [CTRL_C] => return KeyOutcome::Interrupt,
            [b'\r'] | [b'\n'] => return KeyOutcome::Commit,
            [DELETE] | [BACKSPACE] => {
                self.query.pop();
            }
            [CTRL_U] => self.query.clear(),
            [CTRL_W] => self.query = delete_last_word(&self.query),
            _ => match std::str::from_utf8(chunk) {
                Ok(text) if !text.is_empty() && !text.chars().any(char::is_control) => {
                    self.query.push_str(text);
                }
                _ => debug!("Ignoring input {chunk:?}"),
            },
        }

        if self.query == before {
            KeyOutcome::Unchanged
        } else {
            KeyOutcome::Changed
        }
    }

    /// Parse the query and run the selection. Failures are shown instead
    /// of results and clear the last results.
    pub fn evaluate(&mut self, settings: &Settings) -> View {
        match self.try_evaluate(settings) {
            Ok(view) => view,
            Err(message) => {
                self.last_results.clear();
                self.last_args = None;
                self.last_request = None;
                View::Error(message)
            }
        }
    }

    fn try_evaluate(&mut self, settings: &Settings) -> Result<View, String> {
        let words = shell_words::split(&self.query).map_err(|e| e.to_string())?;
        let typed = LiveQuery::try_parse_from(std::iter::once("music".to_string()).chain(words))
            .map_err(|e| e.to_string())?
            .play;
        let args = self.with_defaults(typed);

        let request = QueryRequest::from_play_args(&args, settings).map_err(|e| format!("{e:#}"))?;
        let songs = selection::select(&request, &NoEditor).map_err(|e| format!("{e:#}"))?;

        self.last_results = songs.clone();
        self.last_args = Some(args);
        self.last_request = Some(request);
        Ok(View::Results(songs))
    }

    /// The player and flags for the last successful evaluation.
    pub fn commit(&self, settings: &Settings) -> Commit<'_> {
        let (Some(args), Some(request)) = (self.last_args.as_ref(), self.last_request.as_ref()) else {
            return Commit::NothingSelected;
        };
        if self.last_results.is_empty() {
            return Commit::NothingSelected;
        }

        let player = Player::new(
            args.vlc_path.clone().unwrap_or_else(|| settings.vlc_path.clone()),
            args.dry_run,
            args.persist || settings.persist,
        );

        Commit::Play {
            player,
            flags: PlaybackFlags::for_request(request, args.random, args.append),
            request,
            songs: &self.last_results,
        }
    }

    fn with_defaults(&self, typed: PlayArgs) -> PlayArgs {
        let base = &self.base;
        PlayArgs {
            terms: if typed.terms.is_empty() { base.terms.clone() } else { typed.terms },
            tags: if typed.tags.is_empty() { base.tags.clone() } else { typed.tags },
            limit: typed.limit.or(base.limit),
            skip: typed.skip.or(base.skip),
            new: typed.new || base.new,
            play_new_first: typed.play_new_first || base.play_new_first,
            delete_old_first: typed.delete_old_first || base.delete_old_first,
            songs_path: typed.songs_path.or_else(|| base.songs_path.clone()),
            vlc_path: typed.vlc_path.or_else(|| base.vlc_path.clone()),
            sort_type: typed.sort_type.or(base.sort_type),
            dry_run: typed.dry_run || base.dry_run,
            persist: typed.persist || base.persist,
            random: typed.random || base.random,
            append: typed.append || base.append,
            editor: false,
            live: false,
            ..typed
        }
    }
}

fn is_word_separator(c: char) -> bool {
    c.is_whitespace() || c == '#' || c == ','
}

/// Drop trailing whitespace, the last word and the one separator in front
/// of it. Earlier separators are kept as typed.
pub fn delete_last_word(query: &str) -> String {
    let trimmed = query.trim_end();
    match trimmed.rfind(is_word_separator) {
        Some(index) => trimmed[..index].to_string(),
        None => String::new(),
    }
}

/// Draw the prompt and `view` from the cursor position down, then park the
/// cursor right after the query text.
pub fn render(out: &mut impl Write, query: &str, view: &View, columns: u16) -> io::Result<()> {
    let columns = usize::from(columns.max(1));
    let lines = view.lines();

    queue!(out, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
    write!(out, "{PROMPT}{query}\r\n")?;
    write!(out, "{}\r\n", "-".repeat(columns.saturating_sub(1).min(80)))?;
    write!(out, "{}", lines.join("\r\n"))?;

    let body_rows: usize = lines.iter().map(|line| rows(line, columns)).sum();
    let up = body_rows.max(1) + 1;
    let column = (PROMPT.chars().count() + query.chars().count()) % columns;

    queue!(out, MoveUp(up as u16), MoveToColumn(column as u16))?;
    out.flush()
}

/// Terminal rows taken by `line`, counting wraps.
fn rows(line: &str, columns: usize) -> usize {
    line.chars().count().div_ceil(columns).max(1)
}

/// Restores cooked mode when dropped.
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to switch the terminal to raw mode")?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to restore terminal mode: {e}");
        }
    }
}

/// Run the interactive search until Enter or Ctrl-C.
pub fn run(settings: &Settings, base: PlayArgs) -> Result<()> {
    let mut session = LiveSession::new(base);
    let mut stdin = io::stdin().lock();
    let mut stdout = io::stdout();
    let mut buffer = [0u8; 64];

    let outcome = {
        let _raw = RawModeGuard::enable()?;
        render(&mut stdout, "", &View::Results(Vec::new()), terminal_width())?;

        let outcome = loop {
            let read = stdin.read(&mut buffer).context("Failed to read from terminal")?;
            if read == 0 {
                break KeyOutcome::Interrupt;
            }

            match session.handle_input(&buffer[..read]) {
                KeyOutcome::Changed => {
                    let view = session.evaluate(settings);
                    render(&mut stdout, session.query(), &view, terminal_width())?;
                }
                KeyOutcome::Unchanged => {}
                outcome => break outcome,
            }
        };

        queue!(stdout, MoveToColumn(0), Clear(ClearType::FromCursorDown))?;
        stdout.flush()?;
        outcome
    };

    if outcome == KeyOutcome::Interrupt {
        debug!("Live search interrupted");
        return Ok(());
    }

    finish(&mut stdout, session.commit(settings))
}

/// Report what Enter selected and start the player.
pub fn finish(out: &mut impl Write, commit: Commit<'_>) -> Result<()> {
    let Commit::Play {
        player,
        flags,
        request,
        songs,
    } = commit
    else {
        writeln!(out, "No songs selected.")?;
        return Ok(());
    };

    writeln!(out, "{}", player::message(songs))?;
    out.flush()?;
    player.launch(&request.root, songs, flags);

    if !player.dry_run {
        thread::sleep(EXIT_GRACE);
    }
    Ok(())
}

fn terminal_width() -> u16 {
    terminal::size().map(|(columns, _)| columns).unwrap_or(80)
}
