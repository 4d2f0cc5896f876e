//! Hand a song list to the user's editor and read back what they kept.

use anyhow::{bail, Context, Result};
use log::debug;
use std::env;
use std::fs;
use std::io::Write;
use std::process::Command;

const DEFAULT_EDITOR: &str = "vi";

/// Something that lets the user rewrite an ordered song list.
pub trait SongListEditor {
    /// Return the edited list. The result replaces the input verbatim.
    fn edit(&self, songs: &[String]) -> Result<Vec<String>>;
}

/// Runs an interactive editor on a temporary file.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Use `$EDITOR`, falling back to `vi`.
    pub fn from_env() -> Self {
        let command = env::var("EDITOR")
            .ok()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_EDITOR.to_string());
        Self::new(command)
    }

    /// Open `text` in the editor, block until it exits and return the
    /// saved file content.
    pub fn edit_text(&self, text: &str) -> Result<String> {
        let mut file = tempfile::Builder::new()
            .prefix("music-playlist-")
            .suffix(".txt")
            .tempfile()
            .context("Failed to create temporary playlist file")?;
        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .context("Failed to write temporary playlist file")?;

        let parts = shell_words::split(&self.command)
            .with_context(|| format!("Invalid editor command `{}`", self.command))?;
        let Some((program, args)) = parts.split_first() else {
            bail!("Editor command is empty");
        };

        debug!("Opening {} with {}", file.path().display(), self.command);
        let status = Command::new(program)
            .args(args)
            .arg(file.path())
            .status()
            .with_context(|| format!("Failed to run editor `{}`", self.command))?;

        if !status.success() {
            bail!("Editor `{}` exited with {status}", self.command);
        }

        // Read by path: many editors replace the file instead of writing in place.
        fs::read_to_string(file.path()).context("Failed to read back edited playlist")
    }
}

impl SongListEditor for ExternalEditor {
    fn edit(&self, songs: &[String]) -> Result<Vec<String>> {
        let edited = self.edit_text(&songs.join("\n"))?;
        Ok(parse_song_list(&edited))
    }
}

/// One song per line, blank lines dropped.
pub fn parse_song_list(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_owned)
        .collect()
}
