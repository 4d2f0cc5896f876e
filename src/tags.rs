//! Tag sidecar file stored at the root of the music directory.
//!
//! The file is a JSON array of `{ "name": ..., "songs": [...] }` objects.
//! It is always read and written whole; there is no locking, so two
//! processes mutating tags at once can lose one of the updates.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const TAG_FILE_NAME: &str = "tags.json";

/// A named set of songs, stored as normalized relative paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub songs: Vec<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            songs: Vec::new(),
        }
    }

    /// `song` must already be normalized with [`normalize_song_path`].
    pub fn contains_song(&self, song: &str) -> bool {
        self.songs.iter().any(|s| s == song)
    }

    fn push_unique(&mut self, song: String) {
        if !self.contains_song(&song) {
            self.songs.push(song);
        }
    }
}

/// Lower-case a relative song path and drop one leading separator.
pub fn normalize_song_path(path: &str) -> String {
    let trimmed = path
        .strip_prefix('/')
        .or_else(|| path.strip_prefix(std::path::MAIN_SEPARATOR))
        .unwrap_or(path);
    trimmed.to_lowercase()
}

/// Handle to the tag file of one music library.
#[derive(Debug, Clone)]
pub struct TagStore {
    path: PathBuf,
}

impl TagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store living next to the songs in `music_root`.
    pub fn for_library(music_root: &Path) -> Self {
        Self::new(music_root.join(TAG_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored tag. A missing or empty file means no tags.
    pub fn get_tags(&self) -> Result<Vec<Tag>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No tag file at {}", self.path.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read tag file {}", self.path.display())
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut tags: Vec<Tag> = serde_json::from_str(&content)
            .with_context(|| format!("Tag file {} is not valid JSON", self.path.display()))?;

        for tag in &mut tags {
            for song in &mut tag.songs {
                *song = normalize_song_path(song);
            }
        }

        Ok(tags)
    }

    /// Overwrite the tag file with `tags`.
    pub fn save(&self, tags: &[Tag]) -> Result<()> {
        let json = serde_json::to_string(tags).context("Failed to serialize tags")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write tag file {}", self.path.display()))
    }

    /// Add `songs` to the tag called `name`, creating it when missing.
    ///
    /// With `append` the songs are merged into the existing membership
    /// (no duplicates); without it the membership is replaced.
    pub fn change_songs_in_tag<S: AsRef<str>>(
        &self,
        name: &str,
        songs: &[S],
        append: bool,
    ) -> Result<Tag> {
        let mut tags = self.get_tags()?;

        let index = match tags.iter().position(|t| t.name == name) {
            Some(index) => index,
            None => {
                tags.push(Tag::new(name));
                tags.len() - 1
            }
        };

        let tag = &mut tags[index];
        if !append {
            tag.songs.clear();
        }
        for song in songs {
            tag.push_unique(normalize_song_path(song.as_ref()));
        }
        let updated = tag.clone();

        self.save(&tags)?;
        info!(
            "{} {} song(s) {} tag '{}'",
            if append { "Added" } else { "Set" },
            songs.len(),
            if append { "to" } else { "as" },
            name
        );

        Ok(updated)
    }
}
