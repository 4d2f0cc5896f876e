//! Recursive walk of the music directory.
//!
//! Pre-order, depth first, in the order the OS lists directory entries (no
//! sorting). Every file is run through the [`QueryMatcher`]; matches are
//! collected as paths relative to the root. Once the optional limit is
//! reached the walk returns [`ControlFlow::Break`] and no further
//! directories are opened.
//!
//! Symlinks are followed, to directories as well as files. A link back to
//! one of its own ancestors is reported as a loop and skipped, so cyclic
//! trees terminate. Entries that cannot be read below the root are logged
//! and skipped; only an unreadable root fails the walk.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use walkdir::WalkDir;

use crate::query::QueryMatcher;
use crate::request::QueryRequest;
use crate::tags::{Tag, TAG_FILE_NAME};

/// Skip and limit applied while walking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Stop once this many songs are collected.
    pub limit: Option<usize>,
    /// Drop this many matches before collecting.
    pub skip: usize,
}

pub struct DirectoryWalker<'a> {
    root: &'a Path,
    matcher: &'a QueryMatcher,
    tags: Option<&'a [Tag]>,
    options: WalkOptions,
}

/// Accumulator owned by a single walk.
#[derive(Default)]
struct WalkState {
    songs: Vec<String>,
    skipped: usize,
}

impl<'a> DirectoryWalker<'a> {
    pub fn new(root: &'a Path, matcher: &'a QueryMatcher, tags: Option<&'a [Tag]>) -> Self {
        Self {
            root,
            matcher,
            tags,
            options: WalkOptions::default(),
        }
    }

    pub fn options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    /// Walk the tree and return the matching relative paths.
    pub fn walk(&self) -> Result<Vec<String>> {
        fs::read_dir(self.root)
            .with_context(|| format!("Failed to read music directory {}", self.root.display()))?;

        let mut state = WalkState::default();
        let entries = WalkDir::new(self.root).follow_links(true).into_iter();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    // unreadable directories, broken links and link loops
                    warn!("Skipping {e}");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if self.visit_file(entry.path(), &mut state).is_break() {
                debug!("Walk stopped early at {} song(s)", state.songs.len());
                break;
            }
        }

        Ok(state.songs)
    }

    fn visit_file(&self, path: &Path, state: &mut WalkState) -> ControlFlow<()> {
        let Some(relative) = self.relative(path) else {
            return ControlFlow::Continue(());
        };

        if relative == TAG_FILE_NAME || !self.matcher.matches(self.tags, &relative) {
            return ControlFlow::Continue(());
        }

        if state.skipped < self.options.skip {
            state.skipped += 1;
            return ControlFlow::Continue(());
        }

        state.songs.push(relative);

        match self.options.limit {
            Some(limit) if state.songs.len() >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(self.root).ok()?;
        match relative.to_str() {
            Some(relative) => Some(relative.to_owned()),
            None => {
                warn!("Skipping non UTF-8 path {}", path.display());
                None
            }
        }
    }
}

/// Walk `request.root` with the request's terms, skip and walk limit.
pub fn walk(request: &QueryRequest, tags: Option<&[Tag]>) -> Result<Vec<String>> {
    let matcher = QueryMatcher::new(request.terms.as_slice(), request.tag_terms.as_slice());
    let options = WalkOptions {
        limit: request.walk_limit(),
        skip: request.walk_skip(),
    };

    DirectoryWalker::new(&request.root, &matcher, tags)
        .options(options)
        .walk()
}
