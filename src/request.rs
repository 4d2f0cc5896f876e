//! The structured query handed to the selection pipeline.
//!
//! A [`QueryRequest`] is assembled once from parsed command-line flags and
//! configuration defaults, then only read.

use anyhow::{Context, Result};
use clap::ValueEnum;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::PlayArgs;
use crate::config::Settings;

/// Filesystem timestamp used for recency ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum SortType {
    /// Last access time
    #[value(name = "a", alias = "access")]
    #[serde(rename = "a", alias = "access")]
    Access,
    /// Creation time (status change time on Unix)
    #[value(name = "c", alias = "creation")]
    #[serde(rename = "c", alias = "creation")]
    Creation,
    /// Last modification time
    #[default]
    #[value(name = "m", alias = "modification")]
    #[serde(rename = "m", alias = "modification")]
    Modification,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub terms: Vec<String>,
    pub tag_terms: Vec<String>,
    /// Music directory to walk.
    pub root: PathBuf,
    pub limit: Option<usize>,
    pub skip: Option<usize>,
    pub sort_type: SortType,
    /// Select the newest songs.
    pub new: bool,
    /// Same selection semantics as `new`.
    pub delete_old_first: bool,
    /// Order playback by recency without affecting which songs are selected.
    pub play_new_first: bool,
    /// Pass the result through `$EDITOR`.
    pub editor: bool,
}

impl QueryRequest {
    pub fn builder(root: impl Into<PathBuf>) -> QueryRequestBuilder {
        QueryRequestBuilder::with_root(root)
    }

    /// Merge parsed play flags with configuration defaults.
    pub fn from_play_args(args: &PlayArgs, settings: &Settings) -> Result<Self> {
        let root = args
            .songs_path
            .as_deref()
            .unwrap_or(settings.music_path.as_path());

        Ok(Self::builder(resolve_root(root)?)
            .terms(args.terms.iter().cloned())
            .tag_terms(args.tags.iter().cloned())
            .limit(args.limit)
            .skip(args.skip)
            .sort_type(args.sort_type.unwrap_or(settings.sort_type))
            .new(args.new)
            .delete_old_first(args.delete_old_first)
            .play_new_first(args.play_new_first)
            .editor(args.editor)
            .build())
    }

    /// Recency sort runs before the limit is applied, so it decides which
    /// songs are kept.
    pub fn sorts_before_limit(&self) -> bool {
        self.new || self.delete_old_first
    }

    /// Any recency sort will run after the walk.
    pub fn needs_recency_sort(&self) -> bool {
        self.sorts_before_limit() || self.play_new_first
    }

    /// Cap pushed into the directory walk.
    ///
    /// None when a later sort has to see every match. Otherwise the limit
    /// grows by `skip` so skipped songs do not eat into it.
    pub fn walk_limit(&self) -> Option<usize> {
        if self.needs_recency_sort() {
            return None;
        }

        self.limit.map(|limit| limit.saturating_add(self.skip.unwrap_or(0)))
    }

    /// Matches the walker drops before collecting. Skipping moves after the
    /// sort when the sort picks the selection.
    pub fn walk_skip(&self) -> usize {
        if self.sorts_before_limit() {
            0
        } else {
            self.skip.unwrap_or(0)
        }
    }
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let absolute = root
        .absolutize()
        .with_context(|| format!("Invalid music directory path {}", root.display()))?;
    Ok(absolute.into_owned())
}

/// Builder for [`QueryRequest`]. Zero limits and skips count as unset.
#[derive(Debug, Clone)]
pub struct QueryRequestBuilder {
    request: QueryRequest,
}

impl QueryRequestBuilder {
    fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            request: QueryRequest {
                terms: Vec::new(),
                tag_terms: Vec::new(),
                root: root.into(),
                limit: None,
                skip: None,
                sort_type: SortType::default(),
                new: false,
                delete_old_first: false,
                play_new_first: false,
                editor: false,
            },
        }
    }

    pub fn terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.terms = terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn tag_terms<I, S>(mut self, tag_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.tag_terms = tag_terms.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.request.limit = limit.filter(|&l| l > 0);
        self
    }

    pub fn skip(mut self, skip: Option<usize>) -> Self {
        self.request.skip = skip.filter(|&s| s > 0);
        self
    }

    pub fn sort_type(mut self, sort_type: SortType) -> Self {
        self.request.sort_type = sort_type;
        self
    }

    pub fn new(mut self, new: bool) -> Self {
        self.request.new = new;
        self
    }

    pub fn delete_old_first(mut self, delete_old_first: bool) -> Self {
        self.request.delete_old_first = delete_old_first;
        self
    }

    pub fn play_new_first(mut self, play_new_first: bool) -> Self {
        self.request.play_new_first = play_new_first;
        self
    }

    pub fn editor(mut self, editor: bool) -> Self {
        self.request.editor = editor;
        self
    }

    pub fn build(self) -> QueryRequest {
        self.request
    }
}
