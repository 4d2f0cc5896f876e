//! Query a music directory from the command line and play what matches.
//!
//! There is no index: every query walks the music directory and matches
//! each file's path (relative to the root) against the query terms.
//!
//! Core modules:
//! - [`query`] - Term grammar and the matcher
//! - [`walker`] - Recursive directory walk with early stop
//! - [`selection`] - Walk, recency sort, limit, skip and editor pass
//! - [`live`] - Interactive search re-run on every keystroke
//! - [`tags`] - Named song lists stored next to the music
//!
//! ### Supporting Modules
//!
//! - [`request`] - The query value built from flags and configuration
//! - [`player`] - Player invocation
//! - [`editor`] - `$EDITOR` pass over a selection
//! - [`config`] - Configuration file and defaults
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Query grammar
//!
//! A term is split into sections on `#` and each section into words on
//! `,`. A song matches a term when every section has a word contained in
//! its lower-cased path, and is kept when it matches at least one term.
//! Terms starting with `!` exclude the songs they match. Tag terms use the
//! same grammar against tag names.
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use music::editor::ExternalEditor;
//! use music::{request::QueryRequest, selection};
//!
//! let request = QueryRequest::builder("/home/me/Music")
//!     .terms(["rock#live,acoustic", "!demo"])
//!     .limit(Some(10))
//!     .new(true)
//!     .build();
//!
//! let songs = selection::select(&request, &ExternalEditor::from_env())?;
//! println!("{}", music::player::message(&songs));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod editor;
pub mod live;
pub mod player;
pub mod query;
pub mod request;
pub mod selection;
pub mod tags;
pub mod walker;
