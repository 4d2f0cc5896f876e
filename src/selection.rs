//! Turns a [`QueryRequest`] into the final ordered song list.
//!
//! Steps, always in this order:
//!
//! 1. walk with the request's walk limit and walk skip
//! 2. stop early on an empty result
//! 3. `new` / `delete-old-first`: sort newest first
//! 4. truncate to `limit`
//! 5. drop `skip` songs if the sort in step 3 ran (the walk skipped otherwise)
//! 6. `play-new-first` alone: sort newest first again, for playback order only
//! 7. `editor`: the user's edited list replaces the result
//!
//! Sorting before the limit picks the newest N songs. `play-new-first` only
//! reorders whatever the walk picked.

use anyhow::{Context, Result};
use log::debug;
use std::cmp::Reverse;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
use std::time::SystemTime;

use crate::editor::SongListEditor;
use crate::request::{QueryRequest, SortType};
use crate::tags::TagStore;
use crate::walker;

/// Run the whole selection pipeline for `request`.
pub fn select(request: &QueryRequest, editor: &dyn SongListEditor) -> Result<Vec<String>> {
    let tags = if request.tag_terms.is_empty() {
        None
    } else {
        Some(TagStore::for_library(&request.root).get_tags()?)
    };

    debug!(
        "Walking {} (walk limit {:?}, walk skip {})",
        request.root.display(),
        request.walk_limit(),
        request.walk_skip()
    );
    let mut songs = walker::walk(request, tags.as_deref())?;

    if songs.is_empty() {
        return Ok(songs);
    }

    if request.sorts_before_limit() {
        sort_by_recency(&request.root, &mut songs, request.sort_type)?;
    }

    if let Some(limit) = request.limit {
        songs.truncate(limit);
    }

    if request.sorts_before_limit() {
        if let Some(skip) = request.skip {
            songs.drain(..skip.min(songs.len()));
        }
    }

    if request.play_new_first && !request.sorts_before_limit() {
        sort_by_recency(&request.root, &mut songs, request.sort_type)?;
    }

    if request.editor {
        songs = editor.edit(&songs)?;
    }

    debug!("Selected {} song(s)", songs.len());
    Ok(songs)
}

/// Sort relative song paths newest first by the chosen timestamp.
///
/// Stable: songs with equal timestamps keep walk order.
pub fn sort_by_recency(root: &Path, songs: &mut Vec<String>, sort_type: SortType) -> Result<()> {
    let mut stamped = songs
        .drain(..)
        .map(|song| -> Result<(SystemTime, String)> {
            Ok((timestamp(&root.join(&song), sort_type)?, song))
        })
        .collect::<Result<Vec<_>>>()?;

    stamped.sort_by_key(|(time, _)| Reverse(*time));
    songs.extend(stamped.into_iter().map(|(_, song)| song));
    Ok(())
}

/// Read the requested timestamp of a file.
pub fn timestamp(path: &Path, sort_type: SortType) -> Result<SystemTime> {
    let meta = fs::metadata(path)
        .with_context(|| format!("Error trying to read '{}'", path.display()))?;

    let time = match sort_type {
        SortType::Access => meta.accessed(),
        SortType::Creation => creation_time(&meta),
        SortType::Modification => meta.modified(),
    };

    time.with_context(|| format!("No {sort_type:?} time available for '{}'", path.display()))
}

#[cfg(unix)]
fn creation_time(meta: &Metadata) -> io::Result<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::{Duration, UNIX_EPOCH};

    let nanos = Duration::from_nanos(meta.ctime_nsec().max(0) as u64);
    let secs = Duration::from_secs(meta.ctime().unsigned_abs());
    Ok(if meta.ctime() >= 0 {
        UNIX_EPOCH + secs + nanos
    } else {
        UNIX_EPOCH - secs + nanos
    })
}

#[cfg(not(unix))]
fn creation_time(meta: &Metadata) -> io::Result<SystemTime> {
    meta.created()
}
