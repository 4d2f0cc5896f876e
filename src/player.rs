//! Hands a selection to an external media player (VLC compatible flags).
//!
//! Only the argument list is built here. The player process is either
//! spawned and left running on its own, or waited on with `--persist`.

use anyhow::{Context, Result};
use log::{debug, error, info};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::request::QueryRequest;

/// Playback order and playlist handling passed to the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackFlags {
    /// Keep the given order.
    pub no_random: bool,
    /// Shuffle (ignored when `no_random` is set).
    pub random: bool,
    /// Append to the running player's playlist instead of replacing it.
    pub enqueue: bool,
}

impl PlaybackFlags {
    /// Recency-ordered selections always play in order.
    pub fn for_request(request: &QueryRequest, random: bool, enqueue: bool) -> Self {
        Self {
            no_random: request.new || request.play_new_first,
            random,
            enqueue,
        }
    }

    fn args(&self) -> Vec<OsString> {
        let mut args = Vec::new();

        if self.no_random {
            args.push("--no-random".into());
        } else if self.random {
            args.push("--random".into());
        }

        if self.enqueue {
            args.push("--playlist-enqueue".into());
        } else {
            args.push("--no-playlist-enqueue".into());
        }

        args
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    /// Executable name or path.
    pub executable: String,
    /// Build everything but never start the player.
    pub dry_run: bool,
    /// Wait for the player to exit.
    pub persist: bool,
}

impl Player {
    pub fn new(executable: impl Into<String>, dry_run: bool, persist: bool) -> Self {
        Self {
            executable: executable.into(),
            dry_run,
            persist,
        }
    }

    /// Absolute song paths followed by the playback flags.
    pub fn song_args<S: AsRef<str>>(root: &Path, songs: &[S], flags: PlaybackFlags) -> Vec<OsString> {
        songs
            .iter()
            .map(|song| root.join(song.as_ref()).into_os_string())
            .chain(flags.args())
            .collect()
    }

    /// Play `songs` (relative to `root`) in the given order.
    pub fn play<S: AsRef<str>>(&self, root: &Path, songs: &[S], flags: PlaybackFlags) -> Result<()> {
        self.run(root, Self::song_args(root, songs, flags))
    }

    /// Let the player expand the whole music directory itself.
    pub fn play_all(&self, root: &Path, flags: PlaybackFlags) -> Result<()> {
        let mut args: Vec<OsString> = vec!["--recursive=expand".into(), root.as_os_str().to_owned()];
        args.extend(flags.args());
        self.run(root, args)
    }

    /// [`Player::play`], logging failures instead of returning them.
    pub fn launch<S: AsRef<str>>(&self, root: &Path, songs: &[S], flags: PlaybackFlags) {
        self.play(root, songs, flags).unwrap_or_else(|e| {
            error!("Error: {e:#}");
        });
    }

    fn run(&self, root: &Path, args: Vec<OsString>) -> Result<()> {
        if self.dry_run {
            debug!("Dry run, not starting {} with {} argument(s)", self.executable, args.len());
            return Ok(());
        }

        let mut command = Command::new(&self.executable);
        command
            .current_dir(root)
            .args(&args)
            .stderr(Stdio::null());

        if self.persist {
            info!("Running {} until it exits", self.executable);
            command
                .status()
                .with_context(|| format!("Error trying to play music with `{}`", self.executable))?;
        } else {
            command
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .spawn()
                .with_context(|| format!("Error trying to play music with `{}`", self.executable))?;
        }

        Ok(())
    }
}

/// Summary printed before playback.
pub fn message<S: AsRef<str>>(songs: &[S]) -> String {
    let mut message = format!("Playing: [{}]", songs.len());
    for song in songs {
        message.push_str("\n- ");
        message.push_str(song.as_ref());
    }
    message
}
