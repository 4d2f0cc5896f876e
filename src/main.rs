//! # music
//!
//! Walks a music directory, keeps the songs whose paths match the query and
//! hands them to a media player (VLC by default).
//!
//! ## Usage
//!
//! ```bash
//! # Play everything under the music directory
//! music play
//!
//! # Ten newest rock songs that are not live recordings
//! music play rock '!live' -n -l 10
//!
//! # Search interactively
//! music play --live
//!
//! # Show tags
//! music tags
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::{debug, error, info};
use std::path::PathBuf;

use music::cli::{Args, Command, PlayArgs};
use music::config::{self, Settings};
use music::editor::ExternalEditor;
use music::player::{self, PlaybackFlags, Player};
use music::request::QueryRequest;
use music::tags::TagStore;
use music::{completion, live, selection};

/// Main entry point.
///
/// Initializes logging, parses command-line arguments, and routes commands.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug music play rock` - Enable debug logging
/// - `RUST_LOG=music::walker=warn music play` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Play(play) => {
            let settings = Settings::load()?;
            play_songs(play, &settings)?;
        }
        Command::Tags { names, songs_path } => {
            let settings = Settings::load()?;
            list_tags(&names, songs_path, &settings)?;
        }
        Command::ConfigPath => {
            println!("{}", config::get_config_path()?.display());
        }
        Command::Completion { shell } => {
            let mut cmd = Args::command();
            completion::generate_completions(completion::shell_to_completion_shell(shell), &mut cmd);
        }
    }

    Ok(())
}

fn play_songs(args: PlayArgs, settings: &Settings) -> Result<()> {
    if args.live {
        return live::run(settings, args);
    }

    let request = QueryRequest::from_play_args(&args, settings)?;
    let player = Player::new(
        args.vlc_path.clone().unwrap_or_else(|| settings.vlc_path.clone()),
        args.dry_run,
        args.persist || settings.persist,
    );
    let flags = PlaybackFlags::for_request(&request, args.random, args.append);

    if args.plays_everything() {
        println!("Playing all songs");
        if let Err(e) = player.play_all(&request.root, flags) {
            error!("Error: {e:#}");
        }
        return Ok(());
    }

    let songs = selection::select(&request, &ExternalEditor::from_env())?;
    if songs.is_empty() {
        eprintln!("Didn't match anything");
        return Ok(());
    }

    let store = TagStore::for_library(&request.root);
    if let Some(name) = &args.add_to_tag {
        store.change_songs_in_tag(name, &songs, true)?;
    }
    if let Some(name) = &args.set_to_tag {
        store.change_songs_in_tag(name, &songs, false)?;
    }

    if args.dry_paths {
        for song in &songs {
            println!("{}", request.root.join(song).display());
        }
        return Ok(());
    }

    println!("{}", player::message(&songs));
    info!("Starting {} with {} song(s)", player.executable, songs.len());
    player.launch(&request.root, &songs, flags);

    Ok(())
}

fn list_tags(names: &[String], songs_path: Option<PathBuf>, settings: &Settings) -> Result<()> {
    let root = songs_path.unwrap_or_else(|| settings.music_path.clone());
    let store = TagStore::for_library(&root);
    let tags = store.get_tags()?;
    debug!("Read {} tag(s) from {}", tags.len(), store.path().display());

    if names.is_empty() {
        if tags.is_empty() {
            eprintln!("No tags in {}", store.path().display());
        }
        for tag in &tags {
            println!("{} ({})", tag.name, tag.songs.len());
        }
        return Ok(());
    }

    for name in names {
        match tags.iter().find(|tag| &tag.name == name) {
            Some(tag) => {
                println!("{}:", tag.name);
                for song in &tag.songs {
                    println!("- {song}");
                }
            }
            None => eprintln!("No tag named '{name}'"),
        }
    }

    Ok(())
}
