//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for `music` using Clap derive macros.
//! The `play` options live in [`PlayArgs`] so the live search loop can parse the
//! text typed at its prompt with exactly the same grammar (see [`LiveQuery`]).
//!
//! ## Commands
//!
//! - `play`: Select songs by query and hand them to the player
//! - `tags`: List tags, or the songs stored under some tags
//! - `config-path`: Print where the configuration file is read from
//! - `completion`: Generate shell completion scripts
//!
//! ## Examples
//!
//! ```bash
//! music play rock '!live'
//! music play -n -l 10 --dry-paths
//! music play jazz#piano,sax -t faves --add-to-tag evening
//! music play --live
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::request::SortType;

/// Environment variable read by `--songs-path`.
pub const SONGS_PATH_ENV: &str = "MUSIC_SONGS_PATH";

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// The main structure contains only a subcommand since all functionality is
/// accessed through specific commands.
#[derive(Parser, Debug)]
#[command(name = "music")]
#[command(about = "Query a music directory and play the matching songs")]
#[command(version)]
pub struct Args {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Select songs and play them
    ///
    /// A song is kept when one of the positional terms matches its path
    /// (case-insensitive). Inside a term `#` separates sections that must
    /// all match and `,` separates alternatives. A leading `!` excludes
    /// matching songs.
    ///
    /// With no terms, tags or limit the whole music directory is played.
    Play(PlayArgs),

    /// List tags and their songs
    ///
    /// Without names every tag is listed with its song count. With names
    /// the songs stored under each of those tags are printed.
    Tags {
        /// Tags to print the songs of
        names: Vec<String>,

        /// Music directory holding the tag file
        #[arg(long, env = SONGS_PATH_ENV, value_hint = clap::ValueHint::DirPath)]
        songs_path: Option<PathBuf>,
    },

    /// Print the configuration file location
    ConfigPath,

    /// Generate shell completions
    ///
    /// Usage: music completion bash > ~/.local/share/bash-completion/completions/music
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Options of the `play` command.
///
/// Also the grammar of the live search prompt.
#[derive(ClapArgs, Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayArgs {
    /// Query terms matched against song paths
    ///
    /// `rock#live` needs both words, `rock,pop` needs either one,
    /// `!jazz` drops songs containing "jazz".
    #[arg(value_hint = clap::ValueHint::Other)]
    pub terms: Vec<String>,

    /// Maximum number of songs to play
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Number of matching songs to skip
    #[arg(long)]
    pub skip: Option<usize>,

    /// Select the newest songs and play them newest first
    #[arg(short, long)]
    pub new: bool,

    /// Play newest first without changing which songs are selected
    #[arg(long, visible_alias = "pnf")]
    pub play_new_first: bool,

    /// Select the newest songs (same selection as --new)
    #[arg(long, visible_alias = "dof")]
    pub delete_old_first: bool,

    /// Do everything except starting the player
    #[arg(short, long)]
    pub dry_run: bool,

    /// Print the absolute paths of the selection instead of playing it
    #[arg(short = 'p', long)]
    pub dry_paths: bool,

    /// Wait for the player to exit
    #[arg(long)]
    pub persist: bool,

    /// Search interactively, re-running the query on every keystroke
    #[arg(long)]
    pub live: bool,

    /// Edit the selection in $EDITOR before playing
    #[arg(short, long)]
    pub editor: bool,

    /// Tag terms, same grammar as the positional terms (repeatable)
    #[arg(short, long)]
    pub tags: Vec<String>,

    /// Add the selection to this tag
    #[arg(short, long, value_name = "TAG")]
    pub add_to_tag: Option<String>,

    /// Replace the songs of this tag with the selection
    #[arg(long, value_name = "TAG")]
    pub set_to_tag: Option<String>,

    /// Timestamp used by --new, --play-new-first and --delete-old-first
    #[arg(short, long, value_enum)]
    pub sort_type: Option<SortType>,

    /// Player executable
    #[arg(long, value_hint = clap::ValueHint::CommandName)]
    pub vlc_path: Option<String>,

    /// Music directory to search
    #[arg(long, env = SONGS_PATH_ENV, value_hint = clap::ValueHint::DirPath)]
    pub songs_path: Option<PathBuf>,

    /// Ask the player to shuffle
    #[arg(short = 'z', long)]
    pub random: bool,

    /// Append to the player's playlist instead of replacing it
    #[arg(long)]
    pub append: bool,
}

impl PlayArgs {
    /// Nothing narrows, reorders or records the selection, so the player
    /// can open the whole directory by itself.
    pub fn plays_everything(&self) -> bool {
        self.terms.is_empty()
            && self.tags.is_empty()
            && self.limit.map_or(true, |limit| limit == 0)
            && self.skip.map_or(true, |skip| skip == 0)
            && !self.dry_paths
            && !self.new
            && !self.play_new_first
            && !self.delete_old_first
            && !self.editor
            && !self.live
            && self.add_to_tag.is_none()
            && self.set_to_tag.is_none()
    }
}

/// Parser for the text typed at the live search prompt.
#[derive(Parser, Debug)]
#[command(name = "music")]
pub struct LiveQuery {
    #[command(flatten)]
    pub play: PlayArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn play(args: &[&str]) -> PlayArgs {
        let argv = ["music", "play"].iter().chain(args.iter()).copied();
        match Args::try_parse_from(argv).unwrap().command {
            Command::Play(play) => play,
            other => panic!("expected play, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_is_consistent() {
        Args::command().debug_assert();
        LiveQuery::command().debug_assert();
    }

    #[test]
    fn test_play_terms_and_flags() {
        let args = play(&["rock#live", "!jazz", "-l", "5", "--skip", "2", "-n", "-s", "a"]);

        assert_eq!(args.terms, vec!["rock#live", "!jazz"]);
        assert_eq!(args.limit, Some(5));
        assert_eq!(args.skip, Some(2));
        assert!(args.new);
        assert_eq!(args.sort_type, Some(SortType::Access));
    }

    #[test]
    fn test_repeated_tags() {
        let args = play(&["-t", "faves", "--tags", "!old"]);
        assert_eq!(args.tags, vec!["faves", "!old"]);
    }

    #[test]
    fn test_aliases() {
        assert!(play(&["--pnf"]).play_new_first);
        assert!(play(&["--dof"]).delete_old_first);
        assert_eq!(play(&["-s", "creation"]).sort_type, Some(SortType::Creation));
    }

    #[test]
    fn test_tag_mutation_flags() {
        let args = play(&["rock", "-a", "mine", "--set-to-tag", "other"]);
        assert_eq!(args.add_to_tag.as_deref(), Some("mine"));
        assert_eq!(args.set_to_tag.as_deref(), Some("other"));
    }

    #[test]
    fn test_live_query_uses_play_grammar() {
        let parsed = LiveQuery::try_parse_from(["music", "rock", "-n", "-l", "3"]).unwrap();
        assert_eq!(parsed.play.terms, vec!["rock"]);
        assert!(parsed.play.new);
        assert_eq!(parsed.play.limit, Some(3));

        assert!(LiveQuery::try_parse_from(["music", "-l", "lots"]).is_err());
    }

    #[test]
    fn test_plays_everything() {
        assert!(play(&[]).plays_everything());
        assert!(play(&["-z", "--append"]).plays_everything());
        assert!(play(&["-l", "0"]).plays_everything());
        assert!(!play(&["rock"]).plays_everything());
        assert!(!play(&["-t", "faves"]).plays_everything());
        assert!(!play(&["-l", "3"]).plays_everything());
        assert!(!play(&["-p"]).plays_everything());
        assert!(!play(&["--live"]).plays_everything());
        assert!(!play(&["--skip", "4"]).plays_everything());
        assert!(!play(&["--add-to-tag", "all"]).plays_everything());
    }

    #[test]
    fn test_other_commands() {
        let args = Args::try_parse_from(["music", "tags", "faves", "old"]).unwrap();
        assert!(matches!(args.command, Command::Tags { ref names, .. } if names.len() == 2));

        let args = Args::try_parse_from(["music", "completion", "fish"]).unwrap();
        assert!(matches!(args.command, Command::Completion { shell: Shell::Fish }));
    }
}
