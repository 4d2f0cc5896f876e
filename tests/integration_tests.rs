//! # Integration Tests for music
//!
//! End-to-end tests from a user perspective: the library pipeline over a
//! throwaway music directory, and the compiled `music` binary run against
//! an isolated configuration file.

use anyhow::Result;
use std::fs::{self, File};
use std::path::Path;
use std::process::{Command, Output};
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

/// Test helper to create a music directory. The n-th file is given a
/// modification time n hours after the epoch, so later files are newer.
fn create_test_library(files: &[&str]) -> Result<TempDir> {
    let temp_dir = TempDir::new()?;

    for (i, file) in files.iter().enumerate() {
        let path = temp_dir.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let handle = File::create(&path)?;
        handle.set_modified(UNIX_EPOCH + Duration::from_secs(3600 * (i as u64 + 1)))?;
    }

    Ok(temp_dir)
}

fn sorted(mut songs: Vec<String>) -> Vec<String> {
    songs.sort();
    songs
}

#[cfg(test)]
mod pipeline_tests {
    use super::*;
    use music::editor::SongListEditor;
    use music::request::QueryRequest;
    use music::selection;
    use music::tags::TagStore;

    /// Stand-in for `$EDITOR` that keeps the list as it is.
    struct KeepEditor;

    impl SongListEditor for KeepEditor {
        fn edit(&self, songs: &[String]) -> Result<Vec<String>> {
            Ok(songs.to_vec())
        }
    }

    #[test]
    fn test_term_filters() -> Result<()> {
        let library = create_test_library(&["rock/a.mp3", "rock/b.mp3", "jazz/c.mp3"])?;
        let root = library.path();

        let rock = QueryRequest::builder(root).terms(["rock"]).build();
        assert_eq!(sorted(selection::select(&rock, &KeepEditor)?), vec!["rock/a.mp3", "rock/b.mp3"]);

        let not_jazz = QueryRequest::builder(root).terms(["!jazz"]).build();
        assert_eq!(
            sorted(selection::select(&not_jazz, &KeepEditor)?),
            vec!["rock/a.mp3", "rock/b.mp3"]
        );

        let everything = QueryRequest::builder(root).build();
        assert_eq!(selection::select(&everything, &KeepEditor)?.len(), 3);

        Ok(())
    }

    #[test]
    fn test_sections_and_alternatives() -> Result<()> {
        let library = create_test_library(&[
            "rock/live/one.mp3",
            "rock/studio/two.mp3",
            "rock/acoustic/three.mp3",
            "pop/live/four.mp3",
        ])?;
        let root = library.path();

        let both = QueryRequest::builder(root).terms(["rock#live"]).build();
        assert_eq!(selection::select(&both, &KeepEditor)?, vec!["rock/live/one.mp3"]);

        let either = QueryRequest::builder(root).terms(["rock#live,acoustic"]).build();
        assert_eq!(
            sorted(selection::select(&either, &KeepEditor)?),
            vec!["rock/acoustic/three.mp3", "rock/live/one.mp3"]
        );

        Ok(())
    }

    #[test]
    fn test_newest_songs_with_limit() -> Result<()> {
        let library = create_test_library(&["a.mp3", "b.mp3", "c.mp3", "d.mp3", "e.mp3"])?;

        let request = QueryRequest::builder(library.path())
            .new(true)
            .limit(Some(3))
            .build();

        assert_eq!(
            selection::select(&request, &KeepEditor)?,
            vec!["e.mp3", "d.mp3", "c.mp3"]
        );

        Ok(())
    }

    #[test]
    fn test_tagging_a_selection_then_querying_by_tag() -> Result<()> {
        let library = create_test_library(&["Rock/A.mp3", "rock/b.mp3", "jazz/c.mp3"])?;
        let root = library.path();
        let store = TagStore::for_library(root);

        let jazz = QueryRequest::builder(root).terms(["jazz"]).build();
        let selected = selection::select(&jazz, &KeepEditor)?;
        store.change_songs_in_tag("evening", &selected, true)?;
        store.change_songs_in_tag("evening", &["Rock/A.mp3"], true)?;
        store.change_songs_in_tag("evening", &["Rock/A.mp3"], true)?;

        let tags = store.get_tags()?;
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].songs, vec!["jazz/c.mp3", "rock/a.mp3"]);

        let by_tag = QueryRequest::builder(root).tag_terms(["even"]).build();
        assert_eq!(
            sorted(selection::select(&by_tag, &KeepEditor)?),
            vec!["Rock/A.mp3", "jazz/c.mp3"]
        );

        let not_tagged = QueryRequest::builder(root).tag_terms(["!evening"]).build();
        assert_eq!(selection::select(&not_tagged, &KeepEditor)?, vec!["rock/b.mp3"]);

        Ok(())
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    /// Run the compiled binary with its configuration isolated in `home`.
    fn music(home: &Path, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_music"))
            .args(args)
            .env("MUSIC_CLI_CONFIG", home.join("config.json"))
            .env_remove("MUSIC_SONGS_PATH")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run music binary")
    }

    fn stdout(output: &Output) -> String {
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    #[test]
    fn test_cli_help_displays_correctly() {
        let home = TempDir::new().unwrap();
        let output = music(home.path(), &["--help"]);

        let text = stdout(&output);
        assert!(output.status.success());
        assert!(text.contains("play"));
        assert!(text.contains("tags"));
        assert!(text.contains("completion"));
    }

    #[test]
    fn test_cli_version_flag() {
        let home = TempDir::new().unwrap();
        let output = music(home.path(), &["--version"]);

        let text = stdout(&output);
        assert!(text.contains("music"));
        assert!(text.contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_completion_generation() {
        let home = TempDir::new().unwrap();
        let output = music(home.path(), &["completion", "bash"]);

        assert!(output.status.success());
        let text = stdout(&output);
        assert!(text.contains("_music"));
        assert!(text.contains("complete"));
    }

    #[test]
    fn test_config_path_honours_override() {
        let home = TempDir::new().unwrap();
        let output = music(home.path(), &["config-path"]);

        assert!(output.status.success());
        assert_eq!(
            stdout(&output).trim(),
            home.path().join("config.json").display().to_string()
        );
    }

    #[test]
    fn test_dry_paths_prints_absolute_paths() -> Result<()> {
        let home = TempDir::new()?;
        let library = create_test_library(&["rock/a.mp3", "rock/b.mp3", "jazz/c.mp3"])?;
        let root = library.path().to_str().unwrap();

        let output = music(home.path(), &["play", "rock", "--dry-paths", "--songs-path", root]);

        assert!(output.status.success());
        let mut lines: Vec<String> = stdout(&output).lines().map(str::to_owned).collect();
        lines.sort();
        assert_eq!(
            lines,
            vec![
                library.path().join("rock/a.mp3").display().to_string(),
                library.path().join("rock/b.mp3").display().to_string(),
            ]
        );

        Ok(())
    }

    #[test]
    fn test_music_path_comes_from_config_file() -> Result<()> {
        let home = TempDir::new()?;
        let library = create_test_library(&["rock/a.mp3", "jazz/c.mp3"])?;
        let config = serde_json::json!({ "path": library.path() });
        fs::write(home.path().join("config.json"), config.to_string())?;

        let output = music(home.path(), &["play", "jazz", "-p"]);

        assert!(output.status.success());
        assert_eq!(
            stdout(&output).trim(),
            library.path().join("jazz/c.mp3").display().to_string()
        );

        Ok(())
    }

    #[test]
    fn test_dry_run_prints_summary() -> Result<()> {
        let home = TempDir::new()?;
        let library = create_test_library(&["rock/a.mp3", "jazz/c.mp3"])?;
        let root = library.path().to_str().unwrap();

        let output = music(
            home.path(),
            &["play", "jazz", "--dry-run", "--vlc-path", "/no/such/player", "--songs-path", root],
        );

        assert!(output.status.success());
        assert_eq!(stdout(&output), "Playing: [1]\n- jazz/c.mp3\n");

        Ok(())
    }

    #[test]
    fn test_no_match_is_not_an_error() -> Result<()> {
        let home = TempDir::new()?;
        let library = create_test_library(&["rock/a.mp3"])?;
        let root = library.path().to_str().unwrap();

        let output = music(home.path(), &["play", "polka", "-d", "--songs-path", root]);

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("Didn't match anything"));

        Ok(())
    }

    #[test]
    fn test_malformed_config_is_fatal() -> Result<()> {
        let home = TempDir::new()?;
        fs::write(home.path().join("config.json"), "{ not json")?;

        let output = music(home.path(), &["play", "rock", "-d"]);

        assert!(!output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("config.json"));

        Ok(())
    }

    #[test]
    fn test_add_to_tag_then_list_tags() -> Result<()> {
        let home = TempDir::new()?;
        let library = create_test_library(&["rock/a.mp3", "rock/b.mp3", "jazz/c.mp3"])?;
        let root = library.path().to_str().unwrap();

        let output = music(
            home.path(),
            &["play", "rock", "-p", "--add-to-tag", "loud", "--songs-path", root],
        );
        assert!(output.status.success());

        let listing = music(home.path(), &["tags", "--songs-path", root]);
        assert!(listing.status.success());
        assert_eq!(stdout(&listing).trim(), "loud (2)");

        let songs = music(home.path(), &["tags", "loud", "--songs-path", root]);
        let text = stdout(&songs);
        assert!(text.starts_with("loud:"));
        assert!(text.contains("- rock/a.mp3"));
        assert!(text.contains("- rock/b.mp3"));

        Ok(())
    }

    #[test]
    fn test_play_all_shortcut() -> Result<()> {
        let home = TempDir::new()?;
        let library = create_test_library(&["rock/a.mp3"])?;
        let root = library.path().to_str().unwrap();

        let output = music(home.path(), &["play", "-d", "--songs-path", root]);

        assert!(output.status.success());
        assert_eq!(stdout(&output).trim(), "Playing all songs");

        Ok(())
    }
}
