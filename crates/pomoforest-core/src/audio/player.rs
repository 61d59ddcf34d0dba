use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use tracing::debug;

use super::AudioBackend;
use crate::error::AudioError;

const SOURCE_PLACEHOLDER: &str = "{source}";

/// Plays nothing; only tracks what would be playing.
#[derive(Debug, Default)]
pub struct SilentPlayer {
    source: Option<PathBuf>,
    playing: bool,
}

impl SilentPlayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioBackend for SilentPlayer {
    fn load(&mut self, source: &Path) {
        self.playing = false;
        self.source = Some(source.to_path_buf());
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn play(&mut self) -> Result<(), AudioError> {
        if self.source.is_none() {
            return Err(AudioError::NoSource);
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }
}

/// Runs an external player process per playback, e.g.
/// `["mpv", "--no-video", "--loop-file=inf", "{source}"]`.
///
/// Pausing kills the process; playing again restarts the loop.
#[derive(Debug)]
pub struct CommandPlayer {
    argv: Vec<String>,
    source: Option<PathBuf>,
    child: Option<Child>,
}

impl CommandPlayer {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            argv,
            source: None,
            child: None,
        }
    }

    fn command_for(&self, source: &Path) -> Option<Command> {
        let (program, rest) = self.argv.split_first()?;
        let mut command = Command::new(program);
        let source = source.to_string_lossy();
        let mut substituted = false;
        for arg in rest {
            if arg.contains(SOURCE_PLACEHOLDER) {
                substituted = true;
                command.arg(arg.replace(SOURCE_PLACEHOLDER, &source));
            } else {
                command.arg(arg);
            }
        }
        if !substituted {
            command.arg(source.as_ref());
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        Some(command)
    }
}

impl AudioBackend for CommandPlayer {
    fn load(&mut self, source: &Path) {
        self.pause();
        self.source = Some(source.to_path_buf());
    }

    fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn play(&mut self) -> Result<(), AudioError> {
        self.refresh();
        if self.child.is_some() {
            return Ok(());
        }
        let source = self.source.as_deref().ok_or(AudioError::NoSource)?;
        if !source.exists() {
            return Err(AudioError::MissingAsset(source.to_path_buf()));
        }
        let mut command = self.command_for(source).ok_or(AudioError::NoSource)?;
        let child = command.spawn().map_err(|source| AudioError::Spawn {
            program: self.argv.first().cloned().unwrap_or_default(),
            source,
        })?;
        debug!(pid = child.id(), "player started");
        self.child = Some(child);
        Ok(())
    }

    fn pause(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            debug!("player stopped");
        }
    }

    fn is_playing(&self) -> bool {
        self.child.is_some()
    }

    fn refresh(&mut self) {
        let Some(child) = self.child.as_mut() else {
            return;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!(%status, "player exited on its own");
                self.child = None;
            }
            Ok(None) => {}
            Err(err) => {
                debug!("cannot poll player: {err}");
                self.child = None;
            }
        }
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        self.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silent_player_needs_a_source() {
        let mut player = SilentPlayer::new();
        assert!(matches!(player.play(), Err(AudioError::NoSource)));
        player.load(Path::new("rain.mp3"));
        player.play().unwrap();
        assert!(player.is_playing());
        player.load(Path::new("fireplace.mp3"));
        assert!(!player.is_playing());
    }

    #[test]
    fn command_player_rejects_missing_asset() {
        let mut player = CommandPlayer::new(vec!["true".into()]);
        player.load(Path::new("/definitely/not/here/rain.mp3"));
        assert!(matches!(player.play(), Err(AudioError::MissingAsset(_))));
        assert!(!player.is_playing());
    }

    #[test]
    fn command_player_with_empty_argv_cannot_play() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("rain.mp3");
        std::fs::write(&asset, b"").unwrap();
        let mut player = CommandPlayer::new(Vec::new());
        player.load(&asset);
        assert!(player.play().is_err());
    }

    #[cfg(unix)]
    #[test]
    fn exited_player_is_noticed_and_restarted() {
        let dir = tempfile::tempdir().unwrap();
        let asset = dir.path().join("rain.mp3");
        std::fs::write(&asset, b"").unwrap();
        let mut player = CommandPlayer::new(vec!["true".into()]);
        player.load(&asset);

        player.play().unwrap();
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while player.is_playing() && std::time::Instant::now() < deadline {
            std::thread::sleep(std::time::Duration::from_millis(20));
            player.refresh();
        }
        assert!(!player.is_playing());

        player.play().unwrap();
        assert!(player.is_playing());
        player.pause();
        assert!(!player.is_playing());
    }

    #[test]
    fn placeholder_is_substituted() {
        let player = CommandPlayer::new(vec![
            "mpv".into(),
            "--loop-file=inf".into(),
            "{source}".into(),
        ]);
        let command = player.command_for(Path::new("/s/rain.mp3")).unwrap();
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["--loop-file=inf", "/s/rain.mp3"]);
    }

    #[test]
    fn source_is_appended_without_placeholder() {
        let player = CommandPlayer::new(vec!["afplay".into()]);
        let command = player.command_for(Path::new("/s/fireplace.mp3")).unwrap();
        let args: Vec<_> = command.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["/s/fireplace.mp3"]);
    }
}
