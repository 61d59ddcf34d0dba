//! Ambient sound for running sessions.
//!
//! The controller binds a logical [`SoundType`] to an asset file and plays it
//! only while the session is running and the user has not muted it. Play
//! failures never reach the caller: they are logged and the session carries
//! on silently.

mod player;

pub use player::{CommandPlayer, SilentPlayer};

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AudioError;
use crate::timer::SessionStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SoundType {
    #[default]
    Rain,
    Fire,
}

impl SoundType {
    /// File name of the looped asset.
    pub fn asset_name(self) -> &'static str {
        match self {
            SoundType::Rain => "rain.mp3",
            SoundType::Fire => "fireplace.mp3",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SoundType::Rain => "Rain Sounds",
            SoundType::Fire => "Fireplace",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            SoundType::Rain => "🌧️",
            SoundType::Fire => "🔥",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SoundType::Rain => SoundType::Fire,
            SoundType::Fire => SoundType::Rain,
        }
    }
}

impl std::str::FromStr for SoundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rain" => Ok(SoundType::Rain),
            "fire" | "fireplace" => Ok(SoundType::Fire),
            other => Err(format!("unknown sound '{other}' (expected rain or fire)")),
        }
    }
}

/// A looping media player.
pub trait AudioBackend {
    /// Replace the current source. Stops playback.
    fn load(&mut self, source: &Path);
    fn source(&self) -> Option<&Path>;
    fn play(&mut self) -> Result<(), AudioError>;
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
    /// Notice playback that ended on its own. Called before `is_playing`
    /// is trusted.
    fn refresh(&mut self) {}
}

impl<T: AudioBackend + ?Sized> AudioBackend for Box<T> {
    fn load(&mut self, source: &Path) {
        (**self).load(source)
    }
    fn source(&self) -> Option<&Path> {
        (**self).source()
    }
    fn play(&mut self) -> Result<(), AudioError> {
        (**self).play()
    }
    fn pause(&mut self) {
        (**self).pause()
    }
    fn is_playing(&self) -> bool {
        (**self).is_playing()
    }
    fn refresh(&mut self) {
        (**self).refresh()
    }
}

/// Who asked for playback. Only user actions may legitimately start sound;
/// automatic resumption is allowed to fail quietly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayOrigin {
    User,
    Automatic,
}

pub struct AudioController<B: AudioBackend> {
    backend: B,
    assets_dir: PathBuf,
    sound: SoundType,
    muted: bool,
}

impl<B: AudioBackend> AudioController<B> {
    pub fn new(mut backend: B, assets_dir: impl Into<PathBuf>, sound: SoundType, muted: bool) -> Self {
        let assets_dir = assets_dir.into();
        backend.load(&assets_dir.join(sound.asset_name()));
        Self {
            backend,
            assets_dir,
            sound,
            muted,
        }
    }

    pub fn sound(&self) -> SoundType {
        self.sound
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn source_for(&self, sound: SoundType) -> PathBuf {
        self.assets_dir.join(sound.asset_name())
    }

    /// Whether the ambient-sound indicator should be shown.
    pub fn is_audible(&self, status: SessionStatus) -> bool {
        Self::should_play(status, self.muted)
    }

    fn should_play(status: SessionStatus, muted: bool) -> bool {
        status == SessionStatus::Running && !muted
    }

    /// Playback start triggered directly by the user (start/resume).
    pub fn start_from_user(&mut self, status: SessionStatus) {
        self.backend.refresh();
        if Self::should_play(status, self.muted) && !self.backend.is_playing() {
            self.play(PlayOrigin::User);
        }
    }

    /// Bring playback in line with the session status and mute flag.
    pub fn sync(&mut self, status: SessionStatus) {
        self.backend.refresh();
        if Self::should_play(status, self.muted) {
            if !self.backend.is_playing() {
                self.play(PlayOrigin::Automatic);
            }
        } else if self.backend.is_playing() {
            self.backend.pause();
        }
    }

    /// Switch the ambient sound. A playing source keeps playing on the new
    /// asset, a paused one stays paused. At most one play attempt is made.
    /// Returns whether anything changed.
    pub fn set_sound(&mut self, sound: SoundType, status: SessionStatus) -> bool {
        if sound == self.sound {
            return false;
        }
        let was_playing = self.backend.is_playing();
        self.sound = sound;
        let source = self.source_for(sound);
        self.backend.load(&source);
        debug!(?sound, source = %source.display(), "ambient sound switched");
        if was_playing && Self::should_play(status, self.muted) {
            self.play(PlayOrigin::Automatic);
        } else {
            self.sync(status);
        }
        true
    }

    /// Mute or unmute without touching the selected source.
    pub fn set_muted(&mut self, muted: bool, status: SessionStatus) -> bool {
        if muted == self.muted {
            return false;
        }
        self.muted = muted;
        self.sync(status);
        true
    }

    /// Stop playback for teardown.
    pub fn stop(&mut self) {
        if self.backend.is_playing() {
            self.backend.pause();
        }
    }

    fn play(&mut self, origin: PlayOrigin) {
        match self.backend.play() {
            Ok(()) => debug!(sound = ?self.sound, ?origin, "ambient sound playing"),
            Err(err) => match origin {
                PlayOrigin::User => warn!(sound = ?self.sound, "audio play failed: {err}"),
                PlayOrigin::Automatic => debug!(sound = ?self.sound, "audio play failed: {err}"),
            },
        }
    }
}
