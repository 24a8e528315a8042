//! Notification sounds — played by a detached player process.
//!
//! Playback is fire-and-forget: it starts before delivery, is never
//! awaited, and a missing player or sound file is only logged.

use std::path::Path;

use super::sink::spawn_detached;

/// Sound to play alongside a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sound {
    /// The assistant finished its turn.
    Hero,
    /// The assistant is waiting on the user.
    Sosumi,
}

impl Sound {
    pub fn name(self) -> &'static str {
        match self {
            Self::Hero => "Hero",
            Self::Sosumi => "Sosumi",
        }
    }

    /// System sound file on macOS.
    fn macos_path(self) -> String {
        format!("/System/Library/Sounds/{}.aiff", self.name())
    }

    /// Closest stock Windows sound.
    fn windows_path(self) -> &'static str {
        match self {
            Self::Hero => r"C:\Windows\Media\Windows Notify System Generic.wav",
            Self::Sosumi => r"C:\Windows\Media\Windows Notify Calendar.wav",
        }
    }

    /// freedesktop sound-theme id.
    fn freedesktop_id(self) -> &'static str {
        match self {
            Self::Hero => "complete",
            Self::Sosumi => "dialog-warning",
        }
    }
}

/// Starts sound playback without waiting for it.
pub trait Chime {
    fn play(&self, sound: Sound);
}

/// Plays sounds through the platform's stock player.
pub struct SystemChime;

impl Chime for SystemChime {
    fn play(&self, sound: Sound) {
        let (program, args) = player_command(sound);
        if let Some(file) = args.iter().find(|a| a.ends_with(".aiff") || a.ends_with(".wav"))
            && !Path::new(file).exists()
        {
            tracing::debug!(sound = sound.name(), file = %file, "sound file missing");
            return;
        }
        if let Err(e) = spawn_detached(program, &args, program) {
            tracing::debug!(sound = sound.name(), error = %e, "sound playback failed");
        }
    }
}

fn player_command(sound: Sound) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("afplay", vec![sound.macos_path()])
    } else if cfg!(windows) {
        (
            "powershell",
            vec![
                "-NoProfile".to_string(),
                "-NonInteractive".to_string(),
                "-Command".to_string(),
                format!(
                    "(New-Object System.Media.SoundPlayer '{}').PlaySync()",
                    sound.windows_path()
                ),
            ],
        )
    } else {
        (
            "canberra-gtk-play",
            vec![format!("--id={}", sound.freedesktop_id())],
        )
    }
}
