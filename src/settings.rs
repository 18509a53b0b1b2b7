use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub completion_model: String,
    pub speech_model: String,
    pub speech_voice: String,
    pub speech_speed: f32,
    pub speech_format: String,
    pub audio_dir: Option<String>,
    pub languages: Vec<String>,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            completion_model: "gpt-4o-mini".to_string(),
            speech_model: "tts-1".to_string(),
            speech_voice: "shimmer".to_string(),
            speech_speed: 1.0,
            speech_format: "mp3".to_string(),
            audio_dir: None,
            languages: vec![
                "English".to_string(),
                "Japanese".to_string(),
                "Polish".to_string(),
            ],
            server_addr: "127.0.0.1:8501".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    openai: Option<OpenAISettings>,
    speech: Option<SpeechSettings>,
    system: Option<SystemSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAISettings {
    model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SpeechSettings {
    model: Option<String>,
    voice: Option<String>,
    speed: Option<f32>,
    format: Option<String>,
    dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemSettings {
    languages: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    /// Directory receiving synthesized audio files.
    pub fn audio_dir(&self) -> PathBuf {
        if let Some(dir) = self.audio_dir.as_deref() {
            return PathBuf::from(dir);
        }
        std::env::temp_dir().join("language-assistant-rust")
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(openai) = incoming.openai {
            if let Some(model) = non_empty(openai.model) {
                self.completion_model = model;
            }
        }
        if let Some(speech) = incoming.speech {
            if let Some(model) = non_empty(speech.model) {
                self.speech_model = model;
            }
            if let Some(voice) = non_empty(speech.voice) {
                self.speech_voice = voice;
            }
            if let Some(speed) = speech.speed {
                if speed > 0.0 {
                    self.speech_speed = speed;
                }
            }
            if let Some(format) = non_empty(speech.format) {
                self.speech_format = format.to_lowercase();
            }
            if let Some(dir) = non_empty(speech.dir) {
                self.audio_dir = Some(dir);
            }
        }
        if let Some(system) = incoming.system {
            if let Some(languages) = system.languages {
                let languages = languages
                    .into_iter()
                    .map(|lang| lang.trim().to_string())
                    .filter(|lang| !lang.is_empty())
                    .collect::<Vec<_>>();
                if !languages.is_empty() {
                    self.languages = languages;
                }
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = non_empty(server.addr) {
                self.server_addr = addr;
            }
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".language-assistant"))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn first_load_writes_default_home_settings() {
        with_temp_home(|home| {
            let settings = load_settings(None).expect("load settings");
            assert_eq!(settings.completion_model, "gpt-4o-mini");
            assert_eq!(settings.speech_voice, "shimmer");
            let written = home.join(".language-assistant").join("settings.toml");
            assert!(written.exists());
        });
    }

    #[test]
    fn extra_settings_override_earlier_layers() {
        with_temp_home(|home| {
            let extra = home.join("extra.toml");
            fs::write(
                &extra,
                "[speech]\nvoice = \"nova\"\nspeed = 1.25\nformat = \"OPUS\"\n\n[system]\nlanguages = [\"Polish\", \" \"]\n",
            )
            .expect("write extra settings");
            let settings = load_settings(Some(&extra)).expect("load settings");
            assert_eq!(settings.speech_voice, "nova");
            assert_eq!(settings.speech_speed, 1.25);
            assert_eq!(settings.speech_format, "opus");
            assert_eq!(settings.languages, vec!["Polish".to_string()]);
        });
    }

    #[test]
    fn missing_extra_settings_is_an_error() {
        with_temp_home(|home| {
            let err = load_settings(Some(&home.join("missing.toml"))).unwrap_err();
            assert!(err.to_string().contains("settings file not found"));
        });
    }

    #[test]
    fn blank_values_keep_defaults() {
        let mut settings = Settings::default();
        let parsed: SettingsFile =
            toml::from_str("[openai]\nmodel = \"  \"\n[speech]\nspeed = 0.0\n").expect("parse");
        settings.merge(parsed);
        assert_eq!(settings.completion_model, "gpt-4o-mini");
        assert_eq!(settings.speech_speed, 1.0);
    }
}
