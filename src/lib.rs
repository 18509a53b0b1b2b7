use anyhow::{anyhow, Result};
use std::path::Path;

pub mod error;
pub mod languages;
pub mod logging;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod session;
pub mod settings;
pub mod speech;
mod test_util;
pub mod translator;

pub use error::{CallError, CallErrorKind};
pub use providers::{OpenAI, Provider, SpeechOptions, SpeechProvider};
pub use session::{Action, Assistant, Notice, NoticeLevel, Outcome, SessionState};
pub use translator::Translator;

#[derive(Debug, Clone)]
pub struct Config {
    pub lang: String,
    pub model: Option<String>,
    pub key: Option<String>,
    pub settings_path: Option<String>,
    pub drill: bool,
    pub speak: bool,
    pub show_languages: bool,
}

/// Text for stdout plus the notices raised while producing it.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub text: String,
    pub notices: Vec<Notice>,
}

impl CommandOutput {
    pub fn has_errors(&self) -> bool {
        self.notices.iter().any(Notice::is_error)
    }
}

/// One-shot CLI run over `input`.
pub async fn run(config: Config, input: Option<String>) -> Result<CommandOutput> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;

    if config.show_languages {
        return Ok(CommandOutput {
            text: format_languages(&settings.languages),
            notices: Vec::new(),
        });
    }

    let input = input.unwrap_or_default();
    if input.trim().is_empty() {
        return Err(anyhow!("stdin is empty"));
    }
    let lang = config.lang.trim().to_string();
    if lang.is_empty() {
        return Err(anyhow!("target language is empty"));
    }

    let assistant = build_assistant(&settings, config.key.clone(), config.model.as_deref());
    let action = if config.drill {
        Action::DrillVocabulary {
            text: input,
            language: lang,
        }
    } else {
        Action::Translate {
            text: input,
            language: lang,
        }
    };

    let outcome = assistant.dispatch(SessionState::default(), action).await;
    let mut notices = outcome.notices;
    let mut state = outcome.state;
    let mut audio_path = None;

    if config.speak && !config.drill && state.has_translation() {
        let played = assistant.dispatch(state, Action::PlayAudio).await;
        notices.extend(played.notices);
        audio_path = played.audio.map(|clip| clip.path);
        state = played.state;
    }

    let view = session::render(&state, &settings.languages);
    let mut text = session::format_view_text(&view);
    if let Some(path) = audio_path {
        text.push_str(&format!("\n\naudio: {}", path.display()));
    }
    Ok(CommandOutput { text, notices })
}

pub fn build_provider(
    settings: &settings::Settings,
    key: Option<String>,
    model: Option<&str>,
) -> OpenAI {
    let model = model
        .filter(|model| !model.trim().is_empty())
        .unwrap_or(&settings.completion_model)
        .to_string();
    OpenAI::new(providers::resolve_key(key.as_deref()))
        .with_model(model)
        .with_speech(SpeechOptions {
            model: settings.speech_model.clone(),
            voice: settings.speech_voice.clone(),
            format: settings.speech_format.clone(),
            speed: settings.speech_speed,
        })
}

pub fn build_assistant(
    settings: &settings::Settings,
    key: Option<String>,
    model: Option<&str>,
) -> Assistant<OpenAI, OpenAI> {
    let provider = build_provider(settings, key, model);
    Assistant::new(provider.clone(), provider, settings.audio_dir())
}

pub fn format_languages(languages: &[String]) -> String {
    languages::language_options(languages)
        .into_iter()
        .map(|option| format!("{}\t{}", option.name, option.locale))
        .collect::<Vec<_>>()
        .join("\n")
}
