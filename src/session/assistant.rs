use std::path::PathBuf;

use tracing::{info, warn};

use super::action::{Action, AudioClip, Notice, Outcome};
use super::state::{SessionState, VocabularyItem};
use crate::languages;
use crate::providers::{Provider, SpeechProvider};
use crate::speech;
use crate::translator::{self, Translator, PLACEHOLDER};

/// Maps `(state, action)` to the next state plus whatever the user should see.
pub struct Assistant<P: Provider, S: SpeechProvider> {
    translator: Translator<P>,
    speech: S,
    audio_dir: PathBuf,
}

impl<P: Provider, S: SpeechProvider> Assistant<P, S> {
    pub fn new(provider: P, speech: S, audio_dir: PathBuf) -> Self {
        Self {
            translator: Translator::new(provider),
            speech,
            audio_dir,
        }
    }

    pub async fn dispatch(&self, state: SessionState, action: Action) -> Outcome {
        let mut notices = Vec::new();
        let mut audio = None;
        let state = match action {
            Action::Translate { text, language } => {
                self.translate(state, text, language, &mut notices).await
            }
            Action::PlayAudio => {
                if state.has_translation() {
                    audio = self.speak(&state.current_translation, &mut notices).await;
                } else {
                    notices.push(Notice::warning("Translate something first to hear it."));
                }
                state
            }
            Action::DrillVocabulary { text, language } => {
                self.drill(state, &text, language, &mut notices).await
            }
            Action::PlayItemAudio { index } => {
                let text = state
                    .vocabulary
                    .get(index)
                    .map(|item| translator::strip_quotes(&item.translation));
                match text {
                    Some(text) if !text.is_empty() && text != PLACEHOLDER => {
                        audio = self.speak(&text, &mut notices).await;
                    }
                    Some(_) => notices.push(Notice::warning(format!(
                        "Vocabulary item {} has no translation to play.",
                        index + 1
                    ))),
                    None => notices.push(Notice::warning(format!(
                        "There is no vocabulary item {}.",
                        index + 1
                    ))),
                }
                state
            }
        };
        Outcome {
            state,
            notices,
            audio,
        }
    }

    async fn translate(
        &self,
        mut state: SessionState,
        text: String,
        language: String,
        notices: &mut Vec<Notice>,
    ) -> SessionState {
        if text.trim().is_empty() {
            notices.push(Notice::warning("Enter some text to translate first."));
            return state;
        }
        info!("translating {} chars into {}", text.chars().count(), language);

        let translation = match self.translator.translate(&text, &language).await {
            Ok(translation) => translation,
            Err(err) => {
                warn!("translation failed: {}", err);
                notices.push(Notice::error(format!("Translation failed: {}", err)));
                return state;
            }
        };

        let grammar = self.translator.explain_grammar(&translation, &language).await;
        state.grammar_explanation = match grammar {
            Ok(explanation) if !explanation.trim().is_empty() => Some(explanation),
            Ok(_) => None,
            Err(err) => {
                warn!("grammar explanation failed: {}", err);
                notices.push(Notice::error(format!("Failed to explain grammar: {}", err)));
                None
            }
        };
        state.current_translation = translation;
        state.translated_language = language;
        state.last_input_text = text;
        state
    }

    async fn drill(
        &self,
        mut state: SessionState,
        text: &str,
        language: String,
        notices: &mut Vec<Notice>,
    ) -> SessionState {
        let words = split_vocabulary(text);
        if words.is_empty() {
            notices.push(Notice::warning("Enter some words to drill first."));
            return state;
        }
        info!("drilling {} words into {}", words.len(), language);

        let mut items = Vec::with_capacity(words.len());
        for word in words {
            let translation = match self.translator.translate_term(&word, &language).await {
                Ok(translation) => translation,
                Err(err) => {
                    warn!("translation of '{}' failed: {}", word, err);
                    notices.push(Notice::error(format!(
                        "Failed to translate '{}': {}",
                        word, err
                    )));
                    PLACEHOLDER.to_string()
                }
            };
            items.push(VocabularyItem {
                original: word,
                translation,
                romanization: None,
            });
        }

        if languages::is_japanese(&language) {
            let translations = items
                .iter()
                .map(|item| item.translation.clone())
                .collect::<Vec<_>>();
            let romaji = match self.translator.romanize(&translations).await {
                Ok(romaji) => romaji,
                Err(err) => {
                    warn!("romanization failed: {}", err);
                    notices.push(Notice::error(format!("Failed to generate Romaji: {}", err)));
                    translator::placeholders(translations.len())
                }
            };
            for (index, item) in items.iter_mut().enumerate() {
                let value = romaji
                    .get(index)
                    .cloned()
                    .unwrap_or_else(|| PLACEHOLDER.to_string());
                item.romanization = Some(value);
            }
        }

        state.vocabulary = items;
        state.vocabulary_language = language;
        state
    }

    async fn speak(&self, text: &str, notices: &mut Vec<Notice>) -> Option<AudioClip> {
        let path = match speech::synthesize_to_file(&self.speech, text, &self.audio_dir).await {
            Ok(path) => path,
            Err(err) => {
                warn!("speech synthesis failed: {}", err);
                notices.push(Notice::error(format!("Failed to generate audio: {}", err)));
                return None;
            }
        };
        match std::fs::read(&path) {
            Ok(bytes) => Some(AudioClip {
                path,
                mime: speech::audio_mime(self.speech.audio_format()).to_string(),
                bytes,
            }),
            Err(err) => {
                notices.push(Notice::error(format!("Audio playback failed: {}", err)));
                None
            }
        }
    }
}

/// Comma-separated when the input has a comma (blanks dropped), whitespace-separated otherwise.
pub fn split_vocabulary(text: &str) -> Vec<String> {
    if text.contains(',') {
        text.split(',')
            .map(str::trim)
            .filter(|word| !word.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        text.split_whitespace().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;
    use crate::providers::{
        GenerationParams, ProviderFuture, ProviderResponse, SpeechFuture,
    };
    use crate::session::NoticeLevel;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    type Reply = Result<String, CallError>;

    /// Replies are consumed in call order; prompts are recorded.
    #[derive(Clone, Default)]
    struct ScriptedProvider {
        replies: Arc<Mutex<VecDeque<Reply>>>,
        prompts: Arc<Mutex<Vec<String>>>,
        pending: Vec<String>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Reply>) -> Self {
            Self {
                replies: Arc::new(Mutex::new(replies.into())),
                ..Self::default()
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl Provider for ScriptedProvider {
        fn append_user_input(mut self, input: String) -> Self {
            self.pending.push(input);
            self
        }

        fn with_generation(self, _params: GenerationParams) -> Self {
            self
        }

        fn complete(self) -> ProviderFuture {
            self.prompts.lock().unwrap().push(self.pending.join("\n"));
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CallError::MalformedResponse("no scripted reply".into())));
            Box::pin(async move {
                reply.map(|text| ProviderResponse {
                    text,
                    model: None,
                    usage: None,
                })
            })
        }
    }

    struct StubSpeech {
        fail: bool,
        inputs: Arc<Mutex<Vec<String>>>,
    }

    impl StubSpeech {
        fn ok() -> Self {
            Self {
                fail: false,
                inputs: Arc::default(),
            }
        }
    }

    impl SpeechProvider for StubSpeech {
        fn audio_format(&self) -> &str {
            "mp3"
        }

        fn synthesize(&self, input: String) -> SpeechFuture {
            self.inputs.lock().unwrap().push(input);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(CallError::Api {
                        status: 500,
                        message: "tts down".to_string(),
                    })
                } else {
                    Ok(b"audio".to_vec())
                }
            })
        }
    }

    fn api_error() -> CallError {
        CallError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        }
    }

    fn assistant(
        replies: Vec<Reply>,
        speech: StubSpeech,
    ) -> (Assistant<ScriptedProvider, StubSpeech>, ScriptedProvider, tempfile::TempDir) {
        let provider = ScriptedProvider::new(replies);
        let dir = tempfile::tempdir().expect("tempdir");
        let assistant = Assistant::new(provider.clone(), speech, dir.path().to_path_buf());
        (assistant, provider, dir)
    }

    fn translated_state() -> SessionState {
        SessionState {
            current_translation: "Kocham cię".to_string(),
            translated_language: "Polish".to_string(),
            grammar_explanation: Some("Old explanation".to_string()),
            vocabulary: vec![VocabularyItem {
                original: "cat".to_string(),
                translation: "\"kot\"".to_string(),
                romanization: None,
            }],
            vocabulary_language: "Polish".to_string(),
            last_input_text: "I love you".to_string(),
        }
    }

    #[test]
    fn vocabulary_splits_on_commas_when_present() {
        assert_eq!(
            split_vocabulary(" cat, , big dog ,bird,"),
            vec!["cat", "big dog", "bird"]
        );
    }

    #[test]
    fn vocabulary_splits_on_whitespace_without_commas() {
        assert_eq!(split_vocabulary("cat\tdog\n bird"), vec!["cat", "dog", "bird"]);
        assert!(split_vocabulary("   ").is_empty());
    }

    #[tokio::test]
    async fn blank_translate_only_warns() {
        let (assistant, provider, _dir) = assistant(Vec::new(), StubSpeech::ok());
        let before = translated_state();
        let outcome = assistant
            .dispatch(
                before.clone(),
                Action::Translate {
                    text: " \n\t".to_string(),
                    language: "Japanese".to_string(),
                },
            )
            .await;
        assert_eq!(outcome.state, before);
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn translate_chains_grammar_on_translated_text() {
        let (assistant, provider, _dir) = assistant(
            vec![
                Ok("Kocham cię".to_string()),
                Ok("'Kocham' is first person singular.".to_string()),
            ],
            StubSpeech::ok(),
        );
        let outcome = assistant
            .dispatch(
                SessionState::default(),
                Action::Translate {
                    text: "I love you".to_string(),
                    language: "Polish".to_string(),
                },
            )
            .await;
        assert!(outcome.notices.is_empty());
        assert_eq!(outcome.state.current_translation, "Kocham cię");
        assert_eq!(outcome.state.translated_language, "Polish");
        assert_eq!(outcome.state.last_input_text, "I love you");
        assert_eq!(
            outcome.state.grammar_explanation.as_deref(),
            Some("'Kocham' is first person singular.")
        );
        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("Sentence:\nKocham cię"));
    }

    #[tokio::test]
    async fn grammar_failure_clears_stale_explanation() {
        let (assistant, _provider, _dir) =
            assistant(vec![Ok("Kocham psy".to_string()), Err(api_error())], StubSpeech::ok());
        let outcome = assistant
            .dispatch(
                translated_state(),
                Action::Translate {
                    text: "I love dogs".to_string(),
                    language: "Polish".to_string(),
                },
            )
            .await;
        assert_eq!(outcome.state.current_translation, "Kocham psy");
        assert_eq!(outcome.state.grammar_explanation, None);
        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome.notices[0].message.contains("grammar"));
    }

    #[tokio::test]
    async fn empty_grammar_reply_clears_stale_explanation() {
        let (assistant, _provider, _dir) = assistant(
            vec![Ok("Kocham psy".to_string()), Ok(String::new())],
            StubSpeech::ok(),
        );
        let outcome = assistant
            .dispatch(
                translated_state(),
                Action::Translate {
                    text: "I love dogs".to_string(),
                    language: "Polish".to_string(),
                },
            )
            .await;
        assert_eq!(outcome.state.current_translation, "Kocham psy");
        assert_eq!(outcome.state.grammar_explanation, None);
        assert!(outcome.notices.is_empty());
    }

    #[tokio::test]
    async fn drill_without_words_only_warns() {
        let (assistant, provider, _dir) = assistant(Vec::new(), StubSpeech::ok());
        let before = translated_state();
        let outcome = assistant
            .dispatch(
                before.clone(),
                Action::DrillVocabulary {
                    text: " , ,".to_string(),
                    language: "Japanese".to_string(),
                },
            )
            .await;
        assert_eq!(outcome.state, before);
        assert_eq!(outcome.notices.len(), 1);
        assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn translate_failure_keeps_prior_state() {
        let (assistant, provider, _dir) = assistant(vec![Err(api_error())], StubSpeech::ok());
        let before = translated_state();
        let outcome = assistant
            .dispatch(
                before.clone(),
                Action::Translate {
                    text: "I love dogs".to_string(),
                    language: "Polish".to_string(),
                },
            )
            .await;
        assert_eq!(outcome.state, before);
        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome.has_errors());
        assert_eq!(provider.prompts().len(), 1);
    }

    #[tokio::test]
    async fn play_audio_uses_stored_translation() {
        let speech = StubSpeech::ok();
        let inputs = speech.inputs.clone();
        let (assistant, _provider, dir) = assistant(Vec::new(), speech);
        let outcome = assistant
            .dispatch(translated_state(), Action::PlayAudio)
            .await;
        let clip = outcome.audio.expect("audio clip");
        assert_eq!(clip.bytes, b"audio");
        assert_eq!(clip.mime, "audio/mpeg");
        assert!(clip.path.starts_with(dir.path()));
        assert_eq!(inputs.lock().unwrap().as_slice(), ["Kocham cię".to_string()]);
    }

    #[tokio::test]
    async fn play_audio_without_translation_warns() {
        let (assistant, _provider, _dir) = assistant(Vec::new(), StubSpeech::ok());
        let outcome = assistant
            .dispatch(SessionState::default(), Action::PlayAudio)
            .await;
        assert!(outcome.audio.is_none());
        assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
    }

    #[tokio::test]
    async fn speech_failure_is_reported_without_audio() {
        let speech = StubSpeech {
            fail: true,
            inputs: Arc::default(),
        };
        let (assistant, _provider, _dir) = assistant(Vec::new(), speech);
        let before = translated_state();
        let outcome = assistant.dispatch(before.clone(), Action::PlayAudio).await;
        assert!(outcome.audio.is_none());
        assert!(outcome.has_errors());
        assert_eq!(outcome.state, before);
    }

    #[tokio::test]
    async fn item_audio_strips_quotes_and_checks_bounds() {
        let speech = StubSpeech::ok();
        let inputs = speech.inputs.clone();
        let (assistant, _provider, _dir) = assistant(Vec::new(), speech);

        let outcome = assistant
            .dispatch(translated_state(), Action::PlayItemAudio { index: 0 })
            .await;
        assert!(outcome.audio.is_some());
        assert_eq!(inputs.lock().unwrap().as_slice(), ["kot".to_string()]);

        let outcome = assistant
            .dispatch(translated_state(), Action::PlayItemAudio { index: 3 })
            .await;
        assert!(outcome.audio.is_none());
        assert_eq!(outcome.notices[0].message, "There is no vocabulary item 4.");
    }

    #[tokio::test]
    async fn drill_isolates_failed_items() {
        let (assistant, _provider, _dir) = assistant(
            vec![Ok("kot".to_string()), Err(api_error()), Ok("ptak".to_string())],
            StubSpeech::ok(),
        );
        let outcome = assistant
            .dispatch(
                SessionState::default(),
                Action::DrillVocabulary {
                    text: "cat dog bird".to_string(),
                    language: "Polish".to_string(),
                },
            )
            .await;
        let translations = outcome
            .state
            .vocabulary
            .iter()
            .map(|item| item.translation.as_str())
            .collect::<Vec<_>>();
        assert_eq!(translations, vec!["kot", PLACEHOLDER, "ptak"]);
        assert_eq!(outcome.notices.len(), 1);
        assert!(outcome.notices[0].message.contains("'dog'"));
    }

    #[tokio::test]
    async fn japanese_drill_zips_romaji_positionally() {
        let (assistant, provider, _dir) = assistant(
            vec![
                Ok("猫".to_string()),
                Ok("犬".to_string()),
                Ok("鳥".to_string()),
                Ok("neko\ninu".to_string()),
            ],
            StubSpeech::ok(),
        );
        let outcome = assistant
            .dispatch(
                SessionState::default(),
                Action::DrillVocabulary {
                    text: "cat, dog, bird".to_string(),
                    language: "Japanese".to_string(),
                },
            )
            .await;
        let romaji = outcome
            .state
            .vocabulary
            .iter()
            .map(|item| item.romanization.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(romaji, vec![Some("neko"), Some("inu"), Some(PLACEHOLDER)]);
        assert_eq!(outcome.state.vocabulary_language, "Japanese");
        assert!(provider.prompts()[3].contains("Japanese:\n猫\n犬\n鳥"));
    }

    #[tokio::test]
    async fn romaji_failure_fills_placeholders() {
        let (assistant, _provider, _dir) = assistant(
            vec![Ok("猫".to_string()), Err(api_error())],
            StubSpeech::ok(),
        );
        let outcome = assistant
            .dispatch(
                SessionState::default(),
                Action::DrillVocabulary {
                    text: "cat".to_string(),
                    language: "japanese".to_string(),
                },
            )
            .await;
        assert_eq!(
            outcome.state.vocabulary[0].romanization.as_deref(),
            Some(PLACEHOLDER)
        );
        assert!(outcome.notices[0].message.contains("Romaji"));
    }

    #[tokio::test]
    async fn drill_replaces_previous_list_wholesale() {
        let (assistant, _provider, _dir) =
            assistant(vec![Ok("Hund".to_string())], StubSpeech::ok());
        let outcome = assistant
            .dispatch(
                translated_state(),
                Action::DrillVocabulary {
                    text: "dog".to_string(),
                    language: "German".to_string(),
                },
            )
            .await;
        assert_eq!(outcome.state.vocabulary.len(), 1);
        assert_eq!(outcome.state.vocabulary[0].original, "dog");
        assert_eq!(outcome.state.current_translation, "Kocham cię");
    }
}
