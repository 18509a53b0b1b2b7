use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CallError;
use crate::providers::SpeechProvider;

/// Synthesizes `text` and keeps the audio in a fresh file under `dir`.
///
/// Files are never removed here; the audio directory grows with every call.
pub async fn synthesize_to_file<S: SpeechProvider>(
    provider: &S,
    text: &str,
    dir: &Path,
) -> Result<PathBuf, CallError> {
    let bytes = provider.synthesize(text.to_string()).await?;
    let path = write_temp_file(&bytes, provider.audio_format(), dir)?;
    debug!("wrote {} bytes of audio to {}", bytes.len(), path.display());
    Ok(path)
}

pub fn audio_mime(format: &str) -> &'static str {
    match format.trim().to_lowercase().as_str() {
        "mp3" => "audio/mpeg",
        "opus" => "audio/ogg",
        "aac" => "audio/aac",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "pcm" => "audio/pcm",
        _ => "application/octet-stream",
    }
}

fn write_temp_file(bytes: &[u8], format: &str, dir: &Path) -> Result<PathBuf, CallError> {
    std::fs::create_dir_all(dir)?;
    let ext = format.trim().to_lowercase();
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };
    let suffix = format!(".{}", ext);
    let mut file = tempfile::Builder::new()
        .prefix("language-assistant-")
        .suffix(&suffix)
        .tempfile_in(dir)?;
    file.write_all(bytes)?;
    file.flush()?;
    let path = file.into_temp_path().keep().map_err(|err| err.error)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::SpeechFuture;

    struct FixedSpeech {
        bytes: Vec<u8>,
    }

    impl SpeechProvider for FixedSpeech {
        fn audio_format(&self) -> &str {
            "mp3"
        }

        fn synthesize(&self, _input: String) -> SpeechFuture {
            let bytes = self.bytes.clone();
            Box::pin(async move { Ok(bytes) })
        }
    }

    #[tokio::test]
    async fn audio_is_kept_in_a_fresh_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = FixedSpeech {
            bytes: b"ID3audio".to_vec(),
        };
        let first = synthesize_to_file(&provider, "cześć", dir.path())
            .await
            .unwrap();
        let second = synthesize_to_file(&provider, "cześć", dir.path())
            .await
            .unwrap();
        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"ID3audio");
        assert_eq!(first.extension().and_then(|ext| ext.to_str()), Some("mp3"));
        assert!(first.starts_with(dir.path()));
    }

    #[test]
    fn formats_map_to_mime_types() {
        assert_eq!(audio_mime("mp3"), "audio/mpeg");
        assert_eq!(audio_mime("WAV"), "audio/wav");
        assert_eq!(audio_mime("midi"), "application/octet-stream");
    }
}
