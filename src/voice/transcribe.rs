use async_trait::async_trait;
use eyre::{Context, Result};
use reqwest::{Client, header::CONTENT_TYPE};

/* === Definitions === */

/// Speech-to-text boundary. Recognition happens elsewhere; this side only
/// ships samples and takes back text. No transcript means no command.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, samples: &[i16], sample_rate: u32) -> Result<Option<String>>;
}

/// Posts raw PCM to a recognition service and returns its plain-text body.
pub struct HttpTranscriber {
    client: Client,
    url: String,
}

/* === Implementations === */

impl HttpTranscriber {
    pub fn new(url: impl Into<String>) -> Self {
        HttpTranscriber {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, samples: &[i16], sample_rate: u32) -> Result<Option<String>> {
        if samples.is_empty() {
            return Ok(None);
        }

        let body: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

        let response = self
            .client
            .post(&self.url)
            .header(
                CONTENT_TYPE,
                format!("audio/L16; rate={sample_rate}; channels=1"),
            )
            .body(body)
            .send()
            .await
            .wrap_err("Transcription request failed")?;

        let text = response
            .error_for_status()
            .wrap_err("Transcription service rejected the audio")?
            .text()
            .await
            .wrap_err("Failed to read the transcript")?;

        let text = text.trim();

        Ok((!text.is_empty()).then(|| text.to_owned()))
    }
}
