use std::time::Duration;

use eyre::Result;
use tokio::time::sleep;

use crate::{
    audio::{Cue, CuePlayer},
    config::{Config, SpeechConfig},
    hardware::{
        AirHandler,
        air_handler::defs::{ButtonEvent, Message, StatusFrame, TargetCommand},
    },
    voice::{
        Recorder,
        capture::FileSource,
        number::extract_target,
        transcribe::{HttpTranscriber, Transcriber},
    },
};

/* === Definitions === */

/// The voice-controller front-end: consumes unit messages in arrival
/// order, tracks what the unit reports, and turns button-delimited voice
/// sessions into target commands.
pub struct Panel {
    cues: Option<CuePlayer>,
    device: AirHandler,
    recording: Option<Recorder>,
    speech: SpeechConfig,
    state: PanelState,
    transcriber: Option<Box<dyn Transcriber>>,
}

/// Last known unit-side state, for transition logging.
#[derive(Default)]
struct PanelState {
    last: Option<StatusFrame>,
}

/* === Implementations === */

impl Panel {
    /// Trailing audio to absorb after the stop press.
    const STOP_DEBOUNCE: Duration = Duration::from_millis(200);

    pub fn new(device: AirHandler, config: &Config) -> Self {
        let transcriber = config
            .speech
            .url
            .as_ref()
            .map(|url| Box::new(HttpTranscriber::new(url.clone())) as Box<dyn Transcriber>);

        let cues = match config.audio.disable_cues {
            true => None,
            false => match CuePlayer::try_new() {
                Ok(player) => Some(player),
                Err(error) => {
                    tracing::warn!("Audio cues unavailable: {error}");
                    None
                }
            },
        };

        Self::assemble(device, config.speech.clone(), transcriber, cues)
    }

    /// Full wiring, used by tests to swap the boundaries out.
    pub fn assemble(
        device: AirHandler,
        speech: SpeechConfig,
        transcriber: Option<Box<dyn Transcriber>>,
        cues: Option<CuePlayer>,
    ) -> Self {
        Panel {
            cues,
            device,
            recording: None,
            speech,
            state: PanelState::default(),
            transcriber,
        }
    }

    /// Runs until the link closes.
    pub async fn run(mut self) -> Result<()> {
        tracing::info!("Panel ready, watching the unit");

        while let Some(message) = self.device.recv().await {
            match message {
                Message::Status(frame) => self.on_status(frame),
                Message::Button(ButtonEvent::Start) => self.on_start(),
                Message::Button(ButtonEvent::Stop) => self.on_stop().await?,
            }
        }

        tracing::info!("Unit link closed");

        Ok(())
    }

    /* == Status == */

    fn on_status(&mut self, frame: StatusFrame) {
        let previous = self.state.last.replace(frame);

        match previous {
            Some(old) if old.state == frame.state => {}
            _ => tracing::info!("Motor {} at speed {}", frame.state.describe(), frame.speed),
        }

        if previous.map(|old| old.target) != Some(frame.target) {
            tracing::info!("Unit target is {}", frame.target);
        }

        tracing::debug!(
            "Inside {}, outside {}, target {}",
            frame.inside,
            frame.outside,
            frame.target,
        );
    }

    /* == Voice sessions == */

    fn on_start(&mut self) {
        if self.recording.is_some() {
            tracing::debug!("Session already open, ignoring Start");
            return;
        }

        let Some(path) = self.speech.capture.clone() else {
            tracing::warn!("No capture source configured, ignoring the session");
            return;
        };

        tracing::info!("Listening...");

        self.recording = Some(Recorder::start(move || FileSource::open(&path)));
        self.cue(Cue::Listening);
    }

    async fn on_stop(&mut self) -> Result<()> {
        let Some(recorder) = self.recording.take() else {
            tracing::debug!("No session open, ignoring Stop");
            return Ok(());
        };

        // Absorb the trailing audio burst before closing the session
        sleep(Self::STOP_DEBOUNCE).await;

        let level = *recorder.level().borrow();
        let samples = recorder.stop().await;

        tracing::info!("Session closed with {} samples (level {level:.2})", samples.len());

        match self.recognize(&samples).await {
            Some(value) => {
                let command = TargetCommand::clamped(value);
                tracing::info!("Heard target {command}");

                self.device.send_target(command).await?;
                self.cue(Cue::Accepted);
            }

            None => {
                tracing::info!("No command recognized");
                self.cue(Cue::NoCommand);
            }
        }

        Ok(())
    }

    /// Transcript to temperature; any failure along the way is only a
    /// missed command.
    async fn recognize(&self, samples: &[i16]) -> Option<i64> {
        let transcriber = self.transcriber.as_ref()?;

        let transcript = match transcriber.transcribe(samples, self.speech.sample_rate).await {
            Ok(transcript) => transcript?,
            Err(error) => {
                tracing::warn!("Transcription failed: {error}");
                return None;
            }
        };

        tracing::debug!("Transcript: {transcript:?}");

        extract_target(&transcript)
    }

    fn cue(&self, cue: Cue) {
        if let Some(player) = &self.cues {
            if player.queue(cue).is_err() {
                tracing::debug!("Cue player is gone");
            }
        }
    }
}
