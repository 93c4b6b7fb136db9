use std::{
    sync::mpsc,
    thread::{JoinHandle, spawn},
    time::Duration,
};

use eyre::Result;
use rodio::{
    OutputStream, Sink,
    source::{SineWave, Source},
};

/* === Definitions === */

/// Short feedback tones for button-delimited voice sessions.
#[derive(Clone, Copy, Debug)]
pub enum Cue {
    /// Session open, the microphone is live.
    Listening,

    /// A target was recognized and sent.
    Accepted,

    /// The session produced no usable command.
    NoCommand,
}

pub struct CuePlayer {
    queue: mpsc::Sender<Cue>,
    _thread: JoinHandle<Result<()>>,
}

/* === Implementations === */

impl CuePlayer {
    pub fn try_new() -> Result<Self> {
        let (queue, rx) = mpsc::channel();
        let _thread = spawn(move || cue_thread(rx));

        Ok(CuePlayer { queue, _thread })
    }

    pub fn queue(&self, cue: Cue) -> Result<()> {
        self.queue.send(cue)?;
        Ok(())
    }
}

fn cue_thread(queue: mpsc::Receiver<Cue>) -> Result<()> {
    let (_stream, handle) = OutputStream::try_default()?;
    let sink = Sink::try_new(&handle)?;

    while let Ok(cue) = queue.recv() {
        let (frequency, length) = tone(cue);

        let source = SineWave::new(frequency)
            .take_duration(Duration::from_millis(length))
            .amplify(0.25);

        sink.append(source);
    }

    Ok(())
}

/// Frequency in Hz and length in ms for each cue.
fn tone(cue: Cue) -> (f32, u64) {
    match cue {
        Cue::Listening => (660., 150),
        Cue::Accepted => (880., 150),
        Cue::NoCommand => (220., 250),
    }
}
