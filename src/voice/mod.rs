use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle, time::timeout};

use self::capture::{FRAME_SAMPLES, FrameSource};

pub mod capture;
pub mod number;
pub mod transcribe;

/* === Definitions === */

/// One in-flight capture session. Exists only while a session is open:
/// created on the start event, torn down on stop.
pub struct Recorder {
    stop: Arc<AtomicBool>,
    level: watch::Receiver<f32>,
    task: JoinHandle<Vec<i16>>,
}

/* === Implementations === */

impl Recorder {
    /// Longest to wait for the capture thread after signalling it. A source
    /// blocked in a read with no data coming never notices the signal.
    const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

    /// Opens the source and captures from it on the blocking pool. Opening
    /// happens inside the task: a FIFO with no writer yet blocks there
    /// instead of stalling the caller.
    pub fn start<S, F>(open: F) -> Self
    where
        S: FrameSource,
        F: FnOnce() -> io::Result<S> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let (level_tx, level) = watch::channel(0.);

        let flag = stop.clone();

        let task = tokio::task::spawn_blocking(move || {
            let mut source = match open() {
                Ok(source) => source,
                Err(error) => {
                    tracing::warn!("Capture source unavailable: {error}");
                    return Vec::new();
                }
            };

            let mut samples = Vec::new();
            let mut frame = [0i16; FRAME_SAMPLES];

            while !flag.load(Ordering::Relaxed) {
                match source.read_frame(&mut frame) {
                    Ok(0) => break,

                    Ok(count) => {
                        samples.extend_from_slice(&frame[..count]);
                        let _ = level_tx.send(capture::level(&frame[..count]));
                    }

                    Err(error) => {
                        tracing::warn!("Capture read failed: {error}");
                        break;
                    }
                }
            }

            samples
        });

        Recorder { stop, level, task }
    }

    /// Microphone level meter, updated per frame.
    pub fn level(&self) -> watch::Receiver<f32> {
        self.level.clone()
    }

    /// Signals the capture loop and collects whatever was recorded. A
    /// source that never unblocks forfeits its samples.
    pub async fn stop(self) -> Vec<i16> {
        self.stop.store(true, Ordering::Relaxed);

        match timeout(Self::JOIN_TIMEOUT, self.task).await {
            Ok(Ok(samples)) => samples,

            Ok(Err(error)) => {
                tracing::warn!("Capture task failed: {error}");
                Vec::new()
            }

            Err(_) => {
                tracing::warn!("Capture source did not stop in time, dropping the session");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Yields a fixed set of frames, then EOF.
    struct ScriptedSource {
        frames: Vec<Vec<i16>>,
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self, frame: &mut [i16]) -> io::Result<usize> {
            if self.frames.is_empty() {
                return Ok(0);
            }

            let next = self.frames.remove(0);
            frame[..next.len()].copy_from_slice(&next);

            Ok(next.len())
        }
    }

    #[tokio::test]
    async fn test_collects_samples_until_eof() {
        let source = ScriptedSource {
            frames: vec![vec![1, 2, 3], vec![4, 5]],
        };

        let recorder = Recorder::start(move || Ok(source));

        // The sender drops once the capture loop hits EOF
        let mut level = recorder.level();
        while level.changed().await.is_ok() {}

        assert_eq!(recorder.stop().await, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_stops_on_signal() {
        /// Never-ending silence.
        struct Endless;

        impl FrameSource for Endless {
            fn read_frame(&mut self, frame: &mut [i16]) -> io::Result<usize> {
                std::thread::sleep(Duration::from_millis(1));
                frame.fill(0);

                Ok(frame.len())
            }
        }

        let recorder = Recorder::start(|| Ok(Endless));
        tokio::time::sleep(Duration::from_millis(50)).await;

        let samples = recorder.stop().await;
        assert!(!samples.is_empty());
    }

    #[tokio::test]
    async fn test_failed_open_yields_no_samples() {
        let recorder = Recorder::start(|| -> io::Result<ScriptedSource> {
            Err(io::Error::other("no such device"))
        });

        assert!(recorder.stop().await.is_empty());
    }
}
