use std::{
    sync::{
        Arc,
        atomic::{AtomicI32, Ordering},
    },
    time::Duration,
};

use eyre::Result;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc,
    task::JoinSet,
    time::{MissedTickBehavior, interval},
};

use super::defs::*;

/* === Definitions === */

/// A stand-in unit speaking the real wire protocol over any transport,
/// running the firmware's decision table over a crude thermal model. Used
/// by the demo command and integration tests; dropping it stops the tasks.
pub struct Simulator {
    tasks: JoinSet<Result<()>>,
}

/// Cloneable remote control for the simulated hardware.
#[derive(Clone)]
pub struct SimHandle {
    inner: Arc<Inner>,
    lines: mpsc::Sender<String>,
}

struct Inner {
    target: AtomicI32,
    inside: AtomicI32,
    outside: AtomicI32,
}

/// Initial sensor temperatures.
#[derive(Clone, Copy, Debug)]
pub struct Climate {
    pub inside: i32,
    pub outside: i32,
}

/* === Implementations === */

impl Default for Climate {
    fn default() -> Self {
        // A warm afternoon: cooling goes through the exhaust hood
        Climate {
            inside: 28,
            outside: 33,
        }
    }
}

impl Simulator {
    /// Telemetry cadence.
    pub const TICK: Duration = Duration::from_millis(100);

    /// Power-on target, as the firmware defaults it.
    pub const INITIAL_TARGET: i32 = 21;

    /// Ticks between one-degree drifts of the inside sensor while running.
    const DRIFT_TICKS: u32 = 4;

    pub fn spawn<R, W>(reader: R, writer: W, climate: Climate) -> (SimHandle, Simulator)
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let inner = Arc::new(Inner {
            target: AtomicI32::new(Self::INITIAL_TARGET),
            inside: AtomicI32::new(climate.inside),
            outside: AtomicI32::new(climate.outside),
        });

        let (lines_tx, lines_rx) = mpsc::channel(64);

        let mut tasks = JoinSet::new();
        tasks.spawn(Self::command_task(reader, inner.clone()));
        tasks.spawn(Self::ticker_task(inner.clone(), lines_tx.clone()));
        tasks.spawn(Self::writer_task(writer, lines_rx));

        let handle = SimHandle {
            inner,
            lines: lines_tx,
        };

        (handle, Simulator { tasks })
    }

    /* == Background tasks == */

    async fn command_task<R>(reader: R, inner: Arc<Inner>) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut lines = BufReader::new(reader).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            match line.trim().parse::<i32>() {
                Ok(value) if (0..=99).contains(&value) => {
                    tracing::debug!("Simulated unit took target {value}");
                    inner.target.store(value, Ordering::Relaxed);
                }

                _ => tracing::trace!("Simulated unit ignoring {line:?}"),
            }
        }

        Ok(())
    }

    async fn ticker_task(inner: Arc<Inner>, lines: mpsc::Sender<String>) -> Result<()> {
        let mut timer = interval(Self::TICK);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut ticks = 0u32;

        loop {
            timer.tick().await;
            ticks = ticks.wrapping_add(1);

            let frame = inner.frame();

            if frame.state != MotorState::Stopped && ticks % Self::DRIFT_TICKS == 0 {
                let drift = (frame.target - frame.inside).signum();
                inner.inside.fetch_add(drift, Ordering::Relaxed);
            }

            if lines.send(frame.to_string()).await.is_err() {
                break;
            }
        }

        Ok(())
    }

    async fn writer_task<W>(mut writer: W, mut lines: mpsc::Receiver<String>) -> Result<()>
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        while let Some(line) = lines.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }

        Ok(())
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

impl SimHandle {
    /// Emits the literal button line, as the firmware does on a press.
    pub async fn press(&self) {
        self.send_line(ButtonEvent::Start.to_string()).await;
    }

    pub async fn release(&self) {
        self.send_line(ButtonEvent::Stop.to_string()).await;
    }

    pub fn warm_inside(&self, degrees: i32) {
        self.inner.inside.fetch_add(degrees, Ordering::Relaxed);
    }

    pub fn warm_outside(&self, degrees: i32) {
        self.inner.outside.fetch_add(degrees, Ordering::Relaxed);
    }

    pub fn target(&self) -> i32 {
        self.inner.target.load(Ordering::Relaxed)
    }

    pub fn reading(&self) -> StatusFrame {
        self.inner.frame()
    }

    async fn send_line(&self, line: String) {
        let _ = self.lines.send(line).await;
    }
}

impl Inner {
    fn frame(&self) -> StatusFrame {
        let target = self.target.load(Ordering::Relaxed);
        let inside = self.inside.load(Ordering::Relaxed);
        let outside = self.outside.load(Ordering::Relaxed);

        let state = motor_state(target, inside, outside);

        let speed = match state {
            MotorState::Stopped => 0,
            _ => (32 * (inside - target).abs()).min(255),
        };

        StatusFrame {
            state,
            target,
            inside,
            outside,
            speed,
        }
    }
}

/// The firmware's control law: a one-degree hysteresis band, cooling by
/// intake or exhaust depending on which side is cooler, heating only by
/// intake of warmer outside air.
fn motor_state(target: i32, inside: i32, outside: i32) -> MotorState {
    if (inside - target).abs() <= 1 {
        MotorState::Stopped
    } else if inside > target {
        match outside < inside {
            true => MotorState::Forward,
            false => MotorState::Backward,
        }
    } else if outside > inside {
        MotorState::Forward
    } else {
        MotorState::Stopped
    }
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{DuplexStream, ReadHalf, duplex},
        time::timeout,
    };

    use super::{super::protocol::Line, *};

    fn spawn_pair(climate: Climate) -> (SimHandle, Simulator, DuplexStream) {
        let (near, far) = duplex(4096);
        let (reader, writer) = tokio::io::split(far);

        let (handle, simulator) = Simulator::spawn(reader, writer, climate);

        (handle, simulator, near)
    }

    async fn next_frame(
        lines: &mut tokio::io::Lines<BufReader<ReadHalf<DuplexStream>>>,
        accept: impl Fn(&StatusFrame) -> bool,
    ) -> StatusFrame {
        timeout(Duration::from_secs(2), async {
            loop {
                let line = lines.next_line().await.unwrap().unwrap();

                if let Ok(Line::Status(frame)) = Line::parse(line.trim()) {
                    if accept(&frame) {
                        return frame;
                    }
                }
            }
        })
        .await
        .expect("no matching frame before the timeout")
    }

    #[test]
    fn test_motor_state_table() {
        let cases = [
            (20, 20, 35, MotorState::Stopped),
            (10, 20, 5, MotorState::Forward),
            (10, 20, 25, MotorState::Backward),
            (40, 20, 30, MotorState::Forward),
            (40, 20, 10, MotorState::Stopped),
        ];

        for (target, inside, outside, expected) in cases {
            assert_eq!(motor_state(target, inside, outside), expected);
        }
    }

    #[tokio::test]
    async fn test_takes_commands_and_reports_state() {
        let climate = Climate {
            inside: 30,
            outside: 20,
        };

        let (_handle, _simulator, near) = spawn_pair(climate);
        let (reader, mut writer) = tokio::io::split(near);

        writer.write_all(b"10\n").await.unwrap();

        let mut lines = BufReader::new(reader).lines();
        let frame = next_frame(&mut lines, |frame| frame.target == 10).await;

        // Cooling with a cooler outside: intake
        assert_eq!(frame.state, MotorState::Forward);
        assert!(frame.speed > 0);
    }

    #[tokio::test]
    async fn test_press_emits_literal_line() {
        let (handle, _simulator, near) = spawn_pair(Climate::default());
        let (reader, _writer) = tokio::io::split(near);

        handle.press().await;

        let mut lines = BufReader::new(reader).lines();

        let seen = timeout(Duration::from_secs(2), async {
            loop {
                let line = lines.next_line().await.unwrap().unwrap();

                if line.trim() == "Start" {
                    return true;
                }
            }
        })
        .await
        .unwrap();

        assert!(seen);
    }

    #[tokio::test]
    async fn test_ignores_out_of_range_commands() {
        let (handle, _simulator, near) = spawn_pair(Climate::default());
        let (_reader, mut writer) = tokio::io::split(near);

        writer.write_all(b"250\nnonsense\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(handle.target(), Simulator::INITIAL_TARGET);
    }
}
