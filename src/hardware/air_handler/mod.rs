use std::time::Duration;

use eyre::{Context, Result};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    sync::mpsc::{self, error::TrySendError},
    task::JoinSet,
    time::{sleep, timeout},
};
use tokio_serial::SerialPortBuilderExt;

use self::{defs::*, protocol::*};

pub mod defs;
pub mod protocol;
pub mod sim;

/* === Definitions === */

/// Serial handle to the fan/hood unit. A background task turns the inbound
/// byte stream into parsed messages; writes go straight to the port.
pub struct AirHandler {
    messages: mpsc::Receiver<Message>,
    writer: Box<dyn AsyncWrite + Send + Sync + Unpin>,

    tasks: JoinSet<Result<()>>,
}

impl AirHandler {
    pub const BAUD_RATE: u32 = 9600;

    /// Opening the port resets the microcontroller; give it time to boot.
    const BOOT_GRACE: Duration = Duration::from_secs(2);

    const CHANNEL_CAPACITY: usize = 256;

    /// Frames that may already be in flight when a reading is requested.
    const STALE_FRAMES: usize = 2;

    /// Longest to wait for any single fresh frame.
    const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

    pub async fn open(path: &str, baud: u32) -> Result<Self> {
        let port = tokio_serial::new(path, baud)
            .open_native_async()
            .wrap_err_with(|| format!("Failed to open serial port {path}"))?;

        let (reader, writer) = tokio::io::split(port);
        let handler = Self::attach(reader, writer);

        tracing::debug!("Port {path} open, waiting out the boot grace period");
        sleep(Self::BOOT_GRACE).await;

        Ok(handler)
    }

    /// Attaches to an already-open transport. No boot grace is applied.
    pub fn attach<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Sync + Unpin + 'static,
    {
        let (messages_tx, messages) = mpsc::channel(Self::CHANNEL_CAPACITY);

        let mut tasks = JoinSet::new();
        tasks.spawn(Self::reader_task(reader, messages_tx));

        AirHandler {
            messages,
            writer: Box::new(writer),
            tasks,
        }
    }

    /* == Public API == */

    /// Fire-and-forget: the protocol has no acknowledgement, the echoed
    /// target in the next status frame is the only confirmation.
    pub async fn send_target(&mut self, command: TargetCommand) -> Result<()> {
        self.writer
            .write_all(command.encode().as_bytes())
            .await
            .wrap_err("Failed to send the target command")?;

        self.writer
            .flush()
            .await
            .wrap_err("Failed to flush the target command")?;

        tracing::debug!("Sent target {command}");

        Ok(())
    }

    /// Next message in arrival order. `None` once the link is gone.
    pub async fn recv(&mut self) -> Option<Message> {
        self.messages.recv().await
    }

    /// Waits for an exact button event, discarding everything else.
    pub async fn wait_for_event(&mut self, event: ButtonEvent, limit: Duration) -> bool {
        timeout(limit, async {
            while let Some(message) = self.messages.recv().await {
                if message == Message::Button(event) {
                    return true;
                }
            }

            false
        })
        .await
        .unwrap_or(false)
    }

    /// Takes a reading that reflects the unit right now: drops the queued
    /// backlog, skips frames that may have been in flight, then returns the
    /// next status frame. `None` when the unit goes quiet.
    pub async fn current_reading(&mut self) -> Option<StatusFrame> {
        self.drain();

        let mut skipped = 0;

        loop {
            match timeout(Self::FRAME_TIMEOUT, self.messages.recv()).await {
                Ok(Some(Message::Status(frame))) => {
                    if skipped < Self::STALE_FRAMES {
                        skipped += 1;
                        continue;
                    }

                    return Some(frame);
                }

                Ok(Some(Message::Button(_))) => continue,
                Ok(None) | Err(_) => return None,
            }
        }
    }

    /// Discards everything queued so far.
    pub fn drain(&mut self) {
        while self.messages.try_recv().is_ok() {}
    }

    /* == Background tasks == */

    async fn reader_task<R>(reader: R, messages: mpsc::Sender<Message>) -> Result<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let mut lines = BufReader::new(reader).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    tracing::warn!("Serial read failed: {error}");
                    break;
                }
            };

            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            let message = match Line::parse(line) {
                Ok(Line::Event(event)) => Message::Button(event),
                Ok(Line::Status(frame)) => Message::Status(frame),
                Err(reason) => {
                    tracing::trace!("Discarding line {line:?}: {reason}");
                    continue;
                }
            };

            match messages.try_send(message) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::trace!("Consumer behind, dropping {line:?}")
                }
                Err(TrySendError::Closed(_)) => break,
            }
        }

        tracing::debug!("Serial reader stopped");

        Ok(())
    }
}

impl Drop for AirHandler {
    fn drop(&mut self) {
        self.tasks.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, DuplexStream, duplex};

    use super::*;

    fn attached_pair() -> (AirHandler, DuplexStream) {
        let (near, far) = duplex(1024);
        let (reader, writer) = tokio::io::split(near);

        (AirHandler::attach(reader, writer), far)
    }

    #[tokio::test]
    async fn test_messages_arrive_in_order() {
        let (mut handler, mut unit) = attached_pair();

        unit.write_all(b"Start\nF,20,25,30,128\nnoise\nStop\n")
            .await
            .unwrap();

        assert_eq!(handler.recv().await, Some(Message::Button(ButtonEvent::Start)));
        assert!(matches!(handler.recv().await, Some(Message::Status(_))));
        assert_eq!(handler.recv().await, Some(Message::Button(ButtonEvent::Stop)));
    }

    #[tokio::test]
    async fn test_wait_for_event_ignores_other_traffic() {
        let (mut handler, mut unit) = attached_pair();

        unit.write_all(b"S,20,21,22,0\nStop\nStart\n").await.unwrap();

        let seen = handler
            .wait_for_event(ButtonEvent::Start, Duration::from_secs(1))
            .await;

        assert!(seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_event_times_out() {
        let (mut handler, _unit) = attached_pair();

        let seen = handler
            .wait_for_event(ButtonEvent::Start, Duration::from_millis(50))
            .await;

        assert!(!seen);
    }

    #[tokio::test]
    async fn test_current_reading_skips_stale_frames() {
        let (mut handler, mut unit) = attached_pair();

        let backlog: String = (0..5).map(|i| format!("S,20,{},30,0\n", 20 + i)).collect();

        // Polled first, so the drain happens before any frame lands
        let (reading, _) = tokio::join!(handler.current_reading(), async {
            unit.write_all(backlog.as_bytes()).await.unwrap();
        });

        assert_eq!(reading.map(|frame| frame.inside), Some(22));
    }

    #[tokio::test(start_paused = true)]
    async fn test_current_reading_is_none_while_quiet() {
        let (mut handler, _unit) = attached_pair();

        assert_eq!(handler.current_reading().await, None);
        assert_eq!(handler.current_reading().await, None);
    }

    #[tokio::test]
    async fn test_send_target_wire_form() {
        let (mut handler, mut unit) = attached_pair();

        handler.send_target(TargetCommand::clamped(5)).await.unwrap();

        let mut buffer = [0u8; 3];
        unit.read_exact(&mut buffer).await.unwrap();

        assert_eq!(&buffer, b"05\n");
    }
}
