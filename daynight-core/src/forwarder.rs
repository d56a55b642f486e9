use std::{fmt::Debug, io::Write, sync::Mutex};

use async_trait::async_trait;
use tracing::{error, info};

use crate::{
    error::{ChannelError, SyncError},
    model::{OutboundMessage, SunTimes},
};

/// Channel to the watch application. `Ok` is the acknowledgment.
#[async_trait]
pub trait MessageChannel: Send + Sync + Debug {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Writes every message as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesChannel<W> {
    out: Mutex<W>,
}

impl<W: Write> JsonLinesChannel<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl JsonLinesChannel<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

#[async_trait]
impl<W: Write + Send + Debug> MessageChannel for JsonLinesChannel<W> {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let line = serde_json::to_string(message).map_err(|e| ChannelError::Io(e.to_string()))?;

        let mut out = self.out.lock().map_err(|_| ChannelError::Busy)?;
        writeln!(out, "{line}").map_err(|e| ChannelError::Io(e.to_string()))?;
        out.flush().map_err(|e| ChannelError::Io(e.to_string()))
    }
}

/// Package `times` and make exactly one send attempt.
pub async fn forward(
    channel: &dyn MessageChannel,
    times: SunTimes,
) -> Result<OutboundMessage, SyncError> {
    let message = OutboundMessage::from(times);

    match channel.send(&message).await {
        Ok(()) => {
            info!("Sunrise/sunset info sent to watch successfully");
            Ok(message)
        }
        Err(e) => {
            let err = SyncError::from(e);
            error!("{err}");
            Err(err)
        }
    }
}
