use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use log::Level;

/// Append-only record of every order attempt and connection failure.
///
/// One journal is created per session and handed to whoever needs it. Each
/// entry is also forwarded to the `log` facade for the console.
pub struct OrderJournal<W: Write> {
    sink: W,
}

impl OrderJournal<File> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Cannot open order log {}", path.display()))?;
        Ok(OrderJournal::new(file))
    }
}

impl<W: Write> OrderJournal<W> {
    pub fn new(sink: W) -> Self {
        OrderJournal { sink }
    }

    pub fn info(&mut self, message: &str) {
        self.record(Level::Info, message);
    }

    pub fn warn(&mut self, message: &str) {
        self.record(Level::Warn, message);
    }

    pub fn error(&mut self, message: &str) {
        self.record(Level::Error, message);
    }

    fn record(&mut self, level: Level, message: &str) {
        log::log!(level, "{}", message);

        let line = format!(
            "{} - {} - {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            level,
            message
        );
        // A broken log file must not abort an order session.
        if let Err(e) = self
            .sink
            .write_all(line.as_bytes())
            .and_then(|_| self.sink.flush())
        {
            log::warn!("Failed to write order log: {}", e);
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.sink
    }
}
