use std::path::PathBuf;

use crate::{HanabiError, Result};

/// Camera or video source shown behind the fireworks.
pub trait VideoFeed {
    fn describe(&self) -> String;
    fn start(&mut self) -> Result<()>;
}

/// Video device exposed as a file, such as `/dev/video0`.
#[derive(Debug, Clone)]
pub struct DeviceFeed {
    path: PathBuf,
    running: bool,
}

impl DeviceFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            running: false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl VideoFeed for DeviceFeed {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn start(&mut self) -> Result<()> {
        let metadata = std::fs::metadata(&self.path)?;
        if metadata.is_dir() {
            return Err(HanabiError::msg(format!(
                "`{}` is a directory, not a video device",
                self.path.display()
            )));
        }
        self.running = true;
        Ok(())
    }
}

/// Starts the backdrop feed. Failure is logged and the fireworks run over
/// an empty background.
pub fn start_backdrop(feed: &mut dyn VideoFeed) -> bool {
    match feed.start() {
        Ok(()) => {
            tracing::info!(feed = %feed.describe(), "backdrop feed started");
            true
        }
        Err(err) => {
            tracing::warn!(feed = %feed.describe(), %err, "backdrop feed unavailable");
            false
        }
    }
}
