//! Wall-clock timing for probe rounds

use std::time::Instant;
use tracing::debug;

/// Labeled stopwatch
#[derive(Debug)]
pub struct Timer {
    label: String,
    started: Instant,
}

impl Timer {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Log the elapsed time and consume the timer
    pub fn finish(self) -> u64 {
        let ms = self.elapsed_ms();
        debug!("{} took {ms}ms", self.label);
        ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn elapsed_grows() {
        let timer = Timer::start("probe");
        sleep(Duration::from_millis(5));
        assert!(timer.finish() >= 5);
    }
}
