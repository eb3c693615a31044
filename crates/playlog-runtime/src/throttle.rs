use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How hard the background ingestion may push the CPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingIntensity {
    Low,
    #[default]
    Medium,
    High,
    Unlimited,
}

impl ProcessingIntensity {
    /// Lines processed between pauses, and the pause length.
    pub fn budget(&self) -> Option<(usize, Duration)> {
        match self {
            ProcessingIntensity::Low => Some((200, Duration::from_millis(20))),
            ProcessingIntensity::Medium => Some((1_000, Duration::from_millis(10))),
            ProcessingIntensity::High => Some((5_000, Duration::from_millis(5))),
            ProcessingIntensity::Unlimited => None,
        }
    }
}

/// Cooperative pause in the line loop.
#[derive(Debug)]
pub struct Throttle {
    budget: Option<(usize, Duration)>,
    since_pause: usize,
    pauses: usize,
}

impl Throttle {
    pub fn new(intensity: ProcessingIntensity) -> Self {
        Self {
            budget: intensity.budget(),
            since_pause: 0,
            pauses: 0,
        }
    }

    /// Count one processed line, sleeping the current thread once the
    /// budget is used up.
    pub fn tick(&mut self) {
        let Some((every, pause)) = self.budget else {
            return;
        };
        self.since_pause += 1;
        if self.since_pause >= every {
            self.since_pause = 0;
            self.pauses += 1;
            std::thread::sleep(pause);
        }
    }

    pub fn pauses(&self) -> usize {
        self.pauses
    }
}
