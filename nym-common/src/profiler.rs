use std::time::Instant;

/// Phase timer. Emits one `tracing` event per finished phase when enabled;
/// a disabled profiler never reads the clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct Profiler {
    enabled: bool,
}

impl Profiler {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&self, phase: &'static str) -> PhaseTimer {
        PhaseTimer {
            phase,
            started: self.enabled.then(Instant::now),
        }
    }
}

/// Reports elapsed time when dropped.
#[must_use = "the phase ends when the timer is dropped"]
#[derive(Debug)]
pub struct PhaseTimer {
    phase: &'static str,
    started: Option<Instant>,
}

impl Drop for PhaseTimer {
    fn drop(&mut self) {
        if let Some(started) = self.started {
            tracing::info!(
                phase = self.phase,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "profiler"
            );
        }
    }
}
