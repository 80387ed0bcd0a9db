use std::time::Duration;

use crate::processors::domain::frame_processor::FrameProcessor;

/// Fixed backoff between readiness probes.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Scheduling seam for the gate's sleep-poll loop, injectable in tests.
pub trait Clock: Send {
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Blocks until a processor's backing resources are actually ready.
///
/// The wait is intentionally unbounded: weights may still be downloading,
/// and process-level timeouts belong to the caller. While waiting, the
/// process-wide log filter is set to `Off` so repeated probes do not spam
/// output; the previous filter is restored the instant readiness is
/// achieved. No lock is held while waiting.
pub struct ReadinessGate {
    clock: Box<dyn Clock>,
    interval: Duration,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self {
            clock: Box::new(SystemClock),
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_clock(clock: Box<dyn Clock>, interval: Duration) -> Self {
        Self { clock, interval }
    }

    pub fn await_ready(&self, processor: &dyn FrameProcessor) {
        let previous = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        loop {
            if processor.probe_ready() {
                break;
            }
            self.clock.sleep(self.interval);
        }
        log::set_max_level(previous);
        log::debug!("frame processor '{}' is ready", processor.name());
    }
}

impl Default for ReadinessGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processors::domain::frame_processor::ProcessContext;
    use crate::shared::face::Face;
    use crate::shared::frame::Frame;
    use crate::shared::run_config::RunConfiguration;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Reports ready after a fixed number of failed probes, recording the
    /// log filter seen by each probe.
    struct CountdownProcessor {
        failures: usize,
        probes: Arc<AtomicUsize>,
        levels_seen: Arc<Mutex<Vec<log::LevelFilter>>>,
    }

    impl CountdownProcessor {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                probes: Arc::new(AtomicUsize::new(0)),
                levels_seen: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl FrameProcessor for CountdownProcessor {
        fn name(&self) -> &'static str {
            "countdown"
        }

        fn pre_check(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn probe_ready(&self) -> bool {
            self.levels_seen.lock().unwrap().push(log::max_level());
            let done = self.probes.fetch_add(1, Ordering::SeqCst);
            done >= self.failures
        }

        fn pre_process(
            &mut self,
            _config: &RunConfiguration,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn process_image(
            &mut self,
            _ctx: &ProcessContext<'_>,
            _image_path: &Path,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn process_video(
            &mut self,
            _ctx: &ProcessContext<'_>,
            _frame_paths: &[PathBuf],
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn post_process(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn get_reference_frame(
            &self,
            _source_face: &Face,
            _target_face: &Face,
            _frame: &Frame,
        ) -> Option<Frame> {
            None
        }
    }

    // The gate toggles the process-wide log filter; serialize these tests
    // so parallel execution cannot interleave the toggles.
    static GATE_LOCK: Mutex<()> = Mutex::new(());

    struct CountingClock {
        sleeps: Arc<AtomicUsize>,
    }

    impl Clock for CountingClock {
        fn sleep(&self, _duration: Duration) {
            self.sleeps.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn gate_with_counter() -> (ReadinessGate, Arc<AtomicUsize>) {
        let sleeps = Arc::new(AtomicUsize::new(0));
        let clock = CountingClock {
            sleeps: sleeps.clone(),
        };
        (
            ReadinessGate::with_clock(Box::new(clock), POLL_INTERVAL),
            sleeps,
        )
    }

    // --- Tests ---

    #[test]
    fn test_returns_after_n_plus_one_probes() {
        let _guard = GATE_LOCK.lock().unwrap();
        let processor = CountdownProcessor::new(3);
        let probes = processor.probes.clone();
        let (gate, sleeps) = gate_with_counter();

        gate.await_ready(&processor);

        assert_eq!(probes.load(Ordering::SeqCst), 4);
        assert_eq!(sleeps.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_immediately_ready_never_sleeps() {
        let _guard = GATE_LOCK.lock().unwrap();
        let processor = CountdownProcessor::new(0);
        let probes = processor.probes.clone();
        let (gate, sleeps) = gate_with_counter();

        gate.await_ready(&processor);

        assert_eq!(probes.load(Ordering::SeqCst), 1);
        assert_eq!(sleeps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_logging_suppressed_while_waiting_and_restored_after() {
        let _guard = GATE_LOCK.lock().unwrap();
        log::set_max_level(log::LevelFilter::Info);

        let processor = CountdownProcessor::new(2);
        let levels = processor.levels_seen.clone();
        let (gate, _) = gate_with_counter();

        gate.await_ready(&processor);

        // Every probe ran with logging disabled
        let levels = levels.lock().unwrap();
        assert_eq!(levels.len(), 3);
        assert!(levels.iter().all(|l| *l == log::LevelFilter::Off));
        // Restored the instant readiness was achieved
        assert_eq!(log::max_level(), log::LevelFilter::Info);
    }

    #[test]
    fn test_default_interval_is_500ms() {
        assert_eq!(POLL_INTERVAL, Duration::from_millis(500));
    }
}
