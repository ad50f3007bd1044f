//! Upload throughput measurement.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const DEFAULT_WINDOW: Duration = Duration::from_secs(5);
const DEFAULT_MAX_SAMPLES: usize = 128;

/// Sliding-window throughput of acknowledged chunks.
///
/// Shared by concurrent chunk uploads; each acknowledgement records its byte
/// count. Samples older than the window, or beyond `max_samples`, are dropped.
pub struct SpeedCalculator {
    window: Duration,
    max_samples: usize,
    samples: Mutex<VecDeque<(Instant, u64)>>,
}

impl Default for SpeedCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_MAX_SAMPLES)
    }
}

impl SpeedCalculator {
    pub fn new(window: Duration, max_samples: usize) -> Self {
        Self {
            window,
            max_samples: max_samples.max(2),
            samples: Mutex::new(VecDeque::new()),
        }
    }

    /// Records `bytes` acknowledged now.
    pub fn add_sample(&self, bytes: u64) {
        self.add_sample_at(Instant::now(), bytes);
    }

    fn add_sample_at(&self, at: Instant, bytes: u64) {
        let mut samples = self.samples.lock().unwrap();
        samples.push_back((at, bytes));

        while samples
            .front()
            .is_some_and(|(t, _)| at.saturating_duration_since(*t) > self.window)
        {
            samples.pop_front();
        }
        while samples.len() > self.max_samples {
            samples.pop_front();
        }
    }

    /// Bytes per second across the window; `0.0` until two samples exist.
    ///
    /// The oldest sample only marks the start of the window, so its bytes are
    /// not counted.
    pub fn bytes_per_second(&self) -> f64 {
        let samples = self.samples.lock().unwrap();
        let (Some((first, _)), Some((last, _))) = (samples.front(), samples.back()) else {
            return 0.0;
        };
        let elapsed = last.saturating_duration_since(*first);
        if elapsed.is_zero() {
            return 0.0;
        }

        let bytes: u64 = samples.iter().skip(1).map(|(_, b)| b).sum();
        bytes as f64 / elapsed.as_secs_f64()
    }
}
