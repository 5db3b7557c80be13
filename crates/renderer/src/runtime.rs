use web_time::Instant;

/// Converts a frame-callback timestamp (milliseconds) into shader seconds.
pub fn timestamp_to_seconds(timestamp_ms: f64) -> f32 {
    (timestamp_ms * 0.001) as f32
}

/// Abstraction over where frame timestamps originate from.
///
/// The browser hands the timestamp to the animation-frame callback directly;
/// the desktop host samples one of these once per redraw.
pub trait TimeSource {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces the timestamp, in milliseconds, for the next frame.
    fn now_ms(&mut self) -> f64;
}

/// Time source backed by the monotonic clock, starting at zero.
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = Instant::now();
    }

    fn now_ms(&mut self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    timestamp_ms: f64,
}

impl FixedTimeSource {
    /// Constructs a source pinned at `seconds`.
    pub fn from_seconds(seconds: f32) -> Self {
        Self {
            timestamp_ms: f64::from(seconds) * 1000.0,
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {}

    fn now_ms(&mut self) -> f64 {
        self.timestamp_ms
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource>;

/// Picks the clock for a run: pinned when `freeze_time` is set, wall-clock otherwise.
pub fn time_source_for(freeze_time: Option<f32>) -> BoxedTimeSource {
    match freeze_time {
        Some(seconds) => Box::new(FixedTimeSource::from_seconds(seconds)),
        None => Box::new(SystemTimeSource::new()),
    }
}
