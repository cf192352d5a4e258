/// Accumulates the elapsed time handed in by the frame driver.
///
/// There is no wall clock behind it: if the driver stops calling
/// [`FrameClock::advance`], time stops too.
#[derive(Debug, Default, Clone)]
pub struct FrameClock {
    pub time_seconds: f32,
    pub frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.time_seconds = 0.0;
        self.frames = 0;
    }

    /// Records one frame and returns the usable delta. Negative or
    /// non-finite deltas count as zero.
    pub fn advance(&mut self, delta: f32) -> f32 {
        let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
        self.time_seconds += delta;
        self.frames += 1;
        delta
    }
}
