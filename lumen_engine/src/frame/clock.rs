//! Frame timing.

/// Timing handed to behaviours each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameTime {
    /// Seconds since the previous frame
    pub delta: f32,
    /// Seconds since the first frame
    pub elapsed: f64,
    /// Zero-based index of this frame
    pub frame_index: u64,
}

/// Accumulates frame deltas.
#[derive(Debug, Default)]
pub struct FrameClock {
    elapsed: f64,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new frame lasting `delta` seconds. Negative deltas clamp to 0.
    pub fn advance(&mut self, delta: f32) -> FrameTime {
        let delta = delta.max(0.0);
        let time = FrameTime { delta, elapsed: self.elapsed + delta as f64, frame_index: self.frames };
        self.elapsed = time.elapsed;
        self.frames += 1;
        time
    }

    /// Frames started so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}
