//! Dots animation for text placeholders.

use std::time::Duration;

/// Nominal period between animation frames.
pub const DOTS_PERIOD: Duration = Duration::from_millis(500);

/// Maximum number of trailing dots before the cycle restarts.
pub const MAX_DOTS: usize = 3;

/// Cycles a placeholder through 0, 1, 2, 3 trailing dots and back to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DotsCycle {
    dots: usize,
}

impl DotsCycle {
    /// Moves to the next frame.
    pub fn advance(&mut self) {
        self.dots = (self.dots + 1) % (MAX_DOTS + 1);
    }

    /// Current number of dots.
    #[must_use]
    pub fn dots(&self) -> usize {
        self.dots
    }

    /// Renders the current frame for `base`.
    #[must_use]
    pub fn frame(&self, base: &str) -> String {
        let mut frame = String::with_capacity(base.len() + self.dots);
        frame.push_str(base);
        frame.extend(std::iter::repeat_n('.', self.dots));
        frame
    }
}
