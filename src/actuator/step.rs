//! Bouncing position generator for `Moved` handlers.

/// Sweeps a position back and forth between two bounds.
///
/// Each [`advance`](Sweep::advance) yields the *current* position and then
/// steps by the stride; when the next position would leave the bounds, the
/// stride flips sign instead of stepping. The engine never advances position
/// on its own — a `Moved` handler typically owns one of these and writes the
/// produced value back to the device.
///
/// # Example
/// ```
/// use tickmux::actuator::Sweep;
///
/// let mut sweep = Sweep::new((0.0, 2.0), 1.0);
/// let values: Vec<f64> = (0..6).map(|_| sweep.advance()).collect();
/// assert_eq!(values, vec![0.0, 1.0, 2.0, 2.0, 1.0, 0.0]);
/// ```
#[derive(Debug, Clone)]
pub struct Sweep {
    min: f64,
    max: f64,
    stride: f64,
    value: f64,
}

impl Sweep {
    /// Creates a sweep over `(min, max)` starting at `min`.
    pub fn new(bounds: (f64, f64), stride: f64) -> Self {
        Self {
            min: bounds.0,
            max: bounds.1,
            stride,
            value: bounds.0,
        }
    }

    /// Starts the sweep at an explicit position.
    pub fn starting_at(mut self, value: f64) -> Self {
        self.value = value.clamp(self.min, self.max);
        self
    }

    /// Current position without advancing.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Current stride (sign carries the direction).
    pub fn stride(&self) -> f64 {
        self.stride
    }

    /// Yields the current position, then steps — flipping direction at the
    /// bounds instead of overshooting.
    pub fn advance(&mut self) -> f64 {
        let current = self.value;
        let next = self.value + self.stride;
        if next > self.max || next < self.min {
            self.stride = -self.stride;
        } else {
            self.value = next;
        }
        current
    }
}

impl Iterator for Sweep {
    type Item = f64;

    /// Never exhausts; the sweep bounces forever.
    fn next(&mut self) -> Option<f64> {
        Some(self.advance())
    }
}
