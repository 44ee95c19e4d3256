//! Preallocated circular delay line

/// Circular buffer sized once at construction
///
/// All reads and writes are bounded; nothing here allocates after `new`.
#[derive(Debug, Clone)]
pub struct DelayLine {
    buffer: Vec<f32>,
    write_pos: usize,
}

impl DelayLine {
    /// Create a delay line able to hold `capacity` past samples
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity.max(2)],
            write_pos: 0,
        }
    }

    /// Capacity needed for `max_ms` at `max_sample_rate`
    pub fn capacity_for(max_ms: f32, max_sample_rate: u32) -> usize {
        (max_ms * max_sample_rate as f32 / 1000.0).ceil() as usize + 2
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Longest delay (in samples) that [`Self::read`] can serve
    pub fn max_delay(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Push one sample
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.buffer[self.write_pos] = sample;
        self.write_pos += 1;
        if self.write_pos == self.buffer.len() {
            self.write_pos = 0;
        }
    }

    /// Sample written `delay` writes ago (0 = most recent)
    #[inline]
    pub fn read(&self, delay: usize) -> f32 {
        let len = self.buffer.len();
        let delay = delay.min(len - 1);
        let index = (self.write_pos + len - 1 - delay) % len;
        self.buffer[index]
    }

    /// Linearly interpolated read at a fractional delay
    #[inline]
    pub fn read_fractional(&self, delay: f32) -> f32 {
        let delay = delay.clamp(0.0, (self.buffer.len() - 2) as f32);
        let whole = delay.floor();
        let frac = delay - whole;
        let a = self.read(whole as usize);
        let b = self.read(whole as usize + 1);
        a + (b - a) * frac
    }

    /// Zero the contents
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_delay() {
        let mut line = DelayLine::new(8);
        for i in 1..=5 {
            line.write(i as f32);
        }
        assert_eq!(line.read(0), 5.0);
        assert_eq!(line.read(2), 3.0);
        assert_eq!(line.read(4), 1.0);
    }

    #[test]
    fn wraps_around() {
        let mut line = DelayLine::new(4);
        for i in 0..10 {
            line.write(i as f32);
        }
        assert_eq!(line.read(0), 9.0);
        assert_eq!(line.read(3), 6.0);
    }

    #[test]
    fn fractional_read_interpolates() {
        let mut line = DelayLine::new(8);
        line.write(0.0);
        line.write(1.0);
        assert!((line.read_fractional(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clear_zeroes() {
        let mut line = DelayLine::new(4);
        line.write(1.0);
        line.clear();
        assert_eq!(line.read(0), 0.0);
    }

    #[test]
    fn capacity_covers_requested_time() {
        let cap = DelayLine::capacity_for(10.0, 48000);
        assert!(cap >= 480);
    }
}
