use std::time::Instant;

/// Wall clock for frame statistics. Animation never reads it: animated
/// nodes advance by fixed per-tick increments.
#[derive(Debug)]
pub struct Clock {
    started: Instant,
    last_tick: Instant,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_tick: now,
        }
    }

    /// Seconds since the previous call, advancing the clock
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        delta
    }

    pub fn elapsed(&self) -> f32 {
        self.started.elapsed().as_secs_f32()
    }

    pub fn reset(&mut self) {
        let now = Instant::now();
        self.started = now;
        self.last_tick = now;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn clock_measures_delta() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        let delta = clock.tick();
        assert!(delta >= 0.009);
        assert!(clock.elapsed() >= delta);
    }

    #[test]
    fn clock_resets() {
        let mut clock = Clock::new();
        thread::sleep(Duration::from_millis(10));
        clock.reset();
        assert!(clock.tick() < 0.005);
    }
}
