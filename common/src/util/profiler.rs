use std::time::Instant;

/// Logs how long a scope took when dropped.
pub struct ScopedTimer {
    name: &'static str,
    level: log::Level,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(name: &'static str) -> Self {
        Self::with_level(name, log::Level::Info)
    }

    pub fn with_level(name: &'static str, level: log::Level) -> Self {
        Self {
            name,
            level,
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::log!(self.level, "{} took {:?}", self.name, self.start.elapsed());
    }
}
