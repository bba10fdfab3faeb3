use super::types::AxonHealth;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub const DEFAULT_HEALTH_TTL: Duration = Duration::from_secs(15);

/// Time source for cache expiry.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Cloned handles share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Last health report together with the time it was taken.
///
/// Entries younger than the TTL are served from [`get`](Self::get); older
/// ones read as missing until [`store`](Self::store) replaces them.
pub struct HealthCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entry: Option<(Instant, AxonHealth)>,
}

impl HealthCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entry: None,
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached report, if it is still within the TTL.
    pub fn get(&self) -> Option<&AxonHealth> {
        let (taken_at, health) = self.entry.as_ref()?;
        let age = self.clock.now().saturating_duration_since(*taken_at);
        (age < self.ttl).then_some(health)
    }

    pub fn store(&mut self, health: AxonHealth) {
        self.entry = Some((self.clock.now(), health));
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}
