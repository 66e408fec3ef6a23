//! Reactor configuration

/// Configuration for a reactor instance.
///
/// Carries the identity used in log records, the tick rate of the system
/// clock and an optional cap on a single channel wait.
#[derive(Debug, Clone)]
pub struct ReactorConfig {
    pub name: &'static str,
    pub tick_rate_hz: u32,
    pub max_wait: Option<u32>,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            name: "reactor",
            tick_rate_hz: 1000,
            max_wait: None,
        }
    }
}

impl ReactorConfig {
    /// Creates a new reactor configuration builder.
    pub fn builder() -> ReactorConfigBuilder {
        ReactorConfigBuilder::default()
    }

    /// Caps `timeout` (in ticks, `None` meaning unbounded) at `max_wait`.
    pub fn clamp_wait(&self, timeout: Option<u32>) -> Option<u32> {
        match (timeout, self.max_wait) {
            (Some(t), Some(cap)) => Some(t.min(cap)),
            (None, cap) => cap,
            (t, None) => t,
        }
    }
}

/// Builder for ergonomic reactor configuration construction.
#[derive(Debug, Clone, Default)]
pub struct ReactorConfigBuilder {
    config: ReactorConfig,
}

impl ReactorConfigBuilder {
    /// Sets the reactor name.
    pub fn name(mut self, name: &'static str) -> Self {
        self.config.name = name;
        self
    }

    /// Sets the tick rate of the system clock.
    ///
    /// # Panics
    /// Panics if `hz` is zero.
    pub fn tick_rate_hz(mut self, hz: u32) -> Self {
        assert!(hz > 0, "tick rate must be greater than 0");
        self.config.tick_rate_hz = hz;
        self
    }

    /// Caps every channel wait at `ticks`, waking the loop at least that often.
    pub fn max_wait(mut self, ticks: u32) -> Self {
        self.config.max_wait = Some(ticks);
        self
    }

    /// Builds the reactor configuration.
    pub fn build(self) -> ReactorConfig {
        self.config
    }
}
