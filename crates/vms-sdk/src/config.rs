//! Session configuration.

/// Configuration for a [`Session`](crate::Session).
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Name recorded on every event the session publishes.
    pub operator: String,
    /// Capacity of the broadcast channel. Slow subscribers lag past it.
    pub event_capacity: usize,
    /// Number of recent events kept for polling readers.
    pub history_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            operator: "Anonymous".to_string(),
            event_capacity: 128,
            history_limit: 64,
        }
    }
}

/// Builder for session configuration.
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    pub fn operator(mut self, name: impl Into<String>) -> Self {
        self.config.operator = name.into();
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity.max(1);
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.config.history_limit = limit;
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.operator, "Anonymous");
        assert_eq!(config.event_capacity, 128);
        assert_eq!(config.history_limit, 64);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfigBuilder::new()
            .operator("Nurse Joy")
            .event_capacity(0)
            .history_limit(8)
            .build();

        assert_eq!(config.operator, "Nurse Joy");
        assert_eq!(config.event_capacity, 1);
        assert_eq!(config.history_limit, 8);
    }
}
