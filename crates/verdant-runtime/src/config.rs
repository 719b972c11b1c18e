//! Runtime configuration.

use verdant_options::{MergeStrategies, Strategy};

/// Settings shared by every instance a [`Runtime`](crate::Runtime) creates.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    /// Per-field merge strategies used for definitions and instances.
    pub strategies: MergeStrategies,
    /// Suppress all diagnostics.
    pub silent: bool,
}

impl RuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strategies(mut self, strategies: MergeStrategies) -> Self {
        self.strategies = strategies;
        self
    }

    /// Override the merge strategy of a single field.
    pub fn with_strategy(mut self, field: impl Into<String>, strategy: Strategy) -> Self {
        self.strategies.set(field, strategy);
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = RuntimeConfig::new()
            .with_strategy("created", Strategy::Override)
            .silent(true);
        assert!(config.silent);
        assert!(matches!(config.strategies.get("created"), Strategy::Override));
        assert!(matches!(config.strategies.get("mounted"), Strategy::Hooks));
    }
}
