//! Explicit alive/torn-down flag for runtime components

use crate::error::GameError;

/// Whether a component may still be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Active,
    Destroyed,
}

impl Lifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }

    /// `Ok(())` while active, `AlreadyDestroyed` for `component` afterwards.
    pub fn ensure_active(&self, component: &'static str) -> Result<(), GameError> {
        match self {
            Lifecycle::Active => Ok(()),
            Lifecycle::Destroyed => Err(GameError::already_destroyed(component)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_active() {
        assert!(Lifecycle::Active.ensure_active("Gameflow").is_ok());
        assert_eq!(
            Lifecycle::Destroyed.ensure_active("Gameflow"),
            Err(GameError::already_destroyed("Gameflow"))
        );
    }
}
