//! Optional component capabilities.
//!
//! Registries broadcast lifecycle calls to heterogeneous components. Each
//! component declares which optional calls it implements and the registry
//! checks before every call, so a missing capability is skipped, never an
//! error.

/// A lifecycle call a component may or may not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Create,
    Show,
    Hide,
    Update,
    Reset,
    Destroy,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::Create,
        Capability::Show,
        Capability::Hide,
        Capability::Update,
        Capability::Reset,
        Capability::Destroy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Create => "create",
            Capability::Show => "show",
            Capability::Hide => "hide",
            Capability::Update => "update",
            Capability::Reset => "reset",
            Capability::Destroy => "destroy",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
