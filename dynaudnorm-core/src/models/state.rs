/// Session lifecycle.
///
/// State transitions:
/// ```text
/// uninitialized ──create ok──→ active ──release──→ released
///       │                        ↺ reset               ↑
///       ├──create failed──→ (stays uninitialized)      │
///       └──────────────────release──────────────────────┘
/// ```
///
/// Only one create attempt is made per session. `released` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Active,
    Released,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_released(&self) -> bool {
        matches!(self, Self::Released)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Active => "active",
            Self::Released => "released",
        }
    }
}
