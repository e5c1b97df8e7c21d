//! Priority levels for build ordering.

/// Priority of a build request.
///
/// Higher value = higher priority (processed first in BinaryHeap)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    /// Nobody is looking at the page (prebuild, idle rebuild)
    #[default]
    Idle = 0,
    /// Page is being viewed or requested right now
    Active = 1,
}

impl Priority {
    /// Check if this is the high priority level.
    #[inline]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
        }
    }
}

impl From<bool> for Priority {
    fn from(active: bool) -> Self {
        if active { Self::Active } else { Self::Idle }
    }
}
