//! Life cycle of the objects owned by the connection layer

use std::sync::atomic::{AtomicBool, Ordering};

/// Destruction flag shared by all handles to a session or surface
///
/// Weak handles check it on upgrade, so an object reads as gone as soon as its
/// owner destroys it, even while some strong handle keeps the allocation around.
#[derive(Debug, Default)]
pub(crate) struct Liveness {
    destroyed: AtomicBool,
}

impl Liveness {
    /// Flag the object as destroyed
    ///
    /// Returns `false` if it already was.
    pub(crate) fn mark_destroyed(&self) -> bool {
        !self.destroyed.swap(true, Ordering::AcqRel)
    }

    #[inline]
    pub(crate) fn is_alive(&self) -> bool {
        !self.destroyed.load(Ordering::Acquire)
    }
}

/// Objects whose lifetime is not owned by the window manager
pub trait IsAlive {
    /// Whether the object has not been destroyed yet
    fn alive(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::Liveness;

    #[test]
    fn destruction_is_reported_once() {
        let liveness = Liveness::default();
        assert!(liveness.is_alive());
        assert!(liveness.mark_destroyed());
        assert!(!liveness.is_alive());
        assert!(!liveness.mark_destroyed());
        assert!(!liveness.is_alive());
    }
}
