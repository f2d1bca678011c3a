use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Mutex, Weak},
};

use indexmap::IndexMap;
use tracing::debug;

use super::{Surface, SurfaceCreationParameters, SurfaceId};
use crate::utils::{
    ids::{Uid, UidPool},
    IsAlive, Liveness,
};

static SESSION_IDS: UidPool = UidPool::new();

#[derive(Debug, Default)]
struct Surfaces {
    next_id: i32,
    map: IndexMap<SurfaceId, Surface>,
}

#[derive(Debug)]
struct SessionInner {
    uid: Uid,
    name: String,
    liveness: Liveness,
    surfaces: Mutex<Surfaces>,
}

/// A connected client
///
/// This is a handle to the inner logic, it can be cloned. The connection layer holds
/// the strong handles; a session is owner of the surfaces it creates.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("uid", &self.inner.uid)
            .field("name", &self.inner.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Session {}

impl Hash for Session {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state)
    }
}

impl IsAlive for Session {
    #[inline]
    fn alive(&self) -> bool {
        self.inner.liveness.is_alive()
    }
}

impl Session {
    /// Create a new session for a client of the given name
    pub fn new(name: impl Into<String>) -> Session {
        let session = Session {
            inner: Arc::new(SessionInner {
                uid: SESSION_IDS.acquire(),
                name: name.into(),
                liveness: Liveness::default(),
                surfaces: Mutex::new(Surfaces::default()),
            }),
        };
        debug!(session = session.inner.uid.get(), name = %session.inner.name, "New session");
        session
    }

    /// Name the client identified itself with
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Process-unique id of this session, for diagnostics
    pub fn uid(&self) -> usize {
        self.inner.uid.get()
    }

    /// Create a new surface owned by this session
    ///
    /// This is what a typical `build` callback given to
    /// [`WindowManager::add_surface`](crate::shell::WindowManager::add_surface) does.
    pub fn create_surface(&self, params: &SurfaceCreationParameters) -> SurfaceId {
        let mut surfaces = self.inner.surfaces.lock().unwrap();
        let id = SurfaceId(surfaces.next_id);
        surfaces.next_id += 1;
        surfaces.map.insert(id, Surface::new(id, params));
        debug!(session = self.inner.uid.get(), ?id, name = %params.name, "Created surface");
        id
    }

    /// Surface of the given id, if this session owns one
    pub fn surface(&self, id: SurfaceId) -> Option<Surface> {
        self.inner.surfaces.lock().unwrap().map.get(&id).cloned()
    }

    /// Destroy the surface of the given id
    ///
    /// The surface is marked dead and released; it is returned so the caller can
    /// still notify whoever tracks it.
    pub fn destroy_surface(&self, id: SurfaceId) -> Option<Surface> {
        let surface = self.inner.surfaces.lock().unwrap().map.shift_remove(&id)?;
        surface.destroy();
        debug!(session = self.inner.uid.get(), ?id, "Destroyed surface");
        Some(surface)
    }

    /// All surfaces currently owned by this session, in creation order
    pub fn surfaces(&self) -> Vec<Surface> {
        self.inner.surfaces.lock().unwrap().map.values().cloned().collect()
    }

    /// Mark this session and all of its surfaces as destroyed
    ///
    /// Destroying a session twice does nothing.
    pub fn destroy(&self) {
        if !self.inner.liveness.mark_destroyed() {
            return;
        }
        let surfaces = std::mem::take(&mut self.inner.surfaces.lock().unwrap().map);
        for surface in surfaces.values() {
            surface.destroy();
        }
        debug!(session = self.inner.uid.get(), surfaces = surfaces.len(), "Destroyed session");
    }

    /// Create a weak handle to this session
    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Weak variant of a [`Session`]
///
/// Does not keep the session alive, and can be used to refer to a
/// potentially already disconnected session.
#[derive(Clone)]
pub struct WeakSession {
    inner: Weak<SessionInner>,
}

impl WeakSession {
    /// Try to retrieve the original `Session`, if it is still alive
    pub fn upgrade(&self) -> Option<Session> {
        self.inner
            .upgrade()
            .map(|inner| Session { inner })
            .filter(|session| session.alive())
    }

    /// Whether this handle refers to the given session
    pub fn is(&self, session: &Session) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&session.inner))
    }
}

impl IsAlive for WeakSession {
    #[inline]
    fn alive(&self) -> bool {
        self.upgrade().is_some()
    }
}

impl fmt::Debug for WeakSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.upgrade() {
            Some(inner) => f
                .debug_struct("WeakSession")
                .field("uid", &inner.uid)
                .field("name", &inner.name)
                .finish(),
            None => f.write_str("WeakSession(<dropped>)"),
        }
    }
}

impl PartialEq for WeakSession {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WeakSession {}

impl Hash for WeakSession {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.as_ptr().hash(state)
    }
}

impl From<&Session> for WeakSession {
    fn from(session: &Session) -> Self {
        session.downgrade()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::IsAlive;

    #[test]
    fn surface_ids_are_per_session() {
        let a = Session::new("a");
        let b = Session::new("b");
        let params = SurfaceCreationParameters::new("window", (100, 100));

        let first = a.create_surface(&params);
        let second = a.create_surface(&params);
        assert_ne!(first, second);
        assert_eq!(b.create_surface(&params), first);
        assert_ne!(a.surface(first), b.surface(first));
    }

    #[test]
    fn destroy_surface_kills_weak_handles() {
        let session = Session::new("client");
        let id = session.create_surface(&SurfaceCreationParameters::new("window", (100, 100)));
        let weak = session.surface(id).unwrap().downgrade();

        assert!(session.destroy_surface(id).is_some());
        assert!(session.surface(id).is_none());
        assert!(!weak.alive());
        assert!(session.destroy_surface(id).is_none());
    }

    #[test]
    fn destroy_session_kills_everything() {
        let session = Session::new("client");
        let id = session.create_surface(&SurfaceCreationParameters::new("window", (100, 100)));
        let surface = session.surface(id).unwrap().downgrade();
        let weak = session.downgrade();

        session.destroy();
        assert!(weak.upgrade().is_none());
        assert!(!surface.alive());
        assert!(session.surfaces().is_empty());
    }

    #[test]
    fn destroying_twice_is_harmless() {
        let session = Session::new("client");
        session.create_surface(&SurfaceCreationParameters::new("window", (100, 100)));

        session.destroy();
        session.destroy();
        assert!(!session.alive());
        assert!(session.surfaces().is_empty());
    }

    #[test]
    fn live_sessions_have_distinct_uids() {
        let sessions: Vec<_> = (0..8).map(|i| Session::new(format!("client {}", i))).collect();
        let uids: std::collections::HashSet<_> = sessions.iter().map(Session::uid).collect();
        assert_eq!(uids.len(), sessions.len());
    }
}
