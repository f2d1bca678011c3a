use std::sync::Mutex;

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::{
    scene::{Session, Surface, WeakSession, WeakSurface},
    utils::{IsAlive, Logical, Point},
};

/// A set of surfaces, as raised in one step by [`FocusController::raise`]
pub type SurfaceSet = IndexSet<WeakSurface>;

/// Authoritative source of focus and stacking order
///
/// The window manager does not duplicate any z-order state, it delegates to an
/// implementation of this trait. [`FocusStack`] is a simple one that is good enough
/// for embedders not having a scene graph of their own.
///
/// Implementations are called while the window manager's lock is held and must
/// not call back into the [`WindowManager`](super::WindowManager).
pub trait FocusController: Send + Sync {
    /// Session currently holding the focus
    fn focused_session(&self) -> Option<Session>;

    /// Surface currently holding the focus
    fn focused_surface(&self) -> Option<Surface>;

    /// Move the focus to the next session, cycling around
    fn focus_next_session(&self);

    /// Focus the given session and surface
    ///
    /// `None` clears the respective focus.
    fn set_focus_to(&self, session: Option<&Session>, surface: Option<&Surface>);

    /// Topmost surface accepting input at the given location
    fn surface_at(&self, cursor: Point<i32, Logical>) -> Option<Surface>;

    /// Raise all given surfaces above every other surface, in one atomic step
    fn raise(&self, surfaces: &SurfaceSet);
}

#[derive(Debug, Default)]
struct FocusState {
    // sessions in connection order
    sessions: IndexSet<WeakSession>,
    // in z-order, back to front
    stack: IndexMap<WeakSurface, WeakSession>,
    focused_session: Option<WeakSession>,
    focused_surface: Option<WeakSurface>,
}

impl FocusState {
    fn cleanup(&mut self) {
        self.sessions.retain(|session| session.alive());
        self.stack.retain(|surface, _| surface.alive());
    }

    fn topmost_of(&self, session: &WeakSession) -> Option<WeakSurface> {
        self.stack
            .iter()
            .rev()
            .find(|(_, owner)| *owner == session)
            .map(|(surface, _)| surface.clone())
    }
}

/// A basic [`FocusController`] keeping a single stacking order
///
/// Sessions and surfaces have to be registered by the embedder through
/// [`FocusStack::add_session`] and [`FocusStack::map_surface`], typically from the
/// connection layer when clients connect and from the `build` callback of
/// [`WindowManager::add_surface`](super::WindowManager::add_surface).
/// Destroyed sessions and surfaces are dropped lazily.
#[derive(Debug, Default)]
pub struct FocusStack {
    state: Mutex<FocusState>,
}

impl FocusStack {
    /// Create an empty focus stack
    pub fn new() -> FocusStack {
        FocusStack::default()
    }

    /// Register a session, it takes part in [`FocusController::focus_next_session`] from now on
    pub fn add_session(&self, session: &Session) {
        self.state.lock().unwrap().sessions.insert(session.downgrade());
    }

    /// Unregister a session and all of its surfaces
    pub fn remove_session(&self, session: &WeakSession) {
        let mut state = self.state.lock().unwrap();
        state.sessions.shift_remove(session);
        state.stack.retain(|_, owner| owner != session);
        if state.focused_session.as_ref() == Some(session) {
            state.focused_session = None;
            state.focused_surface = None;
        }
    }

    /// Put a surface on top of the stack
    pub fn map_surface(&self, session: &Session, surface: &Surface) {
        let mut state = self.state.lock().unwrap();
        state.sessions.insert(session.downgrade());
        let surface = surface.downgrade();
        state.stack.shift_remove(&surface);
        state.stack.insert(surface, session.downgrade());
    }

    /// Remove a surface from the stack
    pub fn unmap_surface(&self, surface: &WeakSurface) {
        let mut state = self.state.lock().unwrap();
        state.stack.shift_remove(surface);
        if state.focused_surface.as_ref() == Some(surface) {
            state.focused_surface = None;
        }
    }

    /// All live surfaces, back to front
    pub fn stacking_order(&self) -> Vec<Surface> {
        let mut state = self.state.lock().unwrap();
        state.cleanup();
        state.stack.keys().filter_map(WeakSurface::upgrade).collect()
    }
}

impl FocusController for FocusStack {
    fn focused_session(&self) -> Option<Session> {
        let state = self.state.lock().unwrap();
        state.focused_session.as_ref().and_then(WeakSession::upgrade)
    }

    fn focused_surface(&self) -> Option<Surface> {
        let state = self.state.lock().unwrap();
        state.focused_surface.as_ref().and_then(WeakSurface::upgrade)
    }

    fn focus_next_session(&self) {
        let mut state = self.state.lock().unwrap();
        state.cleanup();
        if state.sessions.is_empty() {
            return;
        }

        let next = match state
            .focused_session
            .as_ref()
            .and_then(|focused| state.sessions.get_index_of(focused))
        {
            Some(idx) => (idx + 1) % state.sessions.len(),
            None => 0,
        };
        let session = state.sessions[next].clone();
        let surface = state.topmost_of(&session);
        debug!(?session, ?surface, "Focusing next session");
        state.focused_session = Some(session);
        state.focused_surface = surface;
    }

    fn set_focus_to(&self, session: Option<&Session>, surface: Option<&Surface>) {
        let mut state = self.state.lock().unwrap();
        state.focused_session = session.map(Session::downgrade);
        state.focused_surface = surface.map(Surface::downgrade);
    }

    fn surface_at(&self, cursor: Point<i32, Logical>) -> Option<Surface> {
        let state = self.state.lock().unwrap();
        state
            .stack
            .keys()
            .rev()
            .filter_map(WeakSurface::upgrade)
            .find(|surface| surface.input_bounds().contains(cursor))
    }

    fn raise(&self, surfaces: &SurfaceSet) {
        let mut state = self.state.lock().unwrap();
        let stack = std::mem::take(&mut state.stack);
        let (raised, rest): (IndexMap<_, _>, IndexMap<_, _>) =
            stack.into_iter().partition(|(surface, _)| surfaces.contains(surface));
        trace!(raised = raised.len(), "Raising surfaces");
        state.stack = rest;
        state.stack.extend(raised);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SurfaceCreationParameters;

    fn surface(session: &Session, name: &str, loc: (i32, i32)) -> Surface {
        let id = session.create_surface(&SurfaceCreationParameters::new(name, (100, 100)).at(loc));
        session.surface(id).unwrap()
    }

    #[test]
    fn raise_keeps_relative_order() {
        let session = Session::new("client");
        let stack = FocusStack::new();
        let a = surface(&session, "a", (0, 0));
        let b = surface(&session, "b", (0, 0));
        let c = surface(&session, "c", (0, 0));
        for s in [&a, &b, &c] {
            stack.map_surface(&session, s);
        }

        let set: SurfaceSet = [c.downgrade(), a.downgrade()].into_iter().collect();
        stack.raise(&set);

        assert_eq!(stack.stacking_order(), vec![b, a, c]);
    }

    #[test]
    fn surface_at_picks_topmost() {
        let session = Session::new("client");
        let stack = FocusStack::new();
        let bottom = surface(&session, "bottom", (0, 0));
        let top = surface(&session, "top", (50, 50));
        stack.map_surface(&session, &bottom);
        stack.map_surface(&session, &top);

        assert_eq!(stack.surface_at((60, 60).into()), Some(top.clone()));
        assert_eq!(stack.surface_at((10, 10).into()), Some(bottom));
        assert_eq!(stack.surface_at((500, 500).into()), None);

        top.destroy();
        assert_ne!(stack.surface_at((60, 60).into()), Some(top));
    }

    #[test]
    fn focus_next_session_cycles() {
        let first = Session::new("first");
        let second = Session::new("second");
        let stack = FocusStack::new();
        stack.add_session(&first);
        stack.add_session(&second);
        let window = surface(&second, "window", (0, 0));
        stack.map_surface(&second, &window);

        stack.focus_next_session();
        assert_eq!(stack.focused_session(), Some(first.clone()));
        assert_eq!(stack.focused_surface(), None);

        stack.focus_next_session();
        assert_eq!(stack.focused_session(), Some(second));
        assert_eq!(stack.focused_surface(), Some(window));

        stack.focus_next_session();
        assert_eq!(stack.focused_session(), Some(first));
    }
}
