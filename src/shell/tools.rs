use std::fmt;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::{FocusController, ShellError, SurfaceInfo, SurfaceSet};
use crate::{
    output::Displays,
    scene::{Session, Surface, SurfaceCreationParameters, WeakSession, WeakSurface},
    utils::{Logical, Point, Rectangle},
};

/// Per session metadata, in the order the sessions were added
pub type SessionInfoMap<S> = IndexMap<WeakSession, S>;

/// Per surface metadata, in the order the surfaces were added
pub type SurfaceInfoMap = IndexMap<WeakSurface, SurfaceInfo>;

/// Everything guarded by the window manager's lock, besides the policy
#[derive(Debug)]
pub(super) struct WindowManagerState<S> {
    pub(super) session_info: SessionInfoMap<S>,
    pub(super) surface_info: SurfaceInfoMap,
    pub(super) displays: Displays,
    pub(super) cursor: Point<i32, Logical>,
    pub(super) last_input_event_timestamp: u64,
}

impl<S> Default for WindowManagerState<S> {
    fn default() -> Self {
        WindowManagerState {
            session_info: IndexMap::new(),
            surface_info: IndexMap::new(),
            displays: Displays::new(),
            cursor: Point::default(),
            last_input_event_timestamp: 0,
        }
    }
}

/// The interface through which a [`WindowManagementPolicy`](super::WindowManagementPolicy)
/// instructs the window manager
///
/// A `WindowManagerTools` can only exist while the window manager's lock is held, so
/// everything here accesses the window manager's state directly. Policies get one
/// passed to each of their `handle_*` methods and must not try to reach the
/// [`WindowManager`](super::WindowManager) itself from there, which would deadlock.
pub struct WindowManagerTools<'a, S> {
    pub(super) state: &'a mut WindowManagerState<S>,
    focus_controller: &'a dyn FocusController,
}

impl<S> fmt::Debug for WindowManagerTools<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManagerTools")
            .field("sessions", &self.state.session_info.len())
            .field("surfaces", &self.state.surface_info.len())
            .field("displays", &self.state.displays)
            .field("cursor", &self.state.cursor)
            .finish_non_exhaustive()
    }
}

impl<'a, S> WindowManagerTools<'a, S> {
    pub(super) fn new(
        state: &'a mut WindowManagerState<S>,
        focus_controller: &'a dyn FocusController,
    ) -> WindowManagerTools<'a, S> {
        WindowManagerTools {
            state,
            focus_controller,
        }
    }

    /// All tracked sessions and their metadata
    pub fn session_info(&self) -> &SessionInfoMap<S> {
        &self.state.session_info
    }

    /// All tracked surfaces and their metadata
    pub fn surface_info(&self) -> &SurfaceInfoMap {
        &self.state.surface_info
    }

    /// The active displays
    pub fn displays(&self) -> &Displays {
        &self.state.displays
    }

    /// Last known cursor location
    pub fn cursor(&self) -> Point<i32, Logical> {
        self.state.cursor
    }

    /// Highest timestamp among the discrete input events seen so far, see [`Event::is_discrete`](crate::input::Event::is_discrete)
    pub fn last_input_event_timestamp(&self) -> u64 {
        self.state.last_input_event_timestamp
    }

    /// First live session whose metadata matches the predicate, in the order sessions were added
    pub fn find_session<F>(&self, mut predicate: F) -> Option<Session>
    where
        F: FnMut(&S) -> bool,
    {
        self.state
            .session_info
            .iter()
            .find(|(_, info)| predicate(info))
            .and_then(|(session, _)| session.upgrade())
    }

    /// Metadata of a session
    ///
    /// Fails if the session is not tracked, which callers should treat as a bug on their side.
    pub fn session_info_for(&self, session: &WeakSession) -> Result<&S, ShellError> {
        self.state
            .session_info
            .get(session)
            .ok_or(ShellError::UnknownSession)
    }

    /// Mutable metadata of a session
    pub fn session_info_for_mut(&mut self, session: &WeakSession) -> Result<&mut S, ShellError> {
        self.state
            .session_info
            .get_mut(session)
            .ok_or(ShellError::UnknownSession)
    }

    /// Metadata of a surface
    ///
    /// Fails if the surface is not tracked, which callers should treat as a bug on their side.
    pub fn surface_info_for(&self, surface: &WeakSurface) -> Result<&SurfaceInfo, ShellError> {
        self.state
            .surface_info
            .get(surface)
            .ok_or(ShellError::UnknownSurface)
    }

    /// Mutable metadata of a surface
    pub fn surface_info_for_mut(&mut self, surface: &WeakSurface) -> Result<&mut SurfaceInfo, ShellError> {
        self.state
            .surface_info
            .get_mut(surface)
            .ok_or(ShellError::UnknownSurface)
    }

    /// Start tracking a surface
    ///
    /// If the creation parameters name a tracked parent, the surface is appended to
    /// that parent's children. Recording an already tracked surface resets its
    /// metadata, except for its children, and moves it over to its new parent.
    pub fn record_surface(
        &mut self,
        session: &Session,
        surface: &Surface,
        params: &SurfaceCreationParameters,
    ) -> &mut SurfaceInfo {
        let mut info = SurfaceInfo::new(session, surface, params);
        let key = info.surface.clone();

        let previous_parent = match self.state.surface_info.get_mut(&key) {
            Some(existing) => {
                info.children = std::mem::take(&mut existing.children);
                Some(existing.parent.clone())
            }
            None => None,
        };

        if previous_parent.as_ref() != Some(&info.parent) {
            if let Some(old_parent) = previous_parent
                .flatten()
                .and_then(|parent| self.state.surface_info.get_mut(&parent))
            {
                old_parent.children.retain(|child| *child != key);
            }
            if let Some(parent) = info
                .parent
                .as_ref()
                .and_then(|parent| self.state.surface_info.get_mut(parent))
            {
                parent.children.push(key.clone());
            }
        }
        debug!(session = session.uid(), surface = surface.uid(), "Tracking surface");

        match self.state.surface_info.entry(key) {
            indexmap::map::Entry::Occupied(mut occupied) => {
                occupied.insert(info);
                occupied.into_mut()
            }
            indexmap::map::Entry::Vacant(vacant) => vacant.insert(info),
        }
    }

    /// Stop tracking a surface, without notifying the policy
    ///
    /// The surface is also dropped from its parent's children. Returns the metadata
    /// that was tracked, if any.
    pub fn forget(&mut self, surface: &WeakSurface) -> Option<SurfaceInfo> {
        let info = self.state.surface_info.shift_remove(surface)?;
        if let Some(parent) = info
            .parent
            .as_ref()
            .and_then(|parent| self.state.surface_info.get_mut(parent))
        {
            parent.children.retain(|child| child != surface);
        }
        trace!(?surface, "Forgot surface");
        Some(info)
    }

    /// Session currently holding the focus
    pub fn focused_session(&self) -> Option<Session> {
        self.focus_controller.focused_session()
    }

    /// Surface currently holding the focus
    pub fn focused_surface(&self) -> Option<Surface> {
        self.focus_controller.focused_surface()
    }

    /// Move the focus to the next session
    pub fn focus_next_session(&self) {
        self.focus_controller.focus_next_session()
    }

    /// Focus the given session and surface
    pub fn set_focus_to(&self, session: Option<&Session>, surface: Option<&Surface>) {
        self.focus_controller.set_focus_to(session, surface)
    }

    /// Topmost surface accepting input at the given location
    pub fn surface_at(&self, cursor: Point<i32, Logical>) -> Option<Surface> {
        self.focus_controller.surface_at(cursor)
    }

    /// The display most relevant to the user right now
    ///
    /// In order of precedence:
    /// 1. If a surface has the focus, the display showing the largest part of it.
    ///    On a tie the display added first wins.
    /// 2. Otherwise the display containing the cursor.
    /// 3. Otherwise the display added first.
    /// 4. An empty rectangle if there are no displays at all.
    pub fn active_display(&self) -> Rectangle<i32, Logical> {
        let displays = &self.state.displays;

        if let Some(surface) = self.focused_surface() {
            let bounds = surface.input_bounds();
            let mut result = Rectangle::default();
            let mut max_overlap_area = -1i64;

            for display in displays {
                let overlap_area = bounds.intersection_area(*display);
                if overlap_area > max_overlap_area {
                    max_overlap_area = overlap_area;
                    result = *display;
                }
            }
            return result;
        }

        // overlapping displays are not expected, the first match wins
        if let Some(display) = displays.iter().find(|display| display.contains(self.state.cursor)) {
            return *display;
        }

        displays.iter().next().copied().unwrap_or_default()
    }

    /// Raise a surface together with everything transitively reachable through its children
    ///
    /// All surfaces are handed to the [`FocusController`] as one set, so they are
    /// raised in one step. Children that are no longer tracked are skipped, and
    /// each surface is visited only once, so cyclic child relations are fine.
    ///
    /// Returns the set of surfaces that were raised.
    pub fn raise_tree(&self, root: &Surface) -> SurfaceSet {
        let mut surfaces = SurfaceSet::new();
        let mut pending = vec![root.downgrade()];

        while let Some(surface) = pending.pop() {
            if !surfaces.insert(surface.clone()) {
                continue;
            }
            if let Some(info) = self.state.surface_info.get(&surface) {
                pending.extend(
                    info.children
                        .iter()
                        .rev()
                        .filter(|child| {
                            !surfaces.contains(*child) && self.state.surface_info.contains_key(*child)
                        })
                        .cloned(),
                );
            }
        }

        trace!(root = root.uid(), count = surfaces.len(), "Raising surface tree");
        self.focus_controller.raise(&surfaces);
        surfaces
    }
}
