use std::{
    fmt,
    sync::{Arc, Mutex},
};

use tracing::{debug, instrument, trace};

use super::{
    tools::WindowManagerState, FocusController, ShellError, SurfaceInfo, SurfaceSet, WindowManagementPolicy,
    WindowManagerTools,
};
use crate::{
    input::{Event, KeyboardEvent, PointerEvent, TouchEvent},
    scene::{
        Session, Surface, SurfaceAttrib, SurfaceCreationParameters, SurfaceId, SurfaceSpecification,
        SurfaceState, WeakSession, WeakSurface,
    },
    utils::{Logical, Point, Rectangle},
};

struct Inner<P: WindowManagementPolicy> {
    policy: P,
    state: WindowManagerState<P::SessionInfo>,
}

/// A policy based window manager
///
/// This takes care of the metadata held for sessions and surfaces, of the set of
/// active displays and of the cursor location, and defers every decision to its
/// [`WindowManagementPolicy`].
///
/// Every method acquires the window manager's lock for its whole duration,
/// policy callbacks included, so the policy observes all changes strictly
/// serialized. The window manager can be shared between threads, e.g. one
/// delivering input and others handling client requests.
pub struct WindowManager<P: WindowManagementPolicy> {
    focus_controller: Arc<dyn FocusController>,
    inner: Mutex<Inner<P>>,
}

impl<P: WindowManagementPolicy> fmt::Debug for WindowManager<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowManager").finish_non_exhaustive()
    }
}

impl<P: WindowManagementPolicy> WindowManager<P> {
    /// Create a new window manager deferring to `policy`, and to `focus_controller` for focus and stacking
    pub fn new(focus_controller: Arc<dyn FocusController>, policy: P) -> WindowManager<P> {
        WindowManager {
            focus_controller,
            inner: Mutex::new(Inner {
                policy,
                state: WindowManagerState::default(),
            }),
        }
    }

    fn with_policy<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut P, &mut WindowManagerTools<'_, P::SessionInfo>) -> R,
    {
        let mut guard = self.inner.lock().unwrap();
        let Inner { policy, state } = &mut *guard;
        let mut tools = WindowManagerTools::new(state, &*self.focus_controller);
        f(policy, &mut tools)
    }

    /// Run `f` with the [`WindowManagerTools`], under the window manager's lock
    ///
    /// `f` must not call back into the window manager.
    pub fn with_tools<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut WindowManagerTools<'_, P::SessionInfo>) -> R,
    {
        self.with_policy(|_, tools| f(tools))
    }

    /// Start tracking a session
    pub fn add_session(&self, session: &Session) {
        self.with_policy(|policy, tools| {
            debug!(session = session.uid(), "Adding session");
            tools
                .state
                .session_info
                .insert(session.downgrade(), P::SessionInfo::default());
            policy.handle_session_info_updated(tools);
        })
    }

    /// Stop tracking a session
    ///
    /// Removing an untracked session only notifies the policy.
    pub fn remove_session(&self, session: &WeakSession) {
        self.with_policy(|policy, tools| {
            debug!(?session, "Removing session");
            tools.state.session_info.shift_remove(session);
            policy.handle_session_info_updated(tools);
        })
    }

    /// Create a new surface for `session`
    ///
    /// The policy gets to adjust the parameters first, then `build` creates the
    /// surface and returns its id. The surface is tracked from there on, and the
    /// policy notified and asked for decorations. No other mutation can happen in
    /// between these steps.
    ///
    /// Fails if `build` returns an id that `session` does not know, in which case
    /// nothing gets tracked.
    #[instrument(level = "debug", skip_all, fields(session = session.uid()))]
    pub fn add_surface<F>(
        &self,
        session: &Session,
        params: &SurfaceCreationParameters,
        mut build: F,
    ) -> Result<SurfaceId, ShellError>
    where
        F: FnMut(&Session, &SurfaceCreationParameters) -> SurfaceId,
    {
        self.with_policy(|policy, tools| {
            let placed_params = policy.handle_place_new_surface(tools, session, params);
            let id = build(session, &placed_params);
            let surface = session.surface(id).ok_or(ShellError::SurfaceNotCreated(id))?;
            tools.record_surface(session, &surface, &placed_params);
            policy.handle_new_surface(tools, session, &surface);
            policy.generate_decorations_for(tools, session, &surface, &mut build);
            Ok(id)
        })
    }

    /// Ask the policy to apply modifications to a surface
    pub fn modify_surface(&self, session: &Session, surface: &Surface, modifications: &SurfaceSpecification) {
        self.with_policy(|policy, tools| {
            trace!(surface = surface.uid(), ?modifications, "Modifying surface");
            policy.handle_modify_surface(tools, session, surface, modifications)
        })
    }

    /// Notify the policy of a surface going away, then stop tracking it
    pub fn remove_surface(&self, session: &Session, surface: &WeakSurface) {
        self.with_policy(|policy, tools| {
            debug!(session = session.uid(), ?surface, "Removing surface");
            policy.handle_delete_surface(tools, session, surface);
            tools.forget(surface);
        })
    }

    /// Stop tracking a surface without notifying the policy
    ///
    /// For surfaces the owning session already knows to be gone.
    pub fn forget(&self, surface: &WeakSurface) -> Option<SurfaceInfo> {
        self.with_tools(|tools| tools.forget(surface))
    }

    /// A display became active
    pub fn add_display(&self, area: Rectangle<i32, Logical>) {
        self.with_policy(|policy, tools| {
            debug!(?area, "Adding display");
            tools.state.displays.add(area);
            policy.handle_displays_updated(tools);
        })
    }

    /// A display went away
    pub fn remove_display(&self, area: Rectangle<i32, Logical>) {
        self.with_policy(|policy, tools| {
            debug!(?area, "Removing display");
            tools.state.displays.remove(area);
            policy.handle_displays_updated(tools);
        })
    }

    /// Handle keyboard input, returns whether the policy consumed it
    pub fn handle_keyboard_event(&self, event: &KeyboardEvent) -> bool {
        self.with_policy(|policy, tools| {
            update_event_timestamp(tools, event);
            policy.handle_keyboard_event(tools, event)
        })
    }

    /// Handle touch input, returns whether the policy consumed it
    pub fn handle_touch_event(&self, event: &TouchEvent) -> bool {
        self.with_policy(|policy, tools| {
            update_event_timestamp(tools, event);
            policy.handle_touch_event(tools, event)
        })
    }

    /// Handle pointer input, returns whether the policy consumed it
    ///
    /// Also moves the cursor to the event's location.
    pub fn handle_pointer_event(&self, event: &PointerEvent) -> bool {
        self.with_policy(|policy, tools| {
            update_event_timestamp(tools, event);
            tools.state.cursor = event.location.to_i32_floor();
            policy.handle_pointer_event(tools, event)
        })
    }

    /// A client asks for a surface to be raised
    ///
    /// The request is silently dropped if `timestamp` predates the latest discrete
    /// input event, so a stale request cannot undo a focus change the user just made.
    pub fn handle_raise_surface(&self, session: &Session, surface: &Surface, timestamp: u64) {
        self.with_policy(|policy, tools| {
            if timestamp >= tools.state.last_input_event_timestamp {
                policy.handle_raise_surface(tools, session, surface);
            } else {
                trace!(
                    surface = surface.uid(),
                    timestamp,
                    last_input = tools.state.last_input_event_timestamp,
                    "Ignoring outdated raise request"
                );
            }
        })
    }

    /// Set an attribute on a surface, returns the value now in effect
    ///
    /// Changes of [`SurfaceAttrib::State`] go through the policy, which decides on
    /// the state actually entered; all other attributes are applied as is.
    pub fn set_surface_attribute(
        &self,
        _session: &Session,
        surface: &Surface,
        attrib: SurfaceAttrib,
        value: i32,
    ) -> Result<i32, ShellError> {
        self.with_policy(|policy, tools| match attrib {
            SurfaceAttrib::State => {
                let requested = SurfaceState::try_from(value)?;
                let state = policy.handle_set_state(tools, surface, requested);
                if let Ok(info) = tools.surface_info_for_mut(&surface.downgrade()) {
                    info.state = state;
                }
                Ok(surface.configure(attrib, state.into()))
            }
            _ => Ok(surface.configure(attrib, value)),
        })
    }

    /// First live session whose metadata matches the predicate, in the order sessions were added
    pub fn find_session<F>(&self, predicate: F) -> Option<Session>
    where
        F: FnMut(&P::SessionInfo) -> bool,
    {
        self.with_tools(|tools| tools.find_session(predicate))
    }

    /// Run `f` on the metadata of a session
    pub fn with_session_info<R, F>(&self, session: &WeakSession, f: F) -> Result<R, ShellError>
    where
        F: FnOnce(&mut P::SessionInfo) -> R,
    {
        self.with_tools(|tools| tools.session_info_for_mut(session).map(f))
    }

    /// Run `f` on the metadata of a surface
    pub fn with_surface_info<R, F>(&self, surface: &WeakSurface, f: F) -> Result<R, ShellError>
    where
        F: FnOnce(&mut SurfaceInfo) -> R,
    {
        self.with_tools(|tools| tools.surface_info_for_mut(surface).map(f))
    }

    /// The display most relevant to the user right now, see [`WindowManagerTools::active_display`]
    pub fn active_display(&self) -> Rectangle<i32, Logical> {
        self.with_tools(|tools| tools.active_display())
    }

    /// Raise a surface and its children, see [`WindowManagerTools::raise_tree`]
    pub fn raise_tree(&self, root: &Surface) -> SurfaceSet {
        self.with_tools(|tools| tools.raise_tree(root))
    }

    /// Last known cursor location
    pub fn cursor(&self) -> Point<i32, Logical> {
        self.with_tools(|tools| tools.cursor())
    }

    /// Highest timestamp among the discrete input events seen so far
    pub fn last_input_event_timestamp(&self) -> u64 {
        self.with_tools(|tools| tools.last_input_event_timestamp())
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
}

fn update_event_timestamp<S>(tools: &mut WindowManagerTools<'_, S>, event: &impl Event) {
    if event.is_discrete() {
        let last = &mut tools.state.last_input_event_timestamp;
        *last = (*last).max(event.time());
    }
}
