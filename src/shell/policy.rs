use super::WindowManagerTools;
use crate::{
    input::{KeyboardEvent, PointerEvent, TouchEvent},
    scene::{Session, Surface, SurfaceCreationParameters, SurfaceId, SurfaceSpecification, SurfaceState, WeakSurface},
};

/// Callback materializing a surface, as given to [`WindowManager::add_surface`](super::WindowManager::add_surface)
pub type SurfaceBuilder<'a> = dyn FnMut(&Session, &SurfaceCreationParameters) -> SurfaceId + 'a;

/// Decision making part of a [`WindowManager`](super::WindowManager)
///
/// The window manager keeps track of sessions, surfaces and displays, and asks its
/// policy whenever something has to be decided: where to place new surfaces, what
/// to do with input, which state a surface may enter.
///
/// All methods are called with the window manager's lock held, one at a time. The
/// [`WindowManagerTools`] given to them is the only way back into the window manager.
pub trait WindowManagementPolicy: Send {
    /// Metadata the policy keeps per session
    type SessionInfo: Default + Send;

    /// A session was added or removed
    fn handle_session_info_updated(&mut self, _tools: &mut WindowManagerTools<'_, Self::SessionInfo>) {}

    /// A display was added or removed
    fn handle_displays_updated(&mut self, _tools: &mut WindowManagerTools<'_, Self::SessionInfo>) {}

    /// Decide where and how a new surface is placed
    ///
    /// The returned parameters are what the surface gets built with.
    fn handle_place_new_surface(
        &mut self,
        _tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        _session: &Session,
        params: &SurfaceCreationParameters,
    ) -> SurfaceCreationParameters {
        params.clone()
    }

    /// A new surface was built and is now tracked
    fn handle_new_surface(
        &mut self,
        tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        session: &Session,
        surface: &Surface,
    );

    /// Build server side decorations for a new surface
    ///
    /// `build` is the same callback the surface itself was built with. Decoration
    /// surfaces the policy wants tracked have to be recorded through
    /// [`WindowManagerTools::record_surface`].
    fn generate_decorations_for(
        &mut self,
        _tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        _session: &Session,
        _surface: &Surface,
        _build: &mut SurfaceBuilder<'_>,
    ) {
    }

    /// A client asks for a surface to be modified
    fn handle_modify_surface(
        &mut self,
        tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        session: &Session,
        surface: &Surface,
        modifications: &SurfaceSpecification,
    );

    /// A surface is about to be removed
    ///
    /// Its metadata is still available during this call, and dropped right after.
    fn handle_delete_surface(
        &mut self,
        tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        session: &Session,
        surface: &WeakSurface,
    );

    /// A client asks for a surface to enter a state, returns the state it actually enters
    fn handle_set_state(
        &mut self,
        _tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        _surface: &Surface,
        state: SurfaceState,
    ) -> SurfaceState {
        state
    }

    /// Keyboard input, returns whether the event was consumed
    fn handle_keyboard_event(
        &mut self,
        tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        event: &KeyboardEvent,
    ) -> bool;

    /// Touch input, returns whether the event was consumed
    fn handle_touch_event(
        &mut self,
        tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        event: &TouchEvent,
    ) -> bool;

    /// Pointer input, returns whether the event was consumed
    fn handle_pointer_event(
        &mut self,
        tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        event: &PointerEvent,
    ) -> bool;

    /// A client asks for one of its surfaces to be raised
    ///
    /// Only called if the request is not older than the latest discrete input event.
    fn handle_raise_surface(
        &mut self,
        tools: &mut WindowManagerTools<'_, Self::SessionInfo>,
        session: &Session,
        surface: &Surface,
    );
}
