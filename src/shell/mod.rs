//! Policy based window management
//!
//! The central piece of this module is the [`WindowManager`]. It keeps track of the
//! connected sessions, of their surfaces and of the active displays, and defers
//! every actual decision to a [`WindowManagementPolicy`] you provide.
//!
//! ```
//! use std::sync::Arc;
//!
//! use compositor_core::{
//!     input::{KeyboardEvent, PointerEvent, TouchEvent},
//!     scene::{Session, Surface, SurfaceCreationParameters, SurfaceSpecification, WeakSurface},
//!     shell::{FocusController, FocusStack, WindowManagementPolicy, WindowManager, WindowManagerTools},
//! };
//!
//! struct FloatingPolicy;
//!
//! impl WindowManagementPolicy for FloatingPolicy {
//!     type SessionInfo = ();
//!
//!     fn handle_new_surface(&mut self, tools: &mut WindowManagerTools<'_, ()>, session: &Session, surface: &Surface) {
//!         tools.set_focus_to(Some(session), Some(surface));
//!     }
//!     fn handle_modify_surface(
//!         &mut self,
//!         _: &mut WindowManagerTools<'_, ()>,
//!         _: &Session,
//!         surface: &Surface,
//!         modifications: &SurfaceSpecification,
//!     ) {
//!         if let Some(size) = modifications.size {
//!             surface.resize(size);
//!         }
//!     }
//!     fn handle_delete_surface(&mut self, _: &mut WindowManagerTools<'_, ()>, _: &Session, _: &WeakSurface) {}
//!     fn handle_keyboard_event(&mut self, _: &mut WindowManagerTools<'_, ()>, _: &KeyboardEvent) -> bool {
//!         false
//!     }
//!     fn handle_touch_event(&mut self, _: &mut WindowManagerTools<'_, ()>, _: &TouchEvent) -> bool {
//!         false
//!     }
//!     fn handle_pointer_event(&mut self, _: &mut WindowManagerTools<'_, ()>, _: &PointerEvent) -> bool {
//!         false
//!     }
//!     fn handle_raise_surface(&mut self, tools: &mut WindowManagerTools<'_, ()>, _: &Session, surface: &Surface) {
//!         tools.raise_tree(surface);
//!     }
//! }
//!
//! let focus = Arc::new(FocusStack::new());
//! let wm = WindowManager::new(focus.clone(), FloatingPolicy);
//!
//! let session = Session::new("terminal");
//! wm.add_session(&session);
//! wm.add_display(((0, 0), (1920, 1080)).into());
//!
//! let params = SurfaceCreationParameters::new("main window", (800, 600));
//! let id = wm
//!     .add_surface(&session, &params, |session, params| {
//!         let id = session.create_surface(params);
//!         focus.map_surface(session, &session.surface(id).unwrap());
//!         id
//!     })
//!     .unwrap();
//!
//! assert_eq!(focus.focused_surface(), session.surface(id));
//! ```

use crate::scene::{InvalidSurfaceState, SurfaceId};

mod focus;
mod manager;
mod policy;
mod surface_info;
mod tools;

pub use self::focus::{FocusController, FocusStack, SurfaceSet};
pub use self::manager::WindowManager;
pub use self::policy::{SurfaceBuilder, WindowManagementPolicy};
pub use self::surface_info::SurfaceInfo;
pub use self::tools::{SessionInfoMap, SurfaceInfoMap, WindowManagerTools};

/// Errors of the window manager
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    /// The session is not tracked by the window manager
    #[error("session is not known to the window manager")]
    UnknownSession,
    /// The surface is not tracked by the window manager
    #[error("surface is not known to the window manager")]
    UnknownSurface,
    /// The callback given to [`WindowManager::add_surface`] returned an id its session does not know
    #[error("no surface with id {0:?} was created")]
    SurfaceNotCreated(SurfaceId),
    /// An attribute was given a value it cannot take
    #[error("invalid attribute value")]
    InvalidAttributeValue(#[from] InvalidSurfaceState),
}
