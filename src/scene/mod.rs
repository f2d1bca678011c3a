//! Sessions and surfaces, as seen by the window manager
//!
//! Both are owned by the connection layer: a [`Session`] lives as long as its client
//! connection, and owns the [`Surface`]s it created. Everything else, in particular
//! the [`WindowManager`](crate::shell::WindowManager), only keeps [`WeakSession`]s
//! and [`WeakSurface`]s around and must cope with them going away at any time.
//!
//! Weak handles compare and hash by the identity of the object they point to, so
//! they can be used as map keys even after the object was destroyed.

mod session;
mod surface;

pub use self::session::{Session, WeakSession};
pub use self::surface::{Surface, WeakSurface};

use crate::utils::{Logical, Point, Size};

/// Identifier of a surface within its owning session
///
/// This is the id handed out to clients; it is only unique per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub i32);

/// Attributes of a surface that can be set through
/// [`WindowManager::set_surface_attribute`](crate::shell::WindowManager::set_surface_attribute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceAttrib {
    /// The [`SurfaceType`]
    Type,
    /// The [`SurfaceState`], subject to the policy's approval
    State,
    /// Buffer swap interval
    SwapInterval,
    /// Whether the surface currently has focus
    Focus,
    /// Dots per inch the client renders at
    Dpi,
    /// Whether the surface is occluded
    Visibility,
    /// Orientations the client prefers
    PreferredOrientation,
}

impl SurfaceAttrib {
    pub(crate) const COUNT: usize = 7;

    pub(crate) fn index(self) -> usize {
        match self {
            SurfaceAttrib::Type => 0,
            SurfaceAttrib::State => 1,
            SurfaceAttrib::SwapInterval => 2,
            SurfaceAttrib::Focus => 3,
            SurfaceAttrib::Dpi => 4,
            SurfaceAttrib::Visibility => 5,
            SurfaceAttrib::PreferredOrientation => 6,
        }
    }
}

/// Value provided for a [`SurfaceState`] does not name any state
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not a valid surface state")]
pub struct InvalidSurfaceState(pub i32);

/// Window management state of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum SurfaceState {
    /// Not yet decided
    #[default]
    Unknown = 0,
    /// Normal, user sized state
    Restored = 1,
    /// Minimized, not shown
    Minimized = 2,
    /// Covers the whole usable area of its display
    Maximized = 3,
    /// Covers the full height of its display
    VertMaximized = 4,
    /// Covers the whole display, without decorations
    Fullscreen = 5,
    /// Covers the full width of its display
    HorizMaximized = 6,
    /// Not shown, and not shown in task lists either
    Hidden = 7,
}

impl TryFrom<i32> for SurfaceState {
    type Error = InvalidSurfaceState;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => SurfaceState::Unknown,
            1 => SurfaceState::Restored,
            2 => SurfaceState::Minimized,
            3 => SurfaceState::Maximized,
            4 => SurfaceState::VertMaximized,
            5 => SurfaceState::Fullscreen,
            6 => SurfaceState::HorizMaximized,
            7 => SurfaceState::Hidden,
            _ => return Err(InvalidSurfaceState(value)),
        })
    }
}

impl From<SurfaceState> for i32 {
    fn from(state: SurfaceState) -> i32 {
        state as i32
    }
}

/// Role of a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum SurfaceType {
    /// Regular application window
    #[default]
    Normal = 0,
    /// Tool palette or similar, attached to a parent
    Utility = 1,
    /// Modal or non-modal dialog, attached to a parent
    Dialog = 2,
    /// Translucent overlay
    Gloss = 3,
    /// Unmanaged, freely positioned
    Freestyle = 4,
    /// Popup menu, attached to a parent
    Menu = 5,
    /// Input method window
    InputMethod = 6,
    /// Toolbox or panel attached to a parent
    Satellite = 7,
    /// Tooltip, attached to a parent
    Tip = 8,
    /// Server side decoration of another surface
    Decoration = 9,
}

impl SurfaceType {
    /// Whether surfaces of this type are stacked with a parent
    pub fn needs_parent(self) -> bool {
        matches!(
            self,
            SurfaceType::Menu | SurfaceType::Satellite | SurfaceType::Tip | SurfaceType::Decoration
        )
    }
}

/// Parameters a client requests a surface to be created with
///
/// The policy may adjust them in
/// [`handle_place_new_surface`](crate::shell::WindowManagementPolicy::handle_place_new_surface)
/// before the surface is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceCreationParameters {
    /// Title of the surface
    pub name: String,
    /// Requested size
    pub size: Size<i32, Logical>,
    /// Requested location of the top-left corner, in global coordinates
    pub top_left: Point<i32, Logical>,
    /// Role of the surface
    pub surface_type: SurfaceType,
    /// Initial window management state
    pub state: SurfaceState,
    /// Surface this one is attached to, if any
    pub parent: Option<WeakSurface>,
    /// Smallest size the client can handle
    pub min_size: Option<Size<i32, Logical>>,
    /// Largest size the client can handle
    pub max_size: Option<Size<i32, Logical>>,
}

impl SurfaceCreationParameters {
    /// Parameters for a normal surface of the given name and size
    pub fn new(name: impl Into<String>, size: impl Into<Size<i32, Logical>>) -> SurfaceCreationParameters {
        SurfaceCreationParameters {
            name: name.into(),
            size: size.into(),
            ..Default::default()
        }
    }

    /// Set the requested top-left corner
    pub fn at(mut self, top_left: impl Into<Point<i32, Logical>>) -> Self {
        self.top_left = top_left.into();
        self
    }

    /// Set the surface role
    pub fn of_type(mut self, surface_type: SurfaceType) -> Self {
        self.surface_type = surface_type;
        self
    }

    /// Set the initial state
    pub fn with_state(mut self, state: SurfaceState) -> Self {
        self.state = state;
        self
    }

    /// Attach the surface to a parent
    pub fn with_parent(mut self, parent: &Surface) -> Self {
        self.parent = Some(parent.downgrade());
        self
    }
}

/// Modifications a client requests on an existing surface
///
/// Every field left to `None` is to be kept as is. What is actually applied is
/// entirely up to the policy's
/// [`handle_modify_surface`](crate::shell::WindowManagementPolicy::handle_modify_surface).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SurfaceSpecification {
    /// New title
    pub name: Option<String>,
    /// New size
    pub size: Option<Size<i32, Logical>>,
    /// New location of the top-left corner
    pub top_left: Option<Point<i32, Logical>>,
    /// New state
    pub state: Option<SurfaceState>,
    /// New parent
    pub parent: Option<WeakSurface>,
    /// New minimum size
    pub min_size: Option<Size<i32, Logical>>,
    /// New maximum size
    pub max_size: Option<Size<i32, Logical>>,
}

impl SurfaceSpecification {
    /// Whether this specification requests no change at all
    pub fn is_empty(&self) -> bool {
        *self == SurfaceSpecification::default()
    }
}
