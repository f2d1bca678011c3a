use std::{
    fmt,
    hash::{Hash, Hasher},
    sync::{Arc, Mutex, Weak},
};

use tracing::trace;

use super::{SurfaceAttrib, SurfaceCreationParameters, SurfaceId, SurfaceState, SurfaceType};
use crate::utils::{
    ids::{Uid, UidPool},
    IsAlive, Liveness, Logical, Point, Rectangle, Size,
};

static SURFACE_IDS: UidPool = UidPool::new();

#[derive(Debug)]
struct SurfaceData {
    name: String,
    top_left: Point<i32, Logical>,
    size: Size<i32, Logical>,
    attributes: [i32; SurfaceAttrib::COUNT],
}

#[derive(Debug)]
struct SurfaceInner {
    uid: Uid,
    id: SurfaceId,
    liveness: Liveness,
    data: Mutex<SurfaceData>,
}

/// A client window
///
/// This is a handle to the inner logic, it can be cloned. Strong handles are
/// meant to be held by the owning [`Session`](super::Session) only.
#[derive(Clone)]
pub struct Surface {
    inner: Arc<SurfaceInner>,
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("uid", &self.inner.uid)
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Surface {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Surface {}

impl Hash for Surface {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Arc::as_ptr(&self.inner).hash(state)
    }
}

impl IsAlive for Surface {
    #[inline]
    fn alive(&self) -> bool {
        self.inner.liveness.is_alive()
    }
}

impl Surface {
    pub(crate) fn new(id: SurfaceId, params: &SurfaceCreationParameters) -> Surface {
        let mut attributes = [0; SurfaceAttrib::COUNT];
        attributes[SurfaceAttrib::Type.index()] = params.surface_type as i32;
        attributes[SurfaceAttrib::State.index()] = params.state.into();
        attributes[SurfaceAttrib::SwapInterval.index()] = 1;
        attributes[SurfaceAttrib::Visibility.index()] = 1;

        Surface {
            inner: Arc::new(SurfaceInner {
                uid: SURFACE_IDS.acquire(),
                id,
                liveness: Liveness::default(),
                data: Mutex::new(SurfaceData {
                    name: params.name.clone(),
                    top_left: params.top_left,
                    size: params.size,
                    attributes,
                }),
            }),
        }
    }

    /// Id of this surface within its session
    pub fn id(&self) -> SurfaceId {
        self.inner.id
    }

    /// Process-unique id of this surface, for diagnostics
    pub fn uid(&self) -> usize {
        self.inner.uid.get()
    }

    /// Title of this surface
    pub fn name(&self) -> String {
        self.inner.data.lock().unwrap().name.clone()
    }

    /// Change the title of this surface
    pub fn rename(&self, name: impl Into<String>) {
        self.inner.data.lock().unwrap().name = name.into();
    }

    /// Location of the top-left corner in global coordinates
    pub fn top_left(&self) -> Point<i32, Logical> {
        self.inner.data.lock().unwrap().top_left
    }

    /// Current size
    pub fn size(&self) -> Size<i32, Logical> {
        self.inner.data.lock().unwrap().size
    }

    /// Move the top-left corner to the given location
    pub fn move_to(&self, top_left: impl Into<Point<i32, Logical>>) {
        self.inner.data.lock().unwrap().top_left = top_left.into();
    }

    /// Change the size
    pub fn resize(&self, size: impl Into<Size<i32, Logical>>) {
        self.inner.data.lock().unwrap().size = size.into();
    }

    /// Area of the screen in which this surface accepts input, in global coordinates
    pub fn input_bounds(&self) -> Rectangle<i32, Logical> {
        let data = self.inner.data.lock().unwrap();
        Rectangle::new(data.top_left, data.size)
    }

    /// Set an attribute, returning the value now in effect
    pub fn configure(&self, attrib: SurfaceAttrib, value: i32) -> i32 {
        trace!(surface = self.inner.uid.get(), ?attrib, value, "Configuring surface");
        let mut data = self.inner.data.lock().unwrap();
        data.attributes[attrib.index()] = value;
        value
    }

    /// Current value of an attribute
    pub fn query(&self, attrib: SurfaceAttrib) -> i32 {
        self.inner.data.lock().unwrap().attributes[attrib.index()]
    }

    /// Current window management state
    pub fn state(&self) -> SurfaceState {
        SurfaceState::try_from(self.query(SurfaceAttrib::State)).unwrap_or_default()
    }

    /// Current role
    pub fn surface_type(&self) -> SurfaceType {
        match self.query(SurfaceAttrib::Type) {
            1 => SurfaceType::Utility,
            2 => SurfaceType::Dialog,
            3 => SurfaceType::Gloss,
            4 => SurfaceType::Freestyle,
            5 => SurfaceType::Menu,
            6 => SurfaceType::InputMethod,
            7 => SurfaceType::Satellite,
            8 => SurfaceType::Tip,
            9 => SurfaceType::Decoration,
            _ => SurfaceType::Normal,
        }
    }

    /// Mark this surface as destroyed
    ///
    /// Weak handles stop upgrading from now on, even if strong handles are still around.
    pub fn destroy(&self) {
        if self.inner.liveness.mark_destroyed() {
            trace!(surface = self.inner.uid.get(), "Surface destroyed");
        }
    }

    /// Create a weak handle to this surface
    pub fn downgrade(&self) -> WeakSurface {
        WeakSurface {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Weak variant of a [`Surface`]
///
/// Does not keep the surface alive, and can be used to refer to a
/// potentially already destroyed surface.
#[derive(Clone)]
pub struct WeakSurface {
    inner: Weak<SurfaceInner>,
}

impl WeakSurface {
    /// Try to retrieve the original `Surface`, if it is still alive
    pub fn upgrade(&self) -> Option<Surface> {
        self.inner
            .upgrade()
            .map(|inner| Surface { inner })
            .filter(|surface| surface.alive())
    }

    /// Whether this handle refers to the given surface
    pub fn is(&self, surface: &Surface) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Arc::as_ptr(&surface.inner))
    }
}

impl IsAlive for WeakSurface {
    #[inline]
    fn alive(&self) -> bool {
        self.upgrade().is_some()
    }
}

impl fmt::Debug for WeakSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.upgrade() {
            Some(inner) => f
                .debug_struct("WeakSurface")
                .field("uid", &inner.uid)
                .field("alive", &inner.liveness.is_alive())
                .finish(),
            None => f.write_str("WeakSurface(<dropped>)"),
        }
    }
}

impl PartialEq for WeakSurface {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for WeakSurface {}

impl Hash for WeakSurface {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.as_ptr().hash(state)
    }
}

impl From<&Surface> for WeakSurface {
    fn from(surface: &Surface) -> Self {
        surface.downgrade()
    }
}
