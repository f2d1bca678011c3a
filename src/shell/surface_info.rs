use crate::{
    scene::{
        Session, Surface, SurfaceCreationParameters, SurfaceState, SurfaceType, WeakSession, WeakSurface,
    },
    utils::{Logical, Rectangle, Size},
};

/// Window management metadata the [`WindowManager`](super::WindowManager) keeps per surface
///
/// An entry exists exactly as long as the surface is known to the window manager.
#[derive(Debug, Clone)]
pub struct SurfaceInfo {
    /// Session owning the surface
    pub session: WeakSession,
    /// The surface itself
    pub surface: WeakSurface,
    /// Role of the surface
    pub surface_type: SurfaceType,
    /// Window management state, as last approved by the policy
    pub state: SurfaceState,
    /// Where to put the surface back when leaving a maximized or fullscreen state
    pub restore_rect: Rectangle<i32, Logical>,
    /// Surface this one is attached to
    pub parent: Option<WeakSurface>,
    /// Surfaces stacked with this one, see [`WindowManagerTools::raise_tree`](super::WindowManagerTools::raise_tree)
    ///
    /// This is whatever the client and policy made of it, it may well contain cycles.
    pub children: Vec<WeakSurface>,
    /// Smallest size the client can handle
    pub min_size: Size<i32, Logical>,
    /// Largest size the client can handle
    pub max_size: Size<i32, Logical>,
    /// Server side decoration drawn for this surface, if any
    pub titlebar: Option<WeakSurface>,
}

impl SurfaceInfo {
    /// Metadata of a freshly created surface
    pub fn new(session: &Session, surface: &Surface, params: &SurfaceCreationParameters) -> SurfaceInfo {
        SurfaceInfo {
            session: session.downgrade(),
            surface: surface.downgrade(),
            surface_type: params.surface_type,
            state: params.state,
            restore_rect: Rectangle::new(params.top_left, params.size),
            parent: params.parent.clone(),
            children: Vec::new(),
            min_size: params.min_size.unwrap_or_default(),
            max_size: params.max_size.unwrap_or_else(|| (i32::MAX, i32::MAX).into()),
            titlebar: None,
        }
    }

    /// Whether the surface may receive the focus
    pub fn can_be_active(&self) -> bool {
        !matches!(
            self.surface_type,
            SurfaceType::Gloss | SurfaceType::Tip | SurfaceType::Decoration
        ) && self.is_visible()
    }

    /// Whether the surface is currently shown
    pub fn is_visible(&self) -> bool {
        !matches!(self.state, SurfaceState::Hidden | SurfaceState::Minimized)
    }

    /// Whether the surface's role requires a parent
    pub fn must_have_parent(&self) -> bool {
        self.surface_type.needs_parent()
    }

    /// Clamp a requested size to the limits the client gave
    pub fn constrain_size(&self, size: Size<i32, Logical>) -> Size<i32, Logical> {
        (
            size.w.clamp(self.min_size.w, self.max_size.w.max(self.min_size.w)),
            size.h.clamp(self.min_size.h, self.max_size.h.max(self.min_size.h)),
        )
            .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrain_size_respects_limits() {
        let session = Session::new("client");
        let params = SurfaceCreationParameters {
            min_size: Some((100, 50).into()),
            max_size: Some((800, 600).into()),
            ..SurfaceCreationParameters::new("window", (300, 200))
        };
        let surface = session.surface(session.create_surface(&params)).unwrap();
        let info = SurfaceInfo::new(&session, &surface, &params);

        assert_eq!(info.constrain_size((10, 10).into()), Size::from((100, 50)));
        assert_eq!(info.constrain_size((1000, 300).into()), Size::from((800, 300)));
        assert_eq!(info.restore_rect, Rectangle::from(((0, 0), (300, 200))));
    }

    #[test]
    fn hidden_surfaces_cannot_be_active() {
        let session = Session::new("client");
        let params = SurfaceCreationParameters::new("window", (300, 200)).with_state(SurfaceState::Hidden);
        let surface = session.surface(session.create_surface(&params)).unwrap();
        let mut info = SurfaceInfo::new(&session, &surface, &params);

        assert!(!info.can_be_active());
        info.state = SurfaceState::Restored;
        assert!(info.can_be_active());
        info.surface_type = SurfaceType::Tip;
        assert!(!info.can_be_active());
        assert!(info.must_have_parent());
    }
}
