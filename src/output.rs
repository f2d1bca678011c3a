//! Tracking of the active displays
//!
//! A display is an active physical output, modeled here purely by the rectangle it
//! covers in the global [`Logical`] coordinate space. Hotplug handling lives outside
//! of this crate: whoever drives the outputs reports them through
//! [`WindowManager::add_display`](crate::shell::WindowManager::add_display) and
//! [`WindowManager::remove_display`](crate::shell::WindowManager::remove_display),
//! which maintain a [`Displays`] collection.

use crate::utils::{Logical, Point, Rectangle};

/// The set of currently active displays
///
/// Iteration order is insertion order. The same rectangle may be added more than
/// once (mirrored outputs), each addition is then tracked as its own entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Displays {
    rects: Vec<Rectangle<i32, Logical>>,
}

impl Displays {
    /// Create an empty set of displays
    pub fn new() -> Displays {
        Displays::default()
    }

    /// Add a display covering `rect`
    pub fn add(&mut self, rect: Rectangle<i32, Logical>) {
        self.rects.push(rect);
    }

    /// Remove one display covering exactly `rect`
    ///
    /// Returns `false` if no such display was known.
    pub fn remove(&mut self, rect: Rectangle<i32, Logical>) -> bool {
        match self.rects.iter().position(|r| *r == rect) {
            Some(idx) => {
                self.rects.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Iterate over the displays in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Rectangle<i32, Logical>> {
        self.rects.iter()
    }

    /// Whether any display contains the given point
    pub fn contains<P: Into<Point<i32, Logical>>>(&self, point: P) -> bool {
        let point = point.into();
        self.rects.iter().any(|r| r.contains(point))
    }

    /// Smallest rectangle covering all displays, empty if there are none
    pub fn bounding_rectangle(&self) -> Rectangle<i32, Logical> {
        self.rects
            .iter()
            .copied()
            .reduce(|acc, rect| acc.merge(rect))
            .unwrap_or_default()
    }

    /// Number of active displays
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Whether no display is active
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl<'a> IntoIterator for &'a Displays {
    type Item = &'a Rectangle<i32, Logical>;
    type IntoIter = std::slice::Iter<'a, Rectangle<i32, Logical>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rects.iter()
    }
}
