//! Decoded input events
//!
//! Input reaches the window manager already decoded from whatever device backend
//! produced it. Every event carries the time it happened at, in nanoseconds of a
//! monotonic clock; the window manager uses these timestamps to reject client
//! requests that are older than the latest *discrete* user interaction, see
//! [`Event::is_discrete`].

use bitflags::bitflags;

use crate::utils::{Logical, Point};

/// Common accessors of all input events
pub trait Event {
    /// Monotonic timestamp of the event, in nanoseconds
    fn time(&self) -> u64;

    /// Whether this event is a discrete user interaction
    ///
    /// Discrete interactions (key presses, button clicks, touches landing or
    /// lifting) move the window manager's notion of "latest input" forward, while
    /// continuous ones like pointer motion don't.
    fn is_discrete(&self) -> bool;
}

/// State of key on a keyboard
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum KeyState {
    /// Key is released
    Released,
    /// Key is pressed
    Pressed,
    /// Key is held and auto-repeating
    Repeated,
}

bitflags! {
    /// Keyboard modifiers active while an event happened
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        /// Shift key
        const SHIFT = 1;
        /// Control key
        const CTRL = 1 << 1;
        /// Alt key
        const ALT = 1 << 2;
        /// Logo ("Super") key
        const LOGO = 1 << 3;
        /// Caps lock is active
        const CAPS_LOCK = 1 << 4;
        /// Num lock is active
        const NUM_LOCK = 1 << 5;
    }
}

/// A key changed state
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardEvent {
    /// Timestamp in nanoseconds
    pub time: u64,
    /// Hardware keycode
    pub keycode: u32,
    /// New state of the key
    pub state: KeyState,
    /// Modifiers active
    pub modifiers: Modifiers,
}

impl Event for KeyboardEvent {
    fn time(&self) -> u64 {
        self.time
    }

    fn is_discrete(&self) -> bool {
        true
    }
}

/// Kind of a pointer event
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PointerAction {
    /// A button was released
    ButtonUp,
    /// A button was pressed
    ButtonDown,
    /// The pointer entered the display area
    Enter,
    /// The pointer left the display area
    Leave,
    /// The pointer moved, or an axis changed
    Motion,
}

bitflags! {
    /// Pointer buttons held down while an event happened
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct PointerButtons: u32 {
        /// Primary ("left") button
        const PRIMARY = 1;
        /// Secondary ("right") button
        const SECONDARY = 1 << 1;
        /// Tertiary ("middle") button
        const TERTIARY = 1 << 2;
        /// Back navigation button
        const BACK = 1 << 3;
        /// Forward navigation button
        const FORWARD = 1 << 4;
    }
}

/// A pointer moved or one of its buttons changed state
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    /// Timestamp in nanoseconds
    pub time: u64,
    /// What happened
    pub action: PointerAction,
    /// Location of the cursor, in global coordinates
    pub location: Point<f64, Logical>,
    /// Buttons held after this event
    pub buttons: PointerButtons,
    /// Modifiers active
    pub modifiers: Modifiers,
}

impl Event for PointerEvent {
    fn time(&self) -> u64 {
        self.time
    }

    fn is_discrete(&self) -> bool {
        matches!(self.action, PointerAction::ButtonUp | PointerAction::ButtonDown)
    }
}

/// Kind of change of a single touch point
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TouchAction {
    /// The touch point was lifted
    Up,
    /// The touch point landed
    Down,
    /// The touch point moved or changed pressure
    Change,
}

/// A single touch point of a [`TouchEvent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Id of the touch sequence, stable from down to up
    pub id: i32,
    /// What happened to this point
    pub action: TouchAction,
    /// Location in global coordinates
    pub location: Point<f64, Logical>,
}

/// A frame of touch points
#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    /// Timestamp in nanoseconds
    pub time: u64,
    /// All current touch points
    pub points: Vec<TouchPoint>,
    /// Modifiers active
    pub modifiers: Modifiers,
}

impl Event for TouchEvent {
    fn time(&self) -> u64 {
        self.time
    }

    fn is_discrete(&self) -> bool {
        self.points
            .iter()
            .any(|point| matches!(point.action, TouchAction::Up | TouchAction::Down))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pointer(action: PointerAction) -> PointerEvent {
        PointerEvent {
            time: 10,
            action,
            location: (1.0, 2.0).into(),
            buttons: PointerButtons::empty(),
            modifiers: Modifiers::empty(),
        }
    }

    fn touch(actions: &[TouchAction]) -> TouchEvent {
        TouchEvent {
            time: 10,
            points: actions
                .iter()
                .enumerate()
                .map(|(id, &action)| TouchPoint {
                    id: id as i32,
                    action,
                    location: (0.0, 0.0).into(),
                })
                .collect(),
            modifiers: Modifiers::empty(),
        }
    }

    #[test]
    fn only_buttons_are_discrete_pointer_events() {
        assert!(pointer(PointerAction::ButtonDown).is_discrete());
        assert!(pointer(PointerAction::ButtonUp).is_discrete());
        assert!(!pointer(PointerAction::Motion).is_discrete());
        assert!(!pointer(PointerAction::Enter).is_discrete());
        assert!(!pointer(PointerAction::Leave).is_discrete());
    }

    #[test]
    fn touch_is_discrete_if_any_point_lands_or_lifts() {
        assert!(!touch(&[]).is_discrete());
        assert!(!touch(&[TouchAction::Change, TouchAction::Change]).is_discrete());
        assert!(touch(&[TouchAction::Change, TouchAction::Up]).is_discrete());
        assert!(touch(&[TouchAction::Down]).is_discrete());
    }
}
