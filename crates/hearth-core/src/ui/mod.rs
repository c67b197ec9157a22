//! Screen-level UI building blocks: buttons, themes and the drawing routines
//! for the fixed dashboard layout.

pub mod button;
pub mod theme;
pub mod widgets;

pub use button::{Button, PressEdge};
pub use theme::{Theme, ThemeFamily};

/// Screen regions redrawn during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedrawSet {
    pub layout: bool,
    pub clock: bool,
    pub signal: bool,
    pub menu_icon: bool,
    pub app_region: bool,
}

impl RedrawSet {
    pub fn is_empty(&self) -> bool {
        !(self.layout || self.clock || self.signal || self.menu_icon || self.app_region)
    }

    /// Union of two sets.
    pub fn merge(&mut self, other: RedrawSet) {
        self.layout |= other.layout;
        self.clock |= other.clock;
        self.signal |= other.signal;
        self.menu_icon |= other.menu_icon;
        self.app_region |= other.app_region;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_is_union() {
        let mut a = RedrawSet {
            clock: true,
            ..Default::default()
        };
        assert!(!a.is_empty());
        a.merge(RedrawSet {
            menu_icon: true,
            ..Default::default()
        });
        assert!(a.clock && a.menu_icon && !a.layout);
        assert!(RedrawSet::default().is_empty());
    }
}
