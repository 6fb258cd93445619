//! Day mark styles.

use std::fmt;

use bitflags::bitflags;

use crate::date_table::DateInfo;

bitflags! {
    /// Visual emphasis of a day in the date navigator.
    ///
    /// The empty set means the day carries no mark.
    #[derive(Default, Clone, Copy, Eq, PartialEq, Hash)]
    pub struct StyleBits: u8 {
        const BOLD   = 0b01;
        const ITALIC = 0b10;
    }
}

impl fmt::Debug for StyleBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NONE");
        }
        bitflags::parser::to_writer(self, f)
    }
}

/// Resolve the style for a day from its contribution counters.
///
/// Transparent components always render italic. Recurring ones render
/// italic when `recur_events_italic` is set and bold otherwise. One-off
/// components render bold.
pub fn style(info: &DateInfo, recur_events_italic: bool) -> StyleBits {
    let mut style = StyleBits::empty();

    if info.n_transparent > 0 || (recur_events_italic && info.n_recurring > 0) {
        style |= StyleBits::ITALIC;
    }

    if info.n_single > 0 || (!recur_events_italic && info.n_recurring > 0) {
        style |= StyleBits::BOLD;
    }

    style
}
