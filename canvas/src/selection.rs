//! Click-to-select protocol.
//!
//! Selection is an ordered set of rectangle ids. [`select_on_click`] is a pure
//! function of the previous selection, what was clicked, and whether a
//! modifier key asks to extend the selection.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::doc::{AnnotationStore, RectId};

/// What a click landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// Empty canvas outside the image.
    Stage,
    /// Something that is not a rectangle, such as the background image.
    Image,
    /// A rectangle body.
    Rectangle(RectId),
}

/// Compute the selection after a click.
///
/// | target | extend | already selected | result |
/// |--------|--------|------------------|--------|
/// | stage / image | any | – | empty |
/// | rectangle | no | no | only the clicked id |
/// | rectangle | yes | yes | clicked id removed |
/// | rectangle | yes | no | clicked id appended |
/// | rectangle | no | yes | unchanged |
#[must_use]
pub fn select_on_click(selection: &[RectId], target: ClickTarget, extend: bool) -> Vec<RectId> {
    let ClickTarget::Rectangle(clicked) = target else {
        return Vec::new();
    };
    let already = selection.contains(&clicked);

    match (extend, already) {
        (false, false) => vec![clicked],
        (true, true) => selection.iter().copied().filter(|id| *id != clicked).collect(),
        (true, false) => {
            let mut next = selection.to_vec();
            next.push(clicked);
            next
        }
        (false, true) => selection.to_vec(),
    }
}

/// Drop ids that no longer name a rectangle in `doc`.
#[must_use]
pub fn prune(selection: &[RectId], doc: &AnnotationStore) -> Vec<RectId> {
    selection.iter().copied().filter(|id| doc.contains(id)).collect()
}
