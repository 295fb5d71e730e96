//! Drag-to-reorder bookkeeping for the route list.
//!
//! The drag works on a preview ordering of place ids; the route itself is only
//! touched when the drop is committed with the final ordering.

use routeplan_core::PlaceId;

/// Index of the item to insert before, given the pointer and the vertical
/// midpoints of the items that are not being dragged.
///
/// Picks the item whose midpoint lies below the pointer and closest to it.
/// `None` means the dragged item goes to the end.
pub fn insert_before(pointer_y: f32, midpoints: &[f32]) -> Option<usize> {
    let mut closest: Option<(usize, f32)> = None;
    for (idx, midpoint) in midpoints.iter().enumerate() {
        let offset = pointer_y - midpoint;
        if offset < 0.0 && closest.map_or(true, |(_, best)| offset > best) {
            closest = Some((idx, offset));
        }
    }
    closest.map(|(idx, _)| idx)
}

/// How the drag was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSource {
    Keyboard,
    Mouse,
}

/// An entry being moved through the route list.
#[derive(Debug, Clone)]
pub struct DragState {
    dragged: PlaceId,
    order: Vec<PlaceId>,
    source: DragSource,
}

impl DragState {
    /// Begin dragging `dragged` within `order`; `None` if it is not part of it.
    pub fn start(order: Vec<PlaceId>, dragged: PlaceId, source: DragSource) -> Option<Self> {
        if !order.contains(&dragged) {
            return None;
        }
        Some(Self {
            dragged,
            order,
            source,
        })
    }

    pub fn dragged(&self) -> PlaceId {
        self.dragged
    }

    pub fn source(&self) -> DragSource {
        self.source
    }

    /// Preview ordering.
    pub fn order(&self) -> &[PlaceId] {
        &self.order
    }

    /// Current index of the dragged entry in the preview.
    pub fn index(&self) -> usize {
        self.order
            .iter()
            .position(|id| *id == self.dragged)
            .unwrap_or(0)
    }

    /// Shift the dragged entry by `delta` slots, clamped to the list.
    pub fn step(&mut self, delta: isize) {
        let from = self.index();
        let last = self.order.len().saturating_sub(1) as isize;
        let to = (from as isize + delta).clamp(0, last) as usize;
        if to != from {
            let id = self.order.remove(from);
            self.order.insert(to, id);
        }
    }

    /// Reposition for a pointer at `pointer_y`, where preview row `i` spans
    /// `[top + i * row_height, top + (i + 1) * row_height)`.
    pub fn hover(&mut self, pointer_y: f32, top: f32, row_height: f32) {
        let mut others = Vec::with_capacity(self.order.len());
        let mut midpoints = Vec::with_capacity(self.order.len());
        for (row, id) in self.order.iter().enumerate() {
            if *id == self.dragged {
                continue;
            }
            others.push(*id);
            midpoints.push(top + row as f32 * row_height + row_height / 2.0);
        }
        let target = insert_before(pointer_y, &midpoints).unwrap_or(others.len());
        others.insert(target, self.dragged);
        self.order = others;
    }

    /// Final ordering to hand to the route.
    pub fn finish(self) -> Vec<PlaceId> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<PlaceId> {
        (0..n).map(|_| PlaceId::new()).collect()
    }

    #[test]
    fn nearest_midpoint_below_pointer_wins() {
        let mids = [10.0, 30.0, 50.0];
        assert_eq!(insert_before(5.0, &mids), Some(0));
        assert_eq!(insert_before(29.0, &mids), Some(1));
        assert_eq!(insert_before(31.0, &mids), Some(2));
        assert_eq!(insert_before(60.0, &mids), None);
        assert_eq!(insert_before(1.0, &[]), None);
    }

    #[test]
    fn hover_moves_dragged_row() {
        let order = ids(4);
        let mut drag = DragState::start(order.clone(), order[0], DragSource::Mouse).unwrap();

        // Pointer on the top edge of row 2 lands before the entry shown there.
        drag.hover(2.0, 0.0, 1.0);
        assert_eq!(drag.order(), &[order[1], order[0], order[2], order[3]]);

        drag.hover(9.0, 0.0, 1.0);
        assert_eq!(drag.order(), &[order[1], order[2], order[3], order[0]]);
        assert_eq!(drag.index(), 3);

        drag.hover(0.0, 0.0, 1.0);
        assert_eq!(drag.finish(), order);
    }

    #[test]
    fn keyboard_steps_are_clamped() {
        let order = ids(3);
        let mut drag = DragState::start(order.clone(), order[1], DragSource::Keyboard).unwrap();
        drag.step(-5);
        assert_eq!(drag.order(), &[order[1], order[0], order[2]]);
        drag.step(1);
        drag.step(1);
        drag.step(1);
        assert_eq!(drag.order(), &[order[0], order[2], order[1]]);
        assert_eq!(drag.dragged(), order[1]);
    }

    #[test]
    fn unknown_entry_cannot_be_dragged() {
        assert!(DragState::start(ids(2), PlaceId::new(), DragSource::Mouse).is_none());
    }
}
