//! Ordered travel route with dense 1-based positions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::{Place, PlaceId};

/// A place scheduled in the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// The scheduled place.
    #[serde(flatten)]
    pub place: Place,
    /// 1-based rank within the route.
    pub position: usize,
}

/// Result of [`Route::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The place was appended at the given position.
    Added(usize),
    /// The place was already scheduled; the route is unchanged.
    AlreadyPresent,
}

/// Derived totals for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouteStats {
    /// Number of entries.
    pub count: usize,
    /// Sum of visit durations in hours.
    pub total_hours: u32,
}

/// User-curated visiting order.
///
/// Positions always run `1..=len()` in vector order and no place appears twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    entries: Vec<RouteEntry>,
}

impl Route {
    /// Empty route.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a route from stored entries.
    ///
    /// Entries are ordered by their stored position (ties keep input order),
    /// duplicate ids are dropped and positions are renumbered.
    pub fn from_entries(mut entries: Vec<RouteEntry>) -> Self {
        entries.sort_by_key(|entry| entry.position);
        let mut seen = HashSet::new();
        entries.retain(|entry| seen.insert(entry.place.id));
        let mut route = Self { entries };
        route.renumber();
        route
    }

    /// Entries in visiting order.
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Place ids in visiting order.
    pub fn ids(&self) -> Vec<PlaceId> {
        self.entries.iter().map(|entry| entry.place.id).collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the route has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the place is scheduled.
    pub fn is_present(&self, id: PlaceId) -> bool {
        self.entries.iter().any(|entry| entry.place.id == id)
    }

    /// Entry for the given place, if scheduled.
    pub fn get(&self, id: PlaceId) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.place.id == id)
    }

    /// Zero-based index of the given place.
    pub fn index_of(&self, id: PlaceId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.place.id == id)
    }

    /// Append a place unless it is already scheduled.
    pub fn add(&mut self, place: Place) -> AddOutcome {
        if self.is_present(place.id) {
            return AddOutcome::AlreadyPresent;
        }
        let position = self.entries.len() + 1;
        self.entries.push(RouteEntry { place, position });
        AddOutcome::Added(position)
    }

    /// Remove a place; returns `false` when it was not scheduled.
    pub fn remove(&mut self, id: PlaceId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.place.id != id);
        let removed = self.entries.len() != before;
        if removed {
            self.renumber();
        }
        removed
    }

    /// Replace the order with `order`.
    ///
    /// Unknown ids are skipped, scheduled ids missing from `order` are dropped
    /// and repeated ids only count once.
    pub fn reorder(&mut self, order: &[PlaceId]) {
        let mut remaining = std::mem::take(&mut self.entries);
        let mut reordered = Vec::with_capacity(order.len().min(remaining.len()));
        for id in order {
            if let Some(idx) = remaining.iter().position(|entry| entry.place.id == *id) {
                reordered.push(remaining.swap_remove(idx));
            }
        }
        self.entries = reordered;
        self.renumber();
    }

    /// Move the entry at index `from` so it ends up at index `to`.
    ///
    /// `to` is clamped to the last index. Returns `false` if `from` is out of range.
    pub fn move_entry(&mut self, from: usize, to: usize) -> bool {
        if from >= self.entries.len() {
            return false;
        }
        let to = to.min(self.entries.len() - 1);
        let mut order = self.ids();
        let id = order.remove(from);
        order.insert(to, id);
        self.reorder(&order);
        true
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry count and total visit hours.
    pub fn stats(&self) -> RouteStats {
        RouteStats {
            count: self.entries.len(),
            total_hours: self.entries.iter().map(|entry| entry.place.hours).sum(),
        }
    }

    fn renumber(&mut self) {
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            entry.position = idx + 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn place(name: &str, hours: u32) -> Place {
        Place {
            id: PlaceId::new(),
            name: name.to_string(),
            description: String::new(),
            category: Category::Historic,
            rating: 4.5,
            hours,
            address: "Somewhere".to_string(),
        }
    }

    fn positions(route: &Route) -> Vec<usize> {
        route.entries().iter().map(|entry| entry.position).collect()
    }

    fn assert_dense(route: &Route) {
        let expected: Vec<usize> = (1..=route.len()).collect();
        assert_eq!(positions(route), expected);
    }

    #[test]
    fn add_appends_with_next_position() {
        let mut route = Route::new();
        let a = place("A", 2);
        let b = place("B", 3);
        assert_eq!(route.add(a.clone()), AddOutcome::Added(1));
        assert_eq!(route.add(b.clone()), AddOutcome::Added(2));

        assert_eq!(route.ids(), vec![a.id, b.id]);
        assert_eq!(positions(&route), vec![1, 2]);
        assert_eq!(
            route.stats(),
            RouteStats {
                count: 2,
                total_hours: 5
            }
        );
    }

    #[test]
    fn duplicate_add_is_ignored() {
        let mut route = Route::new();
        let a = place("A", 2);
        route.add(a.clone());
        let snapshot = route.clone();
        assert_eq!(route.add(a), AddOutcome::AlreadyPresent);
        assert_eq!(route, snapshot);
    }

    #[test]
    fn remove_renumbers_remaining() {
        let mut route = Route::new();
        let a = place("A", 2);
        let b = place("B", 3);
        route.add(a.clone());
        route.add(b.clone());

        assert!(route.remove(a.id));
        assert_eq!(route.ids(), vec![b.id]);
        assert_eq!(positions(&route), vec![1]);
        assert_eq!(
            route.stats(),
            RouteStats {
                count: 1,
                total_hours: 3
            }
        );
    }

    #[test]
    fn removing_absent_place_is_noop() {
        let mut route = Route::new();
        route.add(place("A", 1));
        let snapshot = route.clone();
        assert!(!route.remove(PlaceId::new()));
        assert_eq!(route, snapshot);
    }

    #[test]
    fn reorder_swaps_entries() {
        let mut route = Route::new();
        let a = place("A", 2);
        let b = place("B", 3);
        route.add(a.clone());
        route.add(b.clone());

        route.reorder(&[b.id, a.id]);
        assert_eq!(route.ids(), vec![b.id, a.id]);
        assert_eq!(positions(&route), vec![1, 2]);
    }

    #[test]
    fn reorder_drops_missing_and_unknown_ids() {
        let mut route = Route::new();
        let a = place("A", 1);
        let b = place("B", 2);
        let c = place("C", 3);
        for p in [&a, &b, &c] {
            route.add(p.clone());
        }

        route.reorder(&[c.id, PlaceId::new(), a.id, c.id]);
        assert_eq!(route.ids(), vec![c.id, a.id]);
        assert_dense(&route);
        assert_eq!(route.stats().total_hours, 4);
    }

    #[test]
    fn move_entry_clamps_target() {
        let mut route = Route::new();
        let ids: Vec<PlaceId> = (0..4)
            .map(|n| {
                let p = place(&format!("P{n}"), 1);
                let id = p.id;
                route.add(p);
                id
            })
            .collect();

        assert!(route.move_entry(0, 10));
        assert_eq!(route.ids(), vec![ids[1], ids[2], ids[3], ids[0]]);
        assert!(route.move_entry(3, 1));
        assert_eq!(route.ids(), vec![ids[1], ids[0], ids[2], ids[3]]);
        assert!(!route.move_entry(4, 0));
        assert_dense(&route);
    }

    #[test]
    fn mixed_operations_keep_positions_dense() {
        let mut route = Route::new();
        let places: Vec<Place> = (0..8).map(|n| place(&format!("P{n}"), n + 1)).collect();
        for (step, p) in places.iter().enumerate() {
            route.add(p.clone());
            if step % 3 == 2 {
                route.remove(places[step - 1].id);
            }
            let mut order = route.ids();
            order.reverse();
            route.reorder(&order);
            assert_dense(&route);
        }
        route.clear();
        assert!(route.is_empty());
        assert_eq!(route.stats(), RouteStats::default());
    }

    #[test]
    fn from_entries_sorts_dedups_and_renumbers() {
        let a = place("A", 1);
        let b = place("B", 2);
        let entries = vec![
            RouteEntry {
                place: b.clone(),
                position: 7,
            },
            RouteEntry {
                place: a.clone(),
                position: 3,
            },
            RouteEntry {
                place: b.clone(),
                position: 9,
            },
        ];
        let route = Route::from_entries(entries);
        assert_eq!(route.ids(), vec![a.id, b.id]);
        assert_dense(&route);
    }

    #[test]
    fn entry_serializes_flat() {
        let entry = RouteEntry {
            place: place("A", 2),
            position: 1,
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["name"], "A");
        assert_eq!(value["hours"], 2);
        assert_eq!(value["position"], 1);
        assert_eq!(value["category"], "historic");
    }
}
