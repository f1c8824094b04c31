//! Panel focus, Tab cycling and directional swap-moves.
//!
//! Adjacency is a fixed table per panel count rather than a geometric search:
//! the templates in [`crate::layout`] are irregular, so each count spells out
//! which slot lies up/down/left/right of every other. Every entry is
//! symmetric: if `a` goes right to `b`, `b` goes left to `a`.

use crate::error::{Result, TodoError};
use crate::layout::{MAX_PANELS, validate_count};
use crate::model::{LayoutRecord, RoleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    fn column(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
            Direction::Left => 2,
            Direction::Right => 3,
        }
    }
}

const X: Option<usize> = None;

/// Rows are slots, columns are [up, down, left, right]
type Table = &'static [[Option<usize>; 4]];

const ONE: Table = &[[X, X, X, X]];

const TWO: Table = &[
    [X, X, X, Some(1)],
    [X, X, Some(0), X],
];

const THREE: Table = &[
    [X, X, X, Some(1)],
    [X, Some(2), Some(0), X],
    [Some(1), X, X, X],
];

const FOUR: Table = &[
    [X, Some(2), X, Some(1)],
    [X, Some(3), Some(0), X],
    [Some(0), X, X, Some(3)],
    [Some(1), X, Some(2), X],
];

const FIVE: Table = &[
    [X, Some(4), X, Some(1)],
    [X, Some(2), Some(0), X],
    [Some(1), Some(3), X, X],
    [Some(2), X, Some(4), X],
    [Some(0), X, X, Some(3)],
];

const SIX: Table = &[
    [X, Some(2), X, Some(1)],
    [X, Some(3), Some(0), X],
    [Some(0), Some(4), X, Some(3)],
    [Some(1), Some(5), Some(2), X],
    [Some(2), X, X, Some(5)],
    [Some(3), X, Some(4), X],
];

const SEVEN: Table = &[
    [X, Some(1), X, Some(3)],
    [Some(0), Some(2), X, Some(4)],
    [Some(1), X, X, Some(5)],
    [X, Some(4), Some(0), X],
    [Some(3), Some(5), Some(1), X],
    [Some(4), Some(6), Some(2), X],
    [Some(5), X, X, X],
];

const EIGHT: Table = &[
    [X, Some(1), X, Some(4)],
    [Some(0), Some(2), X, Some(5)],
    [Some(1), Some(3), X, Some(6)],
    [Some(2), X, X, Some(7)],
    [X, Some(5), Some(0), X],
    [Some(4), Some(6), Some(1), X],
    [Some(5), Some(7), Some(2), X],
    [Some(6), X, Some(3), X],
];

fn table(count: usize) -> Option<Table> {
    match count {
        1 => Some(ONE),
        2 => Some(TWO),
        3 => Some(THREE),
        4 => Some(FOUR),
        5 => Some(FIVE),
        6 => Some(SIX),
        7 => Some(SEVEN),
        8 => Some(EIGHT),
        _ => None,
    }
}

/// The slot reached from `index` in `direction`, or `None` when there is no
/// neighbour that way (or the inputs are out of range).
pub fn neighbor(index: usize, direction: Direction, count: usize) -> Option<usize> {
    table(count)?.get(index)?[direction.column()]
}

/// Tab order: the next slot, wrapping around
pub fn next_focus(index: usize, count: usize) -> usize {
    if count == 0 { 0 } else { (index + 1) % count }
}

/// One geometric position in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelSlot {
    pub index: usize,
    pub role: Option<RoleId>,
    pub focused: bool,
}

/// Slots of the multi-panel view. Exactly one slot is focused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLayout {
    slots: Vec<PanelSlot>,
}

impl PanelLayout {
    /// A layout with one slot per entry of `roles`, focus on slot 0
    pub fn new(roles: Vec<Option<RoleId>>) -> Result<Self> {
        validate_count(roles.len())?;
        let slots = roles
            .into_iter()
            .enumerate()
            .map(|(index, role)| PanelSlot {
                index,
                role,
                focused: index == 0,
            })
            .collect();
        Ok(Self { slots })
    }

    /// Rebuild from the persisted record; roles that no longer exist become
    /// unassigned panels.
    pub fn from_record(record: &LayoutRecord, role_exists: impl Fn(RoleId) -> bool) -> Result<Self> {
        let mut roles = record.panel_roles.clone();
        roles.resize(record.panel_count.min(MAX_PANELS), None);
        for role in roles.iter_mut() {
            if role.is_some_and(|id| !role_exists(id)) {
                *role = None;
            }
        }
        Self::new(roles)
    }

    pub fn to_record(&self) -> LayoutRecord {
        LayoutRecord {
            panel_count: self.slots.len(),
            panel_roles: self.roles(),
        }
    }

    pub fn count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[PanelSlot] {
        &self.slots
    }

    pub fn roles(&self) -> Vec<Option<RoleId>> {
        self.slots.iter().map(|s| s.role).collect()
    }

    pub fn focused_index(&self) -> usize {
        self.slots.iter().position(|s| s.focused).unwrap_or(0)
    }

    pub fn focused_role(&self) -> Option<RoleId> {
        self.slots.get(self.focused_index()).and_then(|s| s.role)
    }

    pub fn set_focus(&mut self, index: usize) -> Result<()> {
        if index >= self.slots.len() {
            return Err(TodoError::not_found(format!("Panel {} not found", index + 1)));
        }
        for slot in self.slots.iter_mut() {
            slot.focused = slot.index == index;
        }
        Ok(())
    }

    /// Tab: advance focus to the next slot and return it
    pub fn focus_next(&mut self) -> usize {
        let next = next_focus(self.focused_index(), self.count());
        for slot in self.slots.iter_mut() {
            slot.focused = slot.index == next;
        }
        next
    }

    /// Swap the focused panel's payload with its neighbour in `direction`.
    /// Focus travels with the moved panel. Returns the new focused index, or
    /// `None` when there is no neighbour (nothing changes).
    pub fn swap_focused(&mut self, direction: Direction) -> Option<usize> {
        let from = self.focused_index();
        let to = neighbor(from, direction, self.count())?;
        let (a, b) = (self.slots[from], self.slots[to]);
        self.slots[from].role = b.role;
        self.slots[from].focused = b.focused;
        self.slots[to].role = a.role;
        self.slots[to].focused = a.focused;
        Some(to)
    }

    /// Bind a role to the focused panel
    pub fn assign_focused(&mut self, role: Option<RoleId>) {
        let index = self.focused_index();
        if let Some(slot) = self.slots.get_mut(index) {
            slot.role = role;
        }
    }

    /// Unassign `role` from every panel
    pub fn clear_role(&mut self, role: RoleId) {
        for slot in self.slots.iter_mut() {
            if slot.role == Some(role) {
                slot.role = None;
            }
        }
    }

    /// Remove the focused panel. Remaining panels keep their order and the
    /// layout shrinks to the next smaller template. `None` when the last
    /// panel was closed.
    pub fn close_focused(&self) -> Option<PanelLayout> {
        let closed = self.focused_index();
        let roles: Vec<Option<RoleId>> = self
            .slots
            .iter()
            .filter(|s| s.index != closed)
            .map(|s| s.role)
            .collect();
        if roles.is_empty() {
            return None;
        }
        let focus = closed.min(roles.len() - 1);
        let mut next = PanelLayout::new(roles).ok()?;
        next.set_focus(focus).ok()?;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{MIN_PANELS, template};

    #[test]
    fn test_every_move_stays_in_range() {
        for count in MIN_PANELS..=MAX_PANELS {
            for index in 0..count {
                for dir in Direction::ALL {
                    if let Some(target) = neighbor(index, dir, count) {
                        assert!(target < count, "count {} {}->{:?}", count, index, dir);
                        assert_ne!(target, index);
                    }
                }
            }
        }
    }

    #[test]
    fn test_moves_are_symmetric() {
        for count in MIN_PANELS..=MAX_PANELS {
            for index in 0..count {
                for dir in Direction::ALL {
                    if let Some(target) = neighbor(index, dir, count) {
                        assert_eq!(
                            neighbor(target, dir.opposite(), count),
                            Some(index),
                            "count {}: {} {:?} -> {} does not come back",
                            count,
                            index,
                            dir,
                            target
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_adjacency_matches_template_geometry() {
        for count in MIN_PANELS..=MAX_PANELS {
            let t = template(count).unwrap();
            for index in 0..count {
                let (col, row, span) = t.placement(index).unwrap();
                for dir in Direction::ALL {
                    let Some(target) = neighbor(index, dir, count) else {
                        continue;
                    };
                    let (tcol, trow, tspan) = t.placement(target).unwrap();
                    let overlaps = row < trow + tspan && trow < row + span;
                    let ok = match dir {
                        Direction::Up => tcol == col && trow + tspan == row,
                        Direction::Down => tcol == col && row + span == trow,
                        Direction::Left => tcol + 1 == col && overlaps,
                        Direction::Right => col + 1 == tcol && overlaps,
                    };
                    assert!(ok, "count {}: {} {:?} -> {} is not adjacent", count, index, dir, target);
                }
            }
        }
    }

    #[test]
    fn test_vertical_neighbours_inside_columns_are_all_mapped() {
        for count in MIN_PANELS..=MAX_PANELS {
            for col in template(count).unwrap().columns {
                for pair in col.cells.windows(2) {
                    assert_eq!(neighbor(pair[0].index, Direction::Down, count), Some(pair[1].index));
                }
            }
        }
    }

    #[test]
    fn test_unmapped_pairs_are_no_move() {
        assert_eq!(neighbor(0, Direction::Left, 4), None);
        assert_eq!(neighbor(0, Direction::Up, 1), None);
        assert_eq!(neighbor(2, Direction::Left, 5), None);
        assert_eq!(neighbor(6, Direction::Left, 7), None);
        assert_eq!(neighbor(9, Direction::Left, 8), None);
        assert_eq!(neighbor(0, Direction::Right, 9), None);
    }

    #[test]
    fn test_five_panel_table() {
        assert_eq!(neighbor(0, Direction::Right, 5), Some(1));
        assert_eq!(neighbor(0, Direction::Down, 5), Some(4));
        assert_eq!(neighbor(4, Direction::Right, 5), Some(3));
        assert_eq!(neighbor(3, Direction::Left, 5), Some(4));
        assert_eq!(neighbor(1, Direction::Down, 5), Some(2));
    }

    #[test]
    fn test_tab_visits_every_slot_once() {
        for count in MIN_PANELS..=MAX_PANELS {
            let mut layout = PanelLayout::new(vec![None; count]).unwrap();
            let mut seen = vec![layout.focused_index()];
            for _ in 1..count {
                seen.push(layout.focus_next());
            }
            let mut sorted = seen.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..count).collect::<Vec<_>>());
            assert_eq!(layout.focus_next(), 0, "wraps after {} steps", count);
        }
    }

    #[test]
    fn test_swap_moves_payload_and_focus() {
        let mut layout = PanelLayout::new(vec![Some(10), Some(20), Some(30), Some(40)]).unwrap();
        assert_eq!(layout.swap_focused(Direction::Right), Some(1));
        assert_eq!(layout.roles(), vec![Some(20), Some(10), Some(30), Some(40)]);
        assert_eq!(layout.focused_index(), 1);
        assert_eq!(layout.focused_role(), Some(10));
        // slot indices never move
        let indices: Vec<usize> = layout.slots().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_swap_without_neighbour_changes_nothing() {
        let mut layout = PanelLayout::new(vec![Some(1), Some(2)]).unwrap();
        let before = layout.clone();
        assert_eq!(layout.swap_focused(Direction::Up), None);
        assert_eq!(layout, before);
    }

    #[test]
    fn test_exactly_one_slot_focused() {
        let mut layout = PanelLayout::new(vec![None; 6]).unwrap();
        layout.focus_next();
        layout.swap_focused(Direction::Down);
        layout.focus_next();
        assert_eq!(layout.slots().iter().filter(|s| s.focused).count(), 1);
    }

    #[test]
    fn test_close_focused_shrinks_and_keeps_order() {
        let mut layout = PanelLayout::new(vec![Some(1), Some(2), Some(3)]).unwrap();
        layout.set_focus(1).unwrap();
        let next = layout.close_focused().unwrap();
        assert_eq!(next.roles(), vec![Some(1), Some(3)]);
        assert_eq!(next.focused_index(), 1);

        let last = PanelLayout::new(vec![Some(1)]).unwrap();
        assert!(last.close_focused().is_none());
    }

    #[test]
    fn test_from_record_drops_missing_roles() {
        let record = LayoutRecord {
            panel_count: 3,
            panel_roles: vec![Some(1), Some(2)],
        };
        let layout = PanelLayout::from_record(&record, |id| id == 1).unwrap();
        assert_eq!(layout.roles(), vec![Some(1), None, None]);
        assert_eq!(layout.to_record().panel_count, 3);
    }

    #[test]
    fn test_new_rejects_bad_counts() {
        assert!(PanelLayout::new(vec![]).is_err());
        assert!(PanelLayout::new(vec![None; 9]).is_err());
    }
}
