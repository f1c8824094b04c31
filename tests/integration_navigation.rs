//! Integration tests: panel focus and movement across every layout size.

use tempfile::TempDir;

use ttodo::layout::{MAX_PANELS, MIN_PANELS};
use ttodo::test_helpers::{seed_store, session_for, submit_all};
use ttodo::{Direction, Key, PanelLayout, Store, neighbor, next_focus, template};

#[test]
fn test_adjacency_is_symmetric_for_every_count() {
    for count in MIN_PANELS..=MAX_PANELS {
        for index in 0..count {
            for direction in Direction::ALL {
                if let Some(target) = neighbor(index, direction, count) {
                    assert!(target < count, "count {} slot {} {:?}", count, index, direction);
                    assert_eq!(
                        neighbor(target, direction.opposite(), count),
                        Some(index),
                        "count {} slot {} {:?}",
                        count,
                        index,
                        direction
                    );
                }
            }
        }
    }
}

#[test]
fn test_every_panel_is_reachable() {
    for count in MIN_PANELS..=MAX_PANELS {
        let mut seen = vec![false; count];
        let mut stack = vec![0];
        while let Some(index) = stack.pop() {
            if std::mem::replace(&mut seen[index], true) {
                continue;
            }
            for direction in Direction::ALL {
                if let Some(next) = neighbor(index, direction, count) {
                    stack.push(next);
                }
            }
        }
        assert!(seen.iter().all(|s| *s), "count {}", count);
    }
}

#[test]
fn test_tab_visits_each_panel_once_per_cycle() {
    for count in MIN_PANELS..=MAX_PANELS {
        let mut layout = PanelLayout::new(vec![None; count]).unwrap();
        let mut visited: Vec<usize> = (0..count).map(|_| layout.focus_next()).collect();
        visited.sort_unstable();
        assert_eq!(visited, (0..count).collect::<Vec<_>>());
        assert_eq!(layout.focused_index(), 0);
        assert_eq!(next_focus(count - 1, count), 0);
    }
}

#[test]
fn test_templates_fill_the_area() {
    let area = ratatui::layout::Rect::new(0, 0, 120, 40);
    for count in MIN_PANELS..=MAX_PANELS {
        let rects = template(count).unwrap().split(area);
        assert_eq!(rects.len(), count);
        let covered: u32 = rects.iter().map(|r| r.width as u32 * r.height as u32).sum();
        assert_eq!(covered, 120 * 40, "count {}", count);
    }
}

#[test]
fn test_space_arrow_swaps_and_persists() {
    let dir = TempDir::new().unwrap();
    let (store, roles) = seed_store(dir.path(), &["A", "B", "C", "D"]);
    let mut s = session_for(store.clone());
    submit_all(&mut s, &["window 4", "r1", "r2", "r3", "r4"]);

    s.handle_key(Key::Esc);
    assert!(s.navigation().active);
    s.handle_key(Key::Char(' '));
    s.handle_key(Key::Right);

    let layout = s.view().layout().unwrap();
    assert_eq!(
        layout.roles(),
        vec![Some(roles[1]), Some(roles[0]), Some(roles[2]), Some(roles[3])]
    );
    assert_eq!(layout.focused_index(), 1);
    assert_eq!(s.view().active_role(), Some(roles[0]));
    // without release events Space only covers one move
    assert!(!s.navigation().space_held);

    let restored = session_for(Store::open(dir.path()));
    assert_eq!(restored.view().layout().unwrap().roles(), layout.roles());
}

#[test]
fn test_held_space_with_release_events() {
    let dir = TempDir::new().unwrap();
    let (store, roles) = seed_store(dir.path(), &["A", "B", "C", "D"]);
    let mut s = session_for(store);
    s.set_release_events(true);
    submit_all(&mut s, &["window 4", "r1", "r2", "r3", "r4"]);

    s.handle_key(Key::Esc);
    s.handle_key(Key::Char(' '));
    s.handle_key(Key::Right);
    s.handle_key(Key::Down);
    let layout = s.view().layout().unwrap();
    assert_eq!(layout.focused_index(), 3);
    assert_eq!(layout.roles()[3], Some(roles[0]));

    s.handle_key(Key::SpaceReleased);
    s.handle_key(Key::Left);
    let layout = s.view().layout().unwrap();
    assert_eq!(layout.focused_index(), 2);
    assert_eq!(layout.roles()[3], Some(roles[0]));
}

#[test]
fn test_move_off_the_edge_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let (store, _) = seed_store(dir.path(), &["A", "B"]);
    let mut s = session_for(store);
    submit_all(&mut s, &["window 2", "r1", "r2"]);
    let before = s.view().layout().unwrap().clone();

    s.handle_key(Key::Esc);
    s.handle_key(Key::Char(' '));
    s.handle_key(Key::Left);
    assert_eq!(s.view().layout().unwrap(), &before);
}

#[test]
fn test_tab_moves_focus_and_active_role() {
    let dir = TempDir::new().unwrap();
    let (store, roles) = seed_store(dir.path(), &["A", "B", "C"]);
    let mut s = session_for(store);
    submit_all(&mut s, &["window 3", "r1", "r2", "r3"]);

    s.handle_key(Key::Tab);
    assert_eq!(s.view().active_role(), Some(roles[1]));
    s.handle_key(Key::Tab);
    s.handle_key(Key::Tab);
    assert_eq!(s.view().active_role(), Some(roles[0]));
}

#[test]
fn test_navigation_scrolls_focused_panel() {
    let dir = TempDir::new().unwrap();
    let (store, _) = seed_store(dir.path(), &["A", "B"]);
    let mut s = session_for(store);
    submit_all(&mut s, &["window 2", "r1", "r2"]);

    s.handle_key(Key::Tab);
    s.handle_key(Key::Esc);
    s.handle_key(Key::Down);
    s.handle_key(Key::Down);
    s.handle_key(Key::Up);
    assert_eq!(s.scroll_offset(1), 1);
    assert_eq!(s.scroll_offset(0), 0);

    s.handle_key(Key::Char('t'));
    assert!(!s.navigation().active);
    assert_eq!(s.input().text(), "t");
}
