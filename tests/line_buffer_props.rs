//! Property tests for the line buffer

use proptest::prelude::*;
use typed_prompt::core::LineBuffer;

#[derive(Debug, Clone)]
enum Op {
    Insert(char),
    Delete,
    Left,
    Right,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<char>().prop_map(Op::Insert),
        Just(Op::Delete),
        Just(Op::Left),
        Just(Op::Right),
    ]
}

fn apply(buf: &mut LineBuffer, op: &Op) {
    match op {
        Op::Insert(c) => {
            buf.insert(*c);
        }
        Op::Delete => {
            buf.delete_before_cursor();
        }
        Op::Left => {
            buf.move_left();
        }
        Op::Right => {
            buf.move_right();
        }
    }
}

proptest! {
    #[test]
    fn cursor_stays_in_bounds(ops in prop::collection::vec(op(), 0..200)) {
        let mut buf = LineBuffer::new();
        for op in &ops {
            apply(&mut buf, op);
            prop_assert!(buf.cursor() <= buf.len());
            prop_assert!(buf.chars().iter().all(|c| !c.is_control()));
        }
    }

    #[test]
    fn same_ops_same_state(ops in prop::collection::vec(op(), 0..100)) {
        let mut a = LineBuffer::new();
        let mut b = LineBuffer::new();
        for op in &ops {
            apply(&mut a, op);
            apply(&mut b, op);
        }
        prop_assert_eq!(a, b);
    }

    #[test]
    fn moves_never_change_text(text in "[a-z]{0,20}", lefts in 0usize..30, rights in 0usize..30) {
        let mut buf = LineBuffer::from_text(&text);
        for _ in 0..lefts {
            buf.move_left();
        }
        for _ in 0..rights {
            buf.move_right();
        }
        prop_assert_eq!(buf.text(), text.clone());
        let len = text.chars().count();
        prop_assert_eq!(buf.cursor(), (len.saturating_sub(lefts) + rights).min(len));
    }

    #[test]
    fn insert_then_delete_restores(text in "[a-z]{0,20}", lefts in 0usize..25, c in "[A-Z]") {
        let mut buf = LineBuffer::from_text(&text);
        for _ in 0..lefts {
            buf.move_left();
        }
        let before = buf.clone();
        let c = c.chars().next().unwrap();
        prop_assert!(buf.insert(c));
        prop_assert!(buf.delete_before_cursor());
        prop_assert_eq!(buf, before);
    }
}
