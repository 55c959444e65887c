use rc_core::arena::ArrayArena;
use rc_core::{Value, Word};

fn link(arena: &mut ArrayArena, parent: rc_core::ArrayId, key: Value, child: rc_core::ArrayId) {
    arena
        .get_mut(parent)
        .unwrap()
        .set(Word::from(key), Word::from(Value::Array(child)));
    arena.attach(child);
}

#[test]
fn alloc_counts_live_arrays() {
    let mut arena = ArrayArena::new();
    let a = arena.alloc();
    let b = arena.alloc();
    assert_ne!(a, b);
    assert_eq!(arena.live(), 2);
    assert!(arena.is_live(a));
    assert!(!arena.is_attached(a));
}

#[test]
fn release_frees_descendants_once() {
    let mut arena = ArrayArena::new();
    let root = arena.alloc();
    let child = arena.alloc();
    let grandchild = arena.alloc();
    link(&mut arena, root, Value::Integer(0), child);
    link(&mut arena, child, Value::Integer(0), grandchild);

    assert_eq!(arena.release(root), 3);
    assert_eq!(arena.live(), 0);
    assert!(!arena.is_live(grandchild));
    assert_eq!(arena.release(root), 0);
}

#[test]
fn release_follows_array_keys() {
    let mut arena = ArrayArena::new();
    let root = arena.alloc();
    let key = arena.alloc();
    arena
        .get_mut(root)
        .unwrap()
        .set(Word::from(Value::Array(key)), Word::from(Value::Integer(1)));
    arena.attach(key);

    assert_eq!(arena.release(root), 2);
    assert!(!arena.is_live(key));
}

#[test]
fn deep_copy_is_independent() {
    let mut arena = ArrayArena::new();
    let original = arena.alloc();
    let child = arena.alloc();
    link(&mut arena, original, Value::Integer(0), child);
    arena
        .get_mut(child)
        .unwrap()
        .set(Word::from(Value::Integer(0)), Word::from(Value::Integer(9)));

    let copy = arena.deep_copy(original);
    assert_eq!(arena.live(), 4);
    assert!(!arena.is_attached(copy));

    let copied_child = Value::from(arena.get(copy).unwrap().get(Word::from(Value::Integer(0))))
        .as_array()
        .unwrap();
    assert_ne!(copied_child, child);
    assert!(arena.is_attached(copied_child));

    assert_eq!(arena.release(original), 2);
    assert_eq!(
        Value::from(arena.get(copied_child).unwrap().get(Word::from(Value::Integer(0)))),
        Value::Integer(9)
    );
}

#[test]
fn sweep_releases_only_detached_arrays() {
    let mut arena = ArrayArena::new();
    let root = arena.alloc();
    let kept = arena.alloc();
    link(&mut arena, root, Value::Integer(0), kept);
    let stranded = arena.alloc();
    let stranded_child = arena.alloc();
    link(&mut arena, stranded, Value::Integer(0), stranded_child);

    assert_eq!(arena.sweep_detached(root), 2);
    assert!(arena.is_live(root));
    assert!(arena.is_live(kept));
    assert!(!arena.is_live(stranded));
    assert_eq!(arena.live_ids().collect::<Vec<_>>(), [root, kept]);
}
