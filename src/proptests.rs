use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::cell::Cell;
use std::collections::BTreeSet;

fn validate_tree(t: &BinarySearchTree) {
    let root = t.root();
    if root.is_sentinel() {
        assert!(root.is_leaf(), "sentinel root must not have children");
        assert_eq!(t.len(), 0, "sentinel root means an empty tree");
        return;
    }

    // Every node carries a payload and respects the bounds inherited from its
    // ancestors.
    let mut stack: Vec<(&Node, Option<&[u8]>, Option<&[u8]>)> = vec![(root, None, None)];
    let mut reachable = 0usize;
    while let Some((node, lower, upper)) = stack.pop() {
        let payload = node.payload().expect("non-root node without payload");
        assert!(!payload.is_empty(), "zero-length payload stored");
        if let Some(lower) = lower {
            assert!(lower < payload, "left bound violated");
        }
        if let Some(upper) = upper {
            assert!(payload < upper, "right bound violated");
        }
        reachable += 1;

        if let Some(left) = node.left() {
            stack.push((left, lower, Some(payload)));
        }
        if let Some(right) = node.right() {
            stack.push((right, Some(payload), upper));
        }
    }

    assert_eq!(reachable, t.len(), "reachable node count must match len()");
    t.validate(bytewise).unwrap();
}

fn balanced_height_bound(n: usize) -> usize {
    // ceil(log2(n + 1))
    (usize::BITS - n.leading_zeros()) as usize
}

fn key_strategy() -> impl Strategy<Value = Vec<u8>> {
    // Short keys so inserts and deletes collide often.
    prop::collection::vec(any::<u8>(), 1..=2)
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 50)]
    Insert(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 30)]
    Delete(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 18)]
    Contains(#[proptest(strategy = "key_strategy()")] Vec<u8>),
    #[proptest(weight = 2)]
    Rebalance,
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_btreeset(ops in prop::collection::vec(any::<Op>(), 0..=1000)) {
        let mut t = BinarySearchTree::new();
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();
        let root: *const Node = t.root();
        let released = Cell::new(0usize);
        let count = |_p: Payload| released.set(released.get() + 1);

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let adopted = t.insert(key.clone().into_boxed_slice(), bytewise).unwrap().is_adopted();
                    prop_assert_eq!(adopted, m.insert(key));
                }
                Op::Delete(key) => {
                    let before = released.get();
                    t.delete(&key, bytewise, &count).unwrap();
                    prop_assert_eq!(released.get() - before, usize::from(m.remove(&key)));
                }
                Op::Contains(key) => {
                    let got = t.contains(&key, bytewise).unwrap().map(|n| n.payload().unwrap().to_vec());
                    prop_assert_eq!(got.as_ref(), m.get(&key));
                }
                Op::Rebalance => {
                    t.rebalance().unwrap();
                }
            }

            prop_assert_eq!(t.len(), m.len());
            prop_assert!(std::ptr::eq(t.root(), root));
        }

        validate_tree(&t);
        let got: Vec<Vec<u8>> = t.iter().map(|p| p.to_vec()).collect();
        let expected: Vec<Vec<u8>> = m.iter().cloned().collect();
        prop_assert_eq!(got, expected);

        let live = t.len();
        let before = released.get();
        t.destroy(&count);
        prop_assert_eq!(released.get() - before, live);
    }

    #[test]
    fn prop_rebalance_shape_only(keys in prop::collection::btree_set(any::<u16>(), 0..=300), order_seed in any::<u64>()) {
        use rand::rngs::StdRng;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut keys: Vec<u16> = keys.into_iter().collect();
        keys.shuffle(&mut StdRng::seed_from_u64(order_seed));

        let mut t = BinarySearchTree::new();
        for k in &keys {
            t.insert(k.to_be_bytes().to_vec().into_boxed_slice(), bytewise).unwrap();
        }
        let root: *const Node = t.root();
        let root_payload = t.root().payload().map(|p| p.as_ptr());
        let before: Vec<(Vec<u8>, *const u8)> = t.iter().map(|p| (p.to_vec(), p.as_ptr())).collect();
        let height_before = t.height();

        t.rebalance().unwrap();

        let after: Vec<(Vec<u8>, *const u8)> = t.iter().map(|p| (p.to_vec(), p.as_ptr())).collect();
        prop_assert_eq!(before, after);
        prop_assert!(std::ptr::eq(t.root(), root));
        prop_assert_eq!(t.root().payload().map(|p| p.as_ptr()), root_payload);
        prop_assert!(t.height() <= height_before);
        if let Some(h) = t.height() {
            prop_assert!(h <= balanced_height_bound(keys.len()));
        }
        validate_tree(&t);
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

fn small_keys() -> Vec<Vec<u8>> {
    vec![
        b"d".to_vec(),
        b"b".to_vec(),
        b"f".to_vec(),
        b"a".to_vec(),
        b"c".to_vec(),
        b"e".to_vec(),
    ]
}

#[test]
fn exhaustive_insert_order_small_set() {
    let keys = small_keys();

    for_each_permutation(&keys, |perm| {
        let mut t = BinarySearchTree::new();
        let mut m: BTreeSet<Vec<u8>> = BTreeSet::new();

        for k in perm {
            let adopted = t.insert(k.clone().into_boxed_slice(), bytewise).unwrap().is_adopted();
            assert_eq!(adopted, m.insert(k));
        }

        validate_tree(&t);
        let got: Vec<Vec<u8>> = t.iter().map(|p| p.to_vec()).collect();
        let expected: Vec<Vec<u8>> = m.iter().cloned().collect();
        assert_eq!(got, expected);

        t.rebalance().unwrap();
        validate_tree(&t);
        assert!(t.height().unwrap() <= balanced_height_bound(keys.len()));
    });
}

#[test]
fn exhaustive_delete_order_small_set() {
    let keys = small_keys();

    // Insert in a fixed order, then delete in all permutations.
    for_each_permutation(&keys, |perm| {
        let mut t = BinarySearchTree::new();
        for k in &keys {
            t.insert(k.clone().into_boxed_slice(), bytewise).unwrap();
        }
        let root: *const Node = t.root();
        let released = Cell::new(0usize);
        let count = |_p: Payload| released.set(released.get() + 1);

        for (i, k) in perm.iter().enumerate() {
            t.delete(k, bytewise, &count).unwrap();
            assert_eq!(released.get(), i + 1, "each delete releases exactly one payload");
            assert_eq!(t.len(), keys.len() - i - 1);
            assert!(std::ptr::eq(t.root(), root));
            validate_tree(&t);
        }
        assert!(t.is_empty());
        assert!(t.root().is_sentinel());
    });
}
