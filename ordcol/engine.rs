//! Free operations over a root node handle: search, positional access,
//! insertion/removal, and the split/merge rebalancing protocol.
//!
//! The tree owns every node through a single [`Arena`]; `Tree` itself only
//! remembers the root and the permanent first leaf. Every operation here
//! takes a comparator explicitly rather than requiring `K: Ord`, since the
//! facades allow a caller-supplied total order.

use std::cmp::Ordering;

use crate::arena::{Arena, NodeId};
use crate::bias::Bias;
use crate::error::{Error, Result};
use crate::node::Node;

pub(crate) struct Tree<K, V> {
    arena: Arena<Node<K, V>>,
    root: NodeId,
    first_leaf: NodeId,
    capacity: usize,
}

impl<K: Clone, V> Tree<K, V> {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity <= 2 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let mut arena = Arena::new();
        let root = arena.insert(Node::new_leaf());
        Ok(Tree {
            arena,
            root,
            first_leaf: root,
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.arena.get(self.root).total_count
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first_leaf(&self) -> NodeId {
        self.first_leaf
    }

    pub fn last_leaf(&self) -> NodeId {
        let mut current = self.root;
        loop {
            let node = self.arena.get(current);
            if node.is_leaf() {
                return current;
            }
            let last_idx = node.node_count() - 1;
            current = node.get_child(last_idx);
        }
    }

    pub(crate) fn leaf_len(&self, leaf: NodeId) -> usize {
        self.arena.get(leaf).node_count()
    }

    pub(crate) fn leaf_key(&self, leaf: NodeId, i: usize) -> &K {
        self.arena.get(leaf).get_key(i)
    }

    pub(crate) fn leaf_value(&self, leaf: NodeId, i: usize) -> &V {
        self.arena.get(leaf).get_value(i)
    }

    pub(crate) fn leaf_value_mut(&mut self, leaf: NodeId, i: usize) -> &mut V {
        self.arena.get_mut(leaf).get_value_mut(i)
    }

    pub(crate) fn leaf_next(&self, leaf: NodeId) -> Option<NodeId> {
        self.arena.get(leaf).next()
    }

    pub(crate) fn leaf_prev(&self, leaf: NodeId) -> Option<NodeId> {
        self.arena.get(leaf).prev()
    }

    /// Resets the tree to empty, retaining the first leaf per the design
    /// note that it is never replaced (stable iteration state across
    /// `Clear`). Everything else reachable from the old root is returned to
    /// the arena's free list.
    pub fn clear(&mut self) {
        let mut stack = vec![self.root];
        let mut to_remove = Vec::new();
        while let Some(id) = stack.pop() {
            if id == self.first_leaf {
                continue;
            }
            if !self.arena.get(id).is_leaf() {
                stack.extend(self.arena.get(id).children().iter().copied());
            }
            to_remove.push(id);
        }
        for id in to_remove {
            self.arena.remove(id);
        }
        let leaf = self.arena.get_mut(self.first_leaf);
        leaf.keys.clear();
        leaf.values_mut().clear();
        leaf.parent = None;
        leaf.total_count = 0;
        leaf.set_next(None);
        leaf.set_prev(None);
        self.root = self.first_leaf;
        log::debug!("cleared tree, retained first leaf {:?}", self.first_leaf);
    }

    fn lower_bound<F: Fn(&K, &K) -> Ordering>(keys: &[K], key: &K, cmp: &F) -> usize {
        let mut lo = 0usize;
        let mut hi = keys.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if cmp(&keys[mid], key) == Ordering::Less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    fn index_in_parent(&self, node: NodeId, parent: NodeId) -> usize {
        self.arena
            .get(parent)
            .children()
            .iter()
            .position(|&c| c == node)
            .expect("node is not among parent's children")
    }

    /// §4.2.1 `Find`. Descends using binary search, widening at each level
    /// for the requested duplicate bias, and (for `Bias::Head`) stitching
    /// backward across the leaf chain at the very end.
    pub fn find<F: Fn(&K, &K) -> Ordering>(
        &self,
        key: &K,
        cmp: &F,
        bias: Bias,
    ) -> (NodeId, usize, bool) {
        let mut current = self.root;
        loop {
            let is_leaf = self.arena.get(current).is_leaf();
            if is_leaf {
                let node = self.arena.get(current);
                let len = node.node_count();
                let pos = Self::lower_bound(&node.keys, key, cmp);
                let found = pos < len && cmp(&node.keys[pos], key) == Ordering::Equal;
                if !found {
                    return (current, pos, false);
                }
                return self.move_to_duplicates_boundary_leaf(current, pos, key, cmp, bias);
            }
            let node = self.arena.get(current);
            let idx = Self::descend_index(node, key, cmp, bias);
            current = node.get_child(idx);
        }
    }

    /// Picks which child to descend into at an internal node, widening
    /// within the node's own separators for the given bias (no cross-node
    /// step is needed above the leaf level: a run that spans siblings is
    /// represented by repeated equal separators in the same parent).
    fn descend_index<F: Fn(&K, &K) -> Ordering>(
        node: &Node<K, V>,
        key: &K,
        cmp: &F,
        bias: Bias,
    ) -> usize {
        let len = node.node_count();
        let idx = Self::lower_bound(&node.keys, key, cmp);
        if idx < len && cmp(&node.keys[idx], key) == Ordering::Equal {
            let mut i = idx;
            match bias {
                Bias::Tail => {
                    while i + 1 < len && cmp(&node.keys[i + 1], key) == Ordering::Equal {
                        i += 1;
                    }
                }
                Bias::Head => {
                    while i > 0 && cmp(&node.keys[i - 1], key) == Ordering::Equal {
                        i -= 1;
                    }
                }
                Bias::Arbitrary => {}
            }
            i
        } else {
            idx.saturating_sub(1)
        }
    }

    fn move_to_duplicates_boundary_leaf<F: Fn(&K, &K) -> Ordering>(
        &self,
        leaf: NodeId,
        pos: usize,
        key: &K,
        cmp: &F,
        bias: Bias,
    ) -> (NodeId, usize, bool) {
        match bias {
            Bias::Arbitrary => (leaf, pos, true),
            Bias::Tail => {
                let mut cur_pos = pos;
                loop {
                    let node = self.arena.get(leaf);
                    if cur_pos + 1 < node.node_count()
                        && cmp(&node.keys[cur_pos + 1], key) == Ordering::Equal
                    {
                        cur_pos += 1;
                    } else {
                        break;
                    }
                }
                (leaf, cur_pos, true)
            }
            Bias::Head => {
                let mut cur_leaf = leaf;
                let mut cur_pos = pos;
                loop {
                    let node = self.arena.get(cur_leaf);
                    if cur_pos > 0 && cmp(&node.keys[cur_pos - 1], key) == Ordering::Equal {
                        cur_pos -= 1;
                        continue;
                    }
                    if cur_pos == 0 {
                        if let Some(prev) = node.prev() {
                            let prev_node = self.arena.get(prev);
                            let prev_count = prev_node.node_count();
                            if prev_count > 0
                                && cmp(&prev_node.keys[prev_count - 1], key) == Ordering::Equal
                            {
                                cur_leaf = prev;
                                cur_pos = prev_count - 1;
                                continue;
                            }
                        }
                    }
                    break;
                }
                (cur_leaf, cur_pos, true)
            }
        }
    }

    /// §4.2.2 `Insert`. Caller has already resolved `(leaf, pos)` via `find`.
    pub fn insert<F: Fn(&K, &K) -> Ordering>(
        &mut self,
        key: K,
        value: V,
        mut leaf: NodeId,
        mut pos: usize,
        cmp: &F,
    ) {
        if self.arena.get(leaf).node_count() >= self.capacity {
            self.ensure_space(leaf, cmp);
            let left_len = self.arena.get(leaf).node_count();
            if pos > left_len {
                let sibling = self
                    .arena
                    .get(leaf)
                    .next()
                    .expect("split of a full leaf must create a next sibling");
                pos -= left_len;
                leaf = sibling;
            }
        }
        self.arena.get_mut(leaf).keys.insert(pos, key);
        self.arena.get_mut(leaf).values_mut().insert(pos, value);
        self.ensure_parent_key(leaf, pos);
        self.adjust_total_count(leaf, 1);
        log::trace!("insert into leaf={:?} pos={}", leaf, pos);
    }

    /// §4.2.3 `Remove`.
    pub fn remove_at(&mut self, leaf: NodeId, pos: usize) -> (K, V) {
        self.adjust_total_count(leaf, -1);
        let key = self.arena.get_mut(leaf).keys.remove(pos);
        let value = self.arena.get_mut(leaf).values_mut().remove(pos);
        if self.arena.get(leaf).node_count() > 0 {
            self.ensure_parent_key(leaf, pos);
        }
        self.merge(leaf);
        log::trace!("removed from leaf={:?} pos={}", leaf, pos);
        (key, value)
    }

    /// Overwrites the value at an existing slot in place (the dictionary
    /// facade's upsert path), returning the previous value.
    pub fn set_value(&mut self, leaf: NodeId, pos: usize, value: V) -> V {
        self.arena.get_mut(leaf).set_value(pos, value)
    }

    fn adjust_total_count(&mut self, node: NodeId, delta: i64) {
        let mut cur = Some(node);
        while let Some(id) = cur {
            let n = self.arena.get_mut(id);
            n.total_count = (n.total_count as i64 + delta) as usize;
            cur = n.parent;
        }
    }

    /// If `pos == 0`, the node's minimum key may have changed; cascade the
    /// new minimum upward through every ancestor that this node occupies
    /// slot 0 of.
    fn ensure_parent_key(&mut self, node: NodeId, pos: usize) {
        if pos != 0 || self.arena.get(node).node_count() == 0 {
            return;
        }
        let mut current = node;
        loop {
            let parent = match self.arena.get(current).parent {
                Some(p) => p,
                None => break,
            };
            let idx = self.index_in_parent(current, parent);
            if idx != 0 {
                break;
            }
            let new_key = self.arena.get(current).keys[0].clone();
            self.arena.get_mut(parent).keys[0] = new_key;
            current = parent;
        }
    }

    fn ensure_parent(&mut self, node: NodeId) {
        if !self.arena.get(node).is_root() {
            return;
        }
        let mut new_root = Node::new_internal();
        new_root.keys.push(self.arena.get(node).keys[0].clone());
        new_root.total_count = self.arena.get(node).total_count;
        let new_root_id = self.arena.insert(new_root);
        self.arena.get_mut(new_root_id).children_mut().push(node);
        self.arena.get_mut(node).parent = Some(new_root_id);
        self.root = new_root_id;
        log::debug!("grew root: {:?} over {:?}", new_root_id, node);
    }

    /// §4.2.6 `EnsureSpace`.
    fn ensure_space<F: Fn(&K, &K) -> Ordering>(&mut self, node: NodeId, cmp: &F) {
        if self.arena.get(node).node_count() < self.capacity {
            return;
        }
        self.ensure_parent(node);
        let parent = self
            .arena
            .get(node)
            .parent
            .expect("ensure_parent always assigns a parent");
        self.ensure_space(parent, cmp);
        // Splitting `parent` may have moved `node` itself into parent's new
        // sibling (if `node` fell in the upper half being relocated), so the
        // parent to insert our own sibling into must be re-read here rather
        // than reusing the handle captured before the recursive call.
        let parent = self
            .arena
            .get(node)
            .parent
            .expect("node must still have a parent after ensure_space");

        let is_leaf = self.arena.get(node).is_leaf();
        let sibling = self
            .arena
            .insert(if is_leaf { Node::new_leaf() } else { Node::new_internal() });
        self.arena.get_mut(sibling).parent = Some(parent);

        if is_leaf {
            let next = self.arena.get(node).next();
            self.arena.get_mut(sibling).set_prev(Some(node));
            self.arena.get_mut(sibling).set_next(next);
            if let Some(n) = next {
                self.arena.get_mut(n).set_prev(Some(sibling));
            }
            self.arena.get_mut(node).set_next(Some(sibling));
        }

        let idx = self.index_in_parent(node, parent);
        self.arena.get_mut(parent).children_mut().insert(idx + 1, sibling);
        let placeholder = self.arena.get(node).keys.last().unwrap().clone();
        self.arena.get_mut(parent).keys.insert(idx + 1, placeholder);

        let total = self.arena.get(node).node_count();
        let left_len = (total + 1) / 2;
        let move_count = total - left_len;
        self.move_entries(node, left_len, sibling, 0, move_count);

        let sibling_min = self.arena.get(sibling).keys[0].clone();
        self.arena.get_mut(parent).keys[idx + 1] = sibling_min;
    }

    /// The `Move` primitive (§4.2.6 design note). Transfers `count` entries
    /// starting at `src_idx` in `source` to position `tgt_idx` in `target`,
    /// re-parenting moved children and propagating the `total_count` delta
    /// up both chains to their lowest common ancestor.
    fn move_entries(&mut self, source: NodeId, src_idx: usize, target: NodeId, tgt_idx: usize, count: usize) {
        if count == 0 {
            return;
        }
        let is_leaf = self.arena.get(source).is_leaf();
        let moved_keys: Vec<K> = self
            .arena
            .get_mut(source)
            .keys
            .drain(src_idx..src_idx + count)
            .collect();

        let moved_leaf_count;
        if is_leaf {
            let moved_values: Vec<V> = self
                .arena
                .get_mut(source)
                .values_mut()
                .drain(src_idx..src_idx + count)
                .collect();
            moved_leaf_count = moved_values.len();
            for (i, v) in moved_values.into_iter().enumerate() {
                self.arena.get_mut(target).values_mut().insert(tgt_idx + i, v);
            }
        } else {
            let moved_children: Vec<NodeId> = self
                .arena
                .get_mut(source)
                .children_mut()
                .drain(src_idx..src_idx + count)
                .collect();
            moved_leaf_count = moved_children
                .iter()
                .map(|&c| self.arena.get(c).total_count)
                .sum();
            for (i, child) in moved_children.into_iter().enumerate() {
                self.arena.get_mut(child).parent = Some(target);
                self.arena
                    .get_mut(target)
                    .children_mut()
                    .insert(tgt_idx + i, child);
            }
        }
        for (i, k) in moved_keys.into_iter().enumerate() {
            self.arena.get_mut(target).keys.insert(tgt_idx + i, k);
        }

        self.propagate_move(source, target, moved_leaf_count);
        self.ensure_parent_key(source, src_idx);
        self.ensure_parent_key(target, tgt_idx);
    }

    fn propagate_move(&mut self, source: NodeId, target: NodeId, moved: usize) {
        if moved == 0 {
            return;
        }
        let mut target_chain = std::collections::HashSet::new();
        let mut t = Some(target);
        while let Some(id) = t {
            target_chain.insert(id);
            t = self.arena.get(id).parent;
        }

        let mut s = Some(source);
        let lca = loop {
            let id = s.expect("source chain must intersect target chain at the tree root");
            if target_chain.contains(&id) {
                break id;
            }
            let n = self.arena.get_mut(id);
            n.total_count -= moved;
            s = n.parent;
        };

        let mut u = Some(target);
        while let Some(id) = u {
            if id == lca {
                break;
            }
            let n = self.arena.get_mut(id);
            n.total_count += moved;
            u = n.parent;
        }
    }

    /// §4.2.7 `Merge`. Only leaves steal from their `next` sibling, matching
    /// the literal source text: underfull internal nodes are left alone,
    /// and only the empty-node cascade applies above the leaf level.
    fn merge(&mut self, node: NodeId) {
        if node == self.root
            && !self.arena.get(node).is_leaf()
            && self.arena.get(node).node_count() == 1
        {
            self.collapse_root(node);
            return;
        }

        let node_count = self.arena.get(node).node_count();
        if node_count == 0 {
            if node == self.first_leaf {
                return;
            }
            let parent = match self.arena.get(node).parent {
                Some(p) => p,
                None => return,
            };
            self.unlink_empty_node(node, parent);
            return;
        }

        if !self.arena.get(node).is_leaf() {
            return;
        }
        let half = self.capacity / 2;
        if node_count >= half {
            return;
        }
        let next = match self.arena.get(node).next() {
            Some(n) => n,
            None => return,
        };
        let next_count = self.arena.get(next).node_count();
        if next_count == 0 {
            self.merge(next);
            return;
        }
        let mut cnt = next_count;
        if node_count + next_count > self.capacity {
            let balanced = (node_count + next_count) / 2;
            cnt = balanced.saturating_sub(node_count);
        }
        if cnt > 0 {
            self.move_entries(next, 0, node, node_count, cnt);
        }
        self.merge(next);
    }

    fn unlink_empty_node(&mut self, node: NodeId, parent: NodeId) {
        let idx = self.index_in_parent(node, parent);
        self.arena.get_mut(parent).keys.remove(idx);
        self.arena.get_mut(parent).children_mut().remove(idx);

        if self.arena.get(node).is_leaf() {
            let prev = self.arena.get(node).prev();
            let next = self.arena.get(node).next();
            if let Some(p) = prev {
                self.arena.get_mut(p).set_next(next);
            }
            if let Some(n) = next {
                self.arena.get_mut(n).set_prev(prev);
            }
        }
        self.arena.remove(node);
        log::trace!("unlinked empty node from parent {:?} at {}", parent, idx);

        if self.arena.get(parent).node_count() > 0 {
            self.ensure_parent_key(parent, idx);
        }
        self.merge(parent);
    }

    fn collapse_root(&mut self, old_root: NodeId) {
        let child = self.arena.get(old_root).get_child(0);
        self.arena.get_mut(child).parent = None;
        self.root = child;
        self.arena.remove(old_root);
        log::debug!("collapsed root {:?} into {:?}", old_root, child);
    }

    /// §4.2.4 `LeafAt`.
    pub fn leaf_at(&self, mut pos: usize) -> (NodeId, usize) {
        let mut current = self.root;
        loop {
            let node = self.arena.get(current);
            if node.is_leaf() {
                return (current, pos);
            }
            let mut idx = 0;
            loop {
                let child = node.get_child(idx);
                let child_count = self.arena.get(child).total_count;
                if pos < child_count {
                    current = child;
                    break;
                }
                pos -= child_count;
                idx += 1;
            }
        }
    }

    /// §4.2.8 `GetRootIndex`.
    pub fn rank(&self, leaf: NodeId, pos: usize) -> usize {
        let mut rank = pos;
        let mut current = leaf;
        while let Some(parent) = self.arena.get(current).parent {
            let idx = self.index_in_parent(current, parent);
            for i in 0..idx {
                let sibling = self.arena.get(parent).get_child(i);
                rank += self.arena.get(sibling).total_count;
            }
            current = parent;
        }
        rank
    }

    pub fn forward_from(&self, leaf: NodeId, pos: usize) -> crate::iter::Forward<'_, K, V> {
        crate::iter::Forward::new(self, leaf, pos)
    }

    pub fn backward_from(&self, leaf: NodeId, pos: isize) -> crate::iter::Backward<'_, K, V> {
        crate::iter::Backward::new(self, leaf, pos)
    }

    pub fn range(
        &self,
        leaf_start: NodeId,
        start_pos: usize,
        leaf_end: NodeId,
        end_pos: isize,
    ) -> crate::iter::Range<'_, K, V> {
        crate::iter::Range::new(self, leaf_start, start_pos, leaf_end, end_pos)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Invariant checking and an ASCII tree-description fixture format,
    //! adapted from this codebase's own B+-tree prototype test harnesses
    //! to the arena + `total_count` model.
    use super::*;
    use std::collections::HashSet;

    impl<K: Clone + std::fmt::Debug + Ord, V> Tree<K, V> {
        /// Walks every live node and checks §3 invariants 1-8 plus the
        /// arena bookkeeping (no dangling ids, free list disjoint from the
        /// live set, which `Arena` guarantees structurally).
        pub fn assert_invariants(&self) {
            assert!(self.arena.get(self.root).is_root(), "root must have no parent");
            let mut visited = HashSet::new();
            self.check_node(self.root, &mut visited);
            self.check_leaf_chain();
        }

        fn check_node(&self, id: NodeId, visited: &mut HashSet<NodeId>) -> (usize, usize) {
            assert!(visited.insert(id), "node {:?} visited twice", id);
            let node = self.arena.get(id);
            assert!(
                node.node_count() <= self.capacity,
                "node {:?} exceeds capacity",
                id
            );
            assert!(
                is_sorted(&node.keys),
                "node {:?} keys not non-decreasing",
                id
            );
            if node.is_leaf() {
                assert_eq!(
                    node.total_count,
                    node.node_count(),
                    "leaf {:?} total_count must equal node_count",
                    id
                );
                (0, node.node_count())
            } else {
                let mut depth = None;
                let mut total = 0;
                for i in 0..node.node_count() {
                    let child = node.get_child(i);
                    assert_eq!(
                        self.arena.get(child).parent,
                        Some(id),
                        "child {:?} does not point back at parent {:?}",
                        child,
                        id
                    );
                    assert_eq!(
                        self.arena.get(child).keys.first(),
                        Some(node.get_key(i)),
                        "separator at slot {} of {:?} must equal child's min key",
                        i,
                        id
                    );
                    let (child_depth, child_total) = self.check_node(child, visited);
                    total += child_total;
                    depth = Some(match depth {
                        None => child_depth + 1,
                        Some(d) => {
                            assert_eq!(d, child_depth + 1, "unbalanced leaf depth under {:?}", id);
                            d
                        }
                    });
                }
                assert_eq!(
                    node.total_count, total,
                    "internal node {:?} total_count mismatch",
                    id
                );
                (depth.unwrap_or(0), total)
            }
        }

        fn check_leaf_chain(&self) {
            let mut current = Some(self.first_leaf);
            let mut prev = None;
            let mut count = 0;
            while let Some(id) = current {
                assert_eq!(self.arena.get(id).prev(), prev, "broken prev link at {:?}", id);
                prev = Some(id);
                current = self.arena.get(id).next();
                count += 1;
                assert!(count <= self.arena.len() + 1, "leaf chain cycle detected");
            }
        }
    }

    fn is_sorted<K: Ord>(keys: &[K]) -> bool {
        keys.windows(2).all(|w| w[0] <= w[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use std::cmp::Ordering as O;

    fn natural(a: &i32, b: &i32) -> O {
        a.cmp(b)
    }

    fn build(capacity: usize, keys: &[i32]) -> Tree<i32, i32> {
        let mut tree = Tree::new(capacity).unwrap();
        for &k in keys {
            let (leaf, pos, found) = tree.find(&k, &natural, Bias::Arbitrary);
            assert!(!found);
            tree.insert(k, k, leaf, pos, &natural);
            tree.assert_invariants();
        }
        tree
    }

    fn collect(tree: &Tree<i32, i32>) -> Vec<i32> {
        let mut out = Vec::new();
        let mut leaf = Some(tree.first_leaf());
        while let Some(id) = leaf {
            for i in 0..tree.leaf_len(id) {
                out.push(*tree.leaf_key(id, i));
            }
            leaf = tree.leaf_next(id);
        }
        out
    }

    /// One-line rendering of the leaf chain for assertion failure messages.
    fn describe(tree: &Tree<i32, i32>) -> String {
        collect(tree).iter().join(", ")
    }

    #[test]
    fn scenario_1_split_and_remove() {
        let mut tree = build(3, &[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let (leaf, pos, found) = tree.find(&3, &natural, Bias::Arbitrary);
        assert!(found);
        tree.remove_at(leaf, pos);
        tree.assert_invariants();
        let (leaf, _) = tree.leaf_at(0);
        tree.remove_at(leaf, 0);
        tree.assert_invariants();
        assert_eq!(
            collect(&tree),
            vec![2, 4, 5, 6, 7, 8, 9],
            "leaf chain was: {}",
            describe(&tree)
        );
    }

    #[test]
    fn leaf_at_and_rank_agree_with_iteration_order() {
        let tree = build(4, &[10, 30, 20, 50, 40, 0, 25]);
        let ordered = collect(&tree);
        for (i, expected) in ordered.iter().enumerate() {
            let (leaf, pos) = tree.leaf_at(i);
            assert_eq!(tree.leaf_key(leaf, pos), expected);
            assert_eq!(tree.rank(leaf, pos), i);
        }
    }

    #[test]
    fn remove_until_empty_preserves_first_leaf() {
        let mut tree = build(4, &(0..100).collect::<Vec<_>>());
        let first = tree.first_leaf();
        while !tree.is_empty() {
            let (leaf, pos) = tree.leaf_at(0);
            tree.remove_at(leaf, pos);
            tree.assert_invariants();
        }
        assert_eq!(tree.first_leaf(), first);
        assert_eq!(collect(&tree), Vec::<i32>::new());
    }

    #[test]
    fn duplicates_bias_head_and_tail() {
        let mut tree: Tree<i32, i32> = Tree::new(3).unwrap();
        for v in 0..6 {
            let (leaf, pos, _) = tree.find(&5, &natural, Bias::Tail);
            tree.insert(5, v, leaf, pos, &natural);
            tree.assert_invariants();
        }
        let values: Vec<i32> = {
            let mut out = Vec::new();
            let mut leaf = Some(tree.first_leaf());
            while let Some(id) = leaf {
                for i in 0..tree.leaf_len(id) {
                    out.push(*tree.leaf_value(id, i));
                }
                leaf = tree.leaf_next(id);
            }
            out
        };
        assert_eq!(values, vec![0, 1, 2, 3, 4, 5]);

        let (leaf, pos, found) = tree.find(&5, &natural, Bias::Head);
        assert!(found);
        assert_eq!(tree.rank(leaf, pos), 0);
        let (leaf, pos, found) = tree.find(&5, &natural, Bias::Tail);
        assert!(found);
        assert_eq!(tree.rank(leaf, pos), 5);
    }
}
