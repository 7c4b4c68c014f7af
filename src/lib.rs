//! # bst-rs
//!
//! A binary search tree over owned, variable-sized, opaque byte payloads.
//!
//! The tree takes ownership of every payload it admits and never copies payload
//! bytes: deletion relocates payloads between nodes by moving their boxes, and
//! [`BinarySearchTree::rebalance`] only rewrites child links. The root node is
//! allocated once and keeps its identity for the lifetime of the tree, even when
//! the element stored in it is deleted.
//!
//! Ordering is supplied by the caller on every call as a comparator over
//! payload bytes.
//!
//! ## Example
//!
//! ```rust
//! use bst_rs::{bytewise, BinarySearchTree, DropPayload};
//!
//! let mut tree = BinarySearchTree::new();
//! tree.insert(b"hello".to_vec().into_boxed_slice(), bytewise).unwrap();
//! tree.insert(b"world".to_vec().into_boxed_slice(), bytewise).unwrap();
//!
//! assert!(tree.contains(b"hello", bytewise).unwrap().is_some());
//! assert_eq!(tree.find_min().unwrap().payload(), Some(&b"hello"[..]));
//!
//! tree.delete(b"hello", bytewise, DropPayload).unwrap();
//! assert_eq!(tree.len(), 1);
//! ```

#![forbid(unsafe_code)]

mod debug;
mod error;
mod node;

pub use debug::{Pretty, PrettyConfig};
pub use error::{Result, TreeError};
pub use node::{bytewise, DropPayload, Node, Payload, ReleasePayload};

use std::cmp::Ordering;
use std::fmt;

use node::Link;
use tracing::{debug, trace, warn};

// =============================================================================
// Tree handle
// =============================================================================

/// A binary search tree with a stable root node.
///
/// An empty tree is a single sentinel root without payload or children. The
/// first inserted payload is adopted into that same root object.
pub struct BinarySearchTree {
    root: Box<Node>,
    count: usize,
}

/// Outcome of [`BinarySearchTree::insert`].
#[derive(Debug)]
pub enum Insertion<'a> {
    /// The tree took ownership of the payload; this is the node now holding it.
    Adopted(&'a Node),
    /// An equal payload was already present. Ownership was not transferred and
    /// the payload is handed back untouched.
    Rejected { existing: &'a Node, payload: Payload },
}

impl<'a> Insertion<'a> {
    /// The node holding the key, whether newly adopted or pre-existing.
    pub fn node(&self) -> &'a Node {
        match *self {
            Insertion::Adopted(node) => node,
            Insertion::Rejected { existing, .. } => existing,
        }
    }

    #[inline]
    pub fn is_adopted(&self) -> bool {
        matches!(self, Insertion::Adopted(_))
    }

    /// The rejected duplicate, if any.
    pub fn into_rejected(self) -> Option<Payload> {
        match self {
            Insertion::Adopted(_) => None,
            Insertion::Rejected { payload, .. } => Some(payload),
        }
    }
}

/// Returns true iff there is no tree behind the handle. An empty tree is a
/// valid handle and is not null.
#[inline]
pub fn is_null(tree: Option<&BinarySearchTree>) -> bool {
    tree.is_none()
}

/// Destroy a possibly-absent tree. A missing handle is a no-op.
pub fn destroy<R: ReleasePayload>(tree: Option<BinarySearchTree>, release: R) {
    match tree {
        Some(tree) => tree.destroy(release),
        None => warn!("destroy invoked on a null tree handle; nothing to do"),
    }
}

impl BinarySearchTree {
    /// Builds an empty tree: one sentinel root node.
    pub fn new() -> Self {
        Self {
            root: Box::new(Node::sentinel()),
            count: 0,
        }
    }

    /// Number of stored payloads.
    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_sentinel()
    }

    /// The root node. Its address is stable across every mutation.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Height in edges of the longest root-to-leaf path, `None` when empty.
    pub fn height(&self) -> Option<usize> {
        if self.root.is_sentinel() {
            return None;
        }

        let mut max = 0usize;
        let mut stack: Vec<(&Node, usize)> = vec![(&*self.root, 0)];
        while let Some((node, depth)) = stack.pop() {
            max = max.max(depth);
            if let Some(left) = node.left() {
                stack.push((left, depth + 1));
            }
            if let Some(right) = node.right() {
                stack.push((right, depth + 1));
            }
        }
        Some(max)
    }

    /// In-order iterator over payload bytes.
    pub fn iter(&self) -> Iter<'_> {
        let mut iter = Iter { stack: Vec::new() };
        if !self.root.is_sentinel() {
            iter.push_left_spine(&self.root);
        }
        iter
    }

    fn check_sentinel(&self, op: &'static str) -> Result<()> {
        if self.root.is_sentinel() && !self.root.is_leaf() {
            return Err(TreeError::malformed(op, "sentinel root with children"));
        }
        Ok(())
    }
}

// =============================================================================
// Queries
// =============================================================================

impl BinarySearchTree {
    /// Look up the node holding a payload equal to `key`.
    ///
    /// `compare(key, payload)` steers the descent. Returns `Ok(None)` when the
    /// tree is empty or the key is absent.
    pub fn contains<F>(&self, key: &[u8], mut compare: F) -> Result<Option<&Node>>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        const OP: &str = "contains";
        self.check_sentinel(OP)?;
        if self.root.is_sentinel() {
            return Ok(None);
        }

        let mut current: &Node = &self.root;
        loop {
            let next = match compare(key, current.key(OP)?) {
                Ordering::Equal => return Ok(Some(current)),
                Ordering::Less => current.left(),
                Ordering::Greater => current.right(),
            };
            match next {
                Some(node) => current = node,
                None => return Ok(None),
            }
        }
    }

    /// Leftmost node. Fails on an empty tree.
    pub fn find_min(&self) -> Result<&Node> {
        if self.root.is_sentinel() {
            return Err(TreeError::empty_tree("find_min"));
        }
        let mut current: &Node = &self.root;
        while let Some(left) = current.left() {
            current = left;
        }
        Ok(current)
    }

    /// Rightmost node. Fails on an empty tree.
    pub fn find_max(&self) -> Result<&Node> {
        if self.root.is_sentinel() {
            return Err(TreeError::empty_tree("find_max"));
        }
        let mut current: &Node = &self.root;
        while let Some(right) = current.right() {
            current = right;
        }
        Ok(current)
    }

    /// Check the sentinel rule, strict in-order ordering under `compare`, and
    /// the live count.
    pub fn validate<F>(&self, mut compare: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        const OP: &str = "validate";
        self.check_sentinel(OP)?;
        let nodes = if self.root.is_sentinel() {
            0
        } else {
            self.count_nodes(OP)?
        };
        if nodes != self.count {
            return Err(TreeError::malformed(OP, "live count does not match reachable nodes"));
        }

        let mut prev: Option<&[u8]> = None;
        for payload in self.iter() {
            if let Some(prev) = prev {
                if compare(prev, payload) != Ordering::Less {
                    return Err(TreeError::malformed(OP, "in-order sequence is not strictly increasing"));
                }
            }
            prev = Some(payload);
        }
        Ok(())
    }

    /// Count real nodes, rejecting any payload-less node on the way.
    fn count_nodes(&self, op: &'static str) -> Result<usize> {
        let mut count = 0usize;
        let mut stack: Vec<&Node> = vec![&*self.root];
        while let Some(node) = stack.pop() {
            node.key(op)?;
            count += 1;
            stack.extend(node.left());
            stack.extend(node.right());
        }
        Ok(count)
    }
}

// =============================================================================
// Insertion
// =============================================================================

impl BinarySearchTree {
    /// Insert `payload`, transferring its ownership to the tree.
    ///
    /// `compare(payload, existing)` steers the descent. If an equal payload is
    /// already stored nothing changes and the payload comes back in
    /// [`Insertion::Rejected`]; dropping it is the caller's business.
    pub fn insert<F>(&mut self, payload: Payload, mut compare: F) -> Result<Insertion<'_>>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        const OP: &str = "insert";
        if payload.is_empty() {
            return Err(TreeError::empty_payload(OP));
        }
        self.check_sentinel(OP)?;

        if self.root.is_sentinel() {
            trace!(size = payload.len(), "payload adopted into sentinel root");
            self.root.payload = Some(payload);
            self.count = 1;
            return Ok(Insertion::Adopted(&self.root));
        }

        let mut node: &mut Node = &mut self.root;
        loop {
            let slot = match compare(&payload[..], node.key(OP)?) {
                Ordering::Equal => {
                    trace!(size = payload.len(), "duplicate payload rejected");
                    return Ok(Insertion::Rejected {
                        existing: node,
                        payload,
                    });
                }
                Ordering::Less => &mut node.left,
                Ordering::Greater => &mut node.right,
            };
            match slot {
                Some(child) => node = child,
                None => {
                    trace!(size = payload.len(), "payload adopted into new node");
                    self.count += 1;
                    let child = slot.insert(Box::new(Node::holding(payload)));
                    return Ok(Insertion::Adopted(&**child));
                }
            }
        }
    }
}

// =============================================================================
// Deletion
// =============================================================================

impl BinarySearchTree {
    /// Delete the payload equal to `key`, handing it to `release`.
    ///
    /// A missing key or an empty tree is a no-op. Exactly one payload is
    /// released per successful deletion and at most one node is freed.
    pub fn delete<F, R>(&mut self, key: &[u8], compare: F, mut release: R) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
        R: ReleasePayload,
    {
        if let Some(payload) = self.remove(key, compare, "delete")? {
            release.release(payload);
        }
        Ok(())
    }

    /// Like [`delete`](Self::delete), but returns the removed payload instead
    /// of releasing it.
    pub fn take<F>(&mut self, key: &[u8], compare: F) -> Result<Option<Payload>>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        self.remove(key, compare, "take")
    }

    fn remove<F>(&mut self, key: &[u8], mut compare: F, op: &'static str) -> Result<Option<Payload>>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        self.check_sentinel(op)?;
        if self.root.is_sentinel() {
            warn!(op, "removal from an empty tree is a no-op");
            return Ok(None);
        }

        let removed = match compare(key, self.root.key(op)?) {
            Ordering::Equal => Self::remove_root(&mut self.root, op)?,
            ordering => {
                let link = match ordering {
                    Ordering::Less => &mut self.root.left,
                    _ => &mut self.root.right,
                };
                match Self::find_link(link, key, &mut compare, op)? {
                    Some(link) => Self::remove_linked(link, op)?,
                    None => None,
                }
            }
        };

        if removed.is_some() {
            self.count -= 1;
        }
        Ok(removed)
    }

    /// The root cannot be unlinked: every shape is resolved by mutating it in
    /// place.
    fn remove_root(root: &mut Node, op: &'static str) -> Result<Option<Payload>> {
        match (root.left.is_some(), root.right.is_some()) {
            (false, false) => {
                trace!("root leaf reverted to sentinel");
                Ok(root.payload.take())
            }
            (true, true) => {
                trace!("root with two children adopts its successor");
                root.adopt_successor(op)
            }
            _ => {
                trace!("root with one child adopts the child");
                match root.left.take().or_else(|| root.right.take()) {
                    Some(child) => Ok(root.adopt_child(child)),
                    None => Ok(None),
                }
            }
        }
    }

    /// Remove the node owned by `link`.
    fn remove_linked(link: &mut Link, op: &'static str) -> Result<Option<Payload>> {
        let Some(node) = link.as_deref_mut() else {
            return Ok(None);
        };
        if node.left.is_some() && node.right.is_some() {
            trace!("node with two children adopts its successor");
            return node.adopt_successor(op);
        }

        let Some(mut removed) = link.take() else {
            return Ok(None);
        };
        trace!(leaf = removed.is_leaf(), "node unlinked");
        *link = removed.left.take().or_else(|| removed.right.take());
        Ok(removed.payload.take())
    }

    /// Walk down from `link` to the link owning the node equal to `key`.
    fn find_link<'a, F>(
        mut link: &'a mut Link,
        key: &[u8],
        compare: &mut F,
        op: &'static str,
    ) -> Result<Option<&'a mut Link>>
    where
        F: FnMut(&[u8], &[u8]) -> Ordering,
    {
        loop {
            let ordering = match link.as_deref() {
                None => return Ok(None),
                Some(node) => compare(key, node.key(op)?),
            };
            if ordering == Ordering::Equal {
                return Ok(Some(link));
            }
            let Some(node) = link else {
                return Ok(None);
            };
            link = match ordering {
                Ordering::Less => &mut node.left,
                _ => &mut node.right,
            };
        }
    }
}

// =============================================================================
// Rebalancing
// =============================================================================

impl BinarySearchTree {
    /// Reshape the tree to logarithmic height.
    ///
    /// Only child links change: the root keeps its identity and payload, every
    /// payload stays in the node that owns it, and the in-order sequence is
    /// unchanged. Each side of the root is rebuilt as a balanced subtree from
    /// its in-order node sequence.
    pub fn rebalance(&mut self) -> Result<()> {
        const OP: &str = "rebalance";
        self.check_sentinel(OP)?;
        if self.root.is_sentinel() {
            return Ok(());
        }

        let n = self.count_nodes(OP)?;
        if n <= 1 {
            return Ok(());
        }
        let height_before = self.height();

        let mut nodes: Vec<Box<Node>> = Vec::new();
        nodes
            .try_reserve_exact(n - 1)
            .map_err(|_| TreeError::allocation_failed(OP, n - 1))?;

        drain_in_order(self.root.left.take(), &mut nodes);
        // The root sits at this position of the in-order sequence.
        let root_pos = nodes.len();
        drain_in_order(self.root.right.take(), &mut nodes);
        debug_assert_eq!(nodes.len() + 1, n);

        let right_len = nodes.len() - root_pos;
        let mut nodes = nodes.into_iter();
        self.root.left = link_balanced(&mut nodes, root_pos);
        self.root.right = link_balanced(&mut nodes, right_len);

        debug!(
            nodes = n,
            root_pos,
            height_before = ?height_before,
            height_after = ?self.height(),
            "tree rebalanced"
        );
        Ok(())
    }
}

/// Move every node of `link` into `out` in order, detaching child links.
fn drain_in_order(link: Link, out: &mut Vec<Box<Node>>) {
    let mut stack: Vec<Box<Node>> = Vec::new();
    let mut current = link;
    loop {
        while let Some(mut node) = current {
            current = node.left.take();
            stack.push(node);
        }
        let Some(mut node) = stack.pop() else {
            break;
        };
        current = node.right.take();
        out.push(node);
    }
}

/// Link the next `len` in-order nodes into a balanced subtree, rooted at the
/// midpoint of the range.
fn link_balanced<I>(nodes: &mut I, len: usize) -> Link
where
    I: Iterator<Item = Box<Node>>,
{
    if len == 0 {
        return None;
    }
    let left_len = (len - 1) / 2;
    let left = link_balanced(nodes, left_len);
    let mut mid = nodes.next()?;
    mid.left = left;
    mid.right = link_balanced(nodes, len - 1 - left_len);
    Some(mid)
}

// =============================================================================
// Destruction
// =============================================================================

impl BinarySearchTree {
    /// Tear the tree down, handing every payload to `release` in post-order.
    pub fn destroy<R: ReleasePayload>(mut self, mut release: R) {
        let released = self.teardown(&mut release);
        debug!(released, "tree destroyed");
    }

    /// Iterative post-order teardown. Leaves the root as an empty sentinel.
    fn teardown<R: ReleasePayload + ?Sized>(&mut self, release: &mut R) -> usize {
        let mut released = 0usize;
        let mut stack: Vec<(Box<Node>, bool)> = Vec::new();
        stack.extend(self.root.right.take().map(|n| (n, false)));
        stack.extend(self.root.left.take().map(|n| (n, false)));

        while let Some((mut node, expanded)) = stack.pop() {
            if expanded {
                if let Some(payload) = node.payload.take() {
                    R::release(release, payload);
                    released += 1;
                }
                continue;
            }
            let left = node.left.take();
            let right = node.right.take();
            stack.push((node, true));
            stack.extend(right.map(|n| (n, false)));
            stack.extend(left.map(|n| (n, false)));
        }

        if let Some(payload) = self.root.payload.take() {
            R::release(release, payload);
            released += 1;
        }
        self.count = 0;
        released
    }
}

impl Drop for BinarySearchTree {
    fn drop(&mut self) {
        self.teardown(&mut DropPayload);
    }
}

impl Default for BinarySearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BinarySearchTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// In-order iterator returned by [`BinarySearchTree::iter`].
pub struct Iter<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iter<'a> {
    fn push_left_spine(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push(node);
            match node.left() {
                Some(left) => node = left,
                None => break,
            }
        }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if let Some(right) = node.right() {
                self.push_left_spine(right);
            }
            if let Some(payload) = node.payload() {
                return Some(payload);
            }
        }
        None
    }
}

impl<'a> IntoIterator for &'a BinarySearchTree {
    type Item = &'a [u8];
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}


#[cfg(test)]
mod proptests;
