//! Tree nodes and the payload ownership contract.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, TreeError};

/// An owned, heap-allocated opaque byte buffer.
///
/// Moving a `Payload` between nodes moves the pointer; the bytes themselves are
/// never copied by the tree.
pub type Payload = Box<[u8]>;

pub(crate) type Link = Option<Box<Node>>;

/// Lexicographic byte order. A ready-made comparator for callers whose payloads
/// sort by their raw bytes.
#[inline]
pub fn bytewise(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

/// Releases payloads the tree gives up on deletion or destruction.
///
/// Implemented for every `FnMut(Payload)`, so a closure can count or recycle
/// buffers. [`DropPayload`] is the default and simply frees the buffer.
pub trait ReleasePayload {
    fn release(&mut self, payload: Payload);
}

impl<F: FnMut(Payload)> ReleasePayload for F {
    #[inline]
    fn release(&mut self, payload: Payload) {
        self(payload)
    }
}

/// Frees released payloads.
#[derive(Clone, Copy, Debug, Default)]
pub struct DropPayload;

impl ReleasePayload for DropPayload {
    #[inline]
    fn release(&mut self, payload: Payload) {
        drop(payload);
    }
}

/// A tree node. Holds either nothing (the sentinel root of an empty tree) or
/// exactly one owned payload, plus exclusive ownership of both subtrees.
pub struct Node {
    pub(crate) payload: Option<Payload>,
    pub(crate) left: Link,
    pub(crate) right: Link,
}

// Only this node: a derived impl would recurse through the whole subtree.
impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("payload_size", &self.payload_size())
            .field("has_left", &self.left.is_some())
            .field("has_right", &self.right.is_some())
            .finish_non_exhaustive()
    }
}

impl Node {
    pub(crate) fn sentinel() -> Self {
        Self {
            payload: None,
            left: None,
            right: None,
        }
    }

    pub(crate) fn holding(payload: Payload) -> Self {
        Self {
            payload: Some(payload),
            left: None,
            right: None,
        }
    }

    /// The payload bytes, or `None` for the sentinel.
    #[inline]
    pub fn payload(&self) -> Option<&[u8]> {
        self.payload.as_deref()
    }

    /// Payload length in bytes; `0` iff this is the sentinel.
    #[inline]
    pub fn payload_size(&self) -> usize {
        self.payload.as_ref().map_or(0, |p| p.len())
    }

    #[inline]
    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    #[inline]
    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.payload.is_none()
    }

    #[inline]
    pub(crate) fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Payload of a node reached by a walk. Only the root of an empty tree may
    /// lack one.
    #[inline]
    pub(crate) fn key(&self, op: &'static str) -> Result<&[u8]> {
        self.payload
            .as_deref()
            .ok_or_else(|| TreeError::malformed(op, "payload-less node below the root"))
    }

    /// Detach the leftmost node of the subtree owned by `link`, splicing its
    /// right child into the vacated slot.
    pub(crate) fn detach_leftmost(mut link: &mut Link) -> Option<Box<Node>> {
        loop {
            let descend = link.as_ref().map_or(false, |n| n.left.is_some());
            if !descend {
                break;
            }
            let Some(node) = link else {
                return None;
            };
            link = &mut node.left;
        }

        let mut leftmost = link.take()?;
        *link = leftmost.right.take();
        Some(leftmost)
    }

    /// Replace this node's payload with its in-order successor's, unlinking
    /// the successor. Returns the payload this node held before. The node must
    /// have a right child. On error the tree is left untouched.
    pub(crate) fn adopt_successor(&mut self, op: &'static str) -> Result<Option<Payload>> {
        let mut leftmost = self
            .right
            .as_deref()
            .ok_or_else(|| TreeError::malformed(op, "successor requested without a right subtree"))?;
        while let Some(left) = leftmost.left() {
            leftmost = left;
        }
        if leftmost.is_sentinel() {
            return Err(TreeError::malformed(op, "payload-less successor"));
        }

        let mut successor = Self::detach_leftmost(&mut self.right)
            .ok_or_else(|| TreeError::malformed(op, "successor requested without a right subtree"))?;
        let adopted = successor
            .payload
            .take()
            .ok_or_else(|| TreeError::malformed(op, "payload-less successor"))?;
        Ok(self.payload.replace(adopted))
    }

    /// Move `child`'s payload and both links into this node, leaving `child`
    /// empty. Returns the payload this node held before.
    pub(crate) fn adopt_child(&mut self, mut child: Box<Node>) -> Option<Payload> {
        let previous = std::mem::replace(&mut self.payload, child.payload.take());
        self.left = child.left.take();
        self.right = child.right.take();
        previous
    }
}
