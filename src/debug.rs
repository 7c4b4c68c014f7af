//! Debug rendering for tree troubleshooting.
//!
//! The tree is drawn sideways: the right subtree above its parent, the left
//! subtree below, one line per node.

use std::fmt;

use crate::{BinarySearchTree, Node};

const BRANCH_RIGHT: &str = "┌── ";
const BRANCH_LEFT: &str = "└── ";
const BAR: &str = "│   ";
const GAP: &str = "    ";

/// Rendering options for [`BinarySearchTree::pretty`].
#[derive(Debug, Clone, Copy)]
pub struct PrettyConfig {
    /// Bytes shown in the default hex preview before truncating with `…`.
    pub preview_bytes: usize,
    /// Show `L=`/`R=` markers for child presence.
    pub show_links: bool,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self {
            preview_bytes: 8,
            show_links: true,
        }
    }
}

impl PrettyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preview_bytes(mut self, preview_bytes: usize) -> Self {
        self.preview_bytes = preview_bytes;
        self
    }

    pub fn show_links(mut self, show_links: bool) -> Self {
        self.show_links = show_links;
        self
    }
}

type PayloadFmt = fn(&[u8], &mut fmt::Formatter<'_>) -> fmt::Result;

/// A `Display` view over a tree. Built by [`BinarySearchTree::pretty`] or
/// [`BinarySearchTree::pretty_with`].
pub struct Pretty<'a, P = PayloadFmt> {
    tree: &'a BinarySearchTree,
    config: PrettyConfig,
    format_payload: Option<P>,
}

impl BinarySearchTree {
    /// Render with a hex preview of each payload.
    pub fn pretty(&self, config: PrettyConfig) -> Pretty<'_> {
        Pretty {
            tree: self,
            config,
            format_payload: None,
        }
    }

    /// Render payloads with a caller-supplied formatter.
    pub fn pretty_with<P>(&self, config: PrettyConfig, format_payload: P) -> Pretty<'_, P>
    where
        P: Fn(&[u8], &mut fmt::Formatter<'_>) -> fmt::Result,
    {
        Pretty {
            tree: self,
            config,
            format_payload: Some(format_payload),
        }
    }
}

impl<P> Pretty<'_, P>
where
    P: Fn(&[u8], &mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn node_line(&self, f: &mut fmt::Formatter<'_>, node: &Node) -> fmt::Result {
        write!(f, "[size={}", node.payload_size())?;
        if self.config.show_links {
            let mark = |present: bool| if present { '+' } else { '-' };
            write!(
                f,
                " L={} R={}",
                mark(node.left().is_some()),
                mark(node.right().is_some())
            )?;
        }
        f.write_str(" data=")?;
        let payload = node.payload().unwrap_or_default();
        match &self.format_payload {
            Some(format_payload) => format_payload(payload, f)?,
            None => self.hex_preview(payload, f)?,
        }
        f.write_str("]\n")
    }

    fn hex_preview(&self, payload: &[u8], f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = payload.len().min(self.config.preview_bytes);
        f.write_str("0x")?;
        for b in &payload[..shown] {
            write!(f, "{:02X}", b)?;
        }
        if payload.len() > shown {
            f.write_str("…")?;
        }
        Ok(())
    }

    /// Draw every node below the root. Walks right, node, left with an explicit
    /// stack, so depth is bounded by memory, not the call stack.
    fn branches(&self, f: &mut fmt::Formatter<'_>, root: &Node) -> fmt::Result {
        // Prefix segments shared by the frames on the current path.
        let mut segments: Vec<&'static str> = Vec::new();
        let mut stack: Vec<Step<'_>> = Vec::new();
        if let Some(left) = root.left() {
            stack.push(Step::Expand { node: left, depth: 0, is_right: false, last: GAP });
        }
        if let Some(right) = root.right() {
            stack.push(Step::Expand { node: right, depth: 0, is_right: true, last: GAP });
        }

        while let Some(step) = stack.pop() {
            match step {
                Step::Expand { node, depth, is_right, last } => {
                    if depth > 0 {
                        segments.truncate(depth - 1);
                        segments.push(last);
                    }
                    if let Some(left) = node.left() {
                        let last = if is_right { BAR } else { GAP };
                        stack.push(Step::Expand { node: left, depth: depth + 1, is_right: false, last });
                    }
                    stack.push(Step::Emit { node, depth, is_right });
                    if let Some(right) = node.right() {
                        let last = if is_right { GAP } else { BAR };
                        stack.push(Step::Expand { node: right, depth: depth + 1, is_right: true, last });
                    }
                }
                Step::Emit { node, depth, is_right } => {
                    for segment in &segments[..depth] {
                        f.write_str(segment)?;
                    }
                    f.write_str(if is_right { BRANCH_RIGHT } else { BRANCH_LEFT })?;
                    self.node_line(f, node)?;
                }
            }
        }
        Ok(())
    }
}

enum Step<'t> {
    /// Schedule the node's right subtree, the node, then its left subtree.
    Expand {
        node: &'t Node,
        depth: usize,
        is_right: bool,
        last: &'static str,
    },
    Emit {
        node: &'t Node,
        depth: usize,
        is_right: bool,
    },
}

impl<P> fmt::Display for Pretty<'_, P>
where
    P: Fn(&[u8], &mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.tree.root();
        if root.is_sentinel() {
            return f.write_str("(empty BST)\n");
        }
        self.node_line(f, root)?;
        self.branches(f, root)
    }
}
