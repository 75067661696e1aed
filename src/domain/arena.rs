use generational_arena::{Arena, Index};
use std::fmt;
use tracing::instrument;

use crate::domain::entities::{ContentGroup, NodeState};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::radio::ExclusionGroupId;

/// Opaque handle of a node in a [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

/// Payload of a tree node: a content group or a caption.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Group(ContentGroup),
    Heading(String),
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group(group) => write!(f, "{}", group.name),
            NodeKind::Heading(caption) => write!(f, "{}", caption),
        }
    }
}

/// Tree node in the arena-based layer hierarchy.
#[derive(Debug)]
pub struct TreeNode {
    /// Group or caption this node displays
    pub kind: NodeKind,
    /// Current state, `HeadingOnly` for captions and root
    pub state: NodeState,
    /// Parent node, None for root and for groups left out of the tree
    pub parent: Option<NodeId>,
    /// Children in display order
    pub children: Vec<NodeId>,
    /// Exclusion groups this node is a member of
    pub exclusion_groups: Vec<ExclusionGroupId>,
}

impl TreeNode {
    fn new(kind: NodeKind, state: NodeState) -> Self {
        Self {
            kind,
            state,
            parent: None,
            children: Vec::new(),
            exclusion_groups: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            NodeKind::Group(group) => &group.name,
            NodeKind::Heading(caption) => caption,
        }
    }

    pub fn group(&self) -> Option<&ContentGroup> {
        match &self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Heading(_) => None,
        }
    }

    pub fn is_heading(&self) -> bool {
        matches!(self.kind, NodeKind::Heading(_))
    }
}

/// Arena storage for all nodes of one layer tree.
///
/// Nodes are owned by the arena only. Parent, child and exclusion links are
/// plain [`NodeId`] values, so the tree carries no reference cycles.
#[derive(Debug)]
pub struct NodeArena {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for NodeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeArena {
    pub fn new() -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode::new(
            NodeKind::Heading(String::new()),
            NodeState::HeadingOnly,
        )));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes including root.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Wrap a content group in a detached node with the group's initial state.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_group(&mut self, group: ContentGroup) -> NodeId {
        let state = NodeState::from(group.initial_state);
        NodeId(self.arena.insert(TreeNode::new(NodeKind::Group(group), state)))
    }

    /// Create a detached heading node.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_heading(&mut self, caption: String) -> NodeId {
        NodeId(self.arena.insert(TreeNode::new(
            NodeKind::Heading(caption),
            NodeState::HeadingOnly,
        )))
    }

    /// Attach a detached node as the last child of `parent`.
    ///
    /// Returns false and leaves the tree untouched when `child` already has a
    /// parent, is root, or either id is unknown.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> bool {
        if child == self.root || parent == child || !self.arena.contains(parent.0) {
            return false;
        }
        match self.arena.get_mut(child.0) {
            Some(node) if node.parent.is_none() => node.parent = Some(parent),
            _ => return false,
        }
        if let Some(parent_node) = self.arena.get_mut(parent.0) {
            parent_node.children.push(child);
        }
        true
    }

    pub fn get_node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut TreeNode> {
        self.arena.get_mut(id.0)
    }

    /// Like [`NodeArena::get_node`] but fails with `UnknownNode`.
    pub fn node(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.get_node(id).ok_or(DomainError::UnknownNode(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> DomainResult<&mut TreeNode> {
        self.get_node_mut(id).ok_or(DomainError::UnknownNode(id))
    }

    /// Pre-order traversal of the attached tree, root first.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    /// Pre-order traversal paired with each node's distance from root.
    pub fn iter_with_depth(&self) -> DepthIterator<'_> {
        DepthIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.calculate_depth(self.root)
    }

    fn calculate_depth(&self, id: NodeId) -> usize {
        if let Some(node) = self.get_node(id) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }
}

pub struct TreeIterator<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeId>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a NodeArena) -> Self {
        Self {
            arena,
            stack: vec![arena.root()],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (NodeId, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current, node));
            }
        }
        None
    }
}

pub struct DepthIterator<'a> {
    arena: &'a NodeArena,
    stack: Vec<(NodeId, usize)>,
}

impl<'a> DepthIterator<'a> {
    fn new(arena: &'a NodeArena) -> Self {
        Self {
            arena,
            stack: vec![(arena.root(), 0)],
        }
    }
}

impl<'a> Iterator for DepthIterator<'a> {
    type Item = (NodeId, usize, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, depth)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current) {
                for &child in node.children.iter().rev() {
                    self.stack.push((child, depth + 1));
                }
                return Some((current, depth, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Visibility;

    #[test]
    fn given_new_arena_then_root_is_heading_without_parent() {
        let arena = NodeArena::new();
        let root = arena.node(arena.root()).unwrap();
        assert!(root.is_heading());
        assert_eq!(root.state, NodeState::HeadingOnly);
        assert!(root.parent.is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn given_attached_node_when_attaching_again_then_refuses() {
        let mut arena = NodeArena::new();
        let a = arena.insert_group(ContentGroup::new(1, "A", Visibility::On));
        let cap = arena.insert_heading("Cap".into());
        assert!(arena.attach(arena.root(), a));
        assert!(arena.attach(arena.root(), cap));
        assert!(!arena.attach(cap, a));
        assert!(!arena.attach(cap, arena.root()));
        assert_eq!(arena.node(arena.root()).unwrap().children, vec![a, cap]);
        assert_eq!(arena.depth(), 2);
    }

    #[test]
    fn given_tree_when_iterating_then_preorder_left_to_right() {
        let mut arena = NodeArena::new();
        let cap = arena.insert_heading("Cap".into());
        let a = arena.insert_group(ContentGroup::new(1, "A", Visibility::On));
        let b = arena.insert_group(ContentGroup::new(2, "B", Visibility::Off));
        arena.attach(arena.root(), cap);
        arena.attach(cap, a);
        arena.attach(arena.root(), b);

        let names: Vec<_> = arena.iter().map(|(_, n)| n.name().to_string()).collect();
        assert_eq!(names, vec!["", "Cap", "A", "B"]);

        let depths: Vec<_> = arena.iter_with_depth().map(|(_, d, _)| d).collect();
        assert_eq!(depths, vec![0, 1, 2, 1]);
    }
}
