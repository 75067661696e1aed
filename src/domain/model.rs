//! Layer model: visibility control and indexed access over a built tree.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeArena, NodeId, TreeIterator, TreeNode};
use crate::domain::entities::{ContentGroup, GroupId, NodeState, Visibility};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::radio::{ExclusionGroup, ExclusionGroupId};

/// Nodes whose state a `set_state` call changed, toggled node first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateChange {
    nodes: Vec<NodeId>,
}

impl StateChange {
    /// Whether anything changed, i.e. whether observers need a notification.
    pub fn changed(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    fn push(&mut self, id: NodeId) {
        if !self.nodes.contains(&id) {
            self.nodes.push(id);
        }
    }
}

/// The optional-content model: a fixed-shape layer tree, exclusion groups
/// and the mutable per-node state.
///
/// Built by [`crate::domain::TreeBuilder`]. Tree shape and exclusion
/// membership never change after construction.
#[derive(Debug)]
pub struct LayerModel {
    arena: NodeArena,
    /// Group nodes in registry order
    registry: Vec<NodeId>,
    by_id: HashMap<GroupId, NodeId>,
    exclusion: Vec<ExclusionGroup>,
}

impl LayerModel {
    pub(crate) fn from_parts(
        arena: NodeArena,
        registry: Vec<NodeId>,
        by_id: HashMap<GroupId, NodeId>,
        exclusion: Vec<ExclusionGroup>,
    ) -> Self {
        let mut model = Self {
            arena,
            registry,
            by_id,
            exclusion,
        };
        model.settle_initial_states();
        model
    }

    /// Documents may switch on several members of one radio group. Keep the
    /// first member that is On and switch the rest off.
    fn settle_initial_states(&mut self) {
        for group in &self.exclusion {
            let mut seen_on = false;
            for &member in group.members() {
                let Some(node) = self.arena.get_node_mut(member) else {
                    continue;
                };
                if node.state != NodeState::On {
                    continue;
                }
                if seen_on {
                    warn!("{} starts on in an exclusion group with another active member, switched off", node.name());
                    node.state = NodeState::Off;
                } else {
                    seen_on = true;
                }
            }
        }
    }

    pub fn root(&self) -> NodeId {
        self.arena.root()
    }

    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Node wrapping the content group with this id.
    pub fn node_for_id(&self, id: &GroupId) -> Option<NodeId> {
        self.by_id.get(id).copied()
    }

    /// Content group behind a node, `None` for headings and unknown ids.
    pub fn group_of(&self, node: NodeId) -> Option<&ContentGroup> {
        self.arena.get_node(node).and_then(TreeNode::group)
    }

    /// Group nodes in registry order.
    pub fn group_nodes(&self) -> &[NodeId] {
        &self.registry
    }

    pub fn exclusion_groups(&self) -> &[ExclusionGroup] {
        &self.exclusion
    }

    pub fn exclusion_group(&self, id: ExclusionGroupId) -> Option<&ExclusionGroup> {
        self.exclusion.get(id.0)
    }

    /// Pre-order traversal of the attached tree, root first.
    pub fn iter(&self) -> TreeIterator<'_> {
        self.arena.iter()
    }

    pub fn name(&self, node: NodeId) -> DomainResult<&str> {
        Ok(self.arena.node(node)?.name())
    }

    /// Whether a UI should render a checkbox for this node.
    pub fn is_checkable(&self, node: NodeId) -> DomainResult<bool> {
        Ok(!self.arena.node(node)?.is_heading())
    }

    // ---------------------------------------------------------------
    // Visibility
    // ---------------------------------------------------------------

    pub fn get_state(&self, node: NodeId) -> DomainResult<NodeState> {
        Ok(self.arena.node(node)?.state)
    }

    /// Set a group node's visibility.
    ///
    /// Turning a node on switches off every other direct member of each
    /// exclusion group it belongs to. Turning a node off touches nothing else.
    #[instrument(level = "debug", skip(self))]
    pub fn set_state(&mut self, node: NodeId, visibility: Visibility) -> DomainResult<StateChange> {
        let mut change = StateChange::default();

        let memberships = {
            let target = self.arena.node_mut(node)?;
            if target.is_heading() {
                return Err(DomainError::NotToggleable(node));
            }
            let state = NodeState::from(visibility);
            if target.state != state {
                target.state = state;
                change.push(node);
            }
            target.exclusion_groups.clone()
        };

        if visibility == Visibility::On {
            for group_id in memberships {
                let Some(group) = self.exclusion.get(group_id.0) else {
                    continue;
                };
                for &member in group.members() {
                    if member == node {
                        continue;
                    }
                    if let Some(other) = self.arena.get_node_mut(member) {
                        if other.state == NodeState::On {
                            other.state = NodeState::Off;
                            change.push(member);
                        }
                    }
                }
            }
        }

        debug!("set_state: {} node(s) changed", change.nodes().len());
        Ok(change)
    }

    /// False when any ancestor group node is off.
    ///
    /// Headings never disable their descendants. The node's own state does
    /// not count.
    pub fn is_enabled(&self, node: NodeId) -> DomainResult<bool> {
        let mut current = self.arena.node(node)?.parent;
        while let Some(ancestor) = current {
            let ancestor_node = self.arena.node(ancestor)?;
            if ancestor_node.state == NodeState::Off {
                return Ok(false);
            }
            current = ancestor_node.parent;
        }
        Ok(true)
    }

    /// Ids of the groups currently in `visibility`, in registry order.
    pub fn groups_with_state(&self, visibility: Visibility) -> Vec<GroupId> {
        let wanted = NodeState::from(visibility);
        self.registry
            .iter()
            .filter_map(|&id| self.arena.get_node(id))
            .filter(|node| node.state == wanted)
            .filter_map(|node| node.group().map(|g| g.id))
            .collect()
    }

    // ---------------------------------------------------------------
    // Indexed access
    // ---------------------------------------------------------------

    pub fn child_count(&self, node: NodeId) -> DomainResult<usize> {
        Ok(self.arena.node(node)?.children.len())
    }

    pub fn child_at(&self, node: NodeId, row: usize) -> DomainResult<NodeId> {
        let children = &self.arena.node(node)?.children;
        children
            .get(row)
            .copied()
            .ok_or(DomainError::RowOutOfRange {
                row,
                count: children.len(),
            })
    }

    pub fn parent_of(&self, node: NodeId) -> DomainResult<Option<NodeId>> {
        Ok(self.arena.node(node)?.parent)
    }

    /// Position of a node among its siblings.
    pub fn row_of(&self, node: NodeId) -> DomainResult<usize> {
        let parent = self
            .arena
            .node(node)?
            .parent
            .ok_or(DomainError::Detached(node))?;
        self.arena
            .node(parent)?
            .children
            .iter()
            .position(|&child| child == node)
            .ok_or(DomainError::Detached(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{OrderEntry, RadioEntry};
    use crate::domain::TreeBuilder;

    fn radio_model(states: &[Visibility]) -> LayerModel {
        let groups = states
            .iter()
            .enumerate()
            .map(|(i, &s)| ContentGroup::new(i as u32 + 1, format!("G{}", i + 1), s))
            .collect();
        let spec: Vec<Vec<RadioEntry>> =
            vec![(1..=states.len() as u32).map(RadioEntry::from).collect()];
        TreeBuilder::new().build(groups, None, Some(spec.as_slice()))
    }

    fn node(model: &LayerModel, id: u32) -> NodeId {
        model.node_for_id(&GroupId::from(id)).unwrap()
    }

    #[test]
    fn given_two_members_on_when_built_then_first_wins() {
        let model = radio_model(&[Visibility::Off, Visibility::On, Visibility::On]);
        assert_eq!(model.get_state(node(&model, 2)).unwrap(), NodeState::On);
        assert_eq!(model.get_state(node(&model, 3)).unwrap(), NodeState::Off);
    }

    #[test]
    fn given_on_member_when_switching_on_again_then_reports_no_change() {
        let mut model = radio_model(&[Visibility::On, Visibility::Off]);
        let change = model.set_state(node(&model, 1), Visibility::On).unwrap();
        assert!(!change.changed());
    }

    #[test]
    fn given_switch_on_when_sibling_cleared_then_change_lists_both() {
        let mut model = radio_model(&[Visibility::On, Visibility::Off]);
        let (one, two) = (node(&model, 1), node(&model, 2));
        let change = model.set_state(two, Visibility::On).unwrap();
        assert_eq!(change.nodes(), &[two, one]);
    }

    #[test]
    fn given_off_parent_group_when_checking_child_then_disabled() {
        let groups = vec![
            ContentGroup::new(1, "Parent", Visibility::Off),
            ContentGroup::new(2, "Child", Visibility::On),
        ];
        let order = vec![
            OrderEntry::reference(1),
            OrderEntry::Nested(vec![OrderEntry::reference(2)]),
        ];
        let mut model = TreeBuilder::new().build(groups, Some(order.as_slice()), None);
        let (parent, child) = (node(&model, 1), node(&model, 2));

        assert!(!model.is_enabled(child).unwrap());
        assert!(model.is_enabled(parent).unwrap());

        model.set_state(parent, Visibility::On).unwrap();
        assert!(model.is_enabled(child).unwrap());
        assert_eq!(model.get_state(child).unwrap(), NodeState::On);
    }
}
