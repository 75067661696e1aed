//! Exclusion (radio button) groups over already-built group nodes

use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::entities::{GroupId, RadioEntry};

/// Position of an exclusion group within its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExclusionGroupId(pub usize);

/// Group nodes of which at most one may be On.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionGroup {
    members: Vec<NodeId>,
}

impl ExclusionGroup {
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }
}

/// Resolve the radio specification into exclusion groups and record the
/// membership back-links on each member node.
///
/// Unknown ids, unsupported entries and heading nodes are dropped; a list
/// that resolves to nothing produces no group. Tree shape is not touched.
#[instrument(level = "debug", skip_all, fields(lists = spec.len()))]
pub fn build_exclusion_groups(
    arena: &mut NodeArena,
    by_id: &HashMap<GroupId, NodeId>,
    spec: &[Vec<RadioEntry>],
) -> Vec<ExclusionGroup> {
    let mut groups = Vec::new();

    for (position, entries) in spec.iter().enumerate() {
        let mut members: Vec<NodeId> = Vec::new();
        for entry in entries {
            let RadioEntry::Reference(group_id) = entry else {
                debug!("radio list {}: skipping unsupported entry", position);
                continue;
            };
            let Some(&node_id) = by_id.get(group_id) else {
                debug!("radio list {}: unknown group {}", position, group_id);
                continue;
            };
            if !members.contains(&node_id) {
                members.push(node_id);
            }
        }

        if members.is_empty() {
            debug!("radio list {}: no resolvable members, dropped", position);
            continue;
        }

        let group_id = ExclusionGroupId(groups.len());
        for &member in &members {
            if let Some(node) = arena.get_node_mut(member) {
                node.exclusion_groups.push(group_id);
            }
        }
        groups.push(ExclusionGroup { members });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ContentGroup, Visibility};
    use serde::de::IgnoredAny;

    fn arena_with(ids: &[u32]) -> (NodeArena, HashMap<GroupId, NodeId>) {
        let mut arena = NodeArena::new();
        let mut by_id = HashMap::new();
        for &id in ids {
            let node = arena.insert_group(ContentGroup::new(id, format!("G{}", id), Visibility::Off));
            by_id.insert(GroupId::from(id), node);
        }
        (arena, by_id)
    }

    #[test]
    fn given_overlapping_lists_when_building_then_node_links_every_group() {
        let (mut arena, by_id) = arena_with(&[1, 2, 3]);
        let spec = vec![
            vec![RadioEntry::from(1), RadioEntry::from(2)],
            vec![RadioEntry::from(2), RadioEntry::from(3)],
        ];

        let groups = build_exclusion_groups(&mut arena, &by_id, &spec);

        assert_eq!(groups.len(), 2);
        let two = arena.node(by_id[&GroupId::from(2)]).unwrap();
        assert_eq!(
            two.exclusion_groups,
            vec![ExclusionGroupId(0), ExclusionGroupId(1)]
        );
    }

    #[test]
    fn given_dangling_and_malformed_entries_when_building_then_dropped() {
        let (mut arena, by_id) = arena_with(&[1, 2]);
        let spec = vec![
            vec![
                RadioEntry::from(1),
                RadioEntry::from(99),
                RadioEntry::Unsupported(IgnoredAny),
                RadioEntry::from(2),
                RadioEntry::from(1),
            ],
            vec![RadioEntry::from(42)],
        ];

        let groups = build_exclusion_groups(&mut arena, &by_id, &spec);

        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].members(),
            &[by_id[&GroupId::from(1)], by_id[&GroupId::from(2)]]
        );
    }
}
