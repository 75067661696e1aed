//! Tree builder: registers content groups and decodes the display order.

use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::domain::arena::{NodeArena, NodeId};
use crate::domain::entities::{ContentGroup, GroupId, OrderEntry, RadioEntry, UnreferencedGroups};
use crate::domain::model::LayerModel;
use crate::domain::radio::build_exclusion_groups;

/// Constructs a [`LayerModel`] from the group registry and the two descriptors.
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder {
    unreferenced: UnreferencedGroups,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose how groups missing from a present display order are shown.
    pub fn with_unreferenced(mut self, unreferenced: UnreferencedGroups) -> Self {
        self.unreferenced = unreferenced;
        self
    }

    /// Build the model.
    ///
    /// Decoding is best effort: dangling references and unsupported entries
    /// are skipped, never fatal. An absent or empty order puts every group
    /// directly under root in registry order.
    #[instrument(level = "debug", skip_all, fields(groups = groups.len()))]
    pub fn build(
        &self,
        groups: Vec<ContentGroup>,
        order: Option<&[OrderEntry]>,
        radio: Option<&[Vec<RadioEntry>]>,
    ) -> LayerModel {
        let mut arena = NodeArena::new();
        let (registry, by_id) = register_groups(&mut arena, groups);
        let root = arena.root();

        match order.filter(|entries| !entries.is_empty()) {
            Some(entries) => {
                decode_order(&mut arena, &by_id, entries, root, root);
                if self.unreferenced == UnreferencedGroups::AppendToRoot {
                    attach_unplaced(&mut arena, &registry);
                }
            }
            None => {
                debug!("no display order, flat fallback");
                for &node in &registry {
                    arena.attach(root, node);
                }
            }
        }

        let exclusion = radio
            .map(|spec| build_exclusion_groups(&mut arena, &by_id, spec))
            .unwrap_or_default();

        LayerModel::from_parts(arena, registry, by_id, exclusion)
    }
}

/// Wrap every group in a node, keeping registry order.
fn register_groups(
    arena: &mut NodeArena,
    groups: Vec<ContentGroup>,
) -> (Vec<NodeId>, HashMap<GroupId, NodeId>) {
    let mut registry = Vec::with_capacity(groups.len());
    let mut by_id = HashMap::with_capacity(groups.len());

    for group in groups {
        let id = group.id;
        let node = arena.insert_group(group);
        if by_id.insert(id, node).is_some() {
            warn!("duplicate content group {}, later entry wins lookup", id);
        }
        registry.push(node);
    }

    (registry, by_id)
}

/// Decode one level of the display order.
///
/// `parent` receives references and captions; `anchor` is the node the next
/// nested list hangs under. A caption becomes both for the rest of the level.
fn decode_order(
    arena: &mut NodeArena,
    by_id: &HashMap<GroupId, NodeId>,
    entries: &[OrderEntry],
    mut parent: NodeId,
    mut anchor: NodeId,
) {
    for entry in entries {
        match entry {
            OrderEntry::Reference(group_id) => {
                let Some(&node) = by_id.get(group_id) else {
                    debug!("order: unknown group {}, skipped", group_id);
                    continue;
                };
                if arena.attach(parent, node) {
                    anchor = node;
                } else {
                    debug!("order: group {} already placed, skipped", group_id);
                }
            }
            OrderEntry::Nested(items) => {
                decode_order(arena, by_id, items, anchor, anchor);
            }
            OrderEntry::Caption(text) => {
                let heading = arena.insert_heading(text.clone());
                arena.attach(parent, heading);
                parent = heading;
                anchor = heading;
            }
            OrderEntry::Unsupported(_) => {
                debug!("order: unsupported entry skipped");
            }
        }
    }
}

fn attach_unplaced(arena: &mut NodeArena, registry: &[NodeId]) {
    let root = arena.root();
    for &node in registry {
        let placed = arena
            .get_node(node)
            .is_some_and(|n| n.parent.is_some());
        if !placed {
            arena.attach(root, node);
        }
    }
}
