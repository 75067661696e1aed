use termtree::Tree;
use tracing::instrument;

use crate::domain::{LayerModel, NodeId, NodeState};

pub trait TreeNodeConvert {
    fn to_tree_string(&self, show_ids: bool) -> Tree<String>;
}

impl TreeNodeConvert for LayerModel {
    #[instrument(level = "debug", skip(self))]
    fn to_tree_string(&self, show_ids: bool) -> Tree<String> {
        fn build_tree(model: &LayerModel, node: NodeId, parent_tree: &mut Tree<String>, show_ids: bool) {
            let Some(children) = model.arena().get_node(node).map(|n| n.children.clone()) else {
                return;
            };
            for child in children {
                let mut child_tree = Tree::new(label(model, child, show_ids));
                build_tree(model, child, &mut child_tree, show_ids);
                parent_tree.push(child_tree);
            }
        }

        let mut tree = Tree::new("layers".to_string());
        build_tree(self, self.root(), &mut tree, show_ids);
        tree
    }
}

/// `[x] Name`, `[ ] Name` or the bare caption for headings.
fn label(model: &LayerModel, node: NodeId, show_ids: bool) -> String {
    let Some(tree_node) = model.arena().get_node(node) else {
        return String::new();
    };
    let marker = match tree_node.state {
        NodeState::On => "[x] ",
        NodeState::Off => "[ ] ",
        NodeState::HeadingOnly => "",
    };
    let mut text = format!("{}{}", marker, tree_node.name());
    if let (true, Some(group)) = (show_ids, tree_node.group()) {
        text.push_str(&format!(" ({})", group.id));
    }
    if !tree_node.is_heading() && !model.is_enabled(node).unwrap_or(true) {
        text.push_str(" (inactive)");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentGroup, OrderEntry, TreeBuilder, Visibility};

    #[test]
    fn given_model_when_rendering_then_marks_states_and_captions() {
        let groups = vec![
            ContentGroup::new(1, "Roads", Visibility::Off),
            ContentGroup::new(2, "Labels", Visibility::On),
        ];
        let order = vec![
            OrderEntry::caption("Map"),
            OrderEntry::reference(1),
            OrderEntry::Nested(vec![OrderEntry::reference(2)]),
        ];
        let model = TreeBuilder::new().build(groups, Some(order.as_slice()), None);

        let rendered = model.to_tree_string(true).to_string();

        assert!(rendered.starts_with("layers\n"));
        assert!(rendered.contains("Map\n"));
        assert!(rendered.contains("[ ] Roads (1 0 R)"));
        assert!(rendered.contains("[x] Labels (2 0 R) (inactive)"));
    }
}
