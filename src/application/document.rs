//! Layer description documents
//!
//! A layer description is the already-decoded optional content data of one
//! document, written as TOML:
//!
//! ```toml
//! base_state = "on"
//! off = [2]
//! order = [1, "Labels", 2, [3], 4]
//! radio = [[2, 3]]
//!
//! [[groups]]
//! id = 1
//! name = "Background"
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    ContentGroup, GroupId, LayerModel, OrderEntry, RadioEntry, TreeBuilder, UnreferencedGroups,
    Visibility,
};

/// One `[[groups]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupEntry {
    pub id: GroupId,
    pub name: String,
    /// Explicit state, wins over `base_state` and the on/off lists
    #[serde(default)]
    pub state: Option<Visibility>,
}

/// Parsed layer description file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerDocument {
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(default = "default_base_state")]
    pub base_state: Visibility,
    #[serde(default)]
    pub on: Vec<GroupId>,
    #[serde(default)]
    pub off: Vec<GroupId>,
    #[serde(default)]
    pub order: Option<Vec<OrderEntry>>,
    #[serde(default)]
    pub radio: Option<Vec<Vec<RadioEntry>>>,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
}

fn default_base_state() -> Visibility {
    Visibility::On
}

impl LayerDocument {
    /// Parse document content.
    ///
    /// # Arguments
    /// * `content` - TOML text
    /// * `path` - Origin of the text, used in error messages
    #[instrument(level = "debug", skip(content))]
    pub fn parse(content: &str, path: &Path) -> ApplicationResult<Self> {
        let mut document: LayerDocument =
            toml::from_str(content).map_err(|e| ApplicationError::InvalidDocument {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        document.path = path.to_path_buf();

        let mut seen = HashSet::new();
        for group in &document.groups {
            if !seen.insert(group.id) {
                return Err(ApplicationError::DuplicateGroup {
                    path: document.path.clone(),
                    id: group.id,
                });
            }
        }

        debug!(
            "parsed {} groups, order: {}, radio: {}",
            document.groups.len(),
            document.order.is_some(),
            document.radio.is_some()
        );
        Ok(document)
    }

    /// Initial state of one group entry.
    ///
    /// Explicit `state`, then the `off` list, then the `on` list, then
    /// `base_state`.
    pub fn initial_state(&self, entry: &GroupEntry) -> Visibility {
        if let Some(state) = entry.state {
            state
        } else if self.off.contains(&entry.id) {
            Visibility::Off
        } else if self.on.contains(&entry.id) {
            Visibility::On
        } else {
            self.base_state
        }
    }

    /// The group registry in document order.
    pub fn content_groups(&self) -> Vec<ContentGroup> {
        self.groups
            .iter()
            .map(|entry| ContentGroup::new(entry.id, entry.name.clone(), self.initial_state(entry)))
            .collect()
    }

    /// Build the layer model for this document.
    pub fn to_model(&self, unreferenced: UnreferencedGroups) -> LayerModel {
        TreeBuilder::new()
            .with_unreferenced(unreferenced)
            .build(
                self.content_groups(),
                self.order.as_deref(),
                self.radio.as_deref(),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeState;

    const DOC: &str = r#"
base_state = "off"
on = [2, 3]
off = [3]

[[groups]]
id = 1
name = "One"

[[groups]]
id = 2
name = "Two"

[[groups]]
id = 3
name = "Three"

[[groups]]
id = { num = 4, gen = 2 }
name = "Four"
state = "on"
"#;

    #[test]
    fn given_state_sources_when_resolving_then_follows_precedence() {
        let document = LayerDocument::parse(DOC, Path::new("doc.toml")).unwrap();
        let states: Vec<_> = document
            .content_groups()
            .into_iter()
            .map(|g| g.initial_state)
            .collect();
        assert_eq!(
            states,
            vec![Visibility::Off, Visibility::On, Visibility::Off, Visibility::On]
        );
    }

    #[test]
    fn given_no_order_when_building_model_then_flat_registry_order() {
        let document = LayerDocument::parse(DOC, Path::new("doc.toml")).unwrap();
        let model = document.to_model(UnreferencedGroups::Omit);

        assert_eq!(model.child_count(model.root()).unwrap(), 4);
        let four = model.node_for_id(&GroupId::new(4, 2)).unwrap();
        assert_eq!(model.row_of(four).unwrap(), 3);
        assert_eq!(model.get_state(four).unwrap(), NodeState::On);
    }

    #[test]
    fn given_duplicate_ids_when_parsing_then_rejects() {
        let content = r#"
[[groups]]
id = 7
name = "A"

[[groups]]
id = 7
name = "B"
"#;
        let err = LayerDocument::parse(content, Path::new("dup.toml")).unwrap_err();
        assert!(matches!(err, ApplicationError::DuplicateGroup { .. }));
        assert!(err.to_string().contains("7 0 R"));
    }

    #[test]
    fn given_broken_toml_when_parsing_then_reports_path() {
        let err = LayerDocument::parse("groups = [", Path::new("broken.toml")).unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }
}
