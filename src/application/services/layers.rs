//! Layer description service
//!
//! Loads layer descriptions, applies visibility toggles and prepares the
//! model for display.

use std::path::Path;
use std::sync::Arc;

use termtree::Tree;
use tracing::{debug, instrument};

use crate::application::document::LayerDocument;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::{GroupId, LayerModel, NodeState, UnreferencedGroups, Visibility};
use crate::infrastructure::traits::FileSystem;
use crate::tree_traits::TreeNodeConvert;

/// One requested visibility change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggle {
    pub id: GroupId,
    pub visibility: Visibility,
}

/// A group whose state moved because of a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedGroup {
    pub id: GroupId,
    pub name: String,
    pub state: NodeState,
}

/// Outcome of one [`Toggle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleReport {
    pub toggle: Toggle,
    /// Toggled group first, then groups cleared by exclusion
    pub changed: Vec<ChangedGroup>,
}

/// Row of a state listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStatus {
    pub id: GroupId,
    pub name: String,
    pub state: NodeState,
    /// No ancestor group is off
    pub enabled: bool,
    /// Reachable from root
    pub placed: bool,
}

/// Service for working with layer description files.
pub struct LayerService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl LayerService {
    /// Create a new layer service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    /// Read and parse a layer description file.
    #[instrument(level = "debug", skip(self))]
    pub fn load_document(&self, path: &Path) -> ApplicationResult<LayerDocument> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::OperationFailed {
                context: format!("layer description not found: {}", path.display()),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "file does not exist",
                )),
            });
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read layer description", path)?;
        LayerDocument::parse(&content, path)
    }

    /// Load a file and build its model.
    ///
    /// `unreferenced` overrides the configured policy when given.
    pub fn open(
        &self,
        path: &Path,
        unreferenced: Option<UnreferencedGroups>,
    ) -> ApplicationResult<LayerModel> {
        let document = self.load_document(path)?;
        let policy = unreferenced.unwrap_or(self.settings.unreferenced_groups);
        debug!("open: policy={}", policy);
        Ok(document.to_model(policy))
    }

    /// Apply toggles in order, reporting what each one changed.
    ///
    /// Stops at the first id the model does not know.
    #[instrument(level = "debug", skip(self, model))]
    pub fn apply(
        &self,
        model: &mut LayerModel,
        toggles: &[Toggle],
    ) -> ApplicationResult<Vec<ToggleReport>> {
        let mut reports = Vec::with_capacity(toggles.len());

        for &toggle in toggles {
            let node = model
                .node_for_id(&toggle.id)
                .ok_or(ApplicationError::UnknownGroup(toggle.id))?;
            let change = model.set_state(node, toggle.visibility)?;

            let mut changed = Vec::with_capacity(change.nodes().len());
            for &id in change.nodes() {
                if let Some(group) = model.group_of(id) {
                    changed.push(ChangedGroup {
                        id: group.id,
                        name: group.name.clone(),
                        state: model.get_state(id)?,
                    });
                }
            }
            reports.push(ToggleReport { toggle, changed });
        }

        Ok(reports)
    }

    /// Every group in registry order with its current state.
    pub fn statuses(&self, model: &LayerModel) -> ApplicationResult<Vec<GroupStatus>> {
        let mut rows = Vec::with_capacity(model.group_nodes().len());
        for &node in model.group_nodes() {
            let Some(group) = model.group_of(node) else {
                continue;
            };
            rows.push(GroupStatus {
                id: group.id,
                name: group.name.clone(),
                state: model.get_state(node)?,
                enabled: model.is_enabled(node)?,
                placed: model.parent_of(node)?.is_some(),
            });
        }
        Ok(rows)
    }

    /// Tree rendering honoring the `show_ids` setting.
    pub fn render(&self, model: &LayerModel) -> Tree<String> {
        model.to_tree_string(self.settings.show_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;

    /// In-memory filesystem.
    struct MemFs(HashMap<PathBuf, String>);

    impl FileSystem for MemFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "missing"))
        }

        fn write(&self, _path: &Path, _content: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn exists(&self, path: &Path) -> bool {
            self.0.contains_key(path)
        }

        fn is_file(&self, path: &Path) -> bool {
            self.0.contains_key(path)
        }

        fn create_dir_all(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }
    }

    const DOC: &str = r#"
order = [1, "Extras", 2]
radio = [[1, 3]]

[[groups]]
id = 1
name = "Day"

[[groups]]
id = 2
name = "Grid"

[[groups]]
id = 3
name = "Night"
state = "off"
"#;

    fn service(settings: Settings) -> LayerService {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("map.toml"), DOC.to_string());
        LayerService::new(Arc::new(MemFs(files)), Arc::new(settings))
    }

    #[test]
    fn given_missing_file_when_loading_then_fails_with_path() {
        let err = service(Settings::default())
            .load_document(Path::new("nope.toml"))
            .unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn given_configured_policy_when_opening_then_argument_overrides() {
        let settings = Settings {
            unreferenced_groups: UnreferencedGroups::AppendToRoot,
            show_ids: false,
        };
        let svc = service(settings);

        let appended = svc.open(Path::new("map.toml"), None).unwrap();
        let night = appended.node_for_id(&GroupId::from(3)).unwrap();
        assert_eq!(appended.parent_of(night).unwrap(), Some(appended.root()));

        let omitted = svc
            .open(Path::new("map.toml"), Some(UnreferencedGroups::Omit))
            .unwrap();
        let night = omitted.node_for_id(&GroupId::from(3)).unwrap();
        assert_eq!(omitted.parent_of(night).unwrap(), None);
    }

    #[test]
    fn given_radio_toggle_when_applied_then_reports_cleared_member() {
        let svc = service(Settings::default());
        let mut model = svc.open(Path::new("map.toml"), None).unwrap();

        let reports = svc
            .apply(
                &mut model,
                &[Toggle {
                    id: GroupId::from(3),
                    visibility: Visibility::On,
                }],
            )
            .unwrap();

        let changed: Vec<_> = reports[0].changed.iter().map(|c| (c.name.as_str(), c.state)).collect();
        assert_eq!(changed, vec![("Night", NodeState::On), ("Day", NodeState::Off)]);
    }

    #[test]
    fn given_unknown_id_when_applied_then_errors() {
        let svc = service(Settings::default());
        let mut model = svc.open(Path::new("map.toml"), None).unwrap();
        let err = svc
            .apply(
                &mut model,
                &[Toggle {
                    id: GroupId::from(42),
                    visibility: Visibility::Off,
                }],
            )
            .unwrap_err();
        assert!(matches!(err, ApplicationError::UnknownGroup(_)));
    }

    #[test]
    fn given_model_when_listing_statuses_then_marks_unplaced_groups() {
        let svc = service(Settings::default());
        let model = svc.open(Path::new("map.toml"), None).unwrap();
        let statuses = svc.statuses(&model).unwrap();
        let placed: Vec<_> = statuses.iter().map(|s| s.placed).collect();
        assert_eq!(placed, vec![true, true, false]);
    }
}
