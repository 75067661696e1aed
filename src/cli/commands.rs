use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::Toggle;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::UnreferencedGroups;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

pub fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    let unreferenced = cli.unreferenced.map(UnreferencedGroups::from);
    match &cli.command {
        Some(Commands::Tree { file }) => _tree(container, file, unreferenced),
        Some(Commands::States { file }) => _states(container, file, unreferenced),
        Some(Commands::Toggle { file, changes }) => {
            _toggle(container, file, changes, unreferenced)
        }
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => _config_show(container),
            ConfigCommands::Init => _config_init(container),
            ConfigCommands::Path => _config_path(cli),
        },
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `layertree --help`".to_string(),
        )),
    }
}

#[instrument(skip(container))]
fn _tree(
    container: &ServiceContainer,
    file: &Path,
    unreferenced: Option<UnreferencedGroups>,
) -> CliResult<()> {
    let model = container.layers.open(file, unreferenced)?;
    debug!("tree depth: {}", model.arena().depth());
    output::info(&container.layers.render(&model));
    Ok(())
}

#[instrument(skip(container))]
fn _states(
    container: &ServiceContainer,
    file: &Path,
    unreferenced: Option<UnreferencedGroups>,
) -> CliResult<()> {
    let model = container.layers.open(file, unreferenced)?;
    let statuses = container.layers.statuses(&model)?;
    if statuses.is_empty() {
        output::warning(&format!("{} defines no content groups", file.display()));
        return Ok(());
    }

    for status in statuses {
        let mut notes = Vec::new();
        if !status.enabled {
            notes.push("inactive");
        }
        if !status.placed {
            notes.push("not in tree");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!("  ({})", notes.iter().join(", "))
        };
        output::info(&format!(
            "{:<10} {:<4} {}{}",
            status.id.to_string(),
            output::state(status.state),
            status.name,
            notes
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _toggle(
    container: &ServiceContainer,
    file: &Path,
    changes: &[Toggle],
    unreferenced: Option<UnreferencedGroups>,
) -> CliResult<()> {
    let mut model = container.layers.open(file, unreferenced)?;
    let reports = container.layers.apply(&mut model, changes)?;

    for report in &reports {
        let label = format!("{} {}", report.toggle.id, report.toggle.visibility);
        if report.changed.is_empty() {
            output::action(&label, "no change");
            continue;
        }
        output::action(
            &label,
            &format!("{} group(s) changed", report.changed.len()),
        );
        for changed in &report.changed {
            output::detail(&format!(
                "{} {} -> {}",
                changed.id,
                changed.name,
                output::state(changed.state)
            ));
        }
    }

    println!();
    output::info(&container.layers.render(&model));
    Ok(())
}

fn _config_show(container: &ServiceContainer) -> CliResult<()> {
    output::header("Effective configuration");
    output::info(&container.settings.to_toml()?);
    Ok(())
}

fn _config_init(container: &ServiceContainer) -> CliResult<()> {
    let path = global_config_path()
        .ok_or_else(|| CliError::Usage("cannot determine config directory".to_string()))?;
    init_config_at(container.fs.as_ref(), &path)?;
    output::success(&format!("created {}", path.display()));
    Ok(())
}

/// Write the settings template to `path`, refusing to overwrite.
pub fn init_config_at(fs: &dyn FileSystem, path: &Path) -> CliResult<()> {
    if fs.exists(path) {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    write_template(fs, path)?;
    Ok(())
}

fn write_template(fs: &dyn FileSystem, path: &Path) -> InfraResult<()> {
    if let Some(parent) = path.parent() {
        fs.create_dir_all(parent)
            .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
    }
    fs.write(path, &Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))
}

fn _config_path(cli: &Cli) -> CliResult<()> {
    match global_config_path() {
        Some(path) => output::action("global", &path.display()),
        None => output::action("global", "unavailable"),
    }
    if let Some(local) = &cli.config {
        output::action("local", &local.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;
    use tempfile::TempDir;

    #[test]
    fn given_no_config_when_init_then_writes_template_and_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("layertree.toml");

        init_config_at(&RealFileSystem, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, Settings::template());
    }

    #[test]
    fn given_existing_config_when_init_then_refuses_and_keeps_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("layertree.toml");
        std::fs::write(&path, "show_ids = true\n").unwrap();

        let err = init_config_at(&RealFileSystem, &path).unwrap_err();

        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "show_ids = true\n");
    }

    #[test]
    fn given_unwritable_target_when_init_then_io_error() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let err = init_config_at(&RealFileSystem, &blocker.join("layertree.toml")).unwrap_err();

        assert!(matches!(err, CliError::Infra(InfraError::Io { .. })));
        assert_eq!(err.exit_code(), crate::exitcode::IOERR);
    }
}
