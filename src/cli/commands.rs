//! Command dispatch
//!
//! Data goes to the `out` writer so commands can be exercised in tests;
//! diagnostics go to stderr via [`output`](crate::cli::output).

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{
    property_controls, ControlKind, FlagSetting, PropagationReport,
};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{resolve_context, Context, Expr, TreeArena};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

pub fn execute_command(cli: &Cli, out: &mut dyn Write) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Eval { expr, set }) => _eval(cli, expr, set, out),
        Some(Commands::Parse { expr }) => _parse(expr, out),
        Some(Commands::Show { document }) => _show(cli, document, out),
        Some(Commands::Context { document, node }) => _context(cli, document, node, out),
        Some(Commands::Set {
            document,
            node,
            value,
        }) => _set(cli, document, node, value, out),
        Some(Commands::Flag {
            document,
            node,
            flag,
            setting,
        }) => _flag(cli, document, node, flag, (*setting).into(), out),
        Some(Commands::Controls { document }) => _controls(cli, document, out),
        Some(Commands::Config { command }) => _config(cli, command, out),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, out);
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `jobad --help`".to_string(),
        )),
    }
}

fn write_out(out: &mut dyn Write, text: impl std::fmt::Display) -> CliResult<()> {
    writeln!(out, "{}", text).map_err(|e| InfraError::io("write output", e).into())
}

/// Settings layered with the local config of `document`'s directory (or `-C`).
fn services_for(cli: &Cli, document: Option<&Path>) -> CliResult<ServiceContainer> {
    let dir: Option<PathBuf> = cli.config_dir.clone().or_else(|| {
        document
            .and_then(Path::parent)
            .map(|p| {
                if p.as_os_str().is_empty() {
                    PathBuf::from(".")
                } else {
                    p.to_path_buf()
                }
            })
    });
    let settings = Settings::load(dir.as_deref())?;
    debug!("settings: {:?}", settings);
    Ok(ServiceContainer::new(settings))
}

/// Load `document` and run the initial visibility pass.
fn load_evaluated(services: &ServiceContainer, document: &Path) -> CliResult<TreeArena> {
    let mut tree = services.documents.load(document)?;
    let report = services.visibility.propagate_all(&mut tree)?;
    warn_skipped(&report);
    Ok(tree)
}

fn warn_skipped(report: &PropagationReport) {
    for skipped in &report.skipped {
        output::warning(&format!("{}: {}", skipped.id, skipped.reason));
    }
}

#[instrument(skip(cli, out))]
fn _eval(cli: &Cli, expr: &str, set: &[(String, String)], out: &mut dyn Write) -> CliResult<()> {
    let services = services_for(cli, None)?;
    // Later --set values for the same name override earlier ones
    let ctx: Context = set.iter().rev().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    let parsed = Expr::parse(expr)?;
    let result = parsed.evaluate(&ctx, services.settings.comparison);
    debug!("{} in {} -> {}", parsed, ctx, result);
    write_out(out, result)
}

#[instrument(skip(out))]
fn _parse(expr: &str, out: &mut dyn Write) -> CliResult<()> {
    let parsed = Expr::parse(expr)?;
    write_out(out, &parsed)?;
    let props = parsed.properties();
    if !props.is_empty() {
        write_out(
            out,
            format!("properties: {}", props.into_iter().collect::<Vec<_>>().join(", ")),
        )?;
    }
    Ok(())
}

#[instrument(skip(cli, out))]
fn _show(cli: &Cli, document: &Path, out: &mut dyn Write) -> CliResult<()> {
    let services = services_for(cli, Some(document))?;
    let tree = load_evaluated(&services, document)?;
    write_out(out, tree.to_tree_string())
}

#[instrument(skip(cli, out))]
fn _context(cli: &Cli, document: &Path, node: &str, out: &mut dyn Write) -> CliResult<()> {
    let services = services_for(cli, Some(document))?;
    let tree = services.documents.load(document)?;
    let ctx = resolve_context(&tree, tree.find(node)?)?;
    if ctx.is_empty() {
        output::warning(&format!("{} inherits no properties", node));
    }
    for (name, value) in ctx.iter() {
        write_out(out, format!("{}={}", name, value))?;
    }
    Ok(())
}

#[instrument(skip(cli, out))]
fn _set(cli: &Cli, document: &Path, node: &str, value: &str, out: &mut dyn Write) -> CliResult<()> {
    let services = services_for(cli, Some(document))?;
    let mut tree = load_evaluated(&services, document)?;
    let idx = tree.find(node)?;
    let report = services.trigger.on_property_change(&mut tree, idx, value)?;
    warn_skipped(&report);
    output::success(&format!(
        "{} = {} ({} changed, scope {})",
        node, value, report.changed, services.settings.change_scope
    ));
    write_out(out, tree.to_tree_string())
}

#[instrument(skip(cli, out))]
fn _flag(
    cli: &Cli,
    document: &Path,
    node: &str,
    flag: &str,
    setting: FlagSetting,
    out: &mut dyn Write,
) -> CliResult<()> {
    let services = services_for(cli, Some(document))?;
    let mut tree = load_evaluated(&services, document)?;
    let idx = tree.find(node)?;
    let report = services.trigger.set_display_flag(&mut tree, idx, flag, setting)?;
    warn_skipped(&report);
    let effective = match tree.resolve_flag(idx, flag)? {
        Some(true) => "show",
        Some(false) => "hide",
        None => "unset",
    };
    write_out(out, format!("{}.{} = {}", node, flag, effective))?;
    write_out(out, tree.to_tree_string())
}

#[instrument(skip(cli, out))]
fn _controls(cli: &Cli, document: &Path, out: &mut dyn Write) -> CliResult<()> {
    let services = services_for(cli, Some(document))?;
    let tree = services.documents.load(document)?;
    for control in property_controls(&tree) {
        let widget = match &control.kind {
            ControlKind::Checkbox { checked } => {
                format!("[{}]", if *checked { "x" } else { " " })
            }
            ControlKind::TextField { value, size } => format!("[{:<width$}]", value, width = *size),
        };
        write_out(
            out,
            format!("{} {} ({}@{})", widget, control.label, control.name, control.node_id),
        )?;
    }
    Ok(())
}

#[instrument(skip(cli, out))]
fn _config(cli: &Cli, command: &ConfigCommands, out: &mut dyn Write) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load(cli.config_dir.as_deref())?;
            write_out(out, settings.to_toml()?)
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(p) => write_out(out, format!("global: {}", p.display()))?,
                None => output::warning("no home directory, global config disabled"),
            }
            let dir = cli.config_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            write_out(out, format!("local:  {}", local_config_path(&dir).display()))
        }
        ConfigCommands::Template => write_out(out, Settings::template()),
    }
}
