//! page-registry: generate and maintain a lazy page-object registry.
//!
//! Scaffolds registry and helper classes in a TypeScript workspace and keeps
//! the registry's imports, fields, accessors and exports in step with the
//! helpers it exposes.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Args, Commands, RegistriesCommand};
use colored::Colorize;
use page_registry::commands::{
    self, Outcome, Session, add_helpers::AddHelpers, cleanup::Cleanup,
    create_helper::CreateHelper, create_registry::CreateRegistry,
    delete_registry::DeleteRegistry, registries::RegistriesAction, remove_helper::RemoveHelper,
    use_helper::UseHelper,
};
use page_registry::{Config, PreferenceStore, TerminalPrompter};

fn main() {
    if let Err(err) = run() {
        eprintln!("{} {:#}", "error:".red().bold(), err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.global.verbose);

    let root = std::fs::canonicalize(&args.global.root)
        .with_context(|| format!("Workspace root {} not found", args.global.root.display()))?;
    let config = Config::load(&root, args.global.config.as_deref())?;
    let prefs = match args.global.prefs.clone().or_else(PreferenceStore::default_path) {
        Some(path) => PreferenceStore::open(path)?,
        None => {
            tracing::warn!("no config directory; registries will not be remembered");
            PreferenceStore::in_memory()
        }
    };
    let mut session = Session::new(root, config, prefs, TerminalPrompter::new());

    let outcome = match args.command {
        Commands::CreateRegistry {
            directory,
            name,
            label,
        } => commands::create_registry::run(
            &mut session,
            CreateRegistry {
                directory,
                name,
                label,
            },
        )?,
        Commands::Add { files, registry } => {
            commands::add_helpers::run(&mut session, AddHelpers { registry, files })?
        }
        Commands::NewHelper {
            directory,
            name,
            register,
            no_register,
            registry,
        } => commands::create_helper::run(
            &mut session,
            CreateHelper {
                directory,
                name,
                register: match (register, no_register) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                registry,
            },
        )?,
        Commands::Use {
            file,
            line,
            accessor,
            registry,
        } => commands::use_helper::run(
            &mut session,
            UseHelper {
                file,
                line,
                accessor,
                registry,
            },
        )?,
        Commands::Remove {
            classes,
            registry,
            delete_file,
            yes,
        } => commands::remove_helper::run(
            &mut session,
            RemoveHelper {
                registry,
                classes,
                delete_file,
                yes,
            },
        )?,
        Commands::DeleteRegistry { registry, yes } => {
            commands::delete_registry::run(&mut session, DeleteRegistry { registry, yes })?
        }
        Commands::Cleanup { registry, yes } => {
            commands::cleanup::run(&mut session, Cleanup { registry, yes })?
        }
        Commands::Validate { json, strict } => {
            let report = commands::validate::run(&session, json, args.global.verbose)?;
            if strict && report.has_errors() {
                bail!("Validation found {} error(s)", report.diagnostics.errors);
            }
            Outcome::Completed
        }
        Commands::Registries { action } => {
            let action = match action.unwrap_or(RegistriesCommand::List) {
                RegistriesCommand::List => RegistriesAction::List,
                RegistriesCommand::Label { path, label } => RegistriesAction::Label { path, label },
                RegistriesCommand::Forget { path } => RegistriesAction::Forget { path },
                RegistriesCommand::Clear { yes } => RegistriesAction::Clear { yes },
                RegistriesCommand::Sort { order } => RegistriesAction::Sort { order },
            };
            commands::registries::run(&mut session, action)?
        }
        Commands::Scan => {
            commands::scan::run(&session);
            Outcome::Completed
        }
    };

    if outcome == Outcome::Cancelled {
        eprintln!("{} Cancelled; nothing was changed", "info:".blue().bold());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .init();
}
