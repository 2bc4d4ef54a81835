//! Command-line interface definitions.
//!
//! Defines the argument parser and subcommands using clap's derive API.
//! Each subcommand maps to one workflow in [`page_registry::commands`].
//! Anything not given on the command line is asked for interactively.

use clap::{Parser, Subcommand};
use page_registry::prefs::SortOrder;
use std::path::PathBuf;

/// Generate and maintain a lazy page-object registry for TypeScript test suites.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// Workspace root. Defaults to current directory.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file. Defaults to the nearest `page-registry.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Preferences file. Defaults to `$PAGE_REGISTRY_PREFS` or the user config dir.
    #[arg(long, global = true)]
    pub prefs: Option<PathBuf>,

    /// Print additional diagnostics to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new registry class.
    CreateRegistry {
        /// Directory to create it in.
        directory: Option<PathBuf>,

        /// Registry class name (e.g., MainFactory).
        #[arg(short, long)]
        name: Option<String>,

        /// Display label remembered for the registry.
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Register helper classes in a registry.
    Add {
        /// Helper files to add. Offers a pick list when omitted.
        files: Vec<PathBuf>,

        /// Registry file. Defaults to a remembered or discovered one.
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Create a new helper class file.
    NewHelper {
        /// Directory to create it in.
        directory: Option<PathBuf>,

        /// Class name; the configured suffix is appended when missing.
        #[arg(short, long)]
        name: Option<String>,

        /// Register the new class without asking.
        #[arg(long, conflicts_with = "no_register")]
        register: bool,

        /// Do not register the new class.
        #[arg(long)]
        no_register: bool,

        /// Registry to register it in.
        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Insert a helper accessor call into a source file.
    Use {
        /// File to edit.
        file: PathBuf,

        /// Line (1-indexed) the call is inserted before.
        #[arg(short, long, default_value_t = 1)]
        line: usize,

        /// Accessor to use (e.g., getLoginPage). Offers a pick list when omitted.
        #[arg(short, long)]
        accessor: Option<String>,

        #[arg(short, long)]
        registry: Option<PathBuf>,
    },

    /// Remove helpers from a registry.
    Remove {
        /// Class names to remove. Offers a pick list when omitted.
        classes: Vec<String>,

        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Also delete the helper files. Refused while other files reference them.
        #[arg(long)]
        delete_file: bool,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete a registry file and forget it.
    DeleteRegistry {
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Remove registry entries whose helper files no longer exist.
    Cleanup {
        #[arg(short, long)]
        registry: Option<PathBuf>,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Check registries and helpers across the workspace.
    Validate {
        /// Emit JSON instead of human-readable output.
        #[arg(long)]
        json: bool,

        /// Exit with an error when any error-level finding exists.
        #[arg(long)]
        strict: bool,
    },

    /// Show or edit remembered registries.
    Registries {
        #[command(subcommand)]
        action: Option<RegistriesCommand>,
    },

    /// List registries and helper candidates without changing anything.
    Scan,
}

#[derive(Debug, Subcommand)]
pub enum RegistriesCommand {
    /// List remembered registries, most recently used first.
    List,

    /// Set the display label of a registry.
    Label { path: PathBuf, label: String },

    /// Forget a registry.
    Forget { path: PathBuf },

    /// Forget every registry.
    Clear {
        #[arg(short, long)]
        yes: bool,
    },

    /// Set how helper candidates are ordered (`name`, `path` or `modified`).
    Sort {
        #[arg(value_parser = parse_sort_order)]
        order: Option<SortOrder>,
    },
}

fn parse_sort_order(s: &str) -> Result<SortOrder, String> {
    match s {
        "name" => Ok(SortOrder::Name),
        "path" => Ok(SortOrder::Path),
        "modified" => Ok(SortOrder::Modified),
        _ => Err(format!(
            "Invalid sort order '{}', expected 'name', 'path' or 'modified'",
            s
        )),
    }
}
