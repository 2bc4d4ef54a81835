//! page-registry library for generating and maintaining page-object registries.
//!
//! A registry is a generated TypeScript singleton class that lazily constructs
//! and caches "page" helper objects, one accessor per helper. This library
//! provides programmatic access to everything the CLI does:
//!
//! 1. **Scanning**: find registries and helper classes by their content
//! 2. **Editing**: splice helper entries into and out of a registry's text
//! 3. **Analysis**: report nesting, orphaned entries and circular imports
//!
//! # Example
//!
//! ```no_run
//! use page_registry::{Config, rewriter, scanner};
//! use std::path::Path;
//!
//! let root = Path::new("./tests");
//! let config = Config::load(root, None).unwrap();
//!
//! let registry = scanner::find_first_registry(root, &config).expect("no registry");
//! let helpers: Vec<_> = scanner::find_candidate_helper_files(root, &config)
//!     .into_iter()
//!     .map(|h| h.file_path)
//!     .collect();
//!
//! let report = rewriter::apply_helper_additions(&registry, &helpers, root, &config).unwrap();
//! println!("Added {:?}, skipped {:?}", report.added, report.skipped_names());
//! ```

pub mod analyzer;
pub mod commands;
pub mod config;
pub mod naming;
pub mod prefs;
pub mod prompt;
pub mod registry;
pub mod rewriter;
pub mod scanner;
pub mod templates;

// Re-export commonly used types at crate root
pub use analyzer::{Diagnostics, Finding, ValidationReport};
pub use config::Config;
pub use prefs::{PreferenceStore, RegistryEntry};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use rewriter::{AdditionReport, RemovalReport};
pub use scanner::{ClassName, HelperClassDescriptor};
