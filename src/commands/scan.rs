//! Read-only listing of registries and helper candidates.

use super::Session;
use crate::prompt::Prompter;
use crate::scanner::{self, ClassName};
use colored::Colorize;

/// Prints the registries and helper candidates the scanner sees.
pub fn run<P: Prompter>(session: &Session<P>) {
    let registries = scanner::find_registries(&session.root, &session.config);
    let helpers = scanner::find_candidate_helper_files(&session.root, &session.config);

    println!("Found {} registr(ies):", registries.len());
    for path in &registries {
        println!("  {}", session.display_path(path));
    }

    println!("Found {} helper candidate(s):", helpers.len());
    for helper in &helpers {
        let shown = session.display_path(&helper.file_path);
        match &helper.class_name {
            ClassName::Declared(name) => println!("  {} {}", name, shown.dimmed()),
            ClassName::Unresolved { guess } => println!(
                "  {} {} {}",
                guess.yellow(),
                shown.dimmed(),
                "(no class declaration)".dimmed()
            ),
        }
    }
}
