//! Manages the remembered registry list.

use super::{Outcome, Session};
use crate::prefs::SortOrder;
use crate::prompt::Prompter;
use anyhow::{Result, bail};
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum RegistriesAction {
    List,
    Label { path: PathBuf, label: String },
    Forget { path: PathBuf },
    Clear { yes: bool },
    /// Sets how helper candidates are ordered; asks when `order` is absent.
    Sort { order: Option<SortOrder> },
}

pub fn run<P: Prompter>(session: &mut Session<P>, action: RegistriesAction) -> Result<Outcome> {
    match action {
        RegistriesAction::List => {
            let entries = session.prefs.list();
            if entries.is_empty() {
                println!("No remembered registries");
            }
            for entry in entries {
                let path = session.display_path(&entry.path);
                if entry.is_stale() {
                    println!("  {} {} {}", entry.label.bold(), path.dimmed(), "(missing)".red());
                } else {
                    println!("  {} {}", entry.label.bold(), path.dimmed());
                }
            }
            println!("Helper order: {}", session.prefs.sort_order().label());
        }
        RegistriesAction::Label { path, label } => {
            let path = session.resolve_path(&path);
            if session.prefs.get(&path).is_none() && !path.is_file() {
                bail!("{} is not a remembered registry", path.display());
            }
            session.prefs.upsert(&path, Some(&label))?;
            session.success(format!("Labelled {} '{}'", session.display_path(&path), label));
        }
        RegistriesAction::Forget { path } => {
            let path = session.resolve_path(&path);
            if session.prefs.remove(&path)? {
                session.success(format!("Forgot {}", session.display_path(&path)));
            } else {
                session.info(format!("{} was not remembered", session.display_path(&path)));
            }
        }
        RegistriesAction::Clear { yes } => {
            if !yes && !session.ui.confirm("Forget every remembered registry?", false)? {
                return Ok(Outcome::Cancelled);
            }
            session.prefs.clear()?;
            session.success("Forgot all registries");
        }
        RegistriesAction::Sort { order } => {
            let order = match order {
                Some(order) => order,
                None => {
                    let items: Vec<String> =
                        SortOrder::ALL.iter().map(|o| o.label().to_string()).collect();
                    match session.ui.choose("Order helpers by", &items)? {
                        Some(index) => SortOrder::ALL[index],
                        None => return Ok(Outcome::Cancelled),
                    }
                }
            };
            session.prefs.set_sort_order(order)?;
            session.success(format!("Helpers are now ordered by {}", order.label()));
        }
    }
    Ok(Outcome::Completed)
}
