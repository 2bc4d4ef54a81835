//! Registry mutation engine.
//!
//! Adds and removes helper entries by splicing text into (or out of) a
//! registry file. Every edit is expressed as a positioned replacement; all
//! replacements for one operation are applied back-to-front in a single pass
//! and written with one `write` call, so a file is either fully updated or
//! left untouched.

use crate::config::Config;
use crate::naming;
use crate::registry::{self, RegistryZones};
use crate::scanner;
use crate::templates;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("blank run pattern should be valid"));

/// A single text replacement with position information. Insertions have
/// `start == end`.
#[derive(Debug, Clone)]
struct Replacement {
    start: usize,
    end: usize,
    new_text: String,
}

impl Replacement {
    fn insert(at: usize, text: impl Into<String>) -> Self {
        Self {
            start: at,
            end: at,
            new_text: text.into(),
        }
    }

    fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            new_text: String::new(),
        }
    }
}

/// Applies replacements to `content`, returning the modified string.
///
/// Replacements are applied in descending offset order so earlier offsets
/// stay valid. Insertions sharing an offset end up in the order given.
fn apply_replacements(content: &str, replacements: Vec<Replacement>) -> String {
    let mut ordered: Vec<(usize, Replacement)> = replacements.into_iter().enumerate().collect();
    ordered.sort_by(|(ia, a), (ib, b)| b.start.cmp(&a.start).then(ib.cmp(ia)));

    let mut result = content.to_string();
    for (_, rep) in ordered {
        if rep.start <= result.len() && rep.end <= result.len() && rep.start <= rep.end {
            result.replace_range(rep.start..rep.end, &rep.new_text);
        }
    }
    result
}

/// Why a candidate was not added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The class, its field or its accessor is already registered (or staged earlier in the batch).
    Duplicate,
    /// The helper already imports its own accessor from this registry.
    Circular { accessor: String },
    /// The file declares no class.
    Unresolved,
    /// The candidate is a registry itself.
    Registry,
    Unreadable,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedHelper {
    pub name: String,
    pub file: PathBuf,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[derive(Debug, Default, Serialize)]
pub struct AdditionReport {
    pub added: Vec<String>,
    pub skipped: Vec<SkippedHelper>,
}

impl AdditionReport {
    pub fn skipped_names(&self) -> Vec<&str> {
        self.skipped.iter().map(|s| s.name.as_str()).collect()
    }

    /// True when every candidate was skipped and the file was not written.
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty()
    }
}

/// The four fragments generated for one accepted helper.
struct StagedEntry {
    class_name: String,
    import: String,
    field: String,
    accessor: String,
    export: String,
}

/// Registers each candidate helper file in the registry at `registry_path`.
///
/// Candidates are processed in the given order. A candidate is skipped when
/// it is a registry, when its class is already imported, its field or accessor
/// already declared, or an earlier candidate in the same batch claimed either.
/// Class names are read from the
/// candidate files now, not from an earlier scan. When nothing survives, the
/// registry is not written at all.
pub fn apply_helper_additions(
    registry_path: &Path,
    candidates: &[PathBuf],
    root: &Path,
    config: &Config,
) -> Result<AdditionReport> {
    let content = std::fs::read_to_string(registry_path)
        .with_context(|| format!("Failed to read {}", registry_path.display()))?;
    let zones = registry::parse(&content);
    let registry_class = registry_class_name(&zones, registry_path);

    let mut report = AdditionReport::default();
    let mut staged = Vec::new();
    let mut seen_classes = HashSet::new();
    let mut seen_fields = HashSet::new();

    for candidate in candidates {
        let text = match std::fs::read_to_string(candidate) {
            Ok(text) => text,
            Err(err) => {
                tracing::debug!(file = %candidate.display(), error = %err, "candidate unreadable");
                report.skipped.push(SkippedHelper {
                    name: display_name(candidate),
                    file: candidate.clone(),
                    reason: SkipReason::Unreadable,
                });
                continue;
            }
        };

        if same_file(candidate, registry_path) || scanner::is_registry_text(&text) {
            report.skipped.push(SkippedHelper {
                name: scanner::extract_class_name(&text).unwrap_or_else(|| display_name(candidate)),
                file: candidate.clone(),
                reason: SkipReason::Registry,
            });
            continue;
        }

        let Some(class_name) = scanner::extract_class_name(&text) else {
            report.skipped.push(SkippedHelper {
                name: scanner::guess_class_name(candidate, config),
                file: candidate.clone(),
                reason: SkipReason::Unresolved,
            });
            continue;
        };

        let field = naming::field_name(&class_name, &config.field_prefix);
        let accessor = naming::accessor_name(&class_name);
        let specifier = naming::import_specifier(registry_path, candidate, root, config);

        if zones.imports_class(&class_name)
            || zones.has_field(&field)
            || zones.accessor(&accessor).is_some()
            || export_span(&content, &accessor).is_some()
            || seen_classes.contains(&class_name)
            || seen_fields.contains(&field)
        {
            report.skipped.push(SkippedHelper {
                name: class_name,
                file: candidate.clone(),
                reason: SkipReason::Duplicate,
            });
            continue;
        }

        if helper_imports_own_accessor(&text, candidate, registry_path, &accessor, root, config) {
            report.skipped.push(SkippedHelper {
                name: class_name,
                file: candidate.clone(),
                reason: SkipReason::Circular { accessor },
            });
            continue;
        }

        seen_classes.insert(class_name.clone());
        seen_fields.insert(field.clone());
        staged.push(StagedEntry {
            import: templates::import_line(&class_name, &specifier),
            field: templates::field_declaration(&field, &class_name),
            accessor: templates::accessor_block(&accessor, &field, &class_name, config),
            export: templates::export_line(&accessor, &class_name, &registry_class, config),
            class_name,
        });
    }

    if staged.is_empty() {
        return Ok(report);
    }

    let anchors = registry::find_insertion_anchors(&content, &config.context_field);
    let mut replacements = Vec::with_capacity(4);

    let mut imports = line_break_before(&content, anchors.after_last_import);
    imports.extend(staged.iter().map(|e| e.import.as_str()));
    if zones.imports.is_empty() {
        imports.push('\n');
    }
    replacements.push(Replacement::insert(anchors.after_last_import, imports));

    let mut fields = line_break_before(&content, anchors.fields.offset);
    if anchors.fields.separated {
        fields.push('\n');
    }
    fields.extend(staged.iter().map(|e| e.field.as_str()));
    replacements.push(Replacement::insert(anchors.fields.offset, fields));

    let mut accessors = line_break_before(&content, anchors.accessors.offset);
    for entry in &staged {
        if anchors.accessors.placeholder {
            accessors.push_str(&entry.accessor);
            accessors.push('\n');
        } else {
            accessors.push('\n');
            accessors.push_str(&entry.accessor);
        }
    }
    replacements.push(Replacement::insert(anchors.accessors.offset, accessors));

    let mut exports = line_break_before(&content, content.len());
    exports.extend(staged.iter().map(|e| e.export.as_str()));
    replacements.push(Replacement::insert(content.len(), exports));

    let updated = apply_replacements(&content, replacements);
    std::fs::write(registry_path, updated)
        .with_context(|| format!("Failed to write {}", registry_path.display()))?;

    report.added = staged.into_iter().map(|e| e.class_name).collect();
    Ok(report)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// `"\n"` when `offset` is not at the start of a line, else empty.
fn line_break_before(content: &str, offset: usize) -> String {
    if offset == 0 || content[..offset].ends_with('\n') {
        String::new()
    } else {
        "\n".to_string()
    }
}

fn registry_class_name(zones: &RegistryZones, registry_path: &Path) -> String {
    zones.class_name.clone().unwrap_or_else(|| {
        let stem = display_name(registry_path);
        let stem = stem.split('.').next().unwrap_or(&stem);
        stem.split(['-', '_'])
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    None => String::new(),
                    Some(c) => c.to_uppercase().chain(chars).collect(),
                }
            })
            .collect()
    })
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Whether the helper source imports `accessor` from the registry itself,
/// which would make registering it circular.
pub fn helper_imports_own_accessor(
    helper_text: &str,
    helper_path: &Path,
    registry_path: &Path,
    accessor: &str,
    root: &Path,
    config: &Config,
) -> bool {
    registry::parse(helper_text).imports.iter().any(|import| {
        import.binds(accessor)
            && naming::resolve_import_base(helper_path, &import.specifier, root, config)
                .is_some_and(|base| naming::import_base_matches(&base, registry_path, config))
    })
}

/// Returns the accessor through which the registry already exposes the class
/// declared in `helper_path`, if any.
///
/// Callers use this to keep a helper from being offered its own accessor. The
/// registry must import the class; the accessor is matched by return type
/// first and by the `get<Class>` naming convention second.
pub fn detect_circular_usage(helper_path: &Path, registry_path: &Path) -> Result<Option<String>> {
    let helper = std::fs::read_to_string(helper_path)
        .with_context(|| format!("Failed to read {}", helper_path.display()))?;
    let Some(class_name) = scanner::extract_class_name(&helper) else {
        return Ok(None);
    };

    let content = std::fs::read_to_string(registry_path)
        .with_context(|| format!("Failed to read {}", registry_path.display()))?;
    let zones = registry::parse(&content);
    if !zones.imports_class(&class_name) {
        return Ok(None);
    }

    Ok(zones
        .accessor_returning(&class_name)
        .or_else(|| zones.accessor(&naming::accessor_name(&class_name)))
        .map(|a| a.name.clone()))
}

#[derive(Debug, Default, Serialize)]
pub struct RemovalReport {
    pub removed: Vec<String>,
    /// Names with no import, field, accessor or export in the registry.
    pub missing: Vec<String>,
}

/// Removes each named helper's import binding, field, accessor and export.
///
/// Sibling bindings in a shared import survive. Runs of blank lines left
/// behind are collapsed. Assumes the generator's own formatting; hand-edited
/// registries may be trimmed imprecisely.
pub fn apply_helper_removals(
    registry_path: &Path,
    class_names: &[String],
    config: &Config,
) -> Result<RemovalReport> {
    let content = std::fs::read_to_string(registry_path)
        .with_context(|| format!("Failed to read {}", registry_path.display()))?;
    let zones = registry::parse(&content);

    let mut report = RemovalReport::default();
    let mut replacements = Vec::new();
    let mut targets: HashSet<&str> = HashSet::new();

    for class_name in class_names {
        let field = naming::field_name(class_name, &config.field_prefix);
        let accessor = zones
            .accessor_returning(class_name)
            .or_else(|| zones.accessor(&naming::accessor_name(class_name)));
        let accessor_name = accessor
            .map(|a| a.name.clone())
            .unwrap_or_else(|| naming::accessor_name(class_name));
        let mut found = zones.imports_class(class_name);

        for decl in zones
            .fields
            .iter()
            .filter(|f| !f.is_static && (f.name == field || f.type_name == *class_name))
        {
            replacements.push(Replacement::delete(decl.span.start, decl.span.end));
            found = true;
        }

        if let Some(accessor) = accessor {
            let end = skip_blank_line(&content, accessor.span.end);
            replacements.push(Replacement::delete(accessor.span.start, end));
            found = true;
        }

        if let Some(span) = export_span(&content, &accessor_name) {
            replacements.push(Replacement::delete(span.0, span.1));
            found = true;
        }

        if found {
            targets.insert(class_name.as_str());
            report.removed.push(class_name.clone());
        } else {
            report.missing.push(class_name.clone());
        }
    }

    for import in &zones.imports {
        if let Some(rep) = prune_import(&content, import, &targets) {
            replacements.push(rep);
        }
    }

    if replacements.is_empty() {
        return Ok(report);
    }

    let updated = apply_replacements(&content, replacements);
    let updated = BLANK_RUN.replace_all(&updated, "\n\n").into_owned();
    std::fs::write(registry_path, updated)
        .with_context(|| format!("Failed to write {}", registry_path.display()))?;
    Ok(report)
}

/// Drops `targets` from an import, deleting the statement when nothing is left.
fn prune_import(
    content: &str,
    import: &registry::ImportStatement,
    targets: &HashSet<&str>,
) -> Option<Replacement> {
    let hit = |name: &str| targets.contains(name);
    let default_hit = import.default_binding.as_deref().is_some_and(hit);
    let kept: Vec<&registry::ImportBinding> = import
        .bindings
        .iter()
        .filter(|b| !hit(&b.imported) && !hit(&b.local))
        .collect();

    if !default_hit && kept.len() == import.bindings.len() {
        return None;
    }

    let default_kept = import.default_binding.as_ref().filter(|_| !default_hit);
    if kept.is_empty() && default_kept.is_none() {
        return Some(Replacement::delete(import.span.start, import.span.end));
    }

    let names = kept.iter().map(|b| b.raw.as_str()).collect::<Vec<_>>().join(", ");
    match (&import.bindings_span, default_hit) {
        (Some(span), false) => Some(Replacement {
            start: span.start,
            end: span.end,
            new_text: format!(" {} ", names),
        }),
        _ => {
            let statement = match (default_kept, names.is_empty()) {
                (Some(default), true) => format!("import {} from '{}';", default, import.specifier),
                (Some(default), false) => {
                    format!("import {}, {{ {} }} from '{}';", default, names, import.specifier)
                }
                (None, _) => format!("import {{ {} }} from '{}';", names, import.specifier),
            };
            let newline = if content[import.span.clone()].ends_with('\n') { "\n" } else { "" };
            Some(Replacement {
                start: import.span.start,
                end: import.span.end,
                new_text: format!("{}{}", statement, newline),
            })
        }
    }
}

/// Extends `end` over one following whitespace-only line.
fn skip_blank_line(content: &str, end: usize) -> usize {
    let next = registry::line_end(content, end);
    if next > end && content[end..next].trim().is_empty() {
        next
    } else {
        end
    }
}

fn export_span(content: &str, accessor: &str) -> Option<(usize, usize)> {
    let pattern = format!(r"(?m)^export[ \t]+const[ \t]+{}\b", regex::escape(accessor));
    let re = Regex::new(&pattern).ok()?;
    let m = re.find(content)?;
    Some((m.start(), registry::line_end(content, m.start())))
}

/// Inserts a call to `accessor` at `line` (1-indexed) of `target`, importing
/// it from the registry module when the file does not already.
///
/// An existing named import from the same module is extended instead of
/// adding a second statement. The call is never placed above the imports.
pub fn insert_helper_usage(
    target: &Path,
    line: usize,
    registry_path: &Path,
    accessor: &str,
    class_name: &str,
    root: &Path,
    config: &Config,
) -> Result<()> {
    let content = std::fs::read_to_string(target)
        .with_context(|| format!("Failed to read {}", target.display()))?;
    let zones = registry::parse(&content);
    let specifier = naming::import_specifier(target, registry_path, root, config);
    let mut replacements = Vec::new();

    if !zones.imports_class(accessor) {
        let same_module = zones
            .imports
            .iter()
            .find(|i| i.specifier == specifier && i.bindings_span.is_some());
        match same_module.and_then(|i| i.bindings_span.clone().map(|s| (i, s))) {
            Some((import, span)) => {
                let mut names: Vec<&str> = import.bindings.iter().map(|b| b.raw.as_str()).collect();
                names.push(accessor);
                replacements.push(Replacement {
                    start: span.start,
                    end: span.end,
                    new_text: format!(" {} ", names.join(", ")),
                });
            }
            None => {
                let offset = zones.last_import_end.unwrap_or(0);
                let mut text = line_break_before(&content, offset);
                text.push_str(&templates::import_line(accessor, &specifier));
                if zones.imports.is_empty() {
                    text.push('\n');
                }
                replacements.push(Replacement::insert(offset, text));
            }
        }
    }

    let offset = line_offset(&content, line).max(zones.last_import_end.unwrap_or(0));
    let indent = usage_indent(&content, offset);
    let mut usage = line_break_before(&content, offset);
    usage.push_str(&templates::usage_statement(
        &indent,
        &naming::variable_name(class_name),
        accessor,
    ));
    replacements.push(Replacement::insert(offset, usage));

    let updated = apply_replacements(&content, replacements);
    std::fs::write(target, updated)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(())
}

/// Indentation for a statement inserted at `offset`: that of the previous
/// non-blank line, one level deeper when the line opens a block.
fn usage_indent(content: &str, offset: usize) -> String {
    let Some(previous) = content[..offset].lines().rev().find(|l| !l.trim().is_empty()) else {
        return String::new();
    };
    let mut indent: String = previous
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    if previous.trim_end().ends_with('{') {
        indent.push_str(if indent.starts_with('\t') { "\t" } else { "    " });
    }
    indent
}

/// Byte offset where 1-indexed `line` starts, clamped to the end of text.
fn line_offset(content: &str, line: usize) -> usize {
    if line <= 1 {
        return 0;
    }
    content
        .match_indices('\n')
        .nth(line - 2)
        .map(|(i, _)| i + 1)
        .unwrap_or(content.len())
}
