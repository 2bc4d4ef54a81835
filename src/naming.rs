//! Identifier and import-path helpers.
//!
//! Pure string/path functions shared by the scanner, the rewriter and the
//! orchestrators. Nothing here touches the filesystem.

use crate::config::{CaseStyle, Config, ImportStyle};
use std::path::{Component, Path, PathBuf};

/// Appends `suffix` unless `input` already ends with it (case-insensitively).
///
/// ```
/// use page_registry::naming::to_canonical_identifier;
///
/// assert_eq!(to_canonical_identifier("Login", "Page"), "LoginPage");
/// assert_eq!(to_canonical_identifier("LoginPage", "Page"), "LoginPage");
/// assert_eq!(to_canonical_identifier("Loginpage", "Page"), "Loginpage");
/// ```
pub fn to_canonical_identifier(input: &str, suffix: &str) -> String {
    let input = input.trim();
    if ends_with_ignore_case(input, suffix) {
        input.to_string()
    } else {
        format!("{}{}", input, suffix)
    }
}

/// Removes a trailing `suffix` (case-insensitively). Leaves the identifier
/// intact when stripping would empty it.
pub fn strip_identifier_suffix<'a>(identifier: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() || identifier.len() <= suffix.len() {
        return identifier;
    }
    if ends_with_ignore_case(identifier, suffix) {
        &identifier[..identifier.len() - suffix.len()]
    } else {
        identifier
    }
}

fn ends_with_ignore_case(value: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return true;
    }
    value.len() >= suffix.len()
        && value.is_char_boundary(value.len() - suffix.len())
        && value[value.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

/// Converts a PascalCase identifier to the given casing.
///
/// `Camel` lower-cases the first letter. `Kebab` and `Snake` additionally put
/// a separator before every interior capital and lower-case it.
pub fn to_field_case(identifier: &str, style: CaseStyle) -> String {
    let separator = match style {
        CaseStyle::Pascal => return identifier.to_string(),
        CaseStyle::Camel => None,
        CaseStyle::Kebab => Some('-'),
        CaseStyle::Snake => Some('_'),
    };

    let mut result = String::with_capacity(identifier.len() + 4);
    for (i, c) in identifier.chars().enumerate() {
        if i == 0 {
            result.extend(c.to_lowercase());
        } else if let Some(sep) = separator.filter(|_| c.is_uppercase()) {
            result.push(sep);
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

/// Private backing field for a helper class, e.g. `_loginPage`.
pub fn field_name(class_name: &str, prefix: &str) -> String {
    format!("{}{}", prefix, to_field_case(class_name, CaseStyle::Camel))
}

/// Public accessor for a helper class, e.g. `getLoginPage`.
pub fn accessor_name(class_name: &str) -> String {
    format!("get{}", upper_first(class_name))
}

/// Local variable name used when inserting a helper at a cursor.
pub fn variable_name(class_name: &str) -> String {
    to_field_case(class_name, CaseStyle::Camel)
}

/// File name (without extension) for a class under the configured casing.
pub fn file_stem(class_name: &str, config: &Config) -> String {
    let base = strip_identifier_suffix(class_name, &config.class_suffix);
    to_field_case(base, config.file_case)
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}

/// Literal suffix strip; no-op when `ext` is absent.
pub fn strip_known_extension<'a>(filename: &'a str, ext: &str) -> &'a str {
    filename.strip_suffix(ext).unwrap_or(filename)
}

/// Relative, POSIX-style module specifier from `from_file` to `to_file`.
///
/// Both paths are expected to be absolute. The result never carries `ext` and
/// always starts with `.`.
pub fn relative_import_specifier(from_file: &Path, to_file: &Path, ext: &str) -> String {
    let from_dir = from_file.parent().unwrap_or(Path::new("/"));
    let relative = relative_path(from_dir, to_file);
    let stripped = strip_known_extension(&relative, ext);
    if stripped.starts_with('.') {
        stripped.to_string()
    } else {
        format!("./{}", stripped)
    }
}

/// Module specifier honouring `import_style` and `import_prefix`.
///
/// Absolute imports are rooted at `root`; targets outside `root` fall back to
/// a relative specifier.
pub fn import_specifier(from_file: &Path, to_file: &Path, root: &Path, config: &Config) -> String {
    if config.import_style == ImportStyle::Absolute {
        if let Ok(rest) = to_file.strip_prefix(root) {
            let posix = posix_join(rest.components());
            let stripped = strip_known_extension(&posix, &config.source_extension);
            return format!("{}{}", config.import_prefix, stripped);
        }
    }
    relative_import_specifier(from_file, to_file, &config.source_extension)
}

/// Resolves a module specifier written in `from_file` to a path without
/// extension. Package imports (neither relative nor under `import_prefix`)
/// resolve to `None`.
pub fn resolve_import_base(
    from_file: &Path,
    specifier: &str,
    root: &Path,
    config: &Config,
) -> Option<PathBuf> {
    let joined = if specifier.starts_with('.') {
        from_file.parent()?.join(specifier)
    } else if !config.import_prefix.is_empty() {
        root.join(specifier.strip_prefix(&config.import_prefix)?)
    } else {
        return None;
    };
    Some(normalize(&joined))
}

/// Existing file a resolved import base points at, trying the bare path, the
/// source extension and an `index` file.
pub fn existing_import_target(base: &Path, config: &Config) -> Option<PathBuf> {
    let with_ext = PathBuf::from(format!("{}{}", base.display(), config.source_extension));
    let index = base.join(format!("index{}", config.source_extension));
    [base.to_path_buf(), with_ext, index]
        .into_iter()
        .find(|p| p.is_file())
}

/// Whether a resolved import base refers to `file`.
pub fn import_base_matches(base: &Path, file: &Path, config: &Config) -> bool {
    let file = normalize(file);
    file == base
        || file.to_string_lossy() == format!("{}{}", base.display(), config.source_extension)
        || file == base.join(format!("index{}", config.source_extension))
}

/// Lexically resolves `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn relative_path(from_dir: &Path, to: &Path) -> String {
    let from: Vec<Component> = from_dir.components().filter(is_named).collect();
    let target: Vec<Component> = to.components().filter(is_named).collect();

    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for component in &target[common..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    parts.join("/")
}

fn is_named(component: &Component) -> bool {
    !matches!(component, Component::CurDir)
}

fn posix_join<'a>(components: impl Iterator<Item = Component<'a>>) -> String {
    components
        .filter(|c| matches!(c, Component::Normal(_)))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
