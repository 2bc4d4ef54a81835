//! Registry content model.
//!
//! Splits a registry file's raw text into its logical zones (imports, private
//! fields, accessors) using line-anchored regular expressions, and computes
//! where new fragments belong. This is not a TypeScript parser: files that
//! deviate from the generated formatting parse incompletely, and every anchor
//! degrades to a fallback rather than failing.
//!
//! All pattern matching against registry text lives here so the rewriter only
//! deals in byte offsets.

use crate::templates::ACCESSOR_PLACEHOLDER;
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// `import A, { B, C as D } from 'x';` (default and named parts optional).
static IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?m)^[ \t]*import[ \t]+(?:type[ \t]+)?(?:([A-Za-z_$][\w$]*)[ \t]*,?[ \t]*)?(?:\{([^}]*)\})?[ \t]*from[ \t]+['"]([^'"]+)['"][ \t]*;?[ \t]*\r?\n?"#,
    )
    .expect("import pattern should be valid")
});

/// `private [static] [readonly] name?: Type;`
static FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*private[ \t]+(static[ \t]+)?(?:readonly[ \t]+)?([A-Za-z_$][\w$]*)[ \t]*[?!]?[ \t]*:[ \t]*([\w$.<>\[\]| ]+?)[ \t]*(?:=[^;\n]*)?;[ \t]*\r?\n?",
    )
    .expect("field pattern should be valid")
});

/// `public name(param?: Type): Return {`
static ACCESSOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*public[ \t]+([A-Za-z_$][\w$]*)[ \t]*\([ \t]*(?:[A-Za-z_$][\w$]*[ \t]*\??[ \t]*:[^)]*)?\)[ \t]*(?::[ \t]*([\w$.<>\[\]]+))?[ \t]*\{",
    )
    .expect("accessor pattern should be valid")
});

static CLASS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:export[ \t]+)?(?:default[ \t]+)?(?:abstract[ \t]+)?class[ \t]+([A-Za-z_$][\w$]*)")
        .expect("class pattern should be valid")
});

static CLOSING_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\}").expect("closing brace pattern should be valid"));

/// One named binding inside `{ ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Name exported by the module.
    pub imported: String,
    /// Name bound locally (differs only with `as`).
    pub local: String,
    /// Original text of the entry, e.g. `type Foo as Bar`.
    pub raw: String,
}

#[derive(Debug, Clone)]
pub struct ImportStatement {
    pub default_binding: Option<String>,
    pub bindings: Vec<ImportBinding>,
    pub specifier: String,
    /// Whole statement including its trailing newline.
    pub span: Range<usize>,
    /// Text between the braces, when the statement has named bindings.
    pub bindings_span: Option<Range<usize>>,
}

impl ImportStatement {
    /// Whether `name` is bound by this statement, by imported or local name.
    pub fn binds(&self, name: &str) -> bool {
        self.default_binding.as_deref() == Some(name)
            || self
                .bindings
                .iter()
                .any(|b| b.imported == name || b.local == name)
    }
}

#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
    pub is_static: bool,
    /// Whole line including its trailing newline.
    pub span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct AccessorDecl {
    pub name: String,
    pub return_type: Option<String>,
    /// From the start of the signature line through the closing brace's newline.
    pub span: Range<usize>,
}

/// Derived view over a registry's text. Never cached; reparse after every edit.
#[derive(Debug, Clone, Default)]
pub struct RegistryZones {
    pub class_name: Option<String>,
    pub imports: Vec<ImportStatement>,
    pub fields: Vec<FieldDecl>,
    pub accessors: Vec<AccessorDecl>,
    pub last_import_end: Option<usize>,
}

impl RegistryZones {
    pub fn imports_class(&self, name: &str) -> bool {
        self.imports.iter().any(|i| i.binds(name))
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn accessor(&self, name: &str) -> Option<&AccessorDecl> {
        self.accessors.iter().find(|a| a.name == name)
    }

    pub fn accessor_returning(&self, type_name: &str) -> Option<&AccessorDecl> {
        self.accessors
            .iter()
            .find(|a| a.return_type.as_deref() == Some(type_name))
    }

    /// Accessors whose return type is an imported class, i.e. registered helpers.
    pub fn helper_accessors(&self) -> Vec<&AccessorDecl> {
        self.accessors
            .iter()
            .filter(|a| {
                a.return_type
                    .as_deref()
                    .is_some_and(|ty| self.imports_class(ty))
            })
            .collect()
    }

    /// Import statement providing `name`, if any.
    pub fn import_of(&self, name: &str) -> Option<&ImportStatement> {
        self.imports.iter().find(|i| i.binds(name))
    }
}

/// Parses registry text into zones.
pub fn parse(text: &str) -> RegistryZones {
    let imports: Vec<ImportStatement> = IMPORT
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let default_binding = caps.get(1).map(|m| m.as_str().to_string());
            let named = caps.get(2);
            if default_binding.is_none() && named.is_none() {
                return None;
            }
            Some(ImportStatement {
                default_binding,
                bindings: named.map(|m| parse_bindings(m.as_str())).unwrap_or_default(),
                specifier: caps[3].to_string(),
                span: whole.range(),
                bindings_span: named.map(|m| m.range()),
            })
        })
        .collect();

    let fields = FIELD
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(FieldDecl {
                name: caps[2].to_string(),
                type_name: caps[3].trim().to_string(),
                is_static: caps.get(1).is_some(),
                span: whole.range(),
            })
        })
        .collect();

    let accessors: Vec<AccessorDecl> = ACCESSOR
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let end = block_end(text, whole.end() - 1)?;
            Some(AccessorDecl {
                name: caps[1].to_string(),
                return_type: caps.get(2).map(|m| m.as_str().to_string()),
                span: whole.start()..end,
            })
        })
        .collect();

    RegistryZones {
        class_name: class_declaration(text),
        last_import_end: imports.last().map(|i| i.span.end),
        imports,
        fields,
        accessors,
    }
}

/// Name of the first class declared in `text`.
pub fn class_declaration(text: &str) -> Option<String> {
    CLASS.captures(text).map(|caps| caps[1].to_string())
}

fn parse_bindings(inner: &str) -> Vec<ImportBinding> {
    inner
        .split(',')
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(|raw| {
            let unprefixed = raw.strip_prefix("type ").map(str::trim).unwrap_or(raw);
            let (imported, local) = match unprefixed.split_once(" as ") {
                Some((imported, local)) => (imported.trim(), local.trim()),
                None => (unprefixed, unprefixed),
            };
            ImportBinding {
                imported: imported.to_string(),
                local: local.to_string(),
                raw: raw.to_string(),
            }
        })
        .collect()
}

/// Byte offset just past the brace matching the one at `open`, including a
/// following newline. Braces inside strings are not special-cased.
pub fn block_end(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(line_end(text, i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Offset just past the newline ending the line containing `offset`, or the
/// end of text.
pub fn line_end(text: &str, offset: usize) -> usize {
    text[offset..]
        .find('\n')
        .map(|i| offset + i + 1)
        .unwrap_or(text.len())
}

/// Offset of the start of the line containing `offset`.
pub fn line_start(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Where new field declarations go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAnchor {
    pub offset: usize,
    /// A blank line must precede the first inserted field.
    pub separated: bool,
}

/// Where new accessor blocks go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessorAnchor {
    pub offset: usize,
    /// Anchored on the placeholder comment rather than a fallback.
    pub placeholder: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionAnchors {
    pub after_last_import: usize,
    pub fields: FieldAnchor,
    pub accessors: AccessorAnchor,
}

/// Computes the three insertion points. `context_field` is the registry's
/// shared context field, which anchors the first helper field.
pub fn find_insertion_anchors(text: &str, context_field: &str) -> InsertionAnchors {
    let zones = parse(text);

    let after_last_import = zones.last_import_end.unwrap_or(0);

    let helper_field = zones
        .fields
        .iter()
        .rev()
        .find(|f| !f.is_static && f.name != context_field);
    let fields = if let Some(field) = helper_field {
        FieldAnchor {
            offset: field.span.end,
            separated: false,
        }
    } else if let Some(field) = zones.fields.iter().find(|f| f.name == context_field) {
        FieldAnchor {
            offset: field.span.end,
            separated: true,
        }
    } else if let Some(field) = zones.fields.iter().find(|f| f.is_static) {
        tracing::debug!("no context field; anchoring helper fields after static field");
        FieldAnchor {
            offset: field.span.end,
            separated: true,
        }
    } else {
        tracing::debug!("no fields; anchoring helper fields after class opening");
        FieldAnchor {
            offset: class_body_start(text).unwrap_or(text.len()),
            separated: false,
        }
    };

    let accessors = match text.find(ACCESSOR_PLACEHOLDER) {
        Some(pos) => AccessorAnchor {
            offset: line_start(text, pos),
            placeholder: true,
        },
        None => {
            tracing::debug!("accessor placeholder missing; anchoring before final brace");
            AccessorAnchor {
                offset: CLOSING_BRACE
                    .find_iter(text)
                    .last()
                    .map(|m| m.start())
                    .unwrap_or(text.len()),
                placeholder: false,
            }
        }
    };

    InsertionAnchors {
        after_last_import,
        fields,
        accessors,
    }
}

fn class_body_start(text: &str) -> Option<usize> {
    let class = CLASS.find(text)?;
    let brace = text[class.end()..].find('{')? + class.end();
    Some(line_end(text, brace + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::templates::render_registry;
    use std::path::PathBuf;

    const POPULATED: &str = "import type { Page } from '@playwright/test';
import { LoginPage } from './login.page';
import { CartPage, type CartItem } from '../cart/cart.page';

export class Pages {
    private static instance: Pages;
    private page?: Page;

    private _loginPage?: LoginPage;
    private _cartPage?: CartPage;

    private constructor() {}

    public static getInstance(): Pages {
        if (!Pages.instance) {
            Pages.instance = new Pages();
        }
        return Pages.instance;
    }

    public getLoginPage(page?: Page): LoginPage {
        if (!this._loginPage) {
            this._loginPage = new LoginPage(page ?? this.page);
        }
        return this._loginPage;
    }

    public getCartPage(page?: Page): CartPage {
        if (!this._cartPage) {
            this._cartPage = new CartPage(page ?? this.page);
        }
        return this._cartPage;
    }

    // page-registry: accessors
}
";

    #[test]
    fn parses_imports_with_multiple_bindings() {
        let zones = parse(POPULATED);
        assert_eq!(zones.imports.len(), 3);
        assert!(zones.imports_class("LoginPage"));
        assert!(zones.imports_class("CartItem"));
        assert_eq!(zones.imports[2].specifier, "../cart/cart.page");
        assert_eq!(zones.imports[2].bindings[1].raw, "type CartItem");
    }

    #[test]
    fn parses_fields_and_static_flag() {
        let zones = parse(POPULATED);
        let names: Vec<_> = zones.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["instance", "page", "_loginPage", "_cartPage"]);
        assert!(zones.fields[0].is_static);
        assert_eq!(zones.fields[2].type_name, "LoginPage");
    }

    #[test]
    fn parses_accessors_but_not_static_methods() {
        let zones = parse(POPULATED);
        let names: Vec<_> = zones.accessors.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["getLoginPage", "getCartPage"]);
        assert_eq!(
            zones.accessor("getCartPage").unwrap().return_type.as_deref(),
            Some("CartPage")
        );
        let span = zones.accessors[0].span.clone();
        assert!(POPULATED[span].ends_with("return this._loginPage;\n    }\n"));
    }

    #[test]
    fn helper_accessors_exclude_context_setter() {
        let text = render_registry("Pages", &Config::default());
        let zones = parse(&text);
        assert_eq!(zones.class_name.as_deref(), Some("Pages"));
        assert_eq!(zones.accessors.len(), 1);
        assert!(zones.helper_accessors().is_empty());
    }

    #[test]
    fn anchors_on_fresh_registry() {
        let text = render_registry("Pages", &Config::default());
        let anchors = find_insertion_anchors(&text, "page");

        assert_eq!(&text[..anchors.after_last_import], "import type { Page } from '@playwright/test';\n");
        assert!(anchors.fields.separated);
        assert!(text[..anchors.fields.offset].ends_with("    private page?: Page;\n"));
        assert!(anchors.accessors.placeholder);
        assert!(text[anchors.accessors.offset..].starts_with("    // page-registry: accessors"));
    }

    #[test]
    fn anchors_after_last_helper_field() {
        let anchors = find_insertion_anchors(POPULATED, "page");
        assert!(!anchors.fields.separated);
        assert!(POPULATED[..anchors.fields.offset].ends_with("private _cartPage?: CartPage;\n"));
    }

    #[test]
    fn accessor_anchor_falls_back_to_final_brace() {
        let text = "export class Pages {\n    private page?: Page;\n}\n\nexport const x = 1;\n";
        let anchors = find_insertion_anchors(text, "page");
        assert!(!anchors.accessors.placeholder);
        assert_eq!(&text[anchors.accessors.offset..anchors.accessors.offset + 2], "}\n");
        assert_eq!(anchors.after_last_import, 0);
    }

    #[test]
    fn field_anchor_falls_back_to_class_body() {
        let text = "export class Pages {\n}\n";
        let anchors = find_insertion_anchors(text, "page");
        assert_eq!(anchors.fields.offset, "export class Pages {\n".len());
    }

    #[test]
    fn block_end_balances_nested_braces() {
        let text = "f() {\n  if (x) {\n  }\n}\nrest";
        assert_eq!(block_end(text, 4), Some(text.len() - 4));
    }

    #[test]
    fn parses_hand_edited_fixture() {
        let fixture = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures/registries/hand-edited.ts");
        let text = std::fs::read_to_string(fixture).unwrap();
        let zones = parse(&text);
        assert_eq!(zones.class_name.as_deref(), Some("AppPages"));
        assert!(zones.imports_class("SearchPage"));
        assert!(zones.has_field("_searchPage"));
        let names: Vec<_> = zones.helper_accessors().iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["getSearchPage", "getProfilePage"]);
    }
}
