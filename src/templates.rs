//! Generated TypeScript shapes.
//!
//! The registry body, the helper body, and the four per-helper fragments the
//! rewriter splices into a registry. The rest of the crate recognises registry
//! files by the markers emitted here, so changes to these shapes must be
//! mirrored in the patterns in [`crate::registry`] and [`crate::scanner`].

use crate::config::Config;

/// Comment marking where new accessors are inserted.
pub const ACCESSOR_PLACEHOLDER: &str = "// page-registry: accessors";

/// Placeholder substituted in custom templates.
pub const NAME_PLACEHOLDER: &str = "{{name}}";

const INDENT: &str = "    ";

/// Full text of a new registry class called `name`.
pub fn render_registry(name: &str, config: &Config) -> String {
    if let Some(template) = &config.registry_template {
        return template.replace(NAME_PLACEHOLDER, name);
    }

    let ctx_type = &config.context_type;
    let ctx_field = &config.context_field;
    format!(
        "import type {{ {ctx_type} }} from '{module}';

export class {name} {{
    private static instance: {name};
    private {ctx_field}?: {ctx_type};

    private constructor() {{}}

    public static getInstance(): {name} {{
        if (!{name}.instance) {{
            {name}.instance = new {name}();
        }}
        return {name}.instance;
    }}

    public set{ctx_upper}({ctx_field}: {ctx_type}): void {{
        this.{ctx_field} = {ctx_field};
    }}

    {ACCESSOR_PLACEHOLDER}
}}

export const get{name} = (): {name} => {name}.getInstance();
",
        module = config.context_module,
        ctx_upper = upper_first(ctx_field),
    )
}

/// Full text of a new helper class called `name`.
pub fn render_helper(name: &str, config: &Config) -> String {
    if let Some(template) = &config.helper_template {
        return template.replace(NAME_PLACEHOLDER, name);
    }

    format!(
        "import type {{ {ctx_type} }} from '{module}';

export class {name} {{
    constructor(private readonly {ctx_field}?: {ctx_type}) {{}}
}}
",
        ctx_type = config.context_type,
        module = config.context_module,
        ctx_field = config.context_field,
    )
}

/// `import { Class } from 'specifier';`
pub fn import_line(class_name: &str, specifier: &str) -> String {
    format!("import {{ {} }} from '{}';\n", class_name, specifier)
}

/// Private backing field for one helper.
pub fn field_declaration(field: &str, class_name: &str) -> String {
    format!("{INDENT}private {}?: {};\n", field, class_name)
}

/// Accessor constructing the helper on first access and returning the cached
/// instance afterwards.
pub fn accessor_block(accessor: &str, field: &str, class_name: &str, config: &Config) -> String {
    let ctx_type = &config.context_type;
    let ctx_field = &config.context_field;
    format!(
        "{INDENT}public {accessor}({ctx_field}?: {ctx_type}): {class_name} {{
{INDENT}{INDENT}if (!this.{field}) {{
{INDENT}{INDENT}{INDENT}this.{field} = new {class_name}({ctx_field} ?? this.{ctx_field});
{INDENT}{INDENT}}}
{INDENT}{INDENT}return this.{field};
{INDENT}}}
"
    )
}

/// Module-level binding forwarding to the singleton's accessor.
pub fn export_line(accessor: &str, class_name: &str, registry_class: &str, config: &Config) -> String {
    let ctx_type = &config.context_type;
    let ctx_field = &config.context_field;
    format!(
        "export const {accessor} = ({ctx_field}?: {ctx_type}): {class_name} => {registry_class}.getInstance().{accessor}({ctx_field});\n"
    )
}

/// Statement inserted where a helper is consumed.
pub fn usage_statement(indent: &str, variable: &str, accessor: &str) -> String {
    format!("{}const {} = {}();\n", indent, variable, accessor)
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().chain(chars).collect(),
    }
}
