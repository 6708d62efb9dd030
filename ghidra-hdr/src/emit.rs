//! Emitter: resolved closure → header text.
//!
//! Three artifacts are rendered, all in resolution order and wrapped in one
//! namespace: forward declarations, enums, and the main header with
//! typedefs and full struct/union bodies.

use tracing::debug;

use crate::augment::Augmentation;
use crate::model::*;
use crate::resolve::Closure;

/// Line terminator used by every artifact.
pub const CRLF: &str = "\r\n";

/// Banner placed at the top of every generated file.
pub const BANNER: &str = "// This file is generated, do not edit by hand";

/// Typedef names the target language already provides.
const INTRINSIC_TYPEDEFS: &[&str] = &["bool", "wchar_t"];

/// Aliases emitted ahead of every other typedef. Ghidra types character
/// buffers as `string` and pointer-sized integers as `pointer`.
const SHORTHANDS: &[(&str, &str)] = &[("char", "string"), ("unsigned int", "pointer")];

/// Names used inside the generated text.
#[derive(Debug, Clone)]
pub struct EmitOptions {
    pub namespace: String,
    /// File name of the forward-declaration header, as included by the main header.
    pub forward_file: String,
    /// File name of the enum header, as included by the main header.
    pub enums_file: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            namespace: "Ghidra".to_string(),
            forward_file: "ghidra.naked.h".to_string(),
            enums_file: "ghidra.enums.h".to_string(),
        }
    }
}

/// The rendered header texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
    pub forward: String,
    pub enums: String,
    pub main: String,
}

/// Render all three headers.
pub fn emit_headers(
    registry: &Registry,
    closure: &Closure,
    augmentation: &Augmentation,
    options: &EmitOptions,
) -> Artifacts {
    let mut forward = Vec::new();
    let mut enums = Vec::new();
    let mut typedefs: Vec<String> = SHORTHANDS
        .iter()
        .map(|(ty, name)| format!("typedef {ty} {name};"))
        .collect();
    let mut bodies = Vec::new();

    for (name, _) in closure.entries() {
        let Some(ty) = registry.get(name) else {
            debug!(name, "skipping undeclared type");
            continue;
        };
        match ty {
            TypeDef::Struct(record) | TypeDef::Union(record) => {
                let keyword = ty.kind().keyword();
                forward.push(format!("{keyword} {};", record.name));
                for child in augmentation.children(&record.name) {
                    forward.push(format!("{} {};", child.keyword, child.name));
                }
                bodies.extend(emit_record(
                    keyword,
                    record,
                    augmentation.methods(&record.name),
                    registry,
                ));
            }
            TypeDef::Typedef(def) => {
                if INTRINSIC_TYPEDEFS.contains(&def.name.as_str()) {
                    debug!(name = %def.name, "skipping intrinsic typedef");
                    continue;
                }
                typedefs.push(emit_typedef(def));
            }
            TypeDef::Enum(def) => enums.extend(emit_enum(def)),
        }
    }

    debug!(
        forward = forward.len(),
        enum_lines = enums.len(),
        typedefs = typedefs.len(),
        "rendered headers"
    );

    let main = {
        let mut lines = vec![
            format!("#include \"./{}\"", options.enums_file),
            format!("#include \"./{}\"", options.forward_file),
            namespace_open(options),
        ];
        lines.extend(typedefs);
        lines.extend(bodies);
        lines.push(namespace_close(options));
        file(lines)
    };

    Artifacts {
        forward: file(wrap(forward, options)),
        enums: file(wrap(enums, options)),
        main,
    }
}

fn namespace_open(options: &EmitOptions) -> String {
    format!("namespace {} {{", options.namespace)
}

fn namespace_close(options: &EmitOptions) -> String {
    format!("}}; // {} namespace", options.namespace)
}

fn wrap(body: Vec<String>, options: &EmitOptions) -> Vec<String> {
    let mut lines = vec![namespace_open(options)];
    lines.extend(body);
    lines.push(namespace_close(options));
    lines
}

/// Prefix banner and include guard, join with CRLF.
fn file(body: Vec<String>) -> String {
    let mut lines = vec![BANNER.to_string(), String::new(), "#pragma once".to_string()];
    lines.extend(body);
    let mut text = lines.join(CRLF);
    text.push_str(CRLF);
    text
}

/// `typedef TYPE NAME;`, or `typedef SIGNATURE;` for function pointers.
pub fn emit_typedef(def: &TypedefDef) -> String {
    if def.is_func {
        format!("typedef {};", def.underlying)
    } else {
        format!("typedef {} {};", def.underlying, def.name)
    }
}

/// One `typedef enum` block.
pub fn emit_enum(def: &EnumDef) -> Vec<String> {
    let mut lines = vec![format!("typedef enum {} {{", def.name)];
    let count = def.variants.len();
    for (i, variant) in def.variants.iter().enumerate() {
        let sep = if i + 1 < count { "," } else { "" };
        lines.push(format!("\t{}={}{sep}", variant.label, variant.value));
    }
    lines.push(format!("}} {};", def.name));
    lines
}

/// A struct or union body followed by its attached methods. The leading
/// comment, if any, goes on the opening line.
pub fn emit_record(
    keyword: &str,
    record: &RecordDef,
    methods: &[Method],
    registry: &Registry,
) -> Vec<String> {
    let mut lines = vec![match &record.comment {
        Some(comment) => format!("{keyword} {} {{ // {comment}", record.name),
        None => format!("{keyword} {} {{", record.name),
    }];
    for field in &record.fields {
        lines.push(format!("\t{}", emit_field(field, registry)));
    }
    for method in methods {
        let decl = format!("{}({});", method.name, method.args);
        if method.return_type.is_empty() {
            lines.push(format!("\t{decl}"));
        } else {
            lines.push(format!("\t{} {decl}", method.return_type));
        }
    }
    lines.push("};".to_string());
    lines
}

/// `TYPE NAME; COMMENT`, with `enum` spelled out for enum-typed fields.
pub fn emit_field(field: &Field, registry: &Registry) -> String {
    let qualifier = if registry.is_enum(&field.ty) { "enum " } else { "" };
    let decl = format!("{qualifier}{} {};", field.ty, field.name);
    if field.comment.is_empty() {
        decl
    } else {
        format!("{decl} {}", field.comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_dump;
    use crate::resolve::resolve;

    fn lines(text: &str) -> Vec<&str> {
        text.split(CRLF).collect()
    }

    #[test]
    fn enum_block() {
        let def = EnumDef {
            name: "Color".into(),
            variants: vec![
                EnumVariant {
                    label: "GREEN".into(),
                    value: 1,
                },
                EnumVariant {
                    label: "RED".into(),
                    value: 2,
                },
            ],
        };
        assert_eq!(
            emit_enum(&def),
            ["typedef enum Color {", "\tGREEN=1,", "\tRED=2", "} Color;"]
        );
    }

    #[test]
    fn typedef_forms() {
        let mut def = TypedefDef {
            name: "dword".into(),
            underlying: "unsigned int".into(),
            depends: Default::default(),
            is_func: false,
        };
        assert_eq!(emit_typedef(&def), "typedef unsigned int dword;");
        def.name = "cb".into();
        def.underlying = "void (*cb)(Unit* pUnit)".into();
        def.is_func = true;
        assert_eq!(emit_typedef(&def), "typedef void (*cb)(Unit* pUnit);");
    }

    #[test]
    fn record_body_with_enum_field_comment_and_methods() {
        let dump = "\
typedef enum UnitType {
    PLAYER=0
} UnitType;
struct Unit { // a unit
    enum UnitType eType; /* kind */
    Unit *pNext;
};
";
        let registry = parse_dump(dump).unwrap();
        let Some(TypeDef::Struct(unit)) = registry.get("Unit") else {
            panic!("Unit missing");
        };
        let methods = [
            Method {
                return_type: "int".into(),
                name: "getX".into(),
                args: "int n".into(),
            },
            Method {
                return_type: String::new(),
                name: "Unit".into(),
                args: String::new(),
            },
        ];
        assert_eq!(
            emit_record("struct", unit, &methods, &registry),
            [
                "struct Unit { // a unit",
                "\tenum UnitType eType; /* kind */",
                "\tUnit* pNext;",
                "\tint getX(int n);",
                "\tUnit();",
                "};",
            ]
        );
    }

    #[test]
    fn full_artifacts() {
        let dump = "\
typedef unsigned char bool;
typedef unsigned int dword;
typedef enum Color {
    RED=2,
    GREEN=1
} Color;
union Value {
    int n;
    float f;
};
struct Unit {
    Color eColor;
    Value value;
    dword dwFlags;
    bool bAlive;
};
";
        let registry = parse_dump(dump).unwrap();
        let closure = resolve(&registry, &["Color", "Unit", "Missing"]);
        let children = vec![ChildClass {
            keyword: "class".into(),
            name: "Player".into(),
            visibility: "public".into(),
            base: "Unit".into(),
        }];
        let augmentation = Augmentation::new(&registry, Vec::new(), children);
        let artifacts = emit_headers(&registry, &closure, &augmentation, &EmitOptions::default());

        assert_eq!(
            lines(&artifacts.forward),
            [
                BANNER,
                "",
                "#pragma once",
                "namespace Ghidra {",
                "union Value;",
                "struct Unit;",
                "class Player;",
                "}; // Ghidra namespace",
                "",
            ]
        );
        assert_eq!(
            lines(&artifacts.enums),
            [
                BANNER,
                "",
                "#pragma once",
                "namespace Ghidra {",
                "typedef enum Color {",
                "\tGREEN=1,",
                "\tRED=2",
                "} Color;",
                "}; // Ghidra namespace",
                "",
            ]
        );
        assert_eq!(
            lines(&artifacts.main),
            [
                BANNER,
                "",
                "#pragma once",
                "#include \"./ghidra.enums.h\"",
                "#include \"./ghidra.naked.h\"",
                "namespace Ghidra {",
                "typedef char string;",
                "typedef unsigned int pointer;",
                "typedef unsigned int dword;",
                "union Value {",
                "\tint n;",
                "\tfloat f;",
                "};",
                "struct Unit {",
                "\tenum Color eColor;",
                "\tValue value;",
                "\tdword dwFlags;",
                "\tbool bAlive;",
                "};",
                "}; // Ghidra namespace",
                "",
            ]
        );
    }
}
