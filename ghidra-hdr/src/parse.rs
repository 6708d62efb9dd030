//! Declaration parser: Ghidra data type dump → [`Registry`].
//!
//! The dump is strictly line oriented: one declaration header per line, one
//! field or enum label per line, and fixed terminators (`} NAME;` for enums,
//! `};` for structs and unions). Each line shape is recognised by a small
//! named rule so its edge cases can be tested on their own.

use std::sync::LazyLock;

use indexmap::IndexSet;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, trace};

use crate::model::*;

/// Errors that abort a parse run.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("type `{name}` is declared more than once")]
    DuplicateType { name: String },

    #[error("{kind} `{name}` is never closed")]
    Unterminated { kind: &'static str, name: String },

    #[error("invalid label in enum `{name}`: `{line}`")]
    InvalidEnumValue { name: String, line: String },

    #[error("malformed field in `{owner}`: `{line}`")]
    MalformedField { owner: String, line: String },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// `RET (*NAME)(ARGS);`: a function-pointer field or typedef body.
static FUNCTION_POINTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<ret>[\w\s\*]+?)\s*\(\s*\*\s*(?P<name>\w+)\s*\)\s*\((?P<args>[^()]*)\)\s*;?\s*$",
    )
    .expect("function pointer pattern")
});

/// Qualifier keywords dropped from field types.
const QUALIFIERS: &[&str] = &["enum", "struct", "union"];

// ---------------------------------------------------------------------------
// Line rules
// ---------------------------------------------------------------------------

/// Normalise a raw dump line: pointer markers bind to the type
/// (`Unit *p` → `Unit* p`) and runs of spaces collapse to one.
pub fn normalize_line(line: &str) -> String {
    let mut line = line.trim_end().replace('\t', " ");
    while line.contains(" *") {
        line = line.replace(" *", "* ");
    }
    while line.contains("  ") {
        line = line.replace("  ", " ");
    }
    line
}

/// A top-level line that opens a declaration.
#[derive(Debug, PartialEq, Eq)]
pub enum HeaderLine {
    Enum {
        name: String,
    },
    Union {
        name: String,
    },
    Typedef(TypedefDef),
    Struct {
        name: String,
        comment: Option<String>,
    },
}

/// Classify a top-level line. Returns `None` for anything that is not a
/// declaration header (terminators, blank lines, `typedef struct` aliases).
pub fn classify_header(line: &str) -> Option<HeaderLine> {
    if let Some(name) = enum_header(line) {
        return Some(HeaderLine::Enum { name });
    }
    if let Some(name) = union_header(line) {
        return Some(HeaderLine::Union { name });
    }
    if let Some(def) = typedef_line(line) {
        return Some(HeaderLine::Typedef(def));
    }
    struct_header(line).map(|(name, comment)| HeaderLine::Struct { name, comment })
}

fn words(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

fn strip_brace(word: &str) -> String {
    word.trim_end_matches('{').to_string()
}

/// `typedef enum NAME {`
pub fn enum_header(line: &str) -> Option<String> {
    match words(line).as_slice() {
        ["typedef", "enum", name, ..] => Some(strip_brace(name)),
        _ => None,
    }
}

/// `union NAME {`. Forward declarations (`union NAME;`) are not headers.
pub fn union_header(line: &str) -> Option<String> {
    if line.trim_end().ends_with(';') {
        return None;
    }
    match words(line).as_slice() {
        ["union", name, ..] => Some(strip_brace(name)),
        _ => None,
    }
}

/// `struct NAME { free text`. The text after the brace becomes the leading
/// comment, with comment markers removed.
pub fn struct_header(line: &str) -> Option<(String, Option<String>)> {
    if line.trim_end().ends_with(';') {
        return None;
    }
    let words = words(line);
    let ["struct", name, rest @ ..] = words.as_slice() else {
        return None;
    };
    let rest = match rest.first() {
        Some(&"{") => &rest[1..],
        _ => rest,
    };
    let text = rest.join(" ");
    let text = text
        .strip_prefix("//")
        .or_else(|| text.strip_prefix("/*"))
        .unwrap_or(&text);
    let text = text
        .strip_suffix("* /")
        .or_else(|| text.strip_suffix("*/"))
        .unwrap_or(text)
        .trim();
    let comment = (!text.is_empty()).then(|| text.to_string());
    Some((strip_brace(name), comment))
}

/// `typedef TYPE NAME;` or `typedef RET (*NAME)(ARGS);`.
///
/// `typedef enum` is an enum header and `typedef struct`/`typedef union`
/// aliases are ignored.
pub fn typedef_line(line: &str) -> Option<TypedefDef> {
    let words = words(line);
    match words.as_slice() {
        ["typedef", "enum" | "struct" | "union", ..] => return None,
        ["typedef", _, _, ..] => {}
        _ => return None,
    }

    let body = line.trim_start().strip_prefix("typedef")?;
    if let Some(fp) = function_pointer(body) {
        return Some(TypedefDef {
            underlying: format!("{} (*{})({})", fp.ret, fp.name, fp.args),
            depends: fp.depends(),
            name: fp.name,
            is_func: true,
        });
    }

    let (name, ty) = words[1..].split_last()?;
    let underlying = ty.join(" ");
    let mut depends = IndexSet::new();
    let base = base_type(&underlying);
    if !is_internal(&base) {
        depends.insert(base);
    }
    Some(TypedefDef {
        name: name.trim_end_matches(';').to_string(),
        underlying,
        depends,
        is_func: false,
    })
}

/// Split a trailing `/* ... */` or `// ...` comment off a field line.
///
/// Pointer normalisation turns `*/` into `* /`; that is undone here.
pub fn split_comment(line: &str) -> (&str, String) {
    let start = [line.find(" /*"), line.find(" //")].into_iter().flatten().min();
    match start {
        Some(idx) => {
            let comment = line[idx + 1..].replace("* /", " */");
            (&line[..idx], comment)
        }
        None => (line, String::new()),
    }
}

/// A parsed `RET (*NAME)(ARGS)` signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPointer {
    pub ret: String,
    pub name: String,
    /// Comma-separated arguments with `struct`/`union`/`enum` qualifiers removed.
    pub args: String,
}

impl FunctionPointer {
    /// Non-primitive argument types, pointer markers stripped. The return
    /// type is not a dependency; it must reach the closure some other way.
    pub fn depends(&self) -> IndexSet<String> {
        let mut depends = IndexSet::new();
        for arg in self.args.split(',').map(str::trim) {
            if arg.is_empty() || arg == "..." {
                continue;
            }
            let tokens = words(arg);
            let ty = if tokens.len() == 1 || is_internal(&base_type(arg)) {
                arg.to_string()
            } else {
                tokens[..tokens.len() - 1].join(" ")
            };
            let base = base_type(&ty);
            if !base.is_empty() && !is_internal(&base) {
                depends.insert(base);
            }
        }
        depends
    }
}

/// Match `RET (*NAME)(ARGS);`.
pub fn function_pointer(line: &str) -> Option<FunctionPointer> {
    let caps = FUNCTION_POINTER.captures(line)?;
    let args = caps["args"]
        .split(',')
        .map(|arg| strip_qualifier(arg.trim()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(FunctionPointer {
        ret: caps["ret"].trim().to_string(),
        name: caps["name"].to_string(),
        args: args.trim().to_string(),
    })
}

fn strip_qualifier(arg: &str) -> String {
    match arg.split_once(' ') {
        Some((q, rest)) if QUALIFIERS.contains(&q) => rest.to_string(),
        _ => arg.to_string(),
    }
}

/// `TYPE NAME;` with qualifier keywords dropped. Returns `(type, name)`.
pub fn plain_field(decl: &str) -> Option<(String, String)> {
    let decl = decl.trim().trim_end_matches(';');
    let tokens: Vec<&str> = decl
        .split_whitespace()
        .filter(|t| !QUALIFIERS.contains(t))
        .collect();
    let (name, ty) = tokens.split_last()?;
    if ty.is_empty() {
        return None;
    }
    Some((ty.join(" "), name.to_string()))
}

/// Rewrite a trailing `[0]` (flexible array member) to `[1]` and note it in
/// the comment. Returns true if the field was rewritten.
pub fn mark_flexible_array(field: &mut Field) -> bool {
    let slot = if field.name.ends_with("[0]") {
        &mut field.name
    } else if field.ty.ends_with("[0]") {
        &mut field.ty
    } else {
        return false;
    };
    slot.truncate(slot.len() - "[0]".len());
    slot.push_str("[1]");
    field.comment = if field.comment.is_empty() {
        "/* variable size */".to_string()
    } else {
        format!("/* variable size */ {}", field.comment)
    };
    true
}

/// `LABEL=VALUE,` inside an enum body. Values are decimal, optionally
/// negative, or `0x` hex.
pub fn enum_variant(line: &str) -> Option<EnumVariant> {
    let (label, value) = line.split_once('=')?;
    let label = label.trim();
    if label.is_empty() {
        return None;
    }
    let value = value.trim().trim_end_matches(',').trim();
    Some(EnumVariant {
        label: label.to_string(),
        value: parse_int(value)?,
    })
}

fn parse_int(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Name of the typedef synthesised for a function-pointer field.
pub fn callback_name(ret: &str, ticker: usize, field: &str) -> String {
    format!("callback_{ret}{ticker}{field}")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn add_dependency(record: &mut RecordDef, ty: &str) {
    let base = base_type(ty);
    if !base.is_empty() && !is_internal(&base) {
        record.depends.insert(base);
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse a whole dump into a fresh registry.
pub fn parse_dump(text: &str) -> ParseResult<Registry> {
    let lines: Vec<String> = text.lines().map(normalize_line).collect();
    let mut parser = Parser {
        lines: &lines,
        pos: 0,
        registry: Registry::default(),
        callback_ticker: 0,
    };
    parser.run()?;

    debug!(
        types = parser.registry.len(),
        structs = parser.registry.names_of(TypeKind::Struct).len(),
        unions = parser.registry.names_of(TypeKind::Union).len(),
        enums = parser.registry.names_of(TypeKind::Enum).len(),
        typedefs = parser.registry.names_of(TypeKind::Typedef).len(),
        "parsed dump"
    );
    Ok(parser.registry)
}

struct Parser<'a> {
    lines: &'a [String],
    pos: usize,
    registry: Registry,
    callback_ticker: usize,
}

impl<'a> Parser<'a> {
    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(line.as_str())
    }

    fn peek_line(&self) -> Option<&'a str> {
        self.lines.get(self.pos).map(String::as_str)
    }

    fn run(&mut self) -> ParseResult<()> {
        while let Some(line) = self.next_line() {
            match classify_header(line) {
                Some(HeaderLine::Enum { name }) => self.parse_enum(name)?,
                Some(HeaderLine::Union { name }) => self.parse_union(name)?,
                Some(HeaderLine::Typedef(def)) => {
                    trace!(name = %def.name, ty = %def.underlying, "typedef");
                    self.registry.insert(TypeDef::Typedef(def))?;
                }
                Some(HeaderLine::Struct { name, comment }) => self.parse_struct(name, comment)?,
                None => {}
            }
        }
        Ok(())
    }

    /// Labels run until `} NAME;` or the end of input.
    fn parse_enum(&mut self, name: String) -> ParseResult<()> {
        let terminator = format!("{name};");
        let mut def = EnumDef {
            name,
            variants: Vec::new(),
        };
        while let Some(line) = self.next_line() {
            let line = line.trim();
            if line.strip_prefix('}').map(str::trim) == Some(terminator.as_str()) {
                break;
            }
            if line.is_empty() || line == "{" {
                continue;
            }
            let variant = enum_variant(line).ok_or_else(|| ParseError::InvalidEnumValue {
                name: def.name.clone(),
                line: line.to_string(),
            })?;
            def.variants.push(variant);
        }
        def.sort_by_value();
        debug!(name = %def.name, variants = def.variants.len(), "parsed enum");
        self.registry.insert(TypeDef::Enum(def))
    }

    /// Fields run until a `};` line, which is consumed.
    fn parse_union(&mut self, name: String) -> ParseResult<()> {
        let mut record = RecordDef::new(name);
        loop {
            let Some(line) = self.next_line() else {
                return Err(ParseError::Unterminated {
                    kind: "union",
                    name: record.name,
                });
            };
            let line = line.trim();
            if line == "};" {
                break;
            }
            if line.is_empty() {
                continue;
            }
            let (decl, comment) = split_comment(line);
            let (ty, field) = plain_field(decl).ok_or_else(|| ParseError::MalformedField {
                owner: record.name.clone(),
                line: line.to_string(),
            })?;
            add_dependency(&mut record, &ty);
            record.fields.push(Field::new(ty, field, comment));
        }
        debug!(name = %record.name, fields = record.fields.len(), "parsed union");
        self.registry.insert(TypeDef::Union(record))
    }

    /// Fields run until a `};` line, which is left for the top-level loop.
    fn parse_struct(&mut self, name: String, comment: Option<String>) -> ParseResult<()> {
        let mut record = RecordDef::new(name);
        record.comment = comment;
        loop {
            let Some(line) = self.peek_line() else {
                return Err(ParseError::Unterminated {
                    kind: "struct",
                    name: record.name,
                });
            };
            let line = line.trim();
            if line == "};" {
                break;
            }
            self.pos += 1;
            if line.is_empty() {
                continue;
            }
            let field = self.struct_field(&record.name, line)?;
            add_dependency(&mut record, &field.ty);
            trace!(owner = %record.name, ty = %field.ty, field = %field.name, "  field");
            record.fields.push(field);
        }
        debug!(name = %record.name, fields = record.fields.len(), "parsed struct");
        self.registry.insert(TypeDef::Struct(record))
    }

    fn struct_field(&mut self, owner: &str, line: &str) -> ParseResult<Field> {
        let (decl, comment) = split_comment(line);

        let mut field = match decl.contains('(').then(|| function_pointer(decl)).flatten() {
            Some(fp) => {
                let name = self.register_callback(&fp)?;
                Field::new(name, fp.name, comment)
            }
            None => {
                let (ty, name) = plain_field(decl).ok_or_else(|| ParseError::MalformedField {
                    owner: owner.to_string(),
                    line: line.to_string(),
                })?;
                Field::new(ty, name, comment)
            }
        };
        mark_flexible_array(&mut field);
        Ok(field)
    }

    /// Register a `callback_*` typedef for a function-pointer field and
    /// return its name.
    fn register_callback(&mut self, fp: &FunctionPointer) -> ParseResult<String> {
        self.callback_ticker += 1;
        let name = callback_name(&fp.ret, self.callback_ticker, &fp.name);
        let def = TypedefDef {
            underlying: format!("{} (*{})({})", fp.ret, name, fp.args),
            depends: fp.depends(),
            name: name.clone(),
            is_func: true,
        };
        trace!(name = %name, signature = %def.underlying, "synthesized callback typedef");
        self.registry.insert(TypeDef::Typedef(def))?;
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<'r>(registry: &'r Registry, name: &str) -> &'r RecordDef {
        match registry.get(name) {
            Some(TypeDef::Struct(r) | TypeDef::Union(r)) => r,
            other => panic!("{name} is not a record: {other:?}"),
        }
    }

    #[test]
    fn normalize_binds_pointers_to_type() {
        assert_eq!(normalize_line("    Unit  **pNext;"), " Unit** pNext;");
        assert_eq!(normalize_line("int a; /* note */\r"), "int a; /* note* /");
    }

    #[test]
    fn classify_headers() {
        assert_eq!(
            classify_header("typedef enum Color {"),
            Some(HeaderLine::Enum {
                name: "Color".into()
            })
        );
        assert_eq!(
            classify_header("union Value {"),
            Some(HeaderLine::Union {
                name: "Value".into()
            })
        );
        assert_eq!(
            classify_header("struct Unit { // player or monster"),
            Some(HeaderLine::Struct {
                name: "Unit".into(),
                comment: Some("player or monster".into()),
            })
        );
        assert_eq!(
            classify_header("struct Unit { /* player or monster* /"),
            Some(HeaderLine::Struct {
                name: "Unit".into(),
                comment: Some("player or monster".into()),
            })
        );
        assert_eq!(
            classify_header("struct Unit {"),
            Some(HeaderLine::Struct {
                name: "Unit".into(),
                comment: None,
            })
        );
        assert_eq!(classify_header("typedef struct Unit Unit;"), None);
        assert_eq!(classify_header("struct Unit;"), None);
        assert_eq!(classify_header("};"), None);
        assert_eq!(classify_header(""), None);
    }

    #[test]
    fn plain_typedef() {
        let def = typedef_line("typedef unsigned int dword;").unwrap();
        assert_eq!(def.name, "dword");
        assert_eq!(def.underlying, "unsigned int");
        assert!(def.depends.is_empty());
        assert!(!def.is_func);

        let def = typedef_line("typedef Unit* UnitPtr;").unwrap();
        assert_eq!(def.depends.iter().collect::<Vec<_>>(), ["Unit"]);
    }

    #[test]
    fn function_pointer_typedef() {
        let def = typedef_line("typedef void (*Handler)(struct Unit* pUnit, int n);").unwrap();
        assert_eq!(def.name, "Handler");
        assert_eq!(def.underlying, "void (*Handler)(Unit* pUnit, int n)");
        assert!(def.is_func);
        assert_eq!(def.depends.iter().collect::<Vec<_>>(), ["Unit"]);
    }

    #[test]
    fn function_pointer_rule() {
        let fp = function_pointer("int (*pfnTick)(Game*, struct Unit* pUnit, unsigned int);").unwrap();
        assert_eq!(fp.ret, "int");
        assert_eq!(fp.name, "pfnTick");
        assert_eq!(fp.args, "Game*, Unit* pUnit, unsigned int");
        assert_eq!(fp.depends().iter().collect::<Vec<_>>(), ["Game", "Unit"]);
        assert!(function_pointer("int field_0x4;").is_none());
    }

    #[test]
    fn function_pointer_return_type_is_not_a_dependency() {
        let fp = function_pointer("Unit* (*pfnGet)(int nIndex);").unwrap();
        assert_eq!(fp.ret, "Unit*");
        assert!(fp.depends().is_empty());
    }

    #[test]
    fn comment_split_restores_terminator() {
        let (decl, comment) = split_comment("int nCount; /* created by retype* /");
        assert_eq!(decl, "int nCount;");
        assert_eq!(comment, "/* created by retype */");
        assert_eq!(split_comment("int n;"), ("int n;", String::new()));
        assert_eq!(
            split_comment("int _0[5]; // compressed"),
            ("int _0[5];", "// compressed".to_string())
        );
    }

    #[test]
    fn plain_field_drops_qualifiers() {
        assert_eq!(
            plain_field("struct Unit* pUnit;"),
            Some(("Unit*".into(), "pUnit".into()))
        );
        assert_eq!(
            plain_field("enum Color eColor;"),
            Some(("Color".into(), "eColor".into()))
        );
        assert_eq!(
            plain_field("unsigned char bFlags;"),
            Some(("unsigned char".into(), "bFlags".into()))
        );
        assert_eq!(plain_field("nothing;"), None);
    }

    #[test]
    fn flexible_array_rewritten() {
        let mut field = Field::new("char", "szData[0]", "");
        assert!(mark_flexible_array(&mut field));
        assert_eq!(field, Field::new("char", "szData[1]", "/* variable size */"));

        let mut field = Field::new("Unit*[0]", "pList", "/* x */");
        assert!(mark_flexible_array(&mut field));
        assert_eq!(field.ty, "Unit*[1]");
        assert_eq!(field.comment, "/* variable size */ /* x */");

        let mut field = Field::new("char", "szName[16]", "");
        assert!(!mark_flexible_array(&mut field));
    }

    #[test]
    fn enum_values() {
        assert_eq!(
            enum_variant(" RED=2,"),
            Some(EnumVariant {
                label: "RED".into(),
                value: 2
            })
        );
        assert_eq!(enum_variant("NONE=-1").map(|v| v.value), Some(-1));
        assert_eq!(enum_variant("MASK=0x10").map(|v| v.value), Some(16));
        assert_eq!(enum_variant("RED=two"), None);
        assert_eq!(enum_variant("RED"), None);
    }

    #[test]
    fn enum_sorted_by_value() {
        let dump = "typedef enum Color {\r\n    RED=2,\r\n    GREEN=1\r\n} Color;\r\n";
        let registry = parse_dump(dump).unwrap();
        let Some(TypeDef::Enum(e)) = registry.get("Color") else {
            panic!("Color missing");
        };
        let pairs: Vec<(&str, i64)> = e
            .variants
            .iter()
            .map(|v| (v.label.as_str(), v.value))
            .collect();
        assert_eq!(pairs, [("GREEN", 1), ("RED", 2)]);
    }

    #[test]
    fn enum_ties_keep_dump_order() {
        let dump = "typedef enum E {\nB=1,\nA=0,\nB_ALIAS=1,\nC=1\n} E;\n";
        let registry = parse_dump(dump).unwrap();
        let Some(TypeDef::Enum(e)) = registry.get("E") else {
            panic!("E missing");
        };
        let labels: Vec<&str> = e.variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, ["A", "B", "B_ALIAS", "C"]);
    }

    #[test]
    fn enum_runs_to_end_of_input() {
        let registry = parse_dump("typedef enum E {\nA=1\n").unwrap();
        assert!(registry.is_enum("E"));
    }

    #[test]
    fn malformed_enum_value_is_fatal() {
        let err = parse_dump("typedef enum E {\nA=one\n} E;\n").unwrap_err();
        assert!(matches!(err, ParseError::InvalidEnumValue { .. }), "{err}");
    }

    #[test]
    fn self_referencing_struct() {
        let dump = "struct Foo {\n    int a;\n    Foo *next;\n};\n";
        let registry = parse_dump(dump).unwrap();
        let foo = record(&registry, "Foo");
        assert_eq!(
            foo.fields,
            [Field::new("int", "a", ""), Field::new("Foo*", "next", "")]
        );
        assert_eq!(foo.depends.iter().collect::<Vec<_>>(), ["Foo"]);
    }

    #[test]
    fn union_fields_and_comments() {
        let dump = "union Value {\n    int nValue; /* raw */\n    struct Unit *pUnit;\n    float fValue;\n};\n";
        let registry = parse_dump(dump).unwrap();
        let value = record(&registry, "Value");
        assert_eq!(
            value.fields,
            [
                Field::new("int", "nValue", "/* raw */"),
                Field::new("Unit*", "pUnit", ""),
                Field::new("float", "fValue", ""),
            ]
        );
        assert_eq!(value.depends.iter().collect::<Vec<_>>(), ["Unit"]);
        assert_eq!(registry.names_of(TypeKind::Union), ["Value".to_string()]);
    }

    #[test]
    fn struct_function_pointer_fields_get_unique_typedefs() {
        let dump = "struct Hooks {\n\
                    void (*pfnCall)(struct Unit *pUnit);\n\
                    void (*pfnCall2)(Game *pGame, int n);\n\
                    int n;\n\
                    };\n\
                    struct Other {\n\
                    void (*pfnCall)(Unit *pUnit);\n\
                    };\n";
        let registry = parse_dump(dump).unwrap();
        let hooks = record(&registry, "Hooks");
        assert_eq!(hooks.fields[0], Field::new("callback_void1pfnCall", "pfnCall", ""));
        assert_eq!(hooks.fields[1], Field::new("callback_void2pfnCall2", "pfnCall2", ""));
        assert_eq!(
            hooks.depends.iter().collect::<Vec<_>>(),
            ["callback_void1pfnCall", "callback_void2pfnCall2"]
        );
        let other = record(&registry, "Other");
        assert_eq!(other.fields[0].ty, "callback_void3pfnCall");

        let Some(TypeDef::Typedef(cb)) = registry.get("callback_void1pfnCall") else {
            panic!("callback typedef missing");
        };
        assert!(cb.is_func);
        assert_eq!(cb.underlying, "void (*callback_void1pfnCall)(Unit* pUnit)");
        assert_eq!(cb.depends.iter().collect::<Vec<_>>(), ["Unit"]);
    }

    #[test]
    fn struct_flexible_array_member() {
        let dump = "struct Packet {\n    int nSize;\n    char data[0];\n};\n";
        let registry = parse_dump(dump).unwrap();
        let packet = record(&registry, "Packet");
        assert_eq!(
            packet.fields[1],
            Field::new("char", "data[1]", "/* variable size */")
        );
        assert!(packet.depends.is_empty());
    }

    #[test]
    fn enum_qualified_struct_field_depends_on_enum() {
        let dump = "struct Unit {\n    enum UnitType eType;\n};\n";
        let registry = parse_dump(dump).unwrap();
        let unit = record(&registry, "Unit");
        assert_eq!(unit.fields[0], Field::new("UnitType", "eType", ""));
        assert_eq!(unit.depends.iter().collect::<Vec<_>>(), ["UnitType"]);
    }

    #[test]
    fn unterminated_struct_is_fatal() {
        let err = parse_dump("struct Unit {\n    int n;\n").unwrap_err();
        assert!(
            matches!(err, ParseError::Unterminated { kind: "struct", ref name } if name == "Unit")
        );
    }

    #[test]
    fn unterminated_union_is_fatal() {
        let err = parse_dump("union Value {\n    int n;\n").unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { kind: "union", .. }));
    }

    #[test]
    fn duplicate_declaration_is_fatal() {
        let dump = "typedef int Foo;\nstruct Foo {\n    int n;\n};\n";
        let err = parse_dump(dump).unwrap_err();
        assert!(matches!(err, ParseError::DuplicateType { ref name } if name == "Foo"));
    }
}
