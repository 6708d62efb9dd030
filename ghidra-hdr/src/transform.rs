//! Struct transforms applied to the resolved closure before emission.
//!
//! Overrides run first so compression sees the final field types.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::model::{Field, RecordDef, Registry, TypeDef, TypeKind};
use crate::resolve::Closure;

/// Per-struct field type overrides: `struct → field → type`.
pub type OverrideTable = HashMap<String, HashMap<String, String>>;

/// Prefix of the placeholder names Ghidra gives undefined fields.
const PLACEHOLDER_PREFIX: &str = "field_";

/// Comment attached to a compressed run.
pub const COMPRESSED_COMMENT: &str = "// compressed";

/// Apply overrides, then (if `compress`) placeholder compression, to every
/// struct in `closure`.
pub fn apply(registry: &mut Registry, closure: &Closure, overrides: &OverrideTable, compress: bool) {
    for (name, kind) in closure.resolved() {
        if kind != TypeKind::Struct {
            continue;
        }
        let Some(TypeDef::Struct(record)) = registry.get_mut(name) else {
            continue;
        };

        if let Some(table) = overrides.get(name) {
            apply_overrides(record, table);
        }

        if compress {
            let before = record.fields.len();
            record.fields = compress_fields(std::mem::take(&mut record.fields));
            if record.fields.len() != before {
                debug!(
                    name,
                    before,
                    after = record.fields.len(),
                    "compressed placeholder fields"
                );
            }
        }
    }
}

/// Replace the type of each field named in `table`. Returns how many fields
/// were rewritten.
pub fn apply_overrides(record: &mut RecordDef, table: &HashMap<String, String>) -> usize {
    let mut applied = 0;
    for (field_name, ty) in table {
        match record.fields.iter_mut().find(|f| &f.name == field_name) {
            Some(field) => {
                debug!(
                    owner = %record.name,
                    field = %field_name,
                    from = %field.ty,
                    to = %ty,
                    "override field type"
                );
                field.ty = ty.clone();
                applied += 1;
            }
            None => warn!(
                owner = %record.name,
                field = %field_name,
                "override names a field the struct does not have"
            ),
        }
    }
    applied
}

fn is_placeholder(field: &Field) -> bool {
    field.name.starts_with(PLACEHOLDER_PREFIX) && !field.name.contains('[')
}

/// Collapse runs of two or more consecutive `field_*` placeholders of the same
/// type into one array field `_<n>[<len>]`, numbering runs from 0.
pub fn compress_fields(fields: Vec<Field>) -> Vec<Field> {
    let mut out = Vec::with_capacity(fields.len());
    let mut run: Vec<Field> = Vec::new();
    let mut runs = 0usize;

    for field in fields {
        if !is_placeholder(&field) {
            flush_run(&mut run, &mut out, &mut runs);
            out.push(field);
            continue;
        }
        if run.first().is_some_and(|first| first.ty != field.ty) {
            flush_run(&mut run, &mut out, &mut runs);
        }
        run.push(field);
    }
    flush_run(&mut run, &mut out, &mut runs);
    out
}

fn flush_run(run: &mut Vec<Field>, out: &mut Vec<Field>, runs: &mut usize) {
    if run.len() < 2 {
        out.append(run);
        return;
    }
    let ty = run[0].ty.clone();
    out.push(Field::new(
        ty,
        format!("_{}[{}]", runs, run.len()),
        COMPRESSED_COMMENT,
    ));
    *runs += 1;
    run.clear();
}
