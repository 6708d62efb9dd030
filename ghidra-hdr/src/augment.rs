//! Augmentation: methods and subclasses declared in hand-written sources.
//!
//! Two line scanners pull records out of existing C++ files: method
//! definitions (`RET [Ns::]Struct::method(ARGS)`) and subclass declarations
//! (`struct Child : public Base`). The records are attached to dumped
//! structs by name; anything that does not name a registered struct is
//! dropped.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::model::{ChildClass, Method, Registry};

static METHOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<ret>[\w\s\*&:]*?)\s*(?:\w+\s*::\s*)?(?P<owner>\w+)\s*::\s*(?P<name>~?\w+)\s*\((?P<args>.*)\)",
    )
    .expect("method pattern")
});

static CHILD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<keyword>struct|class)\s+(?P<name>\w+)\s*(?:final\s*)?:\s*(?:(?P<visibility>public|protected|private)\s+)?(?:virtual\s+)?(?:\w+\s*::\s*)*(?P<base>\w+)",
    )
    .expect("child class pattern")
});

/// A method definition found in a source file, with the struct it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    pub owner: String,
    pub method: Method,
}

/// Read an augmentation source. A missing or unreadable file yields `None`.
pub fn read_source(path: &Path) -> Option<String> {
    match std::fs::read(path) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            debug!(path = %path.display(), err = %e, "augmentation source unavailable");
            None
        }
    }
}

/// Scan a source file for out-of-line method definitions.
///
/// Statements (lines ending in `;`) are skipped so calls inside method
/// bodies are not mistaken for definitions.
pub fn scan_methods(text: &str) -> Vec<MethodRecord> {
    let mut records = Vec::new();
    for line in text.lines() {
        if line.trim_end().ends_with(';') {
            continue;
        }
        let Some(caps) = METHOD.captures(line) else {
            continue;
        };
        let return_type = caps["ret"].split_whitespace().collect::<Vec<_>>().join(" ");
        if return_type == "return" {
            continue;
        }
        let record = MethodRecord {
            owner: caps["owner"].to_string(),
            method: Method {
                return_type,
                name: caps["name"].to_string(),
                args: caps["args"].trim().to_string(),
            },
        };
        trace!(owner = %record.owner, method = %record.method.name, "found method");
        records.push(record);
    }
    records
}

/// Scan a header for `struct|class NAME : [visibility] BASE` declarations.
pub fn scan_children(text: &str) -> Vec<ChildClass> {
    let mut children = Vec::new();
    for line in text.lines() {
        let Some(caps) = CHILD.captures(line) else {
            continue;
        };
        let child = ChildClass {
            keyword: caps["keyword"].to_string(),
            name: caps["name"].to_string(),
            visibility: caps
                .name("visibility")
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            base: caps["base"].to_string(),
        };
        trace!(name = %child.name, base = %child.base, "found child class");
        children.push(child);
    }
    children
}

/// Methods and subclasses keyed by the name of the struct they attach to.
#[derive(Debug, Default, Clone)]
pub struct Augmentation {
    methods: HashMap<String, Vec<Method>>,
    children: HashMap<String, Vec<ChildClass>>,
}

impl Augmentation {
    /// Keep only records that name a struct registered in `registry`.
    pub fn new(registry: &Registry, methods: Vec<MethodRecord>, children: Vec<ChildClass>) -> Self {
        let mut augmentation = Self::default();
        let mut dropped = 0usize;

        for record in methods {
            if registry.is_struct(&record.owner) {
                augmentation
                    .methods
                    .entry(record.owner)
                    .or_default()
                    .push(record.method);
            } else {
                trace!(owner = %record.owner, method = %record.method.name, "method owner is not a dumped struct");
                dropped += 1;
            }
        }

        for child in children {
            if registry.is_struct(&child.base) {
                augmentation
                    .children
                    .entry(child.base.clone())
                    .or_default()
                    .push(child);
            } else {
                trace!(name = %child.name, base = %child.base, "child base is not a dumped struct");
                dropped += 1;
            }
        }

        debug!(
            methods = augmentation.methods.values().map(Vec::len).sum::<usize>(),
            children = augmentation.children.values().map(Vec::len).sum::<usize>(),
            dropped,
            "attached augmentation records"
        );
        augmentation
    }

    pub fn methods(&self, owner: &str) -> &[Method] {
        self.methods.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn children(&self, base: &str) -> &[ChildClass] {
        self.children.get(base).map(Vec::as_slice).unwrap_or(&[])
    }
}
