use crate::error::{InstrumentError, Result};
use gocov_protocol::unquote;
use tree_sitter::Node;

/// Packages the registry itself depends on, plus pseudo-packages
const UNINSTRUMENTABLE: [&str; 6] = ["C", "runtime", "sync", "sync/atomic", "syscall", "unsafe"];

/// Whether a package may be instrumented at all
#[must_use]
pub fn instrumentable(path: &str) -> bool {
    !UNINSTRUMENTABLE.contains(&path)
}

/// Import path an instrumented copy of `path` is published under.
///
/// Instrumented code imports the registry, so an instrumented registry must
/// move aside to keep importing its pristine self.
#[must_use]
pub fn instrumented_package_path(registry_import: &str, path: &str) -> String {
    if path == registry_import {
        format!("{registry_import}/instrumented")
    } else {
        path.to_string()
    }
}

/// One `import` spec of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportSpec {
    /// Explicit name: an identifier, `_` or `.`
    pub name: Option<String>,
    pub path: String,
    /// Byte range of the path literal, quotes included
    pub literal: (usize, usize),
}

#[derive(Debug, Default)]
pub(crate) struct Imports {
    pub specs: Vec<ImportSpec>,
    /// End of the last import declaration
    pub end: Option<usize>,
}

impl Imports {
    pub fn collect(root: Node<'_>, src: &str) -> Result<Self> {
        let mut imports = Self::default();
        let mut cursor = root.walk();
        let decls: Vec<_> = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() == "import_declaration")
            .collect();
        for decl in decls {
            imports.end = Some(decl.end_byte());
            let mut cursor = decl.walk();
            let children: Vec<_> = decl.named_children(&mut cursor).collect();
            for child in children {
                match child.kind() {
                    "import_spec" => imports.specs.push(spec(child, src)?),
                    "import_spec_list" => {
                        let mut cursor = child.walk();
                        let specs: Vec<_> = child
                            .named_children(&mut cursor)
                            .filter(|n| n.kind() == "import_spec")
                            .collect();
                        for s in specs {
                            imports.specs.push(spec(s, src)?);
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(imports)
    }

    /// Name under which `path` is usable as a qualifier, if imported
    pub fn qualifier(&self, path: &str) -> Option<String> {
        self.specs
            .iter()
            .filter(|spec| spec.path == path)
            .find_map(ImportSpec::bound_name)
            .map(str::to_string)
    }

    /// Whether some import already binds `name` in the file scope
    pub fn binds(&self, name: &str) -> bool {
        self.specs.iter().any(|spec| spec.bound_name() == Some(name))
    }

    /// `base`, or `base1`, `base2`, ... if taken
    pub fn fresh_name(&self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 1;
        while self.binds(&name) {
            name = format!("{base}{n}");
            n += 1;
        }
        name
    }
}

impl ImportSpec {
    fn bound_name(&self) -> Option<&str> {
        match self.name.as_deref() {
            Some("_" | ".") => None,
            Some(name) => Some(name),
            None => Some(self.path.rsplit('/').next().unwrap_or(&self.path)),
        }
    }
}

fn spec(node: Node<'_>, src: &str) -> Result<ImportSpec> {
    let text = |n: Node<'_>| &src[n.start_byte()..n.end_byte()];
    let name = node.child_by_field_name("name").map(|n| text(n).to_string());
    let literal_node = node
        .child_by_field_name("path")
        .ok_or_else(|| InstrumentError::InvalidImport {
            literal: text(node).to_string(),
            reason: "missing path".into(),
        })?;
    let literal = text(literal_node);
    let path = unquote_path(literal).map_err(|reason| InstrumentError::InvalidImport {
        literal: literal.to_string(),
        reason,
    })?;
    Ok(ImportSpec {
        name,
        path,
        literal: (literal_node.start_byte(), literal_node.end_byte()),
    })
}

fn unquote_path(literal: &str) -> std::result::Result<String, String> {
    if let Some(raw) = literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
        return Ok(raw.to_string());
    }
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| "not a string literal".to_string())
        .and_then(unquote)
}
