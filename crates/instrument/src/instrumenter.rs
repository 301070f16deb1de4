use crate::config::InstrumentConfig;
use crate::edit::{apply_edits, Edit};
use crate::error::{InstrumentError, Result};
use crate::imports::{instrumentable, instrumented_package_path, Imports};
use gocov_coverage::registry::Package;
use gocov_coverage::Registry;
use gocov_extents::{is_generated, ExtentDiscoverer, FuncExtent, StmtKind};
use gocov_protocol::{quote, OBJECT_PREFIX};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;
use tree_sitter::Node;

/// Result of instrumenting one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentedFile {
    pub source: String,
    pub functions: usize,
    pub statements: usize,
}

/// Rewrites Go files so that they report coverage at run time.
///
/// Handles (`gocovObject<uid>`) are allocated from an instrument-time
/// [`Registry`]; one instrumenter must see every file of a package so the
/// handles stay unique within it.
pub struct Instrumenter {
    config: InstrumentConfig,
    discoverer: ExtentDiscoverer,
    registry: Registry,
    packages: HashMap<String, Arc<Package>>,
}

impl Instrumenter {
    pub fn new(config: InstrumentConfig) -> Result<Self> {
        config.validate()?;
        let discoverer = ExtentDiscoverer::new(config.discovery.clone())?;
        Ok(Self {
            config,
            discoverer,
            registry: Registry::new(),
            packages: HashMap::new(),
        })
    }

    #[must_use]
    pub const fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    /// Instrument-time registry holding every registered object, with zero counts
    #[must_use]
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Instrument one file of the package `package_path`.
    ///
    /// `file_name` is recorded in the registrations as the function's file.
    pub fn instrument_file(
        &mut self,
        package_path: &str,
        file_name: &str,
        src: &str,
    ) -> Result<InstrumentedFile> {
        if !instrumentable(package_path) {
            return Err(InstrumentError::NotInstrumentable(package_path.to_string()));
        }
        let tree = self.discoverer.parse(src)?;
        let root = tree.root_node();
        if declares_handles(root, src) {
            return Err(InstrumentError::AlreadyInstrumented(file_name.to_string()));
        }
        let imports = Imports::collect(root, src)?;
        let mut edits = self.rewrite_imports(&imports);

        let funcs = if self.config.discovery.skip_generated && is_generated(src) {
            log::debug!("{file_name}: generated, not instrumented");
            Vec::new()
        } else {
            self.discoverer.discover_tree(&tree, src)
        };
        if funcs.is_empty() {
            return Ok(InstrumentedFile {
                source: apply_edits(src, edits),
                functions: 0,
                statements: 0,
            });
        }

        let decl_offset = imports
            .end
            .or_else(|| package_clause_end(root))
            .unwrap_or(0);
        let mut decls = Vec::new();

        let package = match self.packages.get(package_path).cloned() {
            Some(package) => package,
            None => {
                let package = self.registry.register_package(package_path);
                let qualifier = match imports.qualifier(&self.config.registry_import) {
                    Some(name) => name,
                    None => {
                        let alias = imports.fresh_name(&self.config.registry_alias);
                        let separator = if imports.end.is_some() { "\n" } else { "\n\n" };
                        edits.push(Edit::insert(
                            decl_offset,
                            format!(
                                "{separator}import {alias} {}",
                                quote(&self.config.registry_import)
                            ),
                        ));
                        alias
                    }
                };
                decls.push(format!(
                    "var {} = {qualifier}.RegisterPackage({})",
                    package.object_ref(),
                    quote(package_path)
                ));
                self.packages.insert(package_path.to_string(), Arc::clone(&package));
                package
            }
        };

        let mut statements = 0;
        for func in &funcs {
            statements += func.stmts.len();
            self.instrument_function(&package, file_name, func, &mut edits, &mut decls);
        }

        let mut block = String::from("\n");
        for decl in &decls {
            let _ = write!(block, "\n{decl}");
        }
        edits.push(Edit::insert(decl_offset, block));

        log::debug!(
            "{file_name}: instrumented {} functions, {statements} statements",
            funcs.len()
        );
        Ok(InstrumentedFile {
            source: apply_edits(src, edits),
            functions: funcs.len(),
            statements,
        })
    }

    fn instrument_function(
        &self,
        package: &Package,
        file_name: &str,
        func: &FuncExtent,
        edits: &mut Vec<Edit>,
        decls: &mut Vec<String>,
    ) {
        let function = self.registry.register_function(
            package,
            func.name.as_str(),
            file_name,
            func.extent.start,
            func.extent.end,
        );
        let fref = function.object_ref();
        decls.push(format!(
            "var {fref} = {}.RegisterFunction({}, {}, {}, {})",
            package.object_ref(),
            quote(&func.name),
            quote(file_name),
            func.extent.start,
            func.extent.end
        ));
        if self.config.track_functions {
            edits.push(Edit::insert(
                func.body,
                format!(" {fref}.Enter(); defer {fref}.Leave();"),
            ));
        }

        for stmt in &func.stmts {
            let statement =
                self.registry
                    .register_statement(&function, stmt.extent.start, stmt.extent.end);
            let sref = statement.object_ref();
            decls.push(format!(
                "var {sref} = {fref}.RegisterStatement({}, {})",
                stmt.extent.start, stmt.extent.end
            ));
            match stmt.kind {
                StmtKind::Simple => edits.push(Edit::insert(stmt.anchor, format!("{sref}.At(); "))),
                StmtKind::ElseIf => {
                    edits.push(Edit::insert(stmt.anchor, format!("{{ {sref}.At(); ")));
                    edits.push(Edit::insert(stmt.extent.end, " }"));
                }
            }
        }
    }

    fn rewrite_imports(&self, imports: &Imports) -> Vec<Edit> {
        imports
            .specs
            .iter()
            .filter_map(|spec| {
                let target = self.config.rewrite_imports.get(&spec.path)?;
                let target = instrumented_package_path(&self.config.registry_import, target);
                let (start, end) = spec.literal;
                Some(Edit::replace(start, end - start, quote(&target)))
            })
            .collect()
    }
}

fn package_clause_end(root: Node<'_>) -> Option<usize> {
    let mut cursor = root.walk();
    let clause = root
        .named_children(&mut cursor)
        .find(|n| n.kind() == "package_clause")
        .map(|n| n.end_byte());
    clause
}

/// Whether the file declares package-level `gocovObject<N>` variables
fn declares_handles(root: Node<'_>, src: &str) -> bool {
    let mut cursor = root.walk();
    let decls: Vec<_> = root
        .named_children(&mut cursor)
        .filter(|n| n.kind() == "var_declaration")
        .collect();
    decls.into_iter().any(|decl| {
        let mut cursor = decl.walk();
        let mut specs: Vec<Node<'_>> = Vec::new();
        for child in decl.named_children(&mut cursor) {
            if child.kind() == "var_spec_list" {
                let mut inner = child.walk();
                specs.extend(child.named_children(&mut inner).filter(|n| n.kind() == "var_spec"));
            } else if child.kind() == "var_spec" {
                specs.push(child);
            }
        }
        specs.iter().any(|spec| {
            let mut cursor = spec.walk();
            let names: Vec<_> = spec.children_by_field_name("name", &mut cursor).collect();
            names.iter().any(|name| {
                src[name.start_byte()..name.end_byte()]
                    .strip_prefix(OBJECT_PREFIX)
                    .is_some_and(|uid| !uid.is_empty() && uid.bytes().all(|b| b.is_ascii_digit()))
            })
        })
    })
}
