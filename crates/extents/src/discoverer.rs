use crate::config::DiscoveryConfig;
use crate::error::{ExtentError, Result};
use crate::language::SourceLanguage;
use crate::types::{Extent, FuncExtent, Position, StmtExtent, StmtKind};
use std::path::Path;
use tree_sitter::{Node, Tree};

const ELSE_PREFIX: usize = "else ".len();

/// Finds function and statement extents in Go source
#[derive(Debug, Clone, Default)]
pub struct ExtentDiscoverer {
    config: DiscoveryConfig,
    language: SourceLanguage,
}

impl ExtentDiscoverer {
    /// Create a discoverer; fails on an invalid configuration
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            language: SourceLanguage::Go,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Parse `src`, rejecting oversized input and syntax errors.
    pub fn parse(&self, src: &str) -> Result<Tree> {
        if src.len() > self.config.max_file_bytes {
            return Err(ExtentError::TooLarge {
                size: src.len(),
                limit: self.config.max_file_bytes,
            });
        }
        let tree = self
            .language
            .parser()?
            .parse(src, None)
            .ok_or_else(|| ExtentError::tree_sitter("parser returned no tree"))?;
        let root = tree.root_node();
        if root.has_error() {
            let at = first_error(root).unwrap_or(root);
            let pos = Position::from_point(at.start_position());
            return Err(ExtentError::Syntax {
                line: pos.line,
                column: pos.column,
            });
        }
        Ok(tree)
    }

    pub fn discover(&self, src: &str) -> Result<Vec<FuncExtent>> {
        if self.config.skip_generated && is_generated(src) {
            log::debug!("skipping generated source");
            return Ok(Vec::new());
        }
        let tree = self.parse(src)?;
        Ok(self.discover_tree(&tree, src))
    }

    /// Discover over a tree already produced by [`Self::parse`] for `src`.
    #[must_use]
    pub fn discover_tree(&self, tree: &Tree, src: &str) -> Vec<FuncExtent> {
        let mut walker = Walker {
            src,
            top_level_literals: self.config.top_level_literals,
            funcs: Vec::new(),
        };
        walker.source_file(tree.root_node());
        walker.funcs
    }

    pub fn discover_file(&self, path: impl AsRef<Path>) -> Result<Vec<FuncExtent>> {
        let path = path.as_ref();
        SourceLanguage::from_path(path)?;
        let src = std::fs::read_to_string(path)?;
        log::debug!("discovering extents in {}", path.display());
        self.discover(&src)
    }
}

/// Whether the source carries the standard generated-code marker before its
/// package clause.
#[must_use]
pub fn is_generated(src: &str) -> bool {
    src.lines()
        .map(str::trim_end)
        .take_while(|line| !line.starts_with("package "))
        .any(|line| line.starts_with("// Code generated ") && line.ends_with(" DO NOT EDIT."))
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<_> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing())
        .find_map(first_error)
}

fn is_compound(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "for_statement"
            | "expression_switch_statement"
            | "type_switch_statement"
            | "select_statement"
            | "block"
    )
}

struct Walker<'a> {
    src: &'a str,
    top_level_literals: bool,
    funcs: Vec<FuncExtent>,
}

impl<'a> Walker<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        &self.src[node.start_byte()..node.end_byte()]
    }

    fn source_file(&mut self, root: Node<'_>) {
        let mut cursor = root.walk();
        let children: Vec<_> = root.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "function_declaration" | "method_declaration" => self.declaration(child),
                _ => self.expressions(child, None),
            }
        }
    }

    fn declaration(&mut self, node: Node<'_>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(name) = node.child_by_field_name("name") else {
            return;
        };
        let name = self.text(name);
        let name = match self.receiver_type(node) {
            Some(receiver) => format!("{receiver}.{name}"),
            None => name.to_string(),
        };
        let func = self.open(name, node, body);
        self.statements(body, func);
    }

    /// Receiver type with pointers and parentheses removed; `T[A,B]` for
    /// generic receivers.
    fn receiver_type(&self, method: Node<'_>) -> Option<String> {
        let receiver = method.child_by_field_name("receiver")?;
        let mut cursor = receiver.walk();
        let param = receiver
            .named_children(&mut cursor)
            .find(|c| c.kind() == "parameter_declaration")?;
        let mut ty = param.child_by_field_name("type")?;
        while matches!(ty.kind(), "pointer_type" | "parenthesized_type") {
            ty = ty.named_child(0)?;
        }
        Some(self.text(ty).split_whitespace().collect())
    }

    fn open(&mut self, name: String, node: Node<'_>, body: Node<'_>) -> usize {
        self.funcs.push(FuncExtent {
            name,
            extent: Extent::of(node),
            body: body.start_byte() + 1,
            stmts: Vec::new(),
        });
        self.funcs.len() - 1
    }

    fn register(&mut self, func: usize, stmt: StmtExtent) {
        self.funcs[func].stmts.push(stmt);
    }

    /// Walk a statement list (a block, a case body, or a bare list).
    fn statements(&mut self, list: Node<'_>, func: usize) {
        let mut cursor = list.walk();
        let children: Vec<_> = list.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "statement_list" => self.statements(child, func),
                "comment" | "empty_statement" => {}
                _ => self.statement(child, func),
            }
        }
    }

    fn statement(&mut self, node: Node<'_>, func: usize) {
        match node.kind() {
            "block" => self.statements(node, func),
            "if_statement" => self.if_statement(node, func),
            "for_statement" => {
                let mut cursor = node.walk();
                let children: Vec<_> = node.named_children(&mut cursor).collect();
                for child in children {
                    if child.kind() == "block" {
                        self.statements(child, func);
                    } else {
                        self.expressions(child, Some(func));
                    }
                }
            }
            "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
                let mut cursor = node.walk();
                let children: Vec<_> = node.named_children(&mut cursor).collect();
                for child in children {
                    match child.kind() {
                        "expression_case" | "type_case" | "default_case" | "communication_case" => {
                            self.case_clause(child, func);
                        }
                        "comment" => {}
                        _ => self.expressions(child, Some(func)),
                    }
                }
            }
            "labeled_statement" => {
                let inner = labeled_inner(node);
                match inner {
                    Some(inner) if is_compound(inner.kind()) => self.statement(inner, func),
                    _ => self.simple(node, func),
                }
            }
            _ => self.simple(node, func),
        }
    }

    fn simple(&mut self, node: Node<'_>, func: usize) {
        self.register(
            func,
            StmtExtent {
                extent: Extent::of(node),
                kind: StmtKind::Simple,
                anchor: node.start_byte(),
            },
        );
        self.expressions(node, Some(func));
    }

    fn if_statement(&mut self, node: Node<'_>, func: usize) {
        for field in ["initializer", "condition"] {
            if let Some(child) = node.child_by_field_name(field) {
                self.expressions(child, Some(func));
            }
        }
        if let Some(consequence) = node.child_by_field_name("consequence") {
            self.statements(consequence, func);
        }
        let Some(alternative) = node.child_by_field_name("alternative") else {
            return;
        };
        if alternative.kind() == "if_statement" {
            let mut extent = Extent::of(alternative);
            extent.start = extent.start.saturating_sub(ELSE_PREFIX);
            extent.start_pos.column = extent.start_pos.column.saturating_sub(ELSE_PREFIX).max(1);
            self.register(
                func,
                StmtExtent {
                    extent,
                    kind: StmtKind::ElseIf,
                    anchor: alternative.start_byte(),
                },
            );
            self.if_statement(alternative, func);
        } else {
            self.statements(alternative, func);
        }
    }

    fn case_clause(&mut self, node: Node<'_>, func: usize) {
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return;
        }
        loop {
            let child = cursor.node();
            let field = cursor.field_name();
            if child.is_named() {
                match (field, child.kind()) {
                    (Some("value" | "type" | "communication"), _) => {
                        self.expressions(child, Some(func));
                    }
                    (_, "statement_list") => self.statements(child, func),
                    (_, "comment" | "empty_statement") => {}
                    _ => self.statement(child, func),
                }
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    /// Search non-statement syntax for function literals.
    ///
    /// Inside a function, a literal's statements are folded into it.
    /// Outside any function, the literal becomes its own function.
    fn expressions(&mut self, node: Node<'_>, func: Option<usize>) {
        if node.kind() == "func_literal" {
            let Some(body) = node.child_by_field_name("body") else {
                return;
            };
            match func {
                Some(func) => self.statements(body, func),
                None if self.top_level_literals => {
                    let pos = Position::from_point(node.start_position());
                    let func = self.open(format!("@{}:{}", pos.line, pos.column), node, body);
                    self.statements(body, func);
                }
                None => {}
            }
            return;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.named_children(&mut cursor).collect();
        for child in children {
            self.expressions(child, func);
        }
    }
}

fn labeled_inner(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let inner = node
        .named_children(&mut cursor)
        .find(|child| child.kind() != "label_name" && child.kind() != "comment");
    inner
}
