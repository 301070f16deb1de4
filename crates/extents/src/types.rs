use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// 1-based line and byte column, as Go reports positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    #[must_use]
    pub const fn from_point(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row + 1,
            column: point.column + 1,
        }
    }
}

/// Byte range `[start, end)` with the positions of both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    pub start: usize,
    pub end: usize,
    pub start_pos: Position,
    pub end_pos: Position,
}

impl Extent {
    #[must_use]
    pub fn of(node: Node<'_>) -> Self {
        Self {
            start: node.start_byte(),
            end: node.end_byte(),
            start_pos: Position::from_point(node.start_position()),
            end_pos: Position::from_point(node.end_position()),
        }
    }
}

/// How a statement appears in source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StmtKind {
    /// A statement written in a statement list
    Simple,

    /// Synthetic statement standing for `else if`; the extent starts at
    /// `else` and ends with the nested `if`
    ElseIf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StmtExtent {
    pub extent: Extent,
    pub kind: StmtKind,

    /// Byte offset of the nested `if` for [`StmtKind::ElseIf`]; the statement
    /// start otherwise
    pub anchor: usize,
}

/// A function or method with the statements attributed to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncExtent {
    /// `F`, `T.M`, or `@line:col` for a literal outside any function
    pub name: String,
    pub extent: Extent,

    /// Byte offset just after the body's opening brace
    pub body: usize,

    /// Statements in source order, including those of nested literals
    pub stmts: Vec<StmtExtent>,
}
