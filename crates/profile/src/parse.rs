//! Go cover profile text format.
//!
//! ```text
//! mode: count
//! example.com/m/p/f.go:3.14,5.2 2 1
//! ```

use crate::error::{ProfileError, Result};
use gocov_extents::Position;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const LINE_PATTERN: &str = r"^(.+):([0-9]+)\.([0-9]+),([0-9]+)\.([0-9]+) ([0-9]+) ([0-9]+)$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Set,
    Count,
    Atomic,
}

impl FromStr for Mode {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "set" => Ok(Self::Set),
            "count" => Ok(Self::Count),
            "atomic" => Ok(Self::Atomic),
            other => Err(ProfileError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Set => "set",
            Self::Count => "count",
            Self::Atomic => "atomic",
        })
    }
}

/// A source region with its hit count; columns are 1-based bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileBlock {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub num_stmt: usize,
    pub count: i64,
}

impl ProfileBlock {
    #[must_use]
    pub const fn start(&self) -> Position {
        Position {
            line: self.start_line,
            column: self.start_col,
        }
    }

    #[must_use]
    pub const fn end(&self) -> Position {
        Position {
            line: self.end_line,
            column: self.end_col,
        }
    }
}

/// All blocks reported for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// File name as written in the profile, normally `<import path>/<file>`
    pub file_name: String,
    pub mode: Mode,
    /// Sorted by start position, duplicates combined
    pub blocks: Vec<ProfileBlock>,
}

impl Profile {
    /// Import path of the package the file belongs to
    #[must_use]
    pub fn package(&self) -> &str {
        self.file_name
            .rsplit_once('/')
            .map_or(".", |(dir, _)| dir)
    }
}

/// Parse profile text; profiles are returned sorted by file name.
pub fn parse_profiles(text: &str) -> Result<Vec<Profile>> {
    let pattern = Regex::new(LINE_PATTERN)?;
    let mut lines = text.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());

    let mode = match lines.next() {
        Some((_, line)) => match line.strip_prefix("mode: ") {
            Some(mode) if !mode.is_empty() => mode.parse::<Mode>()?,
            _ => return Err(ProfileError::BadModeLine(line.to_string())),
        },
        None => return Ok(Vec::new()),
    };

    let mut files: BTreeMap<String, Vec<ProfileBlock>> = BTreeMap::new();
    for (index, line) in lines {
        // Concatenated profiles repeat the header.
        if line.starts_with("mode: ") {
            continue;
        }
        let malformed = || ProfileError::Malformed {
            line: index + 1,
            text: line.to_string(),
        };
        let caps = pattern.captures(line).ok_or_else(malformed)?;
        let number = |i: usize| caps[i].parse::<usize>().map_err(|_| malformed());
        let block = ProfileBlock {
            start_line: number(2)?,
            start_col: number(3)?,
            end_line: number(4)?,
            end_col: number(5)?,
            num_stmt: number(6)?,
            count: caps[7].parse::<i64>().map_err(|_| malformed())?,
        };
        files.entry(caps[1].to_string()).or_default().push(block);
    }

    files
        .into_iter()
        .map(|(file_name, blocks)| {
            let blocks = combine_blocks(&file_name, mode, blocks)?;
            Ok(Profile {
                file_name,
                mode,
                blocks,
            })
        })
        .collect()
}

pub fn parse_profiles_file(path: &Path) -> Result<Vec<Profile>> {
    let text = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_profiles(&text)
}

/// Sort blocks and merge repeats of the same region, as the Go tooling does:
/// `set` profiles keep the highest count, the others add counts.
fn combine_blocks(file: &str, mode: Mode, mut blocks: Vec<ProfileBlock>) -> Result<Vec<ProfileBlock>> {
    blocks.sort_by_key(|b| (b.start(), b.end()));
    let mut combined: Vec<ProfileBlock> = Vec::with_capacity(blocks.len());
    for block in blocks {
        match combined.last_mut() {
            Some(last) if last.start() == block.start() && last.end() == block.end() => {
                if last.num_stmt != block.num_stmt {
                    return Err(ProfileError::InconsistentNumStmt {
                        file: file.to_string(),
                        before: last.num_stmt,
                        after: block.num_stmt,
                    });
                }
                last.count = match mode {
                    Mode::Set => last.count.max(block.count),
                    Mode::Count | Mode::Atomic => last.count.saturating_add(block.count),
                };
            }
            _ => combined.push(block),
        }
    }
    Ok(combined)
}
