use crate::object_ref::ObjectRef;
use crate::quote::quote;
use std::fmt;

/// One line of a trace log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `RegisterPackage("name"): <target>`
    RegisterPackage { name: String, target: ObjectRef },

    /// `<package>.RegisterFunction("name", "file", start, end): <target>`
    RegisterFunction {
        package: ObjectRef,
        name: String,
        file: String,
        start: usize,
        end: usize,
        target: ObjectRef,
    },

    /// `<function>.RegisterStatement(start, end): <target>`
    RegisterStatement {
        function: ObjectRef,
        start: usize,
        end: usize,
        target: ObjectRef,
    },

    /// `<function>.Enter()`
    Enter(ObjectRef),

    /// `<function>.Leave()`
    Leave(ObjectRef),

    /// `<statement>.At()`
    At(ObjectRef),
}

impl Event {
    /// Encode as a newline-terminated log line.
    #[must_use]
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegisterPackage { name, target } => {
                write!(f, "RegisterPackage({}): {target}", quote(name))
            }
            Self::RegisterFunction {
                package,
                name,
                file,
                start,
                end,
                target,
            } => write!(
                f,
                "{package}.RegisterFunction({}, {}, {start}, {end}): {target}",
                quote(name),
                quote(file)
            ),
            Self::RegisterStatement {
                function,
                start,
                end,
                target,
            } => write!(f, "{function}.RegisterStatement({start}, {end}): {target}"),
            Self::Enter(object) => write!(f, "{object}.Enter()"),
            Self::Leave(object) => write!(f, "{object}.Leave()"),
            Self::At(object) => write!(f, "{object}.At()"),
        }
    }
}
