/// One change to the original text: insert `text` at `offset`, replacing
/// the `remove` bytes that follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub offset: usize,
    pub remove: usize,
    pub text: String,
}

impl Edit {
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            remove: 0,
            text: text.into(),
        }
    }

    pub fn replace(offset: usize, remove: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            remove,
            text: text.into(),
        }
    }
}

/// Build a new text interleaving `edits` with `src`.
///
/// Edits at the same offset keep the order they were given in. Edits must
/// not overlap a preceding replacement.
#[must_use]
pub fn apply_edits(src: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by_key(|edit| edit.offset);
    let extra: usize = edits.iter().map(|edit| edit.text.len()).sum();
    let mut out = String::with_capacity(src.len() + extra);
    let mut cursor = 0;
    for edit in edits {
        debug_assert!(edit.offset >= cursor, "overlapping edit at {}", edit.offset);
        out.push_str(&src[cursor..edit.offset]);
        out.push_str(&edit.text);
        cursor = edit.offset + edit.remove;
    }
    out.push_str(&src[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn interleaves_inserts_and_replacements() {
        let edits = vec![
            Edit::insert(11, "!"),
            Edit::replace(0, 5, "Goodbye"),
            Edit::insert(11, "?"),
        ];
        assert_eq!(apply_edits("hello world", edits), "Goodbye world!?");
    }

    #[test]
    fn no_edits_is_identity() {
        assert_eq!(apply_edits("package p\n", Vec::new()), "package p\n");
    }

    proptest! {
        #[test]
        fn inserts_only_add_text(src in "[a-z\\n]{0,40}", marks in prop::collection::vec(0usize..41, 0..8)) {
            let edits: Vec<Edit> = marks
                .iter()
                .map(|&m| Edit::insert(m.min(src.len()), "#"))
                .collect();
            let out = apply_edits(&src, edits);
            prop_assert_eq!(out.len(), src.len() + marks.len());
            prop_assert_eq!(out.replace('#', ""), src);
        }
    }
}
