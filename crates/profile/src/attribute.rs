use crate::parse::ProfileBlock;
use gocov_extents::StmtExtent;

/// Hit count of each statement, in the order of `stmts`.
///
/// A statement takes the count of the first block (in position order) that
/// overlaps it; further overlapping blocks are ignored. Neither input needs
/// to be sorted.
#[must_use]
pub fn attribute(stmts: &[StmtExtent], blocks: &[ProfileBlock]) -> Vec<i64> {
    let mut order: Vec<usize> = (0..stmts.len()).collect();
    order.sort_by_key(|&i| (stmts[i].extent.start_pos, stmts[i].extent.end_pos));
    let mut blocks = blocks.to_vec();
    blocks.sort_by_key(|b| (b.start(), b.end(), b.count));

    let mut reached = vec![0; stmts.len()];
    // Blocks before `first` end before every remaining statement starts.
    let mut first = 0;
    for i in order {
        let start = stmts[i].extent.start_pos;
        let end = stmts[i].extent.end_pos;
        let mut k = first;
        while let Some(block) = blocks.get(k) {
            if block.start() >= end {
                break;
            }
            if block.end() <= start {
                k += 1;
                continue;
            }
            reached[i] += block.count;
            break;
        }
        first = k;
    }
    reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use gocov_extents::{Extent, Position, StmtKind};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn stmt(start: (usize, usize), end: (usize, usize)) -> StmtExtent {
        StmtExtent {
            extent: Extent {
                start: 0,
                end: 0,
                start_pos: Position {
                    line: start.0,
                    column: start.1,
                },
                end_pos: Position {
                    line: end.0,
                    column: end.1,
                },
            },
            kind: StmtKind::Simple,
            anchor: 0,
        }
    }

    fn block(start: (usize, usize), end: (usize, usize), count: i64) -> ProfileBlock {
        ProfileBlock {
            start_line: start.0,
            start_col: start.1,
            end_line: end.0,
            end_col: end.1,
            num_stmt: 1,
            count,
        }
    }

    #[test]
    fn multi_line_statement_takes_first_block() {
        let stmts = [stmt((1, 1), (3, 10))];
        let blocks = [block((1, 0), (2, 5), 3), block((2, 6), (3, 9), 1)];
        assert_eq!(attribute(&stmts, &blocks), vec![3]);
    }

    #[test]
    fn touching_blocks_do_not_overlap() {
        let stmts = [stmt((2, 1), (2, 8))];
        let before = block((1, 1), (2, 1), 7);
        let after = block((2, 8), (3, 1), 9);
        assert_eq!(attribute(&stmts, &[before, after]), vec![0]);
    }

    #[test]
    fn nested_statements_see_their_own_block() {
        // `defer func() { x-- }()` with the literal body never run
        let stmts = [stmt((5, 2), (7, 5)), stmt((6, 3), (6, 6))];
        let blocks = [block((4, 1), (5, 20), 1), block((6, 3), (6, 6), 0), block((7, 5), (8, 2), 1)];
        assert_eq!(attribute(&stmts, &blocks), vec![1, 0]);
    }

    #[test]
    fn statement_order_is_preserved() {
        let stmts = [stmt((9, 1), (9, 5)), stmt((1, 1), (1, 5))];
        let blocks = [block((1, 1), (1, 5), 2), block((9, 1), (9, 5), 4)];
        assert_eq!(attribute(&stmts, &blocks), vec![4, 2]);
    }

    proptest! {
        #[test]
        fn shuffled_blocks_attribute_the_same(
            lines in prop::collection::vec(1usize..60, 1..20),
            counts in prop::collection::vec(0i64..5, 20),
            seed in any::<u64>(),
        ) {
            let stmts: Vec<StmtExtent> = lines.iter().map(|&l| stmt((l, 2), (l, 9))).collect();
            let blocks: Vec<ProfileBlock> = (0..20)
                .map(|i| block((i * 3 + 1, 1), (i * 3 + 3, 1), counts[i]))
                .collect();
            let mut shuffled = blocks.clone();
            let n = shuffled.len();
            for i in 0..n {
                let j = (seed.wrapping_mul(i as u64 + 1).wrapping_add(7) % n as u64) as usize;
                shuffled.swap(i, j);
            }
            prop_assert_eq!(attribute(&stmts, &blocks), attribute(&stmts, &shuffled));
        }
    }
}
