//! Statement coverage percentages and the plain text report.

use crate::model::{FunctionCoverage, PackageCoverage};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Write as _;
use std::path::Path;

/// Percentage of `reached` over `total`; zero when there is nothing to reach
#[must_use]
pub fn coverage_percent(reached: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        reached as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionSummary {
    pub name: String,
    pub file: String,
    pub reached: usize,
    pub total: usize,
}

impl FunctionSummary {
    #[must_use]
    pub fn new(function: &FunctionCoverage) -> Self {
        Self {
            name: function.name.clone(),
            file: function.file.clone(),
            reached: function.statements_reached(),
            total: function.statements.len(),
        }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        coverage_percent(self.reached, self.total)
    }

    // Higher coverage first, then larger functions first.
    fn report_order(&self, other: &Self) -> Ordering {
        other
            .percent()
            .total_cmp(&self.percent())
            .then(other.total.cmp(&self.total))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageSummary {
    pub name: String,
    /// In report order
    pub functions: Vec<FunctionSummary>,
    pub reached: usize,
    pub total: usize,
}

impl PackageSummary {
    #[must_use]
    pub fn new(package: &PackageCoverage) -> Self {
        let mut functions: Vec<FunctionSummary> =
            package.functions.iter().map(FunctionSummary::new).collect();
        functions.sort_by(FunctionSummary::report_order);
        Self {
            name: package.name.clone(),
            reached: functions.iter().map(|f| f.reached).sum(),
            total: functions.iter().map(|f| f.total).sum(),
            functions,
        }
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        coverage_percent(self.reached, self.total)
    }
}

#[must_use]
pub fn summarize(packages: &[PackageCoverage]) -> Vec<PackageSummary> {
    packages.iter().map(PackageSummary::new).collect()
}

/// Render summaries as aligned text, one block per package:
///
/// ```text
/// example.com/p/f.go  Run  66.67% (2/3)
/// example.com/p/f.go  New  0.00% (0/1)
/// Total coverage: 50.00% (2/4)
/// ```
#[must_use]
pub fn render_text(summaries: &[PackageSummary]) -> String {
    let mut out = String::new();
    for package in summaries {
        let locations: Vec<String> = package
            .functions
            .iter()
            .map(|f| format!("{}/{}", package.name, base_name(&f.file)))
            .collect();
        let location_width = locations.iter().map(String::len).max().unwrap_or(0);
        let name_width = package.functions.iter().map(|f| f.name.len()).max().unwrap_or(0);

        for (function, location) in package.functions.iter().zip(&locations) {
            let _ = writeln!(
                out,
                "{location:<location_width$}  {:<name_width$}  {:.2}% ({}/{})",
                function.name,
                function.percent(),
                function.reached,
                function.total,
            );
        }
        let _ = writeln!(
            out,
            "Total coverage: {:.2}% ({}/{})",
            package.percent(),
            package.reached,
            package.total
        );
        out.push('\n');
    }
    out
}

fn base_name(file: &str) -> &str {
    Path::new(file)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StatementCoverage;
    use pretty_assertions::assert_eq;

    fn function(name: &str, reached: &[i64]) -> FunctionCoverage {
        let mut f = FunctionCoverage::new(name, "/src/p/f.go", 0, 100);
        f.statements = reached
            .iter()
            .enumerate()
            .map(|(i, &reached)| StatementCoverage {
                start: i,
                end: i + 1,
                reached,
            })
            .collect();
        f
    }

    fn package() -> PackageCoverage {
        PackageCoverage {
            name: "example.com/p".into(),
            functions: vec![
                function("New", &[0]),
                function("Run", &[1, 4, 0]),
                function("Empty", &[]),
                function("T.Close", &[2]),
            ],
        }
    }

    #[test]
    fn percent_of_nothing_is_zero() {
        assert_eq!(coverage_percent(0, 0), 0.0);
        assert_eq!(coverage_percent(1, 4), 25.0);
    }

    #[test]
    fn orders_by_descending_coverage() {
        let summary = PackageSummary::new(&package());
        let order: Vec<&str> = summary.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(order, vec!["T.Close", "Run", "New", "Empty"]);
        assert_eq!((summary.reached, summary.total), (3, 5));
    }

    #[test]
    fn renders_aligned_text() {
        let text = render_text(&summarize(&[package()]));
        assert_eq!(
            text,
            "example.com/p/f.go  T.Close  100.00% (1/1)\n\
             example.com/p/f.go  Run      66.67% (2/3)\n\
             example.com/p/f.go  New      0.00% (0/1)\n\
             example.com/p/f.go  Empty    0.00% (0/0)\n\
             Total coverage: 60.00% (3/5)\n\n"
        );
    }

    #[test]
    fn empty_package_still_has_a_total() {
        let text = render_text(&summarize(&[PackageCoverage::new("q")]));
        assert_eq!(text, "Total coverage: 0.00% (0/0)\n\n");
    }
}
