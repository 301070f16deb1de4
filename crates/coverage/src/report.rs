use crate::error::ReportError;
use crate::model::PackageCoverage;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

type Result<T> = std::result::Result<T, ReportError>;

/// Packages kept sorted by name; the unit that gets serialized and merged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Report {
    #[serde(default, deserialize_with = "sorted_packages")]
    packages: Vec<PackageCoverage>,
}

// Reports written by other tools may list packages in any order.
fn sorted_packages<'de, D>(deserializer: D) -> std::result::Result<Vec<PackageCoverage>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut packages = Option::<Vec<PackageCoverage>>::deserialize(deserializer)?.unwrap_or_default();
    packages.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(packages)
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn packages(&self) -> &[PackageCoverage] {
        &self.packages
    }

    #[must_use]
    pub fn into_packages(self) -> Vec<PackageCoverage> {
        self.packages
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<&PackageCoverage> {
        self.search(name).ok().map(|i| &self.packages[i])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn search(&self, name: &str) -> std::result::Result<usize, usize> {
        self.packages.binary_search_by(|p| p.name.as_str().cmp(name))
    }

    /// Insert a package that must not already be present.
    pub fn add_package(&mut self, package: PackageCoverage) -> Result<()> {
        match self.search(&package.name) {
            Ok(_) => Err(ReportError::DuplicatePackage(package.name)),
            Err(i) => {
                self.packages.insert(i, package);
                Ok(())
            }
        }
    }

    /// Accumulate into the package of the same name, inserting it if absent.
    ///
    /// On a structural mismatch the report is left unchanged.
    pub fn merge_package(&mut self, package: PackageCoverage) -> Result<()> {
        match self.search(&package.name) {
            Ok(i) => self.packages[i]
                .accumulate(&package)
                .map_err(|source| ReportError::Merge {
                    package: package.name,
                    source,
                }),
            Err(i) => {
                self.packages.insert(i, package);
                Ok(())
            }
        }
    }

    /// Merge every package of `other`.
    ///
    /// All packages are checked before any is merged; on a mismatch the
    /// report is left unchanged.
    pub fn merge_report(&mut self, other: Self) -> Result<()> {
        for package in &other.packages {
            if let Ok(i) = self.search(&package.name) {
                self.packages[i]
                    .check_compatible(package)
                    .map_err(|source| ReportError::Merge {
                        package: package.name.clone(),
                        source,
                    })?;
            }
        }
        other
            .packages
            .into_iter()
            .try_for_each(|package| self.merge_package(package))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read_from(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Write the JSON report followed by a newline.
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        serde_json::to_writer(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl FromIterator<PackageCoverage> for Report {
    /// Collect packages, accumulating duplicates that match and keeping the
    /// first of those that do not.
    fn from_iter<I: IntoIterator<Item = PackageCoverage>>(iter: I) -> Self {
        let mut report = Self::new();
        for package in iter {
            if let Err(err) = report.merge_package(package) {
                log::warn!("{err}");
            }
        }
        report
    }
}
