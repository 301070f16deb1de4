use crate::attribute::attribute;
use crate::error::{ProfileError, Result};
use crate::parse::Profile;
use gocov_coverage::registry::Package;
use gocov_coverage::{PackageCoverage, Registry};
use gocov_extents::{DiscoveryConfig, ExtentDiscoverer, FuncExtent};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maps profile file names to files on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceResolver {
    /// Module path the profile file names start with
    pub module: Option<String>,
    /// Directory the module (or, without one, the import paths) is rooted at
    pub root: PathBuf,
}

impl SourceResolver {
    pub fn new(module: Option<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            module,
            root: root.into(),
        }
    }

    #[must_use]
    pub fn resolve(&self, file_name: &str) -> PathBuf {
        let relative = self
            .module
            .as_deref()
            .and_then(|module| file_name.strip_prefix(module))
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(file_name);
        self.root.join(relative)
    }
}

/// Configuration for profile ingestion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestConfig {
    /// Worker threads analyzing source files; 0 picks one per CPU
    pub jobs: usize,
    pub discovery: DiscoveryConfig,
}

impl IngestConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.discovery
            .validate()
            .map_err(|e| ProfileError::InvalidConfig(e.to_string()))
    }
}

/// Ingestion result: the packages built and the profiles that were skipped
#[derive(Debug, Default)]
pub struct Ingested {
    /// Sorted by name
    pub packages: Vec<PackageCoverage>,
    pub skipped: Vec<(String, ProfileError)>,
}

struct Analyzed {
    package: String,
    path: PathBuf,
    funcs: Vec<FuncExtent>,
    reached: Vec<Vec<i64>>,
}

/// Attributes cover profile blocks onto discovered statements.
pub struct Ingester {
    config: IngestConfig,
    discoverer: ExtentDiscoverer,
    resolver: SourceResolver,
}

impl Ingester {
    pub fn new(config: IngestConfig, resolver: SourceResolver) -> Result<Self> {
        config.validate()?;
        let discoverer = ExtentDiscoverer::new(config.discovery.clone())
            .map_err(|e| ProfileError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            config,
            discoverer,
            resolver,
        })
    }

    /// Analyze every profiled file on a bounded pool, then register the
    /// results in profile order so uids are reproducible.
    ///
    /// A file that cannot be read or parsed is skipped and reported in
    /// [`Ingested::skipped`]; the rest continue.
    pub fn ingest(&self, profiles: &[Profile]) -> Result<Ingested> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.jobs)
            .build()?;
        let analyzed: Vec<Result<Analyzed>> =
            pool.install(|| profiles.par_iter().map(|p| self.analyze(p)).collect());

        let registry = Registry::new();
        let mut packages: HashMap<String, Arc<Package>> = HashMap::new();
        // Keyed by file as well: `init` and top-level literals repeat across files.
        let mut seen: HashSet<(String, String, usize)> = HashSet::new();
        let mut skipped = Vec::new();

        for (profile, result) in profiles.iter().zip(analyzed) {
            let file = match result {
                Ok(file) => file,
                Err(err) => {
                    log::warn!("skipping {}: {err}", profile.file_name);
                    skipped.push((profile.file_name.clone(), err));
                    continue;
                }
            };
            let package = Arc::clone(
                packages
                    .entry(file.package.clone())
                    .or_insert_with(|| registry.register_package(file.package.as_str())),
            );
            let file_name = file.path.display().to_string();
            for (func, reached) in file.funcs.iter().zip(&file.reached) {
                if !seen.insert((file_name.clone(), func.name.clone(), func.extent.start)) {
                    log::debug!("{file_name}: {} already registered", func.name);
                    continue;
                }
                let function = registry.register_function(
                    &package,
                    func.name.as_str(),
                    file_name.as_str(),
                    func.extent.start,
                    func.extent.end,
                );
                for (stmt, &count) in func.stmts.iter().zip(reached) {
                    registry
                        .register_statement(&function, stmt.extent.start, stmt.extent.end)
                        .record(count);
                }
            }
        }

        let mut packages = registry.snapshot();
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Ingested { packages, skipped })
    }

    fn analyze(&self, profile: &Profile) -> Result<Analyzed> {
        let path = self.resolver.resolve(&profile.file_name);
        let src = read_source(&path)?;
        let funcs = self
            .discoverer
            .discover(&src)
            .map_err(|source| ProfileError::Source {
                file: profile.file_name.clone(),
                source,
            })?;
        let reached = funcs
            .iter()
            .map(|func| attribute(&func.stmts, &profile.blocks))
            .collect();
        log::debug!("{}: {} functions", profile.file_name, funcs.len());
        Ok(Analyzed {
            package: profile.package().to_string(),
            path,
            funcs,
            reached,
        })
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })
}
