//! The lockfile merger.
//!
//! One `ResolvedGraph` is produced per constituent build by reconciling its
//! dependency graph against the verification tiers and repository layouts;
//! `merge` then folds the resolved graphs into one canonical lockfile.
//! Everything short of a hash conflict degrades with a warning, because the
//! lockfile records best-effort reproducible provenance and should not
//! block builds on metadata gaps.

use std::collections::{BTreeMap, HashMap};

use futures::stream::{self, StreamExt};
use indexmap::IndexMap;
use tracing::{debug, warn};

use gradlock_cache::hash::sha256_hex;
use gradlock_cache::ComponentVerifier;
use gradlock_config::descriptor::parse_module_descriptor;
use gradlock_config::{DependencyGraph, GradleModule};
use gradlock_core::error::LockError;
use gradlock_core::types::{
    ArtifactFile, Checksum, ChecksumKind, DependencyCoordinates, Lockfile, Module, ModuleId,
    ModuleVersionId, Repository, RepositoryKind, VersionCache,
};
use gradlock_registry::{artifact_urls, HttpClient};

use crate::MergeResult;

/// Shared state for one merge run. All caches are owned by the run and
/// passed by reference, never process-global.
pub struct MergeContext<'a> {
    pub verifier: &'a ComponentVerifier<'a>,
    pub versions: &'a VersionCache,
    /// `None` disables the network fetch-and-hash tier (offline mode).
    pub client: Option<&'a HttpClient>,
    /// URL prefix of the local test mirror; `file:` repositories under it
    /// survive filtering.
    pub m2_override: Option<String>,
    /// Bound on concurrent network fetches.
    pub fetch_concurrency: usize,
}

impl<'a> MergeContext<'a> {
    pub fn new(verifier: &'a ComponentVerifier<'a>, versions: &'a VersionCache) -> Self {
        Self {
            verifier,
            versions,
            client: None,
            m2_override: None,
            fetch_concurrency: 8,
        }
    }

    pub fn with_client(mut self, client: &'a HttpClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn with_m2_override(mut self, prefix: impl Into<String>) -> Self {
        self.m2_override = Some(prefix.into());
        self
    }
}

/// One build's reconciled artifacts, keyed for deterministic folding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedGraph {
    pub components: BTreeMap<ModuleVersionId, BTreeMap<String, ArtifactFile>>,
}

/// A repository is only lockfile-worthy if it can be fetched from outside
/// this machine: drop it when all of its metadata resources or all of its
/// artifact resources are local `file:` URLs outside the test mirror.
fn should_skip_repository(repository: &Repository, m2: Option<&str>) -> bool {
    let local_only = |resources: &[String]| {
        resources.iter().all(|resource| {
            resource.starts_with("file:") && m2.map_or(true, |m2| !resource.starts_with(m2))
        })
    };
    local_only(&repository.artifact_resources) || local_only(&repository.metadata_resources)
}

fn filter_repositories(
    graph: &DependencyGraph,
    m2: Option<&str>,
) -> HashMap<String, Repository> {
    let mut repositories = HashMap::new();
    for configuration in graph {
        for repository in &configuration.repositories {
            if should_skip_repository(repository, m2) {
                warn!("{}: all resource urls are local files; skipping repository", repository.id);
                continue;
            }
            repositories.insert(repository.id.clone(), repository.clone());
        }
    }
    repositories
}

/// One module version with the repositories it was observed through.
struct ComponentWork {
    id: ModuleVersionId,
    coordinates: DependencyCoordinates,
    repositories: Vec<Repository>,
}

fn collect_components(
    graph: &DependencyGraph,
    repositories: &HashMap<String, Repository>,
    versions: &VersionCache,
) -> Vec<ComponentWork> {
    let mut grouped: BTreeMap<ModuleVersionId, (DependencyCoordinates, Vec<String>)> =
        BTreeMap::new();
    for configuration in graph {
        for dependency in &configuration.all_dependencies {
            // Project-to-project edges carry no repository and are never
            // lockfile-worthy.
            let Some(repository) = &dependency.repository else {
                continue;
            };
            let coordinates = &dependency.coordinates;
            let id = ModuleVersionId::new(
                coordinates.module_id(),
                versions.parse(&coordinates.version),
                coordinates.timestamp.clone(),
            );
            let entry = grouped
                .entry(id)
                .or_insert_with(|| (coordinates.clone(), Vec::new()));
            if !entry.1.contains(repository) {
                entry.1.push(repository.clone());
            }
        }
    }

    grouped
        .into_iter()
        .filter_map(|(id, (coordinates, repository_ids))| {
            let observed: Vec<Repository> = repository_ids
                .iter()
                .filter_map(|repository_id| repositories.get(repository_id))
                .cloned()
                .collect();
            if observed.is_empty() {
                warn!("{id}: no fetchable repositories for ids {repository_ids:?}; skipping");
                return None;
            }
            Some(ComponentWork {
                id,
                coordinates,
                repositories: observed,
            })
        })
        .collect()
}

/// Candidate URLs for one file across every repository the component was
/// observed through, deduplicated in repository order.
fn collect_urls(work: &ComponentWork, file_name: &str, descriptor: Option<&GradleModule>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for repository in &work.repositories {
        for url in artifact_urls(&work.coordinates, file_name, repository, descriptor) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Auxiliary metadata files a repository serves for a component even when
/// the verification document does not enumerate them.
fn metadata_file_names(work: &ComponentWork) -> Vec<String> {
    let mut names = Vec::new();
    let module = &work.coordinates.module;
    let version = work.coordinates.artifact_version();
    if work.repositories.iter().any(Repository::maven_layout) {
        names.push(format!("{module}-{version}.pom"));
    }
    if work
        .repositories
        .iter()
        .any(|r| r.declares_metadata_source("gradleMetadata"))
    {
        names.push(format!("{module}-{version}.module"));
    }
    if work
        .repositories
        .iter()
        .any(|r| r.kind == RepositoryKind::Ivy)
    {
        names.push(format!("ivy-{}.xml", work.coordinates.version));
    }
    names
}

struct FetchedDescriptor {
    file_name: String,
    urls: Vec<String>,
    sha256: String,
    module: GradleModule,
}

/// Fetch and parse the component's Gradle module descriptor, when a
/// repository declares the `gradleMetadata` source. Any failure makes the
/// descriptor absent; downstream logic falls back to nominal file names.
async fn fetch_descriptor(
    work: &ComponentWork,
    ctx: &MergeContext<'_>,
) -> Option<FetchedDescriptor> {
    let client = ctx.client?;
    if !work
        .repositories
        .iter()
        .any(|r| r.declares_metadata_source("gradleMetadata"))
    {
        return None;
    }
    let file_name = format!(
        "{}-{}.module",
        work.coordinates.module,
        work.coordinates.artifact_version()
    );
    let urls = collect_urls(work, &file_name, None);
    if urls.is_empty() {
        return None;
    }
    let (_, bytes) = client.fetch_bytes(&urls).await.or_else(|| {
        debug!("{}: module descriptor not reachable; treating as absent", work.id);
        None
    })?;
    let text = std::str::from_utf8(&bytes).ok()?;
    match parse_module_descriptor(text) {
        Ok(module) => Some(FetchedDescriptor {
            file_name,
            urls,
            sha256: sha256_hex(&bytes),
            module,
        }),
        Err(e) => {
            warn!("{}: {e}; ignoring module descriptor", work.id);
            None
        }
    }
}

/// Reconcile one component: trusted checksums from the verification tiers,
/// candidate URLs from the repository layouts, and the network tier for
/// auxiliary metadata files.
async fn process_component(
    work: ComponentWork,
    ctx: &MergeContext<'_>,
) -> (ModuleVersionId, BTreeMap<String, ArtifactFile>) {
    let verification = ctx.verifier.resolve(&work.id);
    let descriptor = fetch_descriptor(&work, ctx).await;
    let descriptor_module = descriptor.as_ref().map(|d| &d.module);

    let mut files: BTreeMap<String, ArtifactFile> = BTreeMap::new();

    match &verification {
        Some(verification) => {
            for file in &verification.files {
                let urls = collect_urls(&work, &file.name, descriptor_module);
                if urls.is_empty() {
                    warn!(
                        "{}: no repository hosts '{}'; skipping file",
                        work.id, file.name
                    );
                    continue;
                }
                let Some(strongest) = file.checksums.iter().max_by_key(|c| c.kind) else {
                    warn!("{}: '{}' carries no checksums; skipping file", work.id, file.name);
                    continue;
                };
                match strongest.to_sri() {
                    Ok(hash) => {
                        files.insert(file.name.clone(), ArtifactFile::new(urls, hash));
                    }
                    Err(e) => {
                        warn!("{}: {e}; skipping file '{}'", work.id, file.name);
                    }
                }
            }
        }
        None => {
            // A primary artifact with no local trust anywhere is dropped,
            // not silently network-trusted.
            warn!(
                "{}: not present in verification metadata or local caches; \
                 only fetched metadata files can be locked",
                work.id
            );
        }
    }

    // Tier four: auxiliary metadata files (POM, module descriptor, Ivy
    // descriptor) not enumerated by the verification document are fetched
    // and hashed on the fly, the observed hash becoming authoritative.
    if let Some(client) = ctx.client {
        for file_name in metadata_file_names(&work) {
            if files.contains_key(&file_name) {
                continue;
            }
            // The descriptor was already fetched whole; reuse its bytes.
            if let Some(descriptor) = descriptor.as_ref().filter(|d| d.file_name == file_name) {
                if let Ok(hash) =
                    Checksum::new(ChecksumKind::Sha256, descriptor.sha256.clone()).to_sri()
                {
                    files.insert(
                        file_name,
                        ArtifactFile::new(descriptor.urls.clone(), hash),
                    );
                }
                continue;
            }
            let urls = collect_urls(&work, &file_name, descriptor_module);
            if urls.is_empty() {
                continue;
            }
            match client.fetch_and_hash(&urls).await {
                Some((_, hex)) => {
                    if let Ok(hash) = Checksum::new(ChecksumKind::Sha256, hex).to_sri() {
                        files.insert(file_name, ArtifactFile::new(urls, hash));
                    }
                }
                None => {
                    debug!(
                        "{}: all candidate urls failed for '{file_name}'; skipping file",
                        work.id
                    );
                }
            }
        }
    }

    (work.id, files)
}

/// Reconcile one build's dependency graph into its resolved artifacts.
pub async fn resolve_graph(
    graph: &DependencyGraph,
    ctx: &MergeContext<'_>,
) -> MergeResult<ResolvedGraph> {
    let repositories = filter_repositories(graph, ctx.m2_override.as_deref());
    if repositories.is_empty() {
        warn!("no fetchable repositories in any configuration; graph contributes nothing");
        return Ok(ResolvedGraph::default());
    }

    let works = collect_components(graph, &repositories, ctx.versions);
    let concurrency = ctx.fetch_concurrency.max(1);

    // Completion order does not matter: results land in a sorted map keyed
    // by component id.
    let resolved: Vec<(ModuleVersionId, BTreeMap<String, ArtifactFile>)> =
        stream::iter(works.into_iter().map(|work| process_component(work, ctx)))
            .buffer_unordered(concurrency)
            .collect()
            .await;

    let mut components = BTreeMap::new();
    for (id, files) in resolved {
        if !files.is_empty() {
            components.insert(id, files);
        }
    }
    Ok(ResolvedGraph { components })
}

/// Fold resolved graphs into one canonical lockfile.
///
/// Two graphs resolving the same (component, file) must agree on the hash;
/// a disagreement means two supposedly identical artifacts have different
/// content, which aborts the merge. Agreeing entries have their URL lists
/// unioned.
pub fn merge(graphs: Vec<ResolvedGraph>) -> MergeResult<Lockfile> {
    let mut combined: BTreeMap<ModuleVersionId, BTreeMap<String, ArtifactFile>> = BTreeMap::new();
    for graph in graphs {
        for (id, files) in graph.components {
            let entry = combined.entry(id.clone()).or_default();
            for (name, file) in files {
                match entry.get_mut(&name) {
                    None => {
                        entry.insert(name, file);
                    }
                    Some(existing) if existing.hash == file.hash => {
                        existing.merge_urls(file.urls);
                    }
                    Some(existing) => {
                        return Err(LockError::HashConflict {
                            artifact: id.to_string(),
                            file: name,
                            existing: existing.hash.clone(),
                            conflicting: file.hash,
                        });
                    }
                }
            }
        }
    }
    Ok(to_lockfile(combined))
}

/// Resolve every graph and fold the results.
pub async fn merge_graphs(
    graphs: &[DependencyGraph],
    ctx: &MergeContext<'_>,
) -> MergeResult<Lockfile> {
    let mut resolved = Vec::with_capacity(graphs.len());
    for graph in graphs {
        resolved.push(resolve_graph(graph, ctx).await?);
    }
    merge(resolved)
}

/// Canonical ordering: modules ascending by (group, name), versions
/// descending (timestamp as secondary descending tiebreak), files
/// ascending by name.
fn to_lockfile(
    combined: BTreeMap<ModuleVersionId, BTreeMap<String, ArtifactFile>>,
) -> Lockfile {
    let mut by_module: BTreeMap<ModuleId, Vec<(ModuleVersionId, BTreeMap<String, ArtifactFile>)>> =
        BTreeMap::new();
    for (id, files) in combined {
        by_module
            .entry(id.module_id.clone())
            .or_default()
            .push((id, files));
    }

    let mut lockfile = Lockfile::default();
    for (module_id, mut versions) in by_module {
        versions.sort_by(|a, b| {
            b.0.version
                .cmp(&a.0.version)
                .then_with(|| b.0.timestamp.cmp(&a.0.timestamp))
        });
        let mut module = Module::default();
        for (id, files) in versions {
            let mut file_map = IndexMap::new();
            for (name, file) in files {
                file_map.insert(name, file);
            }
            module.versions.insert(id.version_key(), file_map);
        }
        lockfile.modules.insert(module_id.to_string(), module);
    }
    lockfile
}

#[cfg(test)]
mod tests {
    use super::*;
    use gradlock_core::types::Version;

    fn id(group: &str, name: &str, version: &str, timestamp: Option<&str>) -> ModuleVersionId {
        ModuleVersionId::new(
            ModuleId::new(group, name),
            Version::parse(version),
            timestamp.map(String::from),
        )
    }

    fn resolved(
        entries: &[(&str, &str, &str, &[&str], &str)],
    ) -> ResolvedGraph {
        // (group:name, version, file, urls, hash)
        let mut graph = ResolvedGraph::default();
        for (module, version, file, urls, hash) in entries {
            let (group, name) = module.split_once(':').unwrap();
            let component = graph
                .components
                .entry(id(group, name, version, None))
                .or_default();
            component.insert(
                file.to_string(),
                ArtifactFile::new(urls.iter().map(|u| u.to_string()).collect(), *hash),
            );
        }
        graph
    }

    #[test]
    fn test_merge_unions_urls_for_agreeing_hashes() {
        let a = resolved(&[(
            "com.example:lib",
            "1.0",
            "lib-1.0.jar",
            &["https://b.example/lib-1.0.jar"],
            "sha256-aa",
        )]);
        let b = resolved(&[(
            "com.example:lib",
            "1.0",
            "lib-1.0.jar",
            &["https://a.example/lib-1.0.jar"],
            "sha256-aa",
        )]);
        let lockfile = merge(vec![a, b]).unwrap();
        let module = &lockfile.modules["com.example:lib"];
        let file = &module.versions["1.0"]["lib-1.0.jar"];
        assert_eq!(
            file.urls,
            vec![
                "https://a.example/lib-1.0.jar".to_string(),
                "https://b.example/lib-1.0.jar".to_string(),
            ]
        );
    }

    #[test]
    fn test_merge_fails_on_hash_conflict() {
        let a = resolved(&[(
            "com.example:lib",
            "1.0",
            "lib-1.0.jar",
            &["https://a.example/lib-1.0.jar"],
            "sha256-aa",
        )]);
        let b = resolved(&[(
            "com.example:lib",
            "1.0",
            "lib-1.0.jar",
            &["https://b.example/lib-1.0.jar"],
            "sha256-bb",
        )]);
        let error = merge(vec![a, b]).unwrap_err();
        match error {
            LockError::HashConflict {
                existing,
                conflicting,
                ..
            } => {
                assert_eq!(existing, "sha256-aa");
                assert_eq!(conflicting, "sha256-bb");
            }
            other => panic!("expected hash conflict, got {other}"),
        }
    }

    #[test]
    fn test_lockfile_orders_modules_ascending_versions_descending() {
        let graph = resolved(&[
            ("org.zeta:lib", "1.0", "lib-1.0.jar", &["https://r/1"], "sha256-a"),
            ("com.alpha:lib", "1.0", "lib-1.0.jar", &["https://r/2"], "sha256-b"),
            ("com.alpha:lib", "2.0", "lib-2.0.jar", &["https://r/3"], "sha256-c"),
            ("com.alpha:lib", "2.0-rc1", "lib-2.0-rc1.jar", &["https://r/4"], "sha256-d"),
        ]);
        let lockfile = merge(vec![graph]).unwrap();

        let modules: Vec<&String> = lockfile.modules.keys().collect();
        assert_eq!(modules, ["com.alpha:lib", "org.zeta:lib"]);

        let versions: Vec<&String> = lockfile.modules["com.alpha:lib"].versions.keys().collect();
        assert_eq!(versions, ["2.0", "2.0-rc1", "1.0"]);
    }

    #[test]
    fn test_timestamped_versions_tiebreak_descending() {
        let mut graph = ResolvedGraph::default();
        for timestamp in ["20070310.181613-3", "20070311.120000-4"] {
            graph
                .components
                .entry(id("org.apache", "snap", "2.0-SNAPSHOT", Some(timestamp)))
                .or_default()
                .insert(
                    format!("snap-2.0-{timestamp}.jar"),
                    ArtifactFile::new(vec!["https://r/s".into()], "sha256-s"),
                );
        }
        let lockfile = merge(vec![graph]).unwrap();
        let versions: Vec<&String> = lockfile.modules["org.apache:snap"].versions.keys().collect();
        assert_eq!(
            versions,
            [
                "org.apache:snap:2.0-SNAPSHOT:20070311.120000-4",
                "org.apache:snap:2.0-SNAPSHOT:20070310.181613-3",
            ]
        );
    }

    #[test]
    fn test_skips_file_only_repositories() {
        let local = Repository {
            id: "local".into(),
            kind: RepositoryKind::Maven,
            m2_compatible: false,
            metadata_sources: vec![],
            metadata_resources: vec!["file:///home/user/.m2/[organisation]/[module]".into()],
            artifact_resources: vec!["file:///home/user/.m2/[organisation]/[module]".into()],
        };
        assert!(should_skip_repository(&local, None));
        // The same repository survives when it sits under the test mirror.
        assert!(!should_skip_repository(&local, Some("file:///home/user/.m2")));

        let remote = Repository {
            id: "central".into(),
            kind: RepositoryKind::Maven,
            m2_compatible: false,
            metadata_sources: vec![],
            metadata_resources: vec!["https://repo.example/[organisation]/[module]".into()],
            artifact_resources: vec!["https://repo.example/[organisation]/[module]".into()],
        };
        assert!(!should_skip_repository(&remote, None));
    }

    #[test]
    fn test_flat_dir_repositories_are_skipped() {
        let flat = Repository {
            id: "flat".into(),
            kind: RepositoryKind::FlatDir,
            m2_compatible: false,
            metadata_sources: vec![],
            metadata_resources: vec![],
            artifact_resources: vec![],
        };
        // No resources at all resolves to "local only" on both lists.
        assert!(should_skip_repository(&flat, None));
    }
}
