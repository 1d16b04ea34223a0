//! Recovering coordinates and artifact names from observed URLs.
//!
//! The build tool reports which URL an artifact was fetched from; matching
//! that URL back through the repository's patterns yields the module
//! coordinates and the nominal artifact file name. Gradle persists
//! artifacts with the Maven artifact naming convention, which may not match
//! the repository's own pattern, so the reconstructed name is normalized to
//! `artifact-version[-classifier][.ext]`.

use gradlock_core::types::DependencyCoordinates;
use regex::Regex;
use tracing::debug;

use super::{repository_patterns, substitute, Attributes, MatcherCache};
use gradlock_core::types::Repository;

/// Regex source matching the version part of an on-disk artifact file name.
///
/// A `-SNAPSHOT` version is matched either verbatim or in its time-stamped
/// publication form (`base-yyyymmdd.hhmmss-n`), because the declared
/// version and the on-disk version differ for snapshot modules.
pub fn version_pattern(version: &str) -> String {
    match version.strip_suffix("-SNAPSHOT") {
        Some(base) => format!(
            "(?:{}|{}-\\d{{8}}\\.\\d{{6}}-\\d+)",
            regex::escape(version),
            regex::escape(base)
        ),
        None => regex::escape(version),
    }
}

/// Find the first repository pattern matching an observed URL and recover
/// the module coordinates, along with the pattern narrowed to that
/// component (attributes substituted, file tokens left in place).
pub fn parse_component(
    repositories: &[Repository],
    url: &str,
    matchers: &MatcherCache,
) -> Option<(DependencyCoordinates, String)> {
    for repository in repositories {
        for pattern in repository_patterns(repository) {
            let Some(matcher) = matchers.matcher(pattern) else {
                continue;
            };
            let Some(attributes) = matcher.matches(url) else {
                continue;
            };
            let Some(organisation) = attributes.get("organisation") else {
                continue;
            };
            let Some(module) = attributes.get("module") else {
                continue;
            };
            let Some(revision) = attributes.get("revision") else {
                continue;
            };
            let coordinates =
                DependencyCoordinates::new(organisation.replace('/', "."), module, revision);
            return Some((coordinates, substitute(pattern, &attributes)));
        }
    }
    debug!("no repository pattern matched url {url}");
    None
}

/// Reconstruct the nominal artifact file name for a URL matched by
/// `parse_component`.
pub fn parse_artifact(resource: &str, coordinates: &DependencyCoordinates, url: &str) -> String {
    let values = match_file_tokens(resource, coordinates, url);
    let artifact = values.as_ref().and_then(|v| v.get("artifact"));
    let classifier = values.as_ref().and_then(|v| v.get("classifier"));
    let ext = values.as_ref().and_then(|v| v.get("ext"));

    let Some(artifact) = artifact else {
        let filename = url
            .rsplit('/')
            .next()
            .unwrap_or(url)
            .split(['#', '?'])
            .next()
            .unwrap_or_default();
        return artifact_from_filename(filename, &coordinates.version, classifier);
    };

    let mut name = format!("{artifact}-{}", coordinates.version);
    if let Some(classifier) = classifier {
        name.push('-');
        name.push_str(classifier);
    }
    if let Some(ext) = ext {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// Match the remaining `[artifact]`/`[classifier]`/`[ext]` tokens of a
/// narrowed pattern against the URL, tolerating time-stamped snapshot file
/// names.
fn match_file_tokens(
    resource: &str,
    coordinates: &DependencyCoordinates,
    url: &str,
) -> Option<Attributes> {
    let mut source = String::from("^");
    let mut groups = Vec::new();
    super::append_pattern(&mut source, resource, false, &mut groups);
    source.push('$');

    if coordinates.version.ends_with("-SNAPSHOT") {
        let literal = regex::escape(&format!("-{}", coordinates.version));
        let tolerant = format!("-{}", version_pattern(&coordinates.version));
        source = source.replace(&literal, &tolerant);
    }

    let regex = Regex::new(&source).ok()?;
    let caps = regex.captures(url)?;
    let mut attributes = Attributes::new();
    for (group, attr) in &groups {
        if let Some(m) = caps.name(group) {
            attributes
                .entry(attr.clone())
                .or_insert_with(|| m.as_str().to_string());
        }
    }
    Some(attributes)
}

fn artifact_from_filename(filename: &str, version: &str, classifier: Option<&String>) -> String {
    let (name, extension) = match filename.rsplit_once('.') {
        Some((name, extension)) => (name, Some(extension)),
        None => (filename, None),
    };
    let mut result = format!("{name}-{version}");
    if let Some(classifier) = classifier {
        result.push('-');
        result.push_str(classifier);
    }
    if let Some(extension) = extension {
        result.push('.');
        result.push_str(extension);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::M2_PATTERN;
    use gradlock_core::types::RepositoryKind;

    fn maven_central() -> Repository {
        Repository {
            id: "MavenRepo".into(),
            kind: RepositoryKind::Maven,
            m2_compatible: false,
            metadata_sources: vec!["mavenPom".into()],
            metadata_resources: vec![format!(
                "https://repo.maven.apache.org/maven2/{M2_PATTERN}"
            )],
            artifact_resources: vec![format!(
                "https://repo.maven.apache.org/maven2/{M2_PATTERN}"
            )],
        }
    }

    #[test]
    fn test_parses_maven_url() {
        let url = "https://repo.maven.apache.org/maven2/com/github/ajalt/clikt-metadata/2.8.0/clikt-metadata-2.8.0.jar";
        let (coordinates, pattern) =
            parse_component(&[maven_central()], url, &MatcherCache::new()).unwrap();
        assert_eq!(
            coordinates,
            DependencyCoordinates::new("com.github.ajalt", "clikt-metadata", "2.8.0")
        );
        assert_eq!(
            parse_artifact(&pattern, &coordinates, url),
            "clikt-metadata-2.8.0.jar"
        );
    }

    #[test]
    fn test_parses_maven_snapshot_url() {
        let url = "https://repo.maven.apache.org/maven2/org/apache/test-SNAPSHOT2/2.0.2-SNAPSHOT/test-SNAPSHOT2-2.0.2-SNAPSHOT.jar";
        let (coordinates, pattern) =
            parse_component(&[maven_central()], url, &MatcherCache::new()).unwrap();
        assert_eq!(
            coordinates,
            DependencyCoordinates::new("org.apache", "test-SNAPSHOT2", "2.0.2-SNAPSHOT")
        );
        assert_eq!(
            parse_artifact(&pattern, &coordinates, url),
            "test-SNAPSHOT2-2.0.2-SNAPSHOT.jar"
        );
    }

    #[test]
    fn test_parses_maven_timestamped_snapshot_url() {
        let url = "https://repo.maven.apache.org/maven2/org/apache/test-SNAPSHOT1/2.0.2-SNAPSHOT/test-SNAPSHOT1-2.0.2-20070310.181613-3.jar";
        let (coordinates, pattern) =
            parse_component(&[maven_central()], url, &MatcherCache::new()).unwrap();
        assert_eq!(
            coordinates,
            DependencyCoordinates::new("org.apache", "test-SNAPSHOT1", "2.0.2-SNAPSHOT")
        );
        assert_eq!(
            parse_artifact(&pattern, &coordinates, url),
            "test-SNAPSHOT1-2.0.2-SNAPSHOT.jar"
        );
    }

    #[test]
    fn test_parses_ivy_descriptor_url() {
        let repository = Repository {
            id: "ivy".into(),
            kind: RepositoryKind::Ivy,
            m2_compatible: false,
            metadata_sources: vec!["ivyDescriptor".into()],
            metadata_resources: vec![
                "https://asset.opendof.org/ivy2/[organisation]/[module]/[revision]/ivy(.[platform]).xml".into(),
            ],
            artifact_resources: vec![
                "https://asset.opendof.org/artifact/[organisation]/[module]/[revision](/[platform])(/[type]s)/[artifact]-[revision](-[classifier]).[ext]".into(),
            ],
        };
        let url = "https://asset.opendof.org/ivy2/org.opendof.core-java/dof-cipher-sms4/1.0/ivy.xml";
        let (coordinates, pattern) =
            parse_component(&[repository], url, &MatcherCache::new()).unwrap();
        assert_eq!(
            coordinates,
            DependencyCoordinates::new("org.opendof.core-java", "dof-cipher-sms4", "1.0")
        );
        assert_eq!(parse_artifact(&pattern, &coordinates, url), "ivy-1.0.xml");
    }

    #[test]
    fn test_unmatched_url_yields_none() {
        let url = "https://elsewhere.example/some/other/path.tgz";
        assert!(parse_component(&[maven_central()], url, &MatcherCache::new()).is_none());
    }
}
