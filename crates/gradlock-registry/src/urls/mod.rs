//! Candidate URL computation for artifact files.
//!
//! Given module coordinates, a verified file name, and one repository,
//! produce every URL the file may be fetched from, in the repository's
//! declared pattern order. Metadata files are subject to redirection: a
//! POM, an Ivy descriptor, or a Gradle module file is looked up through the
//! repository's metadata patterns only when the repository declares the
//! corresponding metadata source.

use gradlock_config::GradleModule;
use gradlock_core::types::{DependencyCoordinates, Repository};
use regex::Regex;

use crate::pattern::parse::version_pattern;
use crate::pattern::{fill, Attributes};

/// Compute the candidate URLs for one artifact file in one repository.
///
/// An empty result is legitimate: a repository does not necessarily host
/// every artifact class, and the caller treats it as "not here" rather
/// than an error.
pub fn artifact_urls(
    coordinates: &DependencyCoordinates,
    file_name: &str,
    repository: &Repository,
    descriptor: Option<&GradleModule>,
) -> Vec<String> {
    // The module descriptor knows when the repository stores the file under
    // a different name than the nominal one.
    let nominal = descriptor
        .and_then(|d| d.file_url(file_name))
        .unwrap_or(file_name);

    let mut attributes = Attributes::new();
    attributes.insert(
        "organisation".to_string(),
        if repository.maven_layout() {
            coordinates.group.replace('.', "/")
        } else {
            coordinates.group.clone()
        },
    );
    attributes.insert("module".to_string(), coordinates.module.clone());
    attributes.insert("revision".to_string(), coordinates.version.clone());
    for (attr, value) in file_attributes(nominal, coordinates) {
        attributes.insert(attr, value);
    }

    let resources = select_resources(&attributes, repository);

    let mut urls: Vec<String> = Vec::new();
    for resource in resources {
        if let Some(url) = fill(resource, &attributes) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Metadata-source redirection: decide whether this file is fetched from
/// the repository's metadata patterns or its artifact patterns.
fn select_resources<'a>(attributes: &Attributes, repository: &'a Repository) -> &'a [String] {
    match attributes.get("ext").map(String::as_str) {
        Some("pom") => {
            if repository.declares_metadata_source("mavenPom") {
                &repository.metadata_resources
            } else {
                &repository.artifact_resources
            }
        }
        Some("xml") => {
            if repository.declares_metadata_source("ivyDescriptor") {
                &repository.metadata_resources
            } else {
                &repository.artifact_resources
            }
        }
        Some("module") => {
            if repository.declares_metadata_source("gradleMetadata")
                || !repository.declares_metadata_source("ignoreGradleMetadataRedirection")
            {
                &repository.metadata_resources
            } else {
                &repository.artifact_resources
            }
        }
        _ => &repository.artifact_resources,
    }
}

/// Parse `artifact`, `classifier`, and `ext` attributes out of an on-disk
/// file name, anchored on the artifact version. The anchor tolerates the
/// declared version differing from the time-stamped on-disk version of a
/// snapshot module.
fn file_attributes(file: &str, coordinates: &DependencyCoordinates) -> Attributes {
    let source = format!(
        "^(?P<artifact>.+)-{}(?:-(?P<classifier>[^.]+))?(?:\\.(?P<ext>.+))?$",
        version_pattern(&coordinates.version)
    );
    let mut attributes = Attributes::new();
    let Ok(regex) = Regex::new(&source) else {
        return attributes;
    };
    let Some(caps) = regex.captures(file) else {
        return attributes;
    };
    if let Some(artifact) = caps.name("artifact") {
        attributes.insert("artifact".to_string(), artifact.as_str().to_string());
    }
    if let Some(classifier) = caps.name("classifier") {
        attributes.insert("classifier".to_string(), classifier.as_str().to_string());
    }
    if let Some(ext) = caps.name("ext") {
        attributes.insert("ext".to_string(), ext.as_str().to_string());
    }
    attributes
}
