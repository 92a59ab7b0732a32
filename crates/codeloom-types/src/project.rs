//! Project state types for Codeloom.
//!
//! A project state is the small per-user record of which files the assistant
//! has generated and which technologies/libraries the project uses. It is
//! sent along with every chat turn so the LLM sees the current project, and
//! it is merged (never implicitly pruned) when a turn produces a new file.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProjectError;

/// Technologies assumed for a project that has none recorded yet.
pub const DEFAULT_TECHNOLOGIES: [&str; 4] = ["HTML", "CSS", "JavaScript", "Tailwind CSS"];

/// Upper bound on a project file name, in bytes.
pub const MAX_FILE_NAME_LEN: usize = 255;

/// A single generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFile {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// Per-user project state.
///
/// Wire names are camelCase. The legacy snake_case names `file_structure`
/// and `installed_libraries` are accepted on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    #[serde(default, alias = "file_structure", deserialize_with = "null_as_default")]
    pub files: Vec<ProjectFile>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub technologies: BTreeSet<String>,

    #[serde(
        default,
        alias = "installed_libraries",
        deserialize_with = "null_as_default"
    )]
    pub installed_libraries: BTreeSet<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Result of merging a generated file into a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Added,
    Replaced,
}

/// Additive update to the non-file parts of a project state.
///
/// Sets are unioned and metadata keys overwritten; nothing is removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(default)]
    pub technologies: BTreeSet<String>,
    #[serde(default, alias = "installed_libraries")]
    pub installed_libraries: BTreeSet<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for ProjectState {
    /// A fresh project: no files, the default web stack, no libraries.
    fn default() -> Self {
        Self {
            files: Vec::new(),
            technologies: DEFAULT_TECHNOLOGIES.iter().map(|t| t.to_string()).collect(),
            installed_libraries: BTreeSet::new(),
            metadata: serde_json::Map::new(),
        }
    }
}

impl ProjectState {
    /// Look up a file by exact name.
    pub fn file(&self, name: &str) -> Option<&ProjectFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Names of all files, in insertion order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }

    /// Replace the file with a matching name, or append it.
    ///
    /// A replaced file keeps its position. The name is validated first; on
    /// error the state is left untouched.
    pub fn merge_file(
        &mut self,
        name: &str,
        content: impl Into<String>,
    ) -> Result<MergeOutcome, ProjectError> {
        validate_file_name(name)?;
        let content = content.into();

        match self.files.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                existing.content = content;
                Ok(MergeOutcome::Replaced)
            }
            None => {
                self.files.push(ProjectFile {
                    name: name.to_string(),
                    content,
                });
                Ok(MergeOutcome::Added)
            }
        }
    }

    /// Remove a file by name. Returns `true` if a file was removed.
    pub fn remove_file(&mut self, name: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.name != name);
        self.files.len() != before
    }

    /// Apply an additive patch.
    pub fn merge_patch(&mut self, patch: ProjectPatch) {
        self.technologies.extend(patch.technologies);
        self.installed_libraries.extend(patch.installed_libraries);
        for (key, value) in patch.metadata {
            self.metadata.insert(key, value);
        }
    }

    /// Check the state as a whole: every name valid, no duplicates.
    pub fn validate(&self) -> Result<(), ProjectError> {
        let mut seen = BTreeSet::new();
        for name in self.file_names() {
            validate_file_name(name)?;
            if !seen.insert(name) {
                return Err(ProjectError::InvalidFileName {
                    name: name.to_string(),
                    reason: "duplicate file name".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Validate a project-relative file name.
///
/// Names are relative paths with `/` separators. Absolute paths, `..`
/// components, backslashes and NUL bytes are rejected so a name can always
/// be joined onto an export directory without escaping it.
pub fn validate_file_name(name: &str) -> Result<(), ProjectError> {
    let invalid = |reason: &str| ProjectError::InvalidFileName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("empty name"));
    }
    if name.len() > MAX_FILE_NAME_LEN {
        return Err(invalid("name too long"));
    }
    if name.contains('\0') {
        return Err(invalid("NUL byte"));
    }
    if name.contains('\\') {
        return Err(invalid("backslash separator"));
    }
    if name.starts_with('/') {
        return Err(invalid("absolute path"));
    }
    for component in name.split('/') {
        match component {
            "" => return Err(invalid("empty path component")),
            "." | ".." => return Err(invalid("relative path component")),
            _ => {}
        }
    }
    Ok(())
}
