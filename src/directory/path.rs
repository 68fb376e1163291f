use serde::Deserialize;
use serde::Serialize;

use crate::constants::PATH_SEPARATOR;
use crate::DirectoryError;
use crate::Result;

/// Splits an absolute path into its segments.
///
/// `"/"` addresses the root and yields no segments. Every other path must
/// start with the separator and contain only non-empty segments.
pub(crate) fn segments(path: &str) -> Result<Vec<&str>> {
    let Some(rest) = path.strip_prefix(PATH_SEPARATOR) else {
        return Err(DirectoryError::InvalidArgument(format!(
            "Path must start with '{}': {:?}",
            PATH_SEPARATOR, path
        ))
        .into());
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = rest.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DirectoryError::InvalidArgument(format!("Empty segment in path: {:?}", path)).into());
    }
    Ok(segments)
}

/// Splits a path into the parent's segments and the last segment.
///
/// Fails for the root path, which create and delete may not address.
pub(crate) fn split_parent(path: &str) -> Result<(Vec<&str>, &str)> {
    let mut segments = segments(path)?;
    match segments.pop() {
        Some(name) => Ok((segments, name)),
        None => Err(DirectoryError::InvalidArgument(format!(
            "Cannot create or delete the root node: {:?}",
            path
        ))
        .into()),
    }
}

/// Appends one segment to an absolute path (`""` and `"/"` both mean root).
pub fn join(
    parent: &str,
    name: &str,
) -> String {
    let parent = parent.trim_end_matches(PATH_SEPARATOR);
    format!("{}{}{}", parent, PATH_SEPARATOR, name)
}

/// Builds the paths an entity manager stores its entities under.
///
/// ```ignore
/// let paths = PathBuilder::new("/midonet")?;
/// assert_eq!(paths.path(&["pools"]), "/midonet/pools");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathBuilder {
    base_path: String,
}

impl PathBuilder {
    /// `base_path` must be `"/"` or a well formed absolute path.
    pub fn new(base_path: impl Into<String>) -> Result<Self> {
        let base_path = base_path.into();
        let trimmed = base_path.trim_end_matches(PATH_SEPARATOR);
        if !trimmed.is_empty() || !base_path.starts_with(PATH_SEPARATOR) {
            segments(trimmed)?;
        }
        Ok(Self {
            base_path: trimmed.to_string(),
        })
    }

    /// Base path without trailing separator (`""` for the root)
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn path(
        &self,
        segments: &[&str],
    ) -> String {
        if segments.is_empty() && self.base_path.is_empty() {
            return PATH_SEPARATOR.to_string();
        }
        segments
            .iter()
            .fold(self.base_path.clone(), |acc, segment| join(&acc, segment))
    }
}
