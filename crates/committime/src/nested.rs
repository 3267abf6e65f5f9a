//! Safe multi-step lookups into nested JSON values.
//!
//! Cluster resources arrive as loosely-shaped JSON documents in which nearly any intermediate
//! field may be absent. [`get_nested`] walks a path of keys and indices and, instead of
//! panicking or returning a bare `None`, reports *where* the walk stopped and what it found
//! there, so that log messages can say e.g.
//! `build is missing spec.revision.git.commit because spec.revision was {}`.

use serde_json::Value;

// -------------------------------------------------------------------------------------------------
// NestedPath
// -------------------------------------------------------------------------------------------------
/// An ordered sequence of object keys and array indices.
///
/// Array indices are written as decimal strings, so a single segment type covers both kinds of
/// access. A path can be built from a dot-delimited string (empty segments are dropped) or from a
/// slice of segments, which is needed when a key itself contains dots, as Kubernetes label keys
/// commonly do.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NestedPath(Vec<String>);

impl NestedPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn join(segments: &[String]) -> String {
        segments.join(".")
    }
}

impl std::fmt::Display for NestedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&Self::join(&self.0))
    }
}

impl From<&str> for NestedPath {
    fn from(path: &str) -> Self {
        NestedPath(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }
}

impl From<&[&str]> for NestedPath {
    fn from(segments: &[&str]) -> Self {
        NestedPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for NestedPath {
    fn from(segments: [&str; N]) -> Self {
        NestedPath(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for NestedPath {
    fn from(segments: Vec<String>) -> Self {
        NestedPath(segments)
    }
}

// -------------------------------------------------------------------------------------------------
// MissingPath
// -------------------------------------------------------------------------------------------------
/// A nested lookup that could not be completed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{}", self.message())]
pub struct MissingPath {
    /// The value the lookup started from
    pub root: Value,

    /// The whole path that was requested
    pub path: NestedPath,

    /// How many segments of `path` were traversed successfully
    pub traversed: usize,

    /// The value reached after traversing `traversed` segments
    pub value: Value,

    /// A human-readable name for `root`, used in the message
    pub root_name: Option<String>,
}

impl MissingPath {
    /// Attach a human-readable name for the root value.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.root_name = Some(name.into());
        self
    }

    /// The prefix of the requested path that was traversed before the failure.
    pub fn traversed_path(&self) -> &[String] {
        &self.path.segments()[..self.traversed]
    }

    pub fn message(&self) -> String {
        let who = match &self.root_name {
            Some(name) => format!("{name} is missing"),
            None => "Missing".to_string(),
        };
        let reached = if self.traversed == 0 {
            "the root".to_string()
        } else {
            NestedPath::join(self.traversed_path())
        };
        format!("{who} {} because {reached} was {}", self.path, self.value)
    }
}

// -------------------------------------------------------------------------------------------------
// lookups
// -------------------------------------------------------------------------------------------------
/// Index one level into `item`.
///
/// Objects are indexed by key; arrays are indexed by a segment that parses as a `usize`.
/// Everything else (scalars, `null`, a non-numeric segment on an array) is treated as missing.
fn step<'a>(item: &'a Value, segment: &str) -> Option<&'a Value> {
    match item {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Follow `path` from `root`, returning the value found at its end.
///
/// An explicit JSON `null` at the final position is returned as-is; indexing *into* a `null`
/// is a failure like any other missing field.
pub fn get_nested<'a, P: Into<NestedPath>>(
    root: &'a Value,
    path: P,
) -> Result<&'a Value, MissingPath> {
    let path = path.into();
    let mut item = root;
    let mut stopped_at = None;
    for (i, segment) in path.segments().iter().enumerate() {
        match step(item, segment) {
            Some(next) => item = next,
            None => {
                stopped_at = Some(i);
                break;
            }
        }
    }
    match stopped_at {
        None => Ok(item),
        Some(traversed) => Err(MissingPath {
            root: root.clone(),
            value: item.clone(),
            traversed,
            path,
            root_name: None,
        }),
    }
}

/// Like [`get_nested`], but return `default` instead of failing.
pub fn get_nested_or<'a, P: Into<NestedPath>>(
    root: &'a Value,
    path: P,
    default: &'a Value,
) -> &'a Value {
    get_nested(root, path).unwrap_or(default)
}

/// Follow `path` from `root` and require a string at its end.
///
/// A value of any other type (including `null`) is reported as a [`MissingPath`] that traversed
/// the entire path, so the message shows what was found instead.
pub fn get_nested_str<'a, P: Into<NestedPath>>(
    root: &'a Value,
    path: P,
) -> Result<&'a str, MissingPath> {
    let path = path.into();
    let value = get_nested(root, path.clone())?;
    match value {
        Value::String(s) => Ok(s.as_str()),
        other => Err(MissingPath {
            root: root.clone(),
            value: other.clone(),
            traversed: path.len(),
            path,
            root_name: None,
        }),
    }
}
