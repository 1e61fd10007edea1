use std::fmt;

/// A location in the virtual folder hierarchy of the document store.
///
/// Always normalized: empty for the root, otherwise non-empty segments joined
/// by single `/` with no leading or trailing slash. Folders only exist as
/// prefixes of stored object paths, so everything that needs a parent, a
/// breadcrumb or a child path goes through this type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StorePath(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    pub label: String,
    pub path: StorePath,
}

pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl StorePath {
    pub fn root() -> Self {
        Self(String::new())
    }

    pub fn new(path: &str) -> Self {
        Self(normalize(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> Vec<&str> {
        if self.is_root() {
            return Vec::new();
        }
        self.0.split('/').collect()
    }

    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    /// The first `k` segments. `k` past the end yields the full path.
    pub fn prefix(&self, k: usize) -> Self {
        Self(self.segments().into_iter().take(k).collect::<Vec<_>>().join("/"))
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(self.prefix(self.depth() - 1))
    }

    pub fn name(&self) -> Option<&str> {
        self.segments().last().copied()
    }

    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            return Self::new(name);
        }
        Self::new(&format!("{}/{}", self.0, name))
    }

    /// Object path of a file called `name` at this location.
    pub fn file_path(&self, name: &str) -> String {
        self.join(name).0
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.segments()
            .iter()
            .enumerate()
            .map(|(index, segment)| Breadcrumb {
                label: (*segment).to_string(),
                path: self.prefix(index + 1),
            })
            .collect()
    }

    pub fn is_within(&self, root: &StorePath) -> bool {
        if root.is_root() || self == root {
            return true;
        }
        self.0.starts_with(&format!("{}/", root.0))
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "/");
        }
        write!(f, "/{}", self.0)
    }
}

impl From<&str> for StorePath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
