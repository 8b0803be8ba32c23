use relative_path::{RelativePath, RelativePathBuf};

/// Identity of an open document: its path relative to the notes root.
///
/// Two panes showing the same file hold equal refs, which is what the
/// self-drop guard compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    relative_path: RelativePathBuf,
    name: String,
}

impl DocumentRef {
    pub fn new(relative_path: RelativePathBuf) -> Self {
        let name = Self::extract_name(&relative_path);
        Self {
            relative_path,
            name,
        }
    }

    pub fn from_relative_str(path: &str) -> Self {
        Self::new(RelativePathBuf::from(path))
    }

    pub fn relative_path(&self) -> &RelativePath {
        &self.relative_path
    }

    /// File name without the `.md` extension, as used in transclusion links
    pub fn name(&self) -> &str {
        &self.name
    }

    fn extract_name(path: &RelativePath) -> String {
        path.file_name()
            .map(|name| name.strip_suffix(".md").unwrap_or(name))
            .unwrap_or("Untitled")
            .to_string()
    }
}

impl From<RelativePathBuf> for DocumentRef {
    fn from(path: RelativePathBuf) -> Self {
        Self::new(path)
    }
}

impl From<&str> for DocumentRef {
    fn from(path: &str) -> Self {
        Self::from_relative_str(path)
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.relative_path.as_str())
    }
}
