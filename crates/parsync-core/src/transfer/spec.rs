use std::path::Path;

/// What to transfer. Built by the CLI layer and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    pub source: String,
    pub destination: String,
    /// Extra tool options, passed through verbatim before the paths.
    pub options: Vec<String>,
    /// Label shown on the display line.
    pub name: String,
}

impl TransferSpec {
    /// New spec named after the final component of `source`.
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        let source = source.into();
        let name = display_name(&source);
        Self {
            source,
            destination: destination.into(),
            options,
            name,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Basename of the source with trailing separators ignored; the source itself when it has none.
pub fn display_name(source: &str) -> String {
    let trimmed = source.trim_end_matches('/');
    Path::new(trimmed)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_source_basename() {
        assert_eq!(display_name("/srv/photos"), "photos");
        assert_eq!(display_name("/srv/photos/"), "photos");
        assert_eq!(display_name("notes.txt"), "notes.txt");
        assert_eq!(display_name("host:/data/set1"), "set1");
    }

    #[test]
    fn name_falls_back_to_source() {
        assert_eq!(display_name("/"), "/");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn explicit_name_overrides() {
        let spec = TransferSpec::new("/a/b", "/dst", vec![]).with_name("backup");
        assert_eq!(spec.name, "backup");
        assert_eq!(spec.source, "/a/b");
    }
}
