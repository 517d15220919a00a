use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempPath};

/// A downloaded payload on local disk. The file is removed when the
/// artifact is dropped, whatever path the owning run exits through.
#[derive(Debug)]
pub struct ScratchArtifact {
    path: TempPath,
    size: u64,
}

impl ScratchArtifact {
    pub(crate) fn new(path: TempPath, size: u64) -> Self {
        Self { path, size }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Directory holding one run's scratch files.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a uniquely named file whose name ends with `filename`, so
    /// format sniffing on the path still works.
    pub fn reserve(&self, filename: &str) -> std::io::Result<NamedTempFile> {
        tempfile::Builder::new()
            .prefix("fetch-")
            .suffix(&format!("-{filename}"))
            .tempfile_in(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn artifact_removes_file_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = ScratchDir::new(dir.path().join("scratch")).unwrap();
        let mut file = scratch.reserve("green_tripdata_2020-01.csv.gz").unwrap();
        file.write_all(b"abc").unwrap();
        let (_, path) = file.into_parts();
        let artifact = ScratchArtifact::new(path, 3);

        let on_disk = artifact.path().to_path_buf();
        assert!(on_disk.exists());
        assert!(on_disk.to_string_lossy().ends_with("green_tripdata_2020-01.csv.gz"));
        drop(artifact);
        assert!(!on_disk.exists());
    }
}
