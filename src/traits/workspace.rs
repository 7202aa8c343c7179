use std::io;
use std::path::{Path, PathBuf};

/// Trait for resolving project paths against the directory a step runs in
pub trait WorkspaceResolver: Send + Sync {
    /// Root that relative project paths are resolved against
    fn root(&self) -> &Path;

    /// Absolute paths are kept as-is, relative ones are joined onto the root
    fn resolve(&self, project_path: &Path) -> PathBuf {
        if project_path.is_absolute() {
            project_path.to_path_buf()
        } else {
            self.root().join(project_path)
        }
    }
}

/// Workspace rooted at a fixed directory
pub struct DirectoryWorkspace {
    root: PathBuf,
}

impl DirectoryWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace rooted at the process's current directory
    pub fn current() -> io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }
}

impl WorkspaceResolver for DirectoryWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_is_joined_onto_root() {
        let workspace = DirectoryWorkspace::new("/builds/job-42");

        assert_eq!(
            workspace.resolve(Path::new("infra/network")),
            PathBuf::from("/builds/job-42/infra/network")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_path_is_kept() {
        let workspace = DirectoryWorkspace::new("/builds/job-42");

        assert_eq!(
            workspace.resolve(Path::new("/srv/terraform")),
            PathBuf::from("/srv/terraform")
        );
    }

    #[test]
    fn test_current_workspace_uses_current_dir() {
        let workspace = DirectoryWorkspace::current().unwrap();

        assert_eq!(workspace.root(), std::env::current_dir().unwrap());
    }
}
