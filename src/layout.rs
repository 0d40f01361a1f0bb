//! Path mapping for the runtime tree.
//!
//! The runtime directory survives across builds and holds the build tree,
//! the persistent config store, and other files needed to actually run the
//! assembled client. Everything here is pure path arithmetic; nothing
//! touches the filesystem.

use std::path::{Path, PathBuf};

const BUILD_SUBDIR: &str = "build";
const STAGING_DIR: &str = "staging";
const GENERATED_SUBDIR: &str = "gen-js";
const VENDOR_SUBDIR: &str = "bower_components";
const THRIFT_MODULE_SUBDIR: &str = "js/thrift";
const CONFIG_STORE_FILE: &str = "config/local.yml";
const ACTIVE_CONFIG_FILE: &str = "config/config.yml";
const PACKAGING_SUBDIR: &str = "dist/bower/pkg";

/// Resolved locations for one project, derived from the project root and the
/// configured runtime directory name.
#[derive(Debug, Clone)]
pub struct RuntimeLayout {
    project_root: PathBuf,
    runtime_dir: PathBuf,
}

impl RuntimeLayout {
    pub fn new(project_root: &Path, runtime_dir: &str) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            runtime_dir: project_root.join(runtime_dir),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    /// A path inside the runtime directory.
    pub fn runtime_path(&self, subpath: &str) -> PathBuf {
        self.runtime_dir.join(subpath)
    }

    /// The build tree root. Recreated content lives here; the directory can
    /// be served directly in development since it holds unminified sources.
    pub fn build_dir(&self) -> PathBuf {
        self.runtime_dir.join(BUILD_SUBDIR)
    }

    /// A path inside the build tree.
    pub fn build_path(&self, subpath: &str) -> PathBuf {
        self.build_dir().join(subpath)
    }

    /// Destination for vendored third-party packages inside the build tree.
    pub fn vendor_dir(&self) -> PathBuf {
        self.build_path(VENDOR_SUBDIR)
    }

    /// Destination for the transformed Thrift modules.
    pub fn thrift_module_dir(&self) -> PathBuf {
        self.build_path(THRIFT_MODULE_SUBDIR)
    }

    /// Transient work area for the external code generator; recreated on
    /// every generation run.
    pub fn staging_dir(&self) -> PathBuf {
        self.project_root.join(STAGING_DIR)
    }

    /// Where the Thrift compiler leaves its JavaScript output inside the
    /// staging area.
    pub fn generated_dir(&self) -> PathBuf {
        self.staging_dir().join(GENERATED_SUBDIR)
    }

    /// The persisted runtime config. Seeded once from the sample config and
    /// hand-maintained afterwards; never overwritten by the pipeline.
    pub fn config_store(&self) -> PathBuf {
        self.runtime_path(CONFIG_STORE_FILE)
    }

    /// The active client config inside the build tree, refreshed from the
    /// config store on every build.
    pub fn active_config(&self) -> PathBuf {
        self.build_path(ACTIVE_CONFIG_FILE)
    }

    /// Output directory for the packaged script assets.
    pub fn packaging_dir(&self) -> PathBuf {
        self.project_root.join(PACKAGING_SUBDIR)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn layout() -> RuntimeLayout {
        RuntimeLayout::new(Path::new("/work/app"), "runtime")
    }

    #[test]
    fn test_build_paths_join_under_runtime_root() {
        let layout = layout();
        assert_eq!(layout.build_dir(), PathBuf::from("/work/app/runtime/build"));
        assert_eq!(
            layout.build_path("js"),
            PathBuf::from("/work/app/runtime/build/js")
        );
        assert_eq!(
            layout.vendor_dir(),
            PathBuf::from("/work/app/runtime/build/bower_components")
        );
        assert_eq!(
            layout.thrift_module_dir(),
            PathBuf::from("/work/app/runtime/build/js/thrift")
        );
    }

    #[test]
    fn test_runtime_and_staging_paths() {
        let layout = layout();
        assert_eq!(
            layout.config_store(),
            PathBuf::from("/work/app/runtime/config/local.yml")
        );
        assert_eq!(
            layout.active_config(),
            PathBuf::from("/work/app/runtime/build/config/config.yml")
        );
        assert_eq!(layout.staging_dir(), PathBuf::from("/work/app/staging"));
        assert_eq!(
            layout.generated_dir(),
            PathBuf::from("/work/app/staging/gen-js")
        );
        assert_eq!(
            layout.packaging_dir(),
            PathBuf::from("/work/app/dist/bower/pkg")
        );
    }
}
