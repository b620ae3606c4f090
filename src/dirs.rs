//! Platform directory lookup.
//!
//! The artefact cache defaults to the platform cache directory. Resolution
//! goes through [`BaseDirs`] so configuration tests can supply fixed paths.

use directories_next::ProjectDirs;
use std::path::PathBuf;

/// Source of platform-specific base directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// Directory for re-downloadable data, if the platform defines one.
    fn cache_dir(&self) -> Option<PathBuf>;
}

/// [`BaseDirs`] backed by `directories-next`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBaseDirs;

impl BaseDirs for SystemBaseDirs {
    fn cache_dir(&self) -> Option<PathBuf> {
        ProjectDirs::from("", "", "stackyard").map(|dirs| dirs.cache_dir().to_path_buf())
    }
}
