//! Discovery of externally installed, version-named SDK trees
//!
//! SDK installers such as the LunarG Vulkan SDK unpack into
//! `<base>/<version>/...`. [`SdkLocator`] scans such a base directory and picks
//! the highest version that actually ships a required artifact.
//!
//! Directory entries are visited in file-name order, so when two directories
//! parse to the same version (`1.2` and `1.2.0`) the one that sorts first wins.
//! That makes the choice independent of the order the filesystem lists them in.

use crate::version::VersionTuple;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Directory inside a Vulkan SDK version that holds the MoltenVK static library.
pub const MOLTENVK_LIB_DIR: &str = "MoltenVK/MoltenVK.xcframework/macos-arm64_x86_64";

/// File name of the MoltenVK static library.
pub const MOLTENVK_LIB: &str = "libMoltenVK.a";

/// Default install directory of the Vulkan SDK, relative to the user's home.
pub const VULKAN_SDK_HOME_DIR: &str = "VulkanSDK";

/// A version directory that contains the required artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkCandidate {
    /// Version parsed from the directory name
    pub version: VersionTuple,
    /// Directory name as found on disk
    pub name: String,
    /// Full path of the version directory
    pub path: PathBuf,
}

/// Scans a base directory for version-named SDK installs.
#[derive(Debug, Clone)]
pub struct SdkLocator {
    base_dir: PathBuf,
}

impl SdkLocator {
    /// Create a locator for `base_dir`. Nothing is read until [`Self::locate`].
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Base directory being scanned
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Find the highest version whose directory contains `artifact(name)`.
    ///
    /// `artifact` maps a version directory name to the artifact path relative
    /// to that directory. Returns `None` when the base directory is missing or
    /// no version qualifies; unreadable entries are skipped.
    pub fn locate<F>(&self, artifact: F) -> Option<SdkCandidate>
    where
        F: Fn(&str) -> PathBuf,
    {
        if !self.base_dir.is_dir() {
            debug!("SDK base directory does not exist: {:?}", self.base_dir);
            return None;
        }

        let mut best: Option<SdkCandidate> = None;

        let entries = WalkDir::new(&self.base_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable SDK entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();

            let artifact_path = entry.path().join(artifact(&name));
            if !artifact_path.is_file() {
                debug!("{:?} lacks {:?}", entry.path(), artifact_path);
                continue;
            }

            let version = VersionTuple::parse(&name);
            debug!("SDK candidate {} at {:?}", version, entry.path());

            if best.as_ref().is_none_or(|b| version > b.version) {
                best = Some(SdkCandidate {
                    version,
                    name,
                    path: entry.path().to_path_buf(),
                });
            }
        }

        best
    }
}

/// Path of the MoltenVK library directory inside an SDK version directory.
pub fn moltenvk_dir(sdk_version_dir: &Path) -> PathBuf {
    sdk_version_dir.join(MOLTENVK_LIB_DIR)
}

/// Scan `<home>/VulkanSDK` for the newest SDK shipping MoltenVK and return its
/// library directory.
pub fn locate_moltenvk(home: &Path) -> Option<PathBuf> {
    SdkLocator::new(home.join(VULKAN_SDK_HOME_DIR))
        .locate(|_| Path::new(MOLTENVK_LIB_DIR).join(MOLTENVK_LIB))
        .map(|candidate| moltenvk_dir(&candidate.path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn artifact(_: &str) -> PathBuf {
        PathBuf::from("lib/libfoo.a")
    }

    fn install(base: &Path, version: &str) {
        let lib = base.join(version).join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("libfoo.a"), b"!<arch>\n").unwrap();
    }

    #[test]
    fn test_missing_base_dir() {
        let temp = TempDir::new().unwrap();
        let locator = SdkLocator::new(temp.path().join("nope"));
        assert_eq!(locator.locate(artifact), None);
    }

    #[test]
    fn test_directories_without_artifact() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("1.0.0/lib")).unwrap();
        fs::create_dir_all(temp.path().join("2.0.0")).unwrap();

        let locator = SdkLocator::new(temp.path());
        assert_eq!(locator.locate(artifact), None);
    }

    #[test]
    fn test_selects_highest_version() {
        let temp = TempDir::new().unwrap();
        for v in ["1.0.0", "1.2.0", "0.9.9"] {
            install(temp.path(), v);
        }

        let found = SdkLocator::new(temp.path()).locate(artifact).unwrap();
        assert_eq!(found.name, "1.2.0");
        assert_eq!(found.path, temp.path().join("1.2.0"));
    }

    #[test]
    fn test_newer_version_without_artifact_is_ignored() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.1.0");
        fs::create_dir_all(temp.path().join("1.9.0")).unwrap();

        let found = SdkLocator::new(temp.path()).locate(artifact).unwrap();
        assert_eq!(found.name, "1.1.0");
    }

    #[test]
    fn test_plain_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.0");
        fs::write(temp.path().join("9.9.9"), b"not a dir").unwrap();

        let found = SdkLocator::new(temp.path()).locate(artifact).unwrap();
        assert_eq!(found.name, "1.0");
    }

    #[test]
    fn test_equal_versions_pick_first_by_name() {
        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.2.0");
        install(temp.path(), "1.2");

        let found = SdkLocator::new(temp.path()).locate(artifact).unwrap();
        assert_eq!(found.name, "1.2");
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_directory_names_are_ranked() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        install(temp.path(), "1.0");
        let odd = OsStr::from_bytes(b"2.\xff");
        let lib = temp.path().join(odd).join("lib");
        fs::create_dir_all(&lib).unwrap();
        fs::write(lib.join("libfoo.a"), b"!<arch>\n").unwrap();

        let found = SdkLocator::new(temp.path()).locate(artifact).unwrap();
        assert_eq!(found.path, temp.path().join(odd));
        assert_eq!(found.version.components(), &[2, 0]);
    }

    #[test]
    fn test_locate_moltenvk() {
        let temp = TempDir::new().unwrap();
        let lib_dir = temp.path().join("VulkanSDK/1.3.275.0").join(MOLTENVK_LIB_DIR);
        fs::create_dir_all(&lib_dir).unwrap();
        fs::write(lib_dir.join(MOLTENVK_LIB), b"").unwrap();

        assert_eq!(locate_moltenvk(temp.path()), Some(lib_dir));
    }
}
