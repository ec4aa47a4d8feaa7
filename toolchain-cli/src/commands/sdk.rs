//! Show which Vulkan SDK install MoltenVK would be taken from

use super::CliError;
use convenient_toolchain::sdk::{MOLTENVK_LIB, MOLTENVK_LIB_DIR, VULKAN_SDK_HOME_DIR, moltenvk_dir};
use convenient_toolchain::{Host, SdkLocator, SystemHost};
use std::path::{Path, PathBuf};

/// Scan `base_dir` (default `~/VulkanSDK`) and print the chosen version
pub fn locate(base_dir: Option<&Path>) -> Result<(), CliError> {
    let base_dir = match base_dir {
        Some(dir) => SystemHost.expand_user(dir),
        None => SystemHost
            .home_dir()
            .map(|home| home.join(VULKAN_SDK_HOME_DIR))
            .unwrap_or_else(|| PathBuf::from("~").join(VULKAN_SDK_HOME_DIR)),
    };

    println!("🔍 Scanning {}", base_dir.display());
    let candidate = SdkLocator::new(&base_dir)
        .locate(|_| Path::new(MOLTENVK_LIB_DIR).join(MOLTENVK_LIB))
        .ok_or_else(|| CliError::SdkNotFound(MOLTENVK_LIB.to_string()))?;

    println!("  ✓ Version: {}", candidate.name);
    println!("  ✓ Library: {}", moltenvk_dir(&candidate.path).display());
    Ok(())
}
