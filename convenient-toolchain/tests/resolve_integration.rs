//! End-to-end resolution tests
//!
//! Drive the public API from raw option strings to a populated
//! `BuildEnvironment`, with fake Vulkan SDK installs under a temporary home.

use convenient_toolchain::sdk::{MOLTENVK_LIB, MOLTENVK_LIB_DIR};
use convenient_toolchain::{
    BuildEnvironment, ConfigVar, ConfigurationResolver, OptionRegistry, ResolveError, StaticHost,
    Tool, load_options_file, parse_assignment,
};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn install_vulkan_sdk(home: &Path, version: &str, with_moltenvk: bool) -> PathBuf {
    let lib_dir = home.join("VulkanSDK").join(version).join(MOLTENVK_LIB_DIR);
    fs::create_dir_all(&lib_dir).unwrap();
    if with_moltenvk {
        fs::write(lib_dir.join(MOLTENVK_LIB), b"!<arch>\n").unwrap();
    }
    lib_dir
}

fn assignments(args: &[&str]) -> HashMap<String, String> {
    args.iter().map(|a| parse_assignment(a).unwrap()).collect()
}

#[test]
fn test_vulkan_picks_newest_sdk_with_moltenvk() {
    let home = TempDir::new().unwrap();
    let _ = install_vulkan_sdk(home.path(), "1.2.198.1", true);
    let expected = install_vulkan_sdk(home.path(), "1.3.250.1", true);
    let _ = install_vulkan_sdk(home.path(), "1.3.275.0", false);

    let host = StaticHost::new()
        .with_home(home.path())
        .with_sdk("macosx", "/Applications/Xcode.app/MacOSX.sdk");
    let options = OptionRegistry::macos()
        .build_options(&assignments(&["arch=arm64", "target=release", "vulkan=yes"]))
        .unwrap();

    let config = ConfigurationResolver::new(&host).resolve(&options).unwrap();
    let flags = config.flag_set();

    assert!(flags.defines.contains(&"VULKAN_ENABLED".to_string()));
    assert!(flags.link_flags.contains(&"-lMoltenVK".to_string()));
    assert!(flags.link_flags.contains(&format!("-L{}", expected.display())));
}

#[test]
fn test_vulkan_without_any_sdk_is_a_discovery_failure() {
    let home = TempDir::new().unwrap();
    let _ = install_vulkan_sdk(home.path(), "1.3.275.0", false);

    let host = StaticHost::new()
        .with_home(home.path())
        .with_sdk("macosx", "/sdk");
    let options = OptionRegistry::macos()
        .build_options(&assignments(&["arch=x86_64"]))
        .unwrap();

    let err = ConfigurationResolver::new(&host).resolve(&options).unwrap_err();
    assert_eq!(err, ResolveError::MoltenVkNotFound);
    assert!(err.is_discovery_failure());
    assert_eq!(err.exit_code(), 255);
}

#[test]
fn test_options_file_to_sink() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("osx.yml");
    fs::write(
        &file,
        "target: release\noptimize: size\narch: x86_64\nlto: thin\nuse_ubsan: yes\nuse_tsan: yes\nvulkan: no\nopengl3: no\n",
    )
    .unwrap();

    let mut values = load_options_file(&file).unwrap();
    values.extend(assignments(&["osxcross_sdk=darwin21"]));
    let options = OptionRegistry::macos().build_options(&values).unwrap();

    let host = StaticHost::new()
        .with_var("OSXCROSS_ROOT", "/usr/local/osxcross")
        .with_var("CCACHE", "ccache");
    let config = ConfigurationResolver::new(&host).resolve(&options).unwrap();

    let mut env = BuildEnvironment::new();
    config.apply(&mut env);

    assert_eq!(
        env.tool(Tool::Cc),
        Some("ccache /usr/local/osxcross/target/bin/x86_64-apple-darwin21-cc")
    );
    assert_eq!(
        env.tool(Tool::Ranlib),
        Some("/usr/local/osxcross/target/bin/x86_64-apple-darwin21-ranlib")
    );
    assert_eq!(env.flag("osxcross"), Some(true));
    assert_eq!(env.suffix(), ".san");

    let cc_flags = env.get(ConfigVar::CcFlags);
    assert_eq!(&cc_flags[..4], &["-g2", "-msse2", "-Os", "-ftree-vectorize"]);
    assert!(cc_flags.contains(&"-flto=thin".to_string()));
    assert!(cc_flags.contains(&"-fsanitize=thread".to_string()));

    let defines = env.get(ConfigVar::CppDefines);
    assert_eq!(defines.iter().filter(|d| *d == "SANITIZERS_ENABLED").count(), 1);
    assert!(!defines.contains(&"GLES3_ENABLED".to_string()));
}

#[test]
fn test_configuration_serializes_to_json() {
    let host = StaticHost::new().with_sdk("macosx", "/sdk");
    let options = OptionRegistry::macos()
        .build_options(&assignments(&["arch=arm64", "vulkan=no", "lto=full"]))
        .unwrap();
    let config = ConfigurationResolver::new(&host).resolve(&options).unwrap();

    let json = serde_json::to_value(&config).unwrap();
    assert_eq!(json["architecture"], "arm64");
    assert_eq!(json["lto"], "full");
    assert_eq!(json["cross_compile"], false);
    assert_eq!(json["toolchain"]["kind"]["kind"], "native");
}
