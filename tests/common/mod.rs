//! Shared utilities for integration testing.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flowhost::config::HostConfig;
use zip::write::SimpleFileOptions;

/// Write a web archive containing the given entries.
pub fn write_webar(directory: &Path, name: &str, entries: &[(&str, &str)]) -> PathBuf {
    std::fs::create_dir_all(directory).unwrap();
    let path = directory.join(name);
    let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
    for (entry_name, content) in entries {
        writer
            .start_file(*entry_name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

/// Dependencies directory of a bundle working directory.
pub fn dependencies_dir(bundle_dir: &Path) -> PathBuf {
    bundle_dir.join("BUNDLE-INF/bundled-dependencies")
}

/// Create a bundle shipping the five core archives. Returns the bundle
/// working directory.
pub fn core_bundle(extensions_root: &Path, bundle_name: &str) -> PathBuf {
    let bundle_dir = extensions_root.join(bundle_name);
    let deps = dependencies_dir(&bundle_dir);

    write_webar(
        &deps,
        "flowhost-web-1.0.webar",
        &[("index.html", "<html>core ui</html>")],
    );
    write_webar(
        &deps,
        "flowhost-web-api-1.0.webar",
        &[("index.html", "<html>core api</html>")],
    );
    write_webar(
        &deps,
        "flowhost-web-docs-1.0.webar",
        &[("index.html", "<html>core docs</html>")],
    );
    write_webar(
        &deps,
        "flowhost-web-content-viewer-1.0.webar",
        &[("index.html", "<html>content viewer</html>")],
    );
    write_webar(
        &deps,
        "flowhost-web-error-1.0.webar",
        &[("index.html", "<html>error page</html>")],
    );
    bundle_dir
}

/// Create a bundle shipping one extension archive with the given
/// descriptor entries. Returns the bundle working directory.
pub fn extension_bundle(
    extensions_root: &Path,
    bundle_name: &str,
    archive_name: &str,
    descriptors: &[(&str, &str)],
) -> PathBuf {
    let bundle_dir = extensions_root.join(bundle_name);
    let deps = dependencies_dir(&bundle_dir);

    let mut entries: Vec<(&str, &str)> = vec![("index.html", "<html>extension ui</html>")];
    entries.extend_from_slice(descriptors);
    write_webar(&deps, archive_name, &entries);
    bundle_dir
}

/// A plaintext host configuration on an ephemeral port, rooted in the
/// given scratch directory.
pub fn test_config(scratch: &Path) -> HostConfig {
    let mut config = HostConfig::default();
    config.web.http_port = Some(0);
    config.web.http_host = Some("127.0.0.1".to_string());
    config.web.working_directory = scratch.join("work/web");
    config.extensions.directory = scratch.join("extensions");
    config.docs.directory = scratch.join("docs");
    config.docs.component_working_directory = scratch.join("work/docs/components");
    config
}

/// HTTP client for talking to the host under test.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
