//! Lifecycle integration tests: full startup over a temp bundle tree,
//! dynamic extension loading against the live server, and shutdown.

use std::sync::Arc;

use flowhost::bundle::{discover_bundles, Bundle};
use flowhost::{HostCollaborators, HostState, WebHost};

mod common;

fn started_host(scratch: &std::path::Path) -> Arc<WebHost> {
    let config = common::test_config(scratch);
    common::core_bundle(&config.extensions.directory, "core-bundle");
    let bundles = discover_bundles(&config.extensions.directory).unwrap();

    let collaborators = HostCollaborators::basic(&config);
    let host = Arc::new(WebHost::new(config, collaborators));
    host.init().unwrap();
    host.clone().start(bundles).unwrap();
    host
}

#[tokio::test(flavor = "multi_thread")]
async fn host_serves_the_core_applications() {
    let scratch = tempfile::tempdir().unwrap();
    let host = started_host(scratch.path());
    assert_eq!(host.state(), HostState::Running);

    let addr = host.bound_addresses()[0];
    let client = common::client();

    let response = client
        .get(format!("http://{addr}/flowhost/"))
        .send()
        .await
        .expect("host unreachable");
    assert_eq!(response.status(), 200);
    let server_header = response
        .headers()
        .get("server")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(server_header.starts_with("flowhost/"));
    assert!(response.text().await.unwrap().contains("core ui"));

    let response = client
        .get(format!("http://{addr}/flowhost-api/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Unmatched paths fall through to the error application at the root.
    let response = client
        .get(format!("http://{addr}/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("error page"));

    host.stop();
    assert_eq!(host.state(), HostState::Stopped);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_core_docs_archive_fails_startup_naming_the_role() {
    let scratch = tempfile::tempdir().unwrap();
    let config = common::test_config(scratch.path());

    let bundle_dir = common::core_bundle(&config.extensions.directory, "core-bundle");
    std::fs::remove_file(
        common::dependencies_dir(&bundle_dir).join("flowhost-web-docs-1.0.webar"),
    )
    .unwrap();
    let bundles = discover_bundles(&config.extensions.directory).unwrap();

    let collaborators = HostCollaborators::basic(&config);
    let host = Arc::new(WebHost::new(config, collaborators));
    host.init().unwrap();

    let error = host.clone().start(bundles).unwrap_err();
    assert!(error.to_string().contains("core-docs"));
    assert_eq!(host.state(), HostState::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn both_connector_families_fail_initialization() {
    let scratch = tempfile::tempdir().unwrap();
    let mut config = common::test_config(scratch.path());
    config.web.https_port = Some(8443);
    config.security.certificate_path = Some(scratch.path().join("cert.pem"));
    config.security.private_key_path = Some(scratch.path().join("key.pem"));

    let collaborators = HostCollaborators::basic(&config);
    let host = WebHost::new(config, collaborators);
    let error = host.init().unwrap_err();
    assert!(error.to_string().contains("one of the HTTP and HTTPS"));
}

#[tokio::test(flavor = "multi_thread")]
async fn dynamic_extension_load_serves_and_registers_the_new_archive() {
    let scratch = tempfile::tempdir().unwrap();
    let host = started_host(scratch.path());
    let addr = host.bound_addresses()[0];
    let client = common::client();

    // The viewer context is unknown before the dynamic load.
    assert!(host
        .registry()
        .viewer_for_content_type("application/json")
        .is_none());
    let response = client
        .get(format!("http://{addr}/json-viewer-1.0/index.html"))
        .send()
        .await
        .unwrap();
    assert_ne!(response.status(), 200);

    let bundle_dir = common::extension_bundle(
        &scratch.path().join("extensions"),
        "viewer-bundle",
        "json-viewer-1.0.webar",
        &[(
            "META-INF/flowhost-content-viewer",
            "application/json\n# application/unrelated\n",
        )],
    );
    host.load_extensions(vec![Bundle::new("viewer-bundle", bundle_dir)]);

    assert_eq!(
        host.registry()
            .viewer_for_content_type("application/json")
            .as_deref(),
        Some("/json-viewer-1.0")
    );
    assert!(host
        .registry()
        .viewer_for_content_type("application/unrelated")
        .is_none());

    // The new mount serves live without a restart.
    let response = client
        .get(format!("http://{addr}/json-viewer-1.0/index.html"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.text().await.unwrap().contains("extension ui"));

    // Existing mounts are untouched.
    let response = client
        .get(format!("http://{addr}/flowhost/"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    host.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn conflicting_dynamic_archive_is_rejected_and_first_wins() {
    let scratch = tempfile::tempdir().unwrap();
    let host = started_host(scratch.path());
    let extensions_root = scratch.path().join("extensions");

    let first = common::extension_bundle(
        &extensions_root,
        "first-bundle",
        "first-ui-1.0.webar",
        &[(
            "META-INF/flowhost-processor-configuration",
            "org.example.Foo\n",
        )],
    );
    host.load_extensions(vec![Bundle::new("first-bundle", first)]);

    let second = common::extension_bundle(
        &extensions_root,
        "second-bundle",
        "second-ui-1.0.webar",
        &[(
            "META-INF/flowhost-processor-configuration",
            "org.example.Foo # duplicate\n",
        )],
    );
    host.load_extensions(vec![Bundle::new("second-bundle", second)]);

    let extensions = host.registry().extensions_for("org.example.Foo").unwrap();
    assert_eq!(extensions.len(), 1);
    assert_eq!(extensions[0].context_path, "/first-ui-1.0");

    // The rejected archive was not mounted.
    assert!(host.mounts().contains_context("/first-ui-1.0"));
    assert!(!host.mounts().contains_context("/second-ui-1.0"));

    host.stop();
}

#[tokio::test(flavor = "multi_thread")]
async fn conflicting_archives_in_the_initial_bundle_set_are_fatal() {
    let scratch = tempfile::tempdir().unwrap();
    let config = common::test_config(scratch.path());
    common::core_bundle(&config.extensions.directory, "core-bundle");
    common::extension_bundle(
        &config.extensions.directory,
        "bundle-a",
        "ui-a-1.0.webar",
        &[(
            "META-INF/flowhost-processor-configuration",
            "org.example.Foo\n",
        )],
    );
    common::extension_bundle(
        &config.extensions.directory,
        "bundle-b",
        "ui-b-1.0.webar",
        &[(
            "META-INF/flowhost-processor-configuration",
            "org.example.Foo\n",
        )],
    );
    let bundles = discover_bundles(&config.extensions.directory).unwrap();

    let collaborators = HostCollaborators::basic(&config);
    let host = Arc::new(WebHost::new(config, collaborators));
    host.init().unwrap();

    let error = host.clone().start(bundles).unwrap_err();
    assert!(error.to_string().contains("org.example.Foo"));
    assert_eq!(host.state(), HostState::Failed);
}

#[tokio::test(flavor = "multi_thread")]
async fn extension_archives_in_the_initial_bundle_set_are_mounted() {
    let scratch = tempfile::tempdir().unwrap();
    let config = common::test_config(scratch.path());
    common::core_bundle(&config.extensions.directory, "core-bundle");
    common::extension_bundle(
        &config.extensions.directory,
        "processor-bundle",
        "proc-ui-2.3.webar",
        &[(
            "META-INF/flowhost-processor-configuration",
            "org.example.Processor\n",
        )],
    );
    let bundles = discover_bundles(&config.extensions.directory).unwrap();

    let collaborators = HostCollaborators::basic(&config);
    let host = Arc::new(WebHost::new(config, collaborators));
    host.init().unwrap();
    host.clone().start(bundles).unwrap();

    assert!(host.mounts().contains_context("/proc-ui-2.3"));
    let extensions = host
        .registry()
        .extensions_for("org.example.Processor")
        .unwrap();
    assert_eq!(extensions[0].context_path, "/proc-ui-2.3");

    host.stop();
}
