//! Lifecycle orchestration for the web application host.
//!
//! # Responsibilities
//! - Sequence initialization, startup, dynamic extension loading, shutdown
//! - Mount the five core applications plus extension archives
//! - Inject the security filter and context attributes into hosted apps
//! - Start dependent subsystems (flow engine, TLS scanner, auto-loader)
//!   only after the web layer is verified healthy
//!
//! # Design Decisions
//! - Fail fast: any error before Running is fatal, the process exits
//!   non-zero and nothing is served partially
//! - Extension load waves after Running are scoped: a bad archive is
//!   rejected and logged without touching the rest of the host

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use hyper_util::rt::TokioTimer;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::archive::{
    classify_core_roles, find_archives, identify_ui_extensions, ClassificationError,
    ClassifiedArchives, DiscoveredArchive, DiscoveryError, Role,
};
use crate::bundle::{Bundle, BundleAutoLoader};
use crate::config::HostConfig;
use crate::extension::{ConflictError, UiExtensionRegistry, UiExtensionType};
use crate::http::{build_router, HostedApp, MountError, MountTable};
use crate::lifecycle::flow::FlowEngine;
use crate::net::{
    bind_listeners, build_connector_specs, build_server_config, BindTarget, BoundConnector,
    ConnectorError, ConnectorSpec, Protocol, TlsError, TlsMaterialScanner,
};
use crate::observability::metrics;
use crate::security::context::{
    FileContentAccess, StaticConfigurationContext, UptimeDiagnostics,
};
use crate::security::{
    AllowedHosts, AppAttributes, ConfigurationContext, ContentAccess, DiagnosticsProvider,
    RateLimiterState, SecurityFilter,
};

const ALLOWED_CONTEXT_PATHS_PARAM: &str = "allowed-context-paths";
const MAX_FORM_CONTENT_SIZE_PARAM: &str = "max-form-content-size";

/// Host lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Created,
    Initialized,
    Starting,
    Running,
    Stopped,
    Failed,
}

/// Error type for the fatal startup path.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),

    #[error(transparent)]
    Mount(#[from] MountError),

    #[error("Failed to prepare directory {path}: {source}")]
    Directory {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to start plugin auto-loader: {0}")]
    AutoLoader(#[from] notify::Error),

    #[error("Unable to load flow: {0}")]
    FlowEngine(String),

    #[error("Web application at {context_path} is unavailable")]
    Unavailable { context_path: String },

    #[error("Invalid lifecycle transition: expected {expected:?}, found {found:?}")]
    InvalidState { expected: HostState, found: HostState },
}

/// Opaque collaborators supplied by the embedding application.
pub struct HostCollaborators {
    pub security_filter: Option<Arc<dyn SecurityFilter>>,
    pub configuration_context: Arc<dyn ConfigurationContext>,
    pub content_access: Arc<dyn ContentAccess>,
    pub diagnostics: Arc<dyn DiagnosticsProvider>,
    pub flow_engine: Option<Arc<dyn FlowEngine>>,
}

impl HostCollaborators {
    /// Stand-in collaborators derived from the host configuration alone.
    pub fn basic(config: &HostConfig) -> Self {
        let mut settings = HashMap::new();
        settings.insert("cluster.node".to_string(), config.cluster.node.to_string());
        settings.insert(
            "https.configured".to_string(),
            config.is_https_configured().to_string(),
        );
        Self {
            security_filter: None,
            configuration_context: Arc::new(StaticConfigurationContext::new(settings)),
            content_access: Arc::new(FileContentAccess::new(&config.web.working_directory)),
            diagnostics: Arc::new(UptimeDiagnostics::new()),
            flow_engine: None,
        }
    }
}

/// Core applications that receive attribute injection.
#[derive(Clone)]
struct CoreContexts {
    api: Arc<HostedApp>,
    content_viewer: Arc<HostedApp>,
    docs: Arc<HostedApp>,
}

/// Mutable runtime pieces built during init and start.
#[derive(Default)]
struct HostRuntime {
    router: Option<Router>,
    connectors: Vec<ConnectorSpec>,
    tls: Option<RustlsConfig>,
    core: Option<CoreContexts>,
    bound: Vec<(ConnectorSpec, SocketAddr)>,
    serve_tasks: Vec<JoinHandle<()>>,
    background_tasks: Vec<JoinHandle<()>>,
    auto_loader: Option<BundleAutoLoader>,
}

/// The web application host.
///
/// Drives the lifecycle `Created → Initialized → Starting → Running →
/// Stopped` with a terminal `Failed` reachable from `Starting`. While
/// Running, `load_extensions` may be invoked at any time, concurrently
/// with live request traffic.
pub struct WebHost {
    config: Arc<HostConfig>,
    collaborators: HostCollaborators,
    state: Mutex<HostState>,
    mounts: Arc<MountTable>,
    registry: Arc<UiExtensionRegistry>,
    limiter: Arc<RateLimiterState>,
    handle: Handle,
    runtime: Mutex<HostRuntime>,
    load_lock: Mutex<()>,
}

impl WebHost {
    pub fn new(config: HostConfig, collaborators: HostCollaborators) -> Self {
        let limiter = Arc::new(RateLimiterState::from_settings(
            config.web.max_requests_per_second,
            config.web.max_access_token_requests_per_second,
            &config.web.request_ip_allowlist,
        ));
        Self {
            config: Arc::new(config),
            collaborators,
            state: Mutex::new(HostState::Created),
            mounts: Arc::new(MountTable::new()),
            registry: Arc::new(UiExtensionRegistry::new()),
            limiter,
            handle: Handle::new(),
            runtime: Mutex::new(HostRuntime::default()),
            load_lock: Mutex::new(()),
        }
    }

    pub fn state(&self) -> HostState {
        *self.state.lock().expect("state lock poisoned")
    }

    pub fn registry(&self) -> Arc<UiExtensionRegistry> {
        self.registry.clone()
    }

    pub fn mounts(&self) -> Arc<MountTable> {
        self.mounts.clone()
    }

    /// Addresses of every bound listener; populated once Starting binds.
    pub fn bound_addresses(&self) -> Vec<SocketAddr> {
        self.runtime
            .lock()
            .expect("runtime lock poisoned")
            .bound
            .iter()
            .map(|(_, addr)| *addr)
            .collect()
    }

    /// Build connectors, the TLS context, and the handler chain skeleton.
    /// Mounts nothing.
    pub fn init(&self) -> Result<(), StartupError> {
        self.check_state(HostState::Created)?;

        let specs = build_connector_specs(&self.config)?;
        let secure = specs.iter().any(|s| s.protocol == Protocol::Secure);

        let tls = if secure {
            let server_config = build_server_config(&self.config.security)?;
            Some(RustlsConfig::from_config(Arc::new(server_config)))
        } else {
            None
        };

        // Host headers are only restricted in HTTPS mode.
        let allowed_hosts = if secure {
            Some(Arc::new(self.build_allowed_hosts(&specs)))
        } else {
            tracing::info!("Running in HTTP mode; host headers not restricted");
            None
        };

        let router = build_router(
            &self.config,
            self.mounts.clone(),
            self.limiter.clone(),
            allowed_hosts,
        );

        {
            let mut runtime = self.runtime.lock().expect("runtime lock poisoned");
            runtime.connectors = specs;
            runtime.tls = tls;
            runtime.router = Some(router);
        }

        self.set_state(HostState::Initialized);
        tracing::info!("Web host initialized");
        Ok(())
    }

    /// Discover and mount everything, bind listeners, verify, inject, and
    /// start dependent subsystems. Fail-fast: any error leaves the host in
    /// `Failed` and nothing partially served.
    pub fn start(self: Arc<Self>, bundles: Vec<Bundle>) -> Result<(), StartupError> {
        self.advance(HostState::Initialized, HostState::Starting)?;

        if let Err(e) = self.run_starting_phase(&bundles) {
            self.set_state(HostState::Failed);
            tracing::error!(error = %e, "Failed to start web server");
            return Err(e);
        }

        // The web layer is confirmed healthy; only now may dependent
        // subsystems begin issuing work against it.
        self.perform_injection();

        if let Err(e) = self.start_flow_engine() {
            self.set_state(HostState::Failed);
            tracing::error!(error = %e, "Failed to start web server");
            return Err(e);
        }

        if let Err(e) = Self::start_background_tasks(&self, &bundles) {
            self.set_state(HostState::Failed);
            tracing::error!(error = %e, "Failed to start web server");
            return Err(e);
        }

        self.dump_urls();
        self.set_state(HostState::Running);
        tracing::info!(
            applications = self.mounts.len(),
            coordinates = self.registry.coordinate_count(),
            "Web host running"
        );
        Ok(())
    }

    /// Load extension archives from bundles that arrived while Running.
    ///
    /// Scoped: discovery errors, registry conflicts, and mount failures
    /// affect only the triggering archive or call, never the live host.
    pub fn load_extensions(&self, bundles: Vec<Bundle>) {
        let _guard = self.load_lock.lock().expect("load lock poisoned");

        let state = self.state();
        if state != HostState::Running {
            tracing::warn!(state = ?state, "Ignoring extension load while not running");
            return;
        }

        let archives = match find_archives(&bundles) {
            Ok(archives) => archives,
            Err(e) => {
                tracing::error!(error = %e, "Unable to discover archives in new bundles");
                return;
            }
        };
        if archives.is_empty() {
            tracing::debug!("No web archives found in new bundles");
            return;
        }

        match self.load_extension_wave(archives, false, true) {
            Ok(mounted) => {
                metrics::record_extension_load(mounted);
                tracing::info!(mounted, "Extension load wave complete");
            }
            Err(e) => tracing::error!(error = %e, "Extension load wave failed"),
        }
    }

    /// Stop the server, then the auto-loader, each best-effort.
    pub fn stop(&self) {
        if self.state() == HostState::Stopped {
            return;
        }
        tracing::info!("Stopping web server");
        self.handle.shutdown();

        let mut runtime = self.runtime.lock().expect("runtime lock poisoned");
        for task in runtime.serve_tasks.drain(..) {
            task.abort();
        }
        for task in runtime.background_tasks.drain(..) {
            task.abort();
        }
        if let Some(loader) = runtime.auto_loader.take() {
            loader.stop();
        }
        drop(runtime);

        self.set_state(HostState::Stopped);
        tracing::info!("Web server stopped");
    }

    fn run_starting_phase(&self, bundles: &[Bundle]) -> Result<(), StartupError> {
        let archives = find_archives(bundles)?;
        let ClassifiedArchives {
            ui,
            api,
            docs,
            content_viewer,
            error,
            others,
        } = classify_core_roles(archives)?;

        // Extension archives first so the content viewer receives the
        // initial mime mappings as init params.
        self.load_extension_wave(others, true, false)?;
        self.mount_core_apps(ui, api, docs, content_viewer, error)?;
        self.verify_mounts()?;

        let specs = {
            let runtime = self.runtime.lock().expect("runtime lock poisoned");
            runtime.connectors.clone()
        };
        let bound = bind_listeners(specs)?;
        self.spawn_servers(bound);
        Ok(())
    }

    fn mount_core_apps(
        &self,
        ui: DiscoveredArchive,
        api: DiscoveredArchive,
        docs: DiscoveredArchive,
        content_viewer: DiscoveredArchive,
        error: DiscoveredArchive,
    ) -> Result<(), StartupError> {
        let work = &self.config.web.working_directory;
        let allowed_context_paths = self.config.web.allowed_context_paths.join(",");
        let max_form = self.config.web.max_form_size_bytes.to_string();
        let context_of = |role: Role| role.context_path().expect("core role has a context path");

        let mut ui_app = HostedApp::mount(&ui, context_of(Role::CoreUi), work)?;
        ui_app.set_init_param(ALLOWED_CONTEXT_PATHS_PARAM, &allowed_context_paths);
        ui_app.set_init_param(MAX_FORM_CONTENT_SIZE_PARAM, &max_form);

        let mut api_app = HostedApp::mount(&api, context_of(Role::CoreApi), work)?;
        api_app.set_init_param(MAX_FORM_CONTENT_SIZE_PARAM, &max_form);

        let mut viewer_app =
            HostedApp::mount(&content_viewer, context_of(Role::CoreContentViewer), work)?;
        viewer_app.mark_content_viewer();
        for (content_type, context_path) in self.registry.mime_mappings() {
            viewer_app.set_init_param(content_type, context_path);
        }

        let api_root = api_app.content_root().to_path_buf();
        let mut docs_app = HostedApp::mount(&docs, context_of(Role::CoreDocs), work)?;
        self.configure_docs_app(&mut docs_app, &api_root)?;

        let mut error_app = HostedApp::mount(&error, context_of(Role::CoreError), work)?;
        error_app.set_init_param(ALLOWED_CONTEXT_PATHS_PARAM, &allowed_context_paths);

        let api_app = Arc::new(api_app);
        let viewer_app = Arc::new(viewer_app);
        let docs_app = Arc::new(docs_app);

        {
            let mut runtime = self.runtime.lock().expect("runtime lock poisoned");
            runtime.core = Some(CoreContexts {
                api: api_app.clone(),
                content_viewer: viewer_app.clone(),
                docs: docs_app.clone(),
            });
        }

        self.mounts.publish(vec![
            Arc::new(ui_app),
            api_app,
            viewer_app,
            docs_app,
            Arc::new(error_app),
        ]);
        Ok(())
    }

    /// Serve the general docs, the generated component docs, and the API
    /// docs inside the documentation application.
    fn configure_docs_app(
        &self,
        docs_app: &mut HostedApp,
        api_root: &Path,
    ) -> Result<(), StartupError> {
        let docs_dir = &self.config.docs.directory;
        if !docs_dir.is_dir() {
            tracing::info!(
                path = %docs_dir.display(),
                "Documentation directory is missing; creating it. Some documentation will be unavailable"
            );
            std::fs::create_dir_all(docs_dir).map_err(|e| StartupError::Directory {
                path: docs_dir.clone(),
                source: e,
            })?;
        }
        docs_app.add_static_mount("/html", docs_dir);

        let component_docs = &self.config.docs.component_working_directory;
        std::fs::create_dir_all(component_docs).map_err(|e| StartupError::Directory {
            path: component_docs.clone(),
            source: e,
        })?;
        docs_app.add_static_mount("/components", component_docs);

        let api_docs = api_root.join("docs");
        std::fs::create_dir_all(&api_docs).map_err(|e| StartupError::Directory {
            path: api_docs.clone(),
            source: e,
        })?;
        docs_app.add_static_mount("/rest-api", &api_docs);
        Ok(())
    }

    /// Mount a wave of extension archives. During startup (`fail_fast`)
    /// any conflict or mount failure aborts; afterwards failures are
    /// scoped to the offending archive.
    fn load_extension_wave(
        &self,
        archives: Vec<DiscoveredArchive>,
        fail_fast: bool,
        inject: bool,
    ) -> Result<usize, StartupError> {
        let mut mounted = 0usize;

        'archives: for archive in archives {
            let extensions = identify_ui_extensions(&archive.path);
            if extensions.is_empty() {
                tracing::debug!(
                    archive = %archive.path.display(),
                    "Archive declares no UI extensions; skipping"
                );
                continue;
            }

            let context_path = format!("/{}", archive.file_stem());
            if self.mounts.contains_context(&context_path) {
                tracing::warn!(
                    archive = %archive.path.display(),
                    context_path = %context_path,
                    "Context path already mounted; skipping archive"
                );
                continue;
            }

            let mut component_ui = false;
            for (kind, values) in &extensions {
                if *kind == UiExtensionType::ContentViewer {
                    continue;
                }
                if let Err(conflict) =
                    self.registry
                        .register_component_ui(*kind, &context_path, values)
                {
                    if fail_fast {
                        return Err(conflict.into());
                    }
                    tracing::error!(
                        archive = %archive.path.display(),
                        error = %conflict,
                        "Rejecting UI extension archive"
                    );
                    continue 'archives;
                }
                component_ui = true;
            }

            let viewer_types = extensions.get(&UiExtensionType::ContentViewer);
            if let Some(types) = viewer_types {
                self.registry.register_content_viewer(&context_path, types);
            }

            let mut app = match HostedApp::mount(
                &archive,
                &context_path,
                &self.config.web.working_directory,
            ) {
                Ok(app) => app,
                Err(e) => {
                    if fail_fast {
                        return Err(e.into());
                    }
                    tracing::error!(
                        archive = %archive.path.display(),
                        error = %e,
                        "Unable to mount extension archive"
                    );
                    continue;
                }
            };
            if component_ui {
                app.mark_component_ui();
            }
            if viewer_types.is_some() {
                app.mark_content_viewer();
            }

            let app = Arc::new(app);
            if inject {
                self.inject_extension_app(&app);
            }
            self.mounts.publish(vec![app]);
            mounted += 1;
        }

        Ok(mounted)
    }

    /// Confirm every mounted application is servable before traffic flows.
    fn verify_mounts(&self) -> Result<(), StartupError> {
        for app in self.mounts.apps() {
            if !app.content_root().is_dir() {
                return Err(StartupError::Unavailable {
                    context_path: app.context_path().to_string(),
                });
            }
        }
        tracing::info!(
            applications = self.mounts.len(),
            "Verified mounted web applications"
        );
        Ok(())
    }

    fn spawn_servers(&self, bound: Vec<BoundConnector>) {
        let mut runtime = self.runtime.lock().expect("runtime lock poisoned");
        let router = runtime
            .router
            .clone()
            .expect("router built during initialization");
        let tls = runtime.tls.clone();

        for BoundConnector {
            spec,
            listener,
            local_addr,
        } in bound
        {
            let make_service = router
                .clone()
                .into_make_service_with_connect_info::<SocketAddr>();
            let label = spec.label.clone();

            let task = match spec.protocol {
                Protocol::Secure => {
                    let tls = tls
                        .clone()
                        .expect("TLS context initialized for secure connectors");
                    let mut server = axum_server::from_tcp_rustls(listener, tls);
                    server
                        .http_builder()
                        .http1()
                        .timer(TokioTimer::new())
                        .max_buf_size(self.config.web.max_header_size_bytes)
                        .header_read_timeout(spec.idle_timeout);
                    let server = server.handle(self.handle.clone());
                    tokio::spawn(async move {
                        if let Err(e) = server.serve(make_service).await {
                            tracing::error!(connector = %label, error = %e, "Web server error");
                        }
                    })
                }
                Protocol::Plain => {
                    let mut server = axum_server::from_tcp(listener);
                    server
                        .http_builder()
                        .http1()
                        .timer(TokioTimer::new())
                        .max_buf_size(self.config.web.max_header_size_bytes)
                        .header_read_timeout(spec.idle_timeout);
                    let server = server.handle(self.handle.clone());
                    tokio::spawn(async move {
                        if let Err(e) = server.serve(make_service).await {
                            tracing::error!(connector = %label, error = %e, "Web server error");
                        }
                    })
                }
            };

            runtime.serve_tasks.push(task);
            runtime.bound.push((spec, local_addr));
        }
    }

    /// Inject the security filter and shared attributes into the core and
    /// extension applications mounted so far.
    fn perform_injection(&self) {
        let core = {
            let runtime = self.runtime.lock().expect("runtime lock poisoned");
            runtime.core.clone()
        };

        if let Some(core) = core {
            let api_attributes = AppAttributes {
                configuration_context: Some(self.collaborators.configuration_context.clone()),
                ui_extensions: Some(self.registry.clone()),
                diagnostics: Some(self.collaborators.diagnostics.clone()),
                ..AppAttributes::default()
            };
            core.api.publish_attributes(api_attributes);

            let viewer_attributes = AppAttributes {
                content_access: Some(self.collaborators.content_access.clone()),
                ..AppAttributes::default()
            };
            core.content_viewer.publish_attributes(viewer_attributes);
            if let Some(filter) = &self.collaborators.security_filter {
                core.content_viewer.attach_security_filter(filter.clone());
            }

            let docs_attributes = AppAttributes {
                extension_mapping: Some(Arc::new(self.registry.extension_mapping())),
                ..AppAttributes::default()
            };
            core.docs.publish_attributes(docs_attributes);
        }

        for app in self.mounts.apps() {
            if app.role() == Role::Extension {
                self.inject_extension_app(&app);
            }
        }
    }

    fn inject_extension_app(&self, app: &Arc<HostedApp>) {
        if app.serves_component_ui() {
            app.publish_attributes(AppAttributes {
                configuration_context: Some(self.collaborators.configuration_context.clone()),
                ..AppAttributes::default()
            });
        }
        if app.serves_component_ui() || app.serves_content_viewer() {
            if let Some(filter) = &self.collaborators.security_filter {
                app.attach_security_filter(filter.clone());
            }
        }
    }

    /// Start the flow engine when this host participates in a cluster. The
    /// engine is only started after the UI layer is verified, so a peer
    /// cannot issue work before this node can answer web requests.
    fn start_flow_engine(&self) -> Result<(), StartupError> {
        if !self.config.cluster.node {
            return Ok(());
        }
        match &self.collaborators.flow_engine {
            Some(engine) => {
                tracing::info!("Loading flow");
                engine
                    .start()
                    .map_err(|e| StartupError::FlowEngine(e.to_string()))?;
                tracing::info!("Flow loaded successfully");
                Ok(())
            }
            None => {
                tracing::warn!("Cluster node has no flow engine configured; nothing to start");
                Ok(())
            }
        }
    }

    fn start_background_tasks(host: &Arc<Self>, bundles: &[Bundle]) -> Result<(), StartupError> {
        let mut runtime = host.runtime.lock().expect("runtime lock poisoned");

        if let Some(tls) = runtime.tls.clone() {
            if host.config.security.auto_reload {
                let scanner = TlsMaterialScanner::new(host.config.security.clone(), tls);
                let task = scanner.spawn(Duration::from_secs(
                    host.config.security.auto_reload_interval_secs,
                ));
                runtime.background_tasks.push(task);
            }
        }

        let extensions_dir = &host.config.extensions.directory;
        std::fs::create_dir_all(extensions_dir).map_err(|e| StartupError::Directory {
            path: extensions_dir.clone(),
            source: e,
        })?;
        let known: HashSet<String> = bundles.iter().map(|b| b.name().to_string()).collect();
        let loader = BundleAutoLoader::start(extensions_dir, Arc::downgrade(host), known)?;
        runtime.auto_loader = Some(loader);
        Ok(())
    }

    fn build_allowed_hosts(&self, specs: &[ConnectorSpec]) -> AllowedHosts {
        let mut hosts: Vec<String> = Vec::new();
        if let Some(host) = &self.config.web.https_host {
            hosts.push(host.clone());
        }
        for spec in specs {
            if let BindTarget::Address(ip) = &spec.target {
                hosts.push(ip.to_string());
            }
        }
        hosts.extend(local_addresses());
        AllowedHosts::new(hosts)
    }

    /// Log every URL the UI is reachable at once startup succeeds.
    fn dump_urls(&self) {
        let runtime = self.runtime.lock().expect("runtime lock poisoned");

        let mut urls = Vec::new();
        for (spec, addr) in &runtime.bound {
            let hosts = match &spec.target {
                BindTarget::Host(Some(host)) => vec![host.clone()],
                BindTarget::Host(None) => local_addresses(),
                BindTarget::Address(ip) => vec![ip.to_string()],
            };
            for host in hosts {
                let host = if host.contains(':') {
                    format!("[{host}]")
                } else {
                    host
                };
                urls.push(format!(
                    "{}://{}:{}",
                    spec.protocol.scheme(),
                    host,
                    addr.port()
                ));
            }
        }

        if urls.is_empty() {
            tracing::warn!(
                "The host has started, but the UI is not available on any addresses. \
                 Please verify the host properties"
            );
        } else {
            tracing::info!("The UI is available at the following URLs:");
            for url in urls {
                tracing::info!("{url}/flowhost");
            }
        }
    }

    fn check_state(&self, expected: HostState) -> Result<(), StartupError> {
        let state = self.state();
        if state != expected {
            return Err(StartupError::InvalidState {
                expected,
                found: state,
            });
        }
        Ok(())
    }

    fn advance(&self, from: HostState, to: HostState) -> Result<(), StartupError> {
        let mut state = self.state.lock().expect("state lock poisoned");
        if *state != from {
            return Err(StartupError::InvalidState {
                expected: from,
                found: *state,
            });
        }
        *state = to;
        Ok(())
    }

    fn set_state(&self, to: HostState) {
        *self.state.lock().expect("state lock poisoned") = to;
    }
}

fn local_addresses() -> Vec<String> {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces
            .into_iter()
            .map(|iface| iface.ip().to_string())
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "Unable to enumerate local addresses");
            vec!["localhost".to_string()]
        }
    }
}
