//! Flow engine seam.
//!
//! The flow/cluster execution engine is a dependent subsystem owned by the
//! embedding application. The host only sequences it: the engine is started
//! after the web layer is verified healthy, so a clustered peer cannot
//! issue work to this node before it can answer web requests.

/// Lifecycle handle for the dependent flow/cluster engine.
pub trait FlowEngine: Send + Sync {
    /// Start the engine and load the flow. Errors are fatal to startup.
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Stop the engine. Best-effort.
    fn stop(&self);
}
