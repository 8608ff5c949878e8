//! flowhost — a host process assembling independently packaged web
//! applications into one running HTTP(S) endpoint.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                  WEB HOST                      │
//!                    │                                                │
//!   Client Request   │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!   ─────────────────┼─▶│   net   │──▶│   http   │──▶│ mount table│  │
//!                    │  │connector│   │  server  │   │  dispatch  │  │
//!                    │  └─────────┘   └──────────┘   └─────┬──────┘  │
//!                    │                                     ▼          │
//!                    │                              ┌────────────┐   │
//!                    │                              │ hosted app │   │
//!                    │                              │ (unpacked  │   │
//!                    │                              │  archive)  │   │
//!                    │                              └────────────┘   │
//!                    │                                                │
//!                    │  ┌──────────────────────────────────────────┐ │
//!                    │  │           Cross-Cutting Concerns          │ │
//!                    │  │ ┌────────┐ ┌─────────┐ ┌───────────────┐ │ │
//!                    │  │ │ config │ │security │ │ observability │ │ │
//!                    │  │ └────────┘ └─────────┘ └───────────────┘ │ │
//!                    │  │ ┌──────────────────┐ ┌─────────────────┐ │ │
//!                    │  │ │ archive/extension│ │    lifecycle    │ │ │
//!                    │  │ │ discovery+registry│ │ init/start/stop │ │ │
//!                    │  │ └──────────────────┘ └─────────────────┘ │ │
//!                    │  └──────────────────────────────────────────┘ │
//!                    └───────────────────────────────────────────────┘
//!
//!  Plugin bundles ──▶ archive discovery ──▶ descriptor reader ──▶ registry
//!  (initial set and bundles arriving while the host is running)
//! ```

// Core subsystems
pub mod archive;
pub mod bundle;
pub mod config;
pub mod extension;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::HostConfig;
pub use lifecycle::{HostCollaborators, HostState, Shutdown, WebHost};
