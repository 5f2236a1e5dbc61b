//! Transport-free operation surface for the newsdesk core
//!
//! Wires the authenticator, workspace registry, workflow engine, and
//! fact-check manager over one shared store, and exposes them as services
//! that transport collaborators (HTTP, gRPC, CLI) call into. Every
//! workspace-scoped call takes a bearer credential plus a per-request
//! workspace selector and runs the authenticate → resolve → require-role
//! pipeline before touching any entity.

pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};
pub use services::{AccountService, FactCheckService, WorkflowService, WorkspaceService};

use std::sync::Arc;

use newsdesk_core::config::Config;
use newsdesk_core::core_activity::SqlActivityRecorder;
use newsdesk_core::core_factcheck::FactCheckManager;
use newsdesk_core::core_identity::Authenticator;
use newsdesk_core::core_workflow::WorkflowEngine;
use newsdesk_core::core_workspace::WorkspaceRegistry;
use newsdesk_core::storage::DeskSqlStore;

/// The wired operation surface
#[derive(Clone)]
pub struct Newsdesk {
    pub accounts: AccountService,
    pub workspaces: WorkspaceService,
    pub workflow: WorkflowService,
    pub fact_checks: FactCheckService,
}

impl Newsdesk {
    /// Open the configured database and wire every service over it
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let store = DeskSqlStore::open(&config.store)?;
        Self::with_store(config, store)
    }

    /// Wire every service over an in-memory database (for tests)
    pub fn in_memory(config: &Config) -> anyhow::Result<Self> {
        let store = DeskSqlStore::memory()?;
        Self::with_store(config, store)
    }

    fn with_store(config: &Config, store: DeskSqlStore) -> anyhow::Result<Self> {
        let authenticator = Arc::new(Authenticator::new(store.clone(), &config.auth)?);
        let registry = Arc::new(WorkspaceRegistry::new(store.clone(), config.auth.invite_ttl));
        let recorder = Arc::new(SqlActivityRecorder::new(store.clone()));
        let engine = WorkflowEngine::new(store.clone(), recorder.clone());
        let fact_checks = FactCheckManager::new(store, engine.clone(), recorder);

        Ok(Newsdesk {
            accounts: AccountService::new(authenticator.clone()),
            workspaces: WorkspaceService::new(authenticator.clone(), registry.clone()),
            workflow: WorkflowService::new(authenticator.clone(), registry.clone(), engine),
            fact_checks: FactCheckService::new(authenticator, registry, fact_checks),
        })
    }
}
