//! Request gating.
//!
//! [`RequestGate`] is the single entry point for grid requests. For each
//! request it:
//!
//! 1. looks up the endpoint,
//! 2. runs the grant check, then the permission check, stopping at the
//!    first denial,
//! 3. compiles the grid parameters against the endpoint's catalogue,
//! 4. applies the configured page-size cap.
//!
//! Authorization always runs before the parameters are looked at, so an
//! unauthorized caller learns nothing about the endpoint's fields.

use std::sync::Arc;

use facility_access::{
    Caller, GrantOutcome, GrantResolver, PermissionResolver, RoleStore, TenantId,
};
use facility_grid::{QueryCompiler, QueryPlan};
use serde_json::Value;
use tracing::debug;

use crate::config::GateConfig;
use crate::error::{GateError, GateResult};
use crate::registry::{Endpoint, EndpointRegistry};

/// Authorizes and compiles grid requests against a registry.
#[derive(Debug, Clone)]
pub struct RequestGate {
    registry: Arc<EndpointRegistry>,
    compiler: QueryCompiler,
    max_per_page: Option<u64>,
}

impl RequestGate {
    /// Creates a gate with the default compiler and no page cap.
    pub fn new(registry: Arc<EndpointRegistry>) -> Self {
        Self {
            registry,
            compiler: QueryCompiler::new(),
            max_per_page: None,
        }
    }

    /// Creates a gate configured from [`GateConfig`].
    pub fn from_config(registry: Arc<EndpointRegistry>, config: &GateConfig) -> Self {
        Self::new(registry)
            .with_compiler(QueryCompiler::new().with_default_per_page(config.default_per_page))
            .with_max_per_page(config.max_per_page)
    }

    /// Replaces the query compiler.
    pub fn with_compiler(mut self, compiler: QueryCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Sets the page-size cap.
    pub fn with_max_per_page(mut self, max_per_page: Option<u64>) -> Self {
        self.max_per_page = max_per_page.map(|max| max.max(1));
        self
    }

    /// Returns the registry.
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Runs both authorization checks for `operation` on `endpoint`.
    ///
    /// On success the caller's effective grants are returned for downstream
    /// use. Any denial is [`GateError::Forbidden`].
    pub fn authorize(
        &self,
        endpoint: &Endpoint,
        operation: &str,
        caller: &Caller,
    ) -> GateResult<GrantOutcome> {
        let outcome = GrantResolver::authorize(caller, &endpoint.rules, operation);
        outcome.decision.into_result()?;
        PermissionResolver::authorize(caller, &endpoint.rules, operation).into_result()?;
        Ok(outcome)
    }

    /// Authorizes the caller, then compiles `params` into a query plan.
    pub fn handle(
        &self,
        endpoint: &str,
        operation: &str,
        caller: &Caller,
        params: &Value,
    ) -> GateResult<QueryPlan> {
        let endpoint = self
            .registry
            .endpoint(endpoint)
            .ok_or_else(|| GateError::UnknownEndpoint {
                endpoint: endpoint.to_string(),
            })?;

        self.authorize(endpoint, operation, caller)?;

        let mut plan = self.compiler.compile(&endpoint.catalogue, params)?;
        self.apply_cap(&mut plan);

        debug!(
            endpoint = %endpoint.name,
            operation,
            user = %caller.user_id,
            "Request authorized and compiled"
        );
        Ok(plan)
    }

    /// Loads the caller's roles from `store`, then behaves as [`handle`](Self::handle).
    pub async fn handle_for_user(
        &self,
        store: &dyn RoleStore,
        user_id: &str,
        tenant: Option<TenantId>,
        endpoint: &str,
        operation: &str,
        params: &Value,
    ) -> GateResult<QueryPlan> {
        let caller = Caller::load(store, user_id, tenant).await?;
        self.handle(endpoint, operation, &caller, params)
    }

    /// Clamps the page size, keeping the requested page.
    fn apply_cap(&self, plan: &mut QueryPlan) {
        let Some(max) = self.max_per_page else {
            return;
        };
        if plan.limit > max {
            plan.set_limit(max);
        }
    }
}
