use std::sync::Arc;

use async_trait::async_trait;

use arbflow_duckdb::DuckDbBackend;
use arbflow_metadata::{
    CreateTenantParams, CredentialStore, IntegrationRecord, TenantRecord,
    UpsertIntegrationParams,
};

/// [`CredentialStore`] backed by the embedded DuckDB file.
pub struct DuckDbCredentialStore {
    db: Arc<DuckDbBackend>,
}

impl DuckDbCredentialStore {
    pub fn new(db: Arc<DuckDbBackend>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for DuckDbCredentialStore {
    async fn ping(&self) -> anyhow::Result<()> {
        self.db.ping().await
    }

    async fn create_tenant(&self, params: CreateTenantParams) -> anyhow::Result<TenantRecord> {
        self.db.create_tenant(params).await
    }

    async fn get_tenant(&self, id: &str) -> anyhow::Result<Option<TenantRecord>> {
        self.db.get_tenant(id).await
    }

    async fn find_tenant_by_email(&self, email: &str) -> anyhow::Result<Option<TenantRecord>> {
        self.db.find_tenant_by_email(email).await
    }

    async fn upsert_integration(
        &self,
        params: UpsertIntegrationParams,
    ) -> anyhow::Result<IntegrationRecord> {
        self.db.upsert_integration(params).await
    }

    async fn list_integrations(
        &self,
        tenant_id: &str,
        provider: Option<&str>,
    ) -> anyhow::Result<Vec<IntegrationRecord>> {
        self.db.list_integrations(tenant_id, provider).await
    }

    async fn delete_integration(&self, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
        self.db.delete_integration(tenant_id, id).await
    }
}
