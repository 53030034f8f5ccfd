use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TenantRecord {
    pub id: String,
    pub company_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

/// Error message [`CredentialStore::create_tenant`] fails with when the email
/// already belongs to a tenant.
pub const EMAIL_TAKEN: &str = "email_taken";

#[derive(Debug, Clone)]
pub struct CreateTenantParams {
    pub company_name: String,
    pub email: String,
    pub password_hash: String,
}

/// A stored link between a tenant and an analytics provider.
///
/// `encrypted_credentials` is never serialized; only the opaque id, the
/// provider tag and the resource id leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationRecord {
    pub id: String,
    #[serde(skip_serializing)]
    pub tenant_id: String,
    pub provider: String,
    pub property_id: Option<String>,
    #[serde(skip_serializing)]
    pub encrypted_credentials: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct UpsertIntegrationParams {
    pub tenant_id: String,
    pub provider: String,
    /// `None` for an OAuth link that has not been narrowed to one property.
    pub property_id: Option<String>,
    pub encrypted_credentials: String,
}

/// Persistence interface for tenants and their integrations.
///
/// Route handlers only talk to this trait, so the embedded DuckDB store can be
/// swapped for a server database without touching them.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    async fn ping(&self) -> anyhow::Result<()>;

    /// Fails with [`EMAIL_TAKEN`] when the email is already registered.
    async fn create_tenant(&self, params: CreateTenantParams) -> anyhow::Result<TenantRecord>;
    async fn get_tenant(&self, id: &str) -> anyhow::Result<Option<TenantRecord>>;
    async fn find_tenant_by_email(&self, email: &str) -> anyhow::Result<Option<TenantRecord>>;

    /// Insert or update the integration keyed by
    /// `(tenant_id, provider, property_id)`. The id of an existing row is kept.
    async fn upsert_integration(
        &self,
        params: UpsertIntegrationParams,
    ) -> anyhow::Result<IntegrationRecord>;
    /// Integrations of a tenant, most recently updated first.
    async fn list_integrations(
        &self,
        tenant_id: &str,
        provider: Option<&str>,
    ) -> anyhow::Result<Vec<IntegrationRecord>>;
    async fn delete_integration(&self, tenant_id: &str, id: &str) -> anyhow::Result<bool>;
}
