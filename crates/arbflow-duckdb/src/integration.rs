use anyhow::Result;
pub use arbflow_metadata::{IntegrationRecord, UpsertIntegrationParams};

use crate::backend::new_id;
use crate::DuckDbBackend;

const INTEGRATION_COLUMNS: &str = "id, tenant_id, provider, property_id, encrypted_credentials, \
     CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)";

fn map_integration(row: &duckdb::Row<'_>) -> duckdb::Result<IntegrationRecord> {
    let property_id: String = row.get(3)?;
    Ok(IntegrationRecord {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        provider: row.get(2)?,
        property_id: (!property_id.is_empty()).then_some(property_id),
        encrypted_credentials: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl DuckDbBackend {
    /// Insert or update the integration keyed by
    /// `(tenant_id, provider, property_id)`.
    ///
    /// The lookup and the write happen under the same connection lock, so two
    /// concurrent upserts for the same key cannot both insert.
    pub async fn upsert_integration(
        &self,
        params: UpsertIntegrationParams,
    ) -> Result<IntegrationRecord> {
        let conn = self.conn.lock().await;
        let property_id = params.property_id.unwrap_or_default();

        let existing: Option<String> = conn
            .prepare(
                "SELECT id FROM integrations \
                 WHERE tenant_id = ?1 AND provider = ?2 AND property_id = ?3",
            )?
            .query_map(
                duckdb::params![params.tenant_id, params.provider, property_id],
                |row| row.get(0),
            )?
            .next()
            .transpose()?;

        let id = match existing {
            Some(id) => {
                conn.execute(
                    "UPDATE integrations \
                     SET encrypted_credentials = ?1, updated_at = CURRENT_TIMESTAMP \
                     WHERE id = ?2",
                    duckdb::params![params.encrypted_credentials, id],
                )?;
                tracing::info!(integration_id = %id, provider = %params.provider, "Integration updated");
                id
            }
            None => {
                let id = new_id();
                conn.execute(
                    "INSERT INTO integrations \
                     (id, tenant_id, provider, property_id, encrypted_credentials, created_at, updated_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
                    duckdb::params![
                        id,
                        params.tenant_id,
                        params.provider,
                        property_id,
                        params.encrypted_credentials
                    ],
                )?;
                tracing::info!(integration_id = %id, provider = %params.provider, "Integration created");
                id
            }
        };

        let sql = format!("SELECT {INTEGRATION_COLUMNS} FROM integrations WHERE id = ?1");
        let record = conn
            .prepare(&sql)?
            .query_row(duckdb::params![id], map_integration)?;
        Ok(record)
    }

    /// Integrations of a tenant, most recently updated first. `provider`
    /// narrows the list to one provider tag.
    pub async fn list_integrations(
        &self,
        tenant_id: &str,
        provider: Option<&str>,
    ) -> Result<Vec<IntegrationRecord>> {
        let conn = self.conn.lock().await;
        let mut out = Vec::new();
        match provider {
            Some(provider) => {
                let sql = format!(
                    "SELECT {INTEGRATION_COLUMNS} FROM integrations \
                     WHERE tenant_id = ?1 AND provider = ?2 \
                     ORDER BY updated_at DESC, id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(duckdb::params![tenant_id, provider], map_integration)?;
                for row in rows {
                    out.push(row?);
                }
            }
            None => {
                let sql = format!(
                    "SELECT {INTEGRATION_COLUMNS} FROM integrations \
                     WHERE tenant_id = ?1 \
                     ORDER BY updated_at DESC, id"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(duckdb::params![tenant_id], map_integration)?;
                for row in rows {
                    out.push(row?);
                }
            }
        }
        Ok(out)
    }

    /// Delete one of the tenant's integrations. Returns `false` when the id
    /// does not exist or belongs to another tenant.
    pub async fn delete_integration(&self, tenant_id: &str, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let rows = conn.execute(
            "DELETE FROM integrations WHERE id = ?1 AND tenant_id = ?2",
            duckdb::params![id, tenant_id],
        )?;
        Ok(rows > 0)
    }
}
