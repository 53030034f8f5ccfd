use anyhow::{anyhow, Result};
pub use arbflow_metadata::{CreateTenantParams, TenantRecord, EMAIL_TAKEN};

use crate::backend::new_id;
use crate::DuckDbBackend;

const TENANT_COLUMNS: &str =
    "id, company_name, email, password_hash, CAST(created_at AS VARCHAR)";

fn map_tenant(row: &duckdb::Row<'_>) -> duckdb::Result<TenantRecord> {
    Ok(TenantRecord {
        id: row.get(0)?,
        company_name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn is_unique_violation(error: &duckdb::Error) -> bool {
    let message = error.to_string();
    message.contains("UNIQUE") || message.contains("Duplicate key")
}

impl DuckDbBackend {
    /// Insert a tenant. A duplicate email fails with [`EMAIL_TAKEN`], both when
    /// seen under the connection lock and when the UNIQUE constraint fires.
    pub async fn create_tenant(&self, params: CreateTenantParams) -> Result<TenantRecord> {
        let conn = self.conn.lock().await;

        let existing: i64 = conn
            .prepare("SELECT COUNT(*) FROM tenants WHERE email = ?1")?
            .query_row(duckdb::params![params.email], |row| row.get(0))?;
        if existing > 0 {
            return Err(anyhow!(EMAIL_TAKEN));
        }

        let id = new_id();
        conn.execute(
            "INSERT INTO tenants (id, company_name, email, password_hash, created_at) \
             VALUES (?1, ?2, ?3, ?4, CURRENT_TIMESTAMP)",
            duckdb::params![id, params.company_name, params.email, params.password_hash],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                anyhow!(EMAIL_TAKEN)
            } else {
                e.into()
            }
        })?;

        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1");
        let tenant = conn
            .prepare(&sql)?
            .query_row(duckdb::params![id], map_tenant)?;
        tracing::info!(tenant_id = %tenant.id, "Tenant created");
        Ok(tenant)
    }

    pub async fn get_tenant(&self, id: &str) -> Result<Option<TenantRecord>> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(duckdb::params![id], map_tenant)?;
        let tenant = rows.next().transpose()?;
        Ok(tenant)
    }

    pub async fn find_tenant_by_email(&self, email: &str) -> Result<Option<TenantRecord>> {
        let conn = self.conn.lock().await;
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE email = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query_map(duckdb::params![email], map_tenant)?;
        let tenant = rows.next().transpose()?;
        Ok(tenant)
    }
}
