/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `ARBFLOW_DUCKDB_MEMORY`, default `"1GB"`). Always set an explicit
/// limit: the DuckDB default (80% of system RAM) is not acceptable for a
/// server process.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- TENANTS (registered company accounts)
-- ===========================================
CREATE TABLE IF NOT EXISTS tenants (
    id              VARCHAR PRIMARY KEY,           -- UUID v4
    company_name    VARCHAR NOT NULL,
    email           VARCHAR NOT NULL UNIQUE,       -- stored lowercased
    password_hash   VARCHAR NOT NULL,              -- Argon2id PHC string
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ===========================================
-- INTEGRATIONS (encrypted provider credentials)
-- ===========================================
-- property_id is '' for an OAuth link that is not tied to one property, so the
-- uniqueness key below also covers that case (NULLs would never collide).
CREATE TABLE IF NOT EXISTS integrations (
    id                      VARCHAR PRIMARY KEY,   -- UUID v4, opaque to clients
    tenant_id               VARCHAR NOT NULL,
    provider                VARCHAR NOT NULL,      -- 'google_analytics'
    property_id             VARCHAR NOT NULL DEFAULT '',
    encrypted_credentials   VARCHAR NOT NULL,      -- AES-256-GCM token, never plaintext
    created_at              TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at              TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_integrations_tenant_provider_property
    ON integrations(tenant_id, provider, property_id);
CREATE INDEX IF NOT EXISTS idx_integrations_tenant
    ON integrations(tenant_id);
"#
    )
}
