// PostgreSQL source store over a sqlx connection pool.
//
// The pool is owned by the `PgSource` value: callers connect, run a load
// or a discovery pass, then close it. Nothing here is cached globally.

use secrecy::ExposeSecret;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{Projection, SourceStore};
use crate::config::SourceConfig;
use crate::discovery::SchemaIntrospector;
use crate::error::CoreError;
use crate::model::{EntityKind, FieldMap};

const SCHEMAS_SQL: &str =
    "SELECT schema_name::text FROM information_schema.schemata ORDER BY schema_name";

const TABLES_SQL: &str = "SELECT table_name::text FROM information_schema.tables \
     WHERE table_schema = $1 AND table_type = 'BASE TABLE' ORDER BY table_name";

const COLUMNS_SQL: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_schema = $1 AND table_name = $2 ORDER BY ordinal_position";

/// Read-only handle on the source database.
pub struct PgSource {
    pool: PgPool,
    target: String,
}

impl PgSource {
    /// Open a pool against the configured database.
    pub async fn connect(config: &SourceConfig) -> Result<Self, CoreError> {
        let target = config.display_target();
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(config.password.expose_secret())
            .database(&config.database)
            .ssl_mode(config.ssl_mode.into())
            .application_name("invsync");

        debug!(%target, ssl_mode = %config.ssl_mode, "creating source connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::SourceQuery { message } => CoreError::ConnectionFailed {
                    target: target.clone(),
                    reason: message,
                },
                other => other,
            })?;

        info!(%target, "source connection pool established");
        Ok(Self { pool, target })
    }

    /// Close every pooled connection.
    pub async fn close(self) {
        self.pool.close().await;
        debug!(target = %self.target, "source connection pool closed");
    }

    async fn names(&self, sql: &str, binds: &[&str]) -> Result<Vec<String>, CoreError> {
        let mut query = sqlx::query_scalar::<_, String>(sql);
        for bind in binds {
            query = query.bind(*bind);
        }
        query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CoreError::Introspection {
                message: format!("{} on {}: {e}", binds.join("."), self.target),
            })
    }
}

impl SourceStore for PgSource {
    async fn fetch(
        &self,
        kind: EntityKind,
        projection: &Projection,
    ) -> Result<Vec<FieldMap>, CoreError> {
        let sql = projection.select_sql(kind);
        debug!(kind = %kind, %sql, "querying source");

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::SourceQuery { message } => CoreError::SourceQuery {
                    message: format!("{}: {message}", projection.qualified_table()),
                },
                other => other,
            })?;

        rows.iter().map(|row| row_to_fields(kind, row)).collect()
    }
}

impl SchemaIntrospector for PgSource {
    async fn schemas(&self) -> Result<Vec<String>, CoreError> {
        self.names(SCHEMAS_SQL, &[]).await
    }

    async fn tables(&self, schema: &str) -> Result<Vec<String>, CoreError> {
        self.names(TABLES_SQL, &[schema]).await
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<String>, CoreError> {
        self.names(COLUMNS_SQL, &[schema, table]).await
    }
}

/// Every projected column is cast to text, so each cell is text or NULL.
fn row_to_fields(kind: EntityKind, row: &PgRow) -> Result<FieldMap, CoreError> {
    let mut fields = FieldMap::new();
    for field in kind.fields() {
        let value: Option<String> = row.try_get(*field).map_err(|e| CoreError::SourceQuery {
            message: format!("malformed {kind} row, field '{field}': {e}"),
        })?;
        fields.insert(*field, value);
    }
    Ok(fields)
}
