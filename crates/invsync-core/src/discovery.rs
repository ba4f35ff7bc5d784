// ── Schema discovery ──
//
// Bootstrap aid for writing projections against an unfamiliar source
// database: enumerate user tables and their columns, then score each
// table against a fixed keyword list per entity kind. Scoring is plain
// substring containment over lower-cased names.

use std::fmt::Write as _;
use std::future::Future;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::EntityKind;

/// Metadata access needed by [`discover`].
pub trait SchemaIntrospector {
    fn schemas(&self) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;

    fn tables(&self, schema: &str) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;

    fn columns(
        &self,
        schema: &str,
        table: &str,
    ) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;
}

/// Schema scanned when every other schema is a system schema.
pub const FALLBACK_SCHEMA: &str = "public";

/// Keywords per kind, matched against table and column names.
pub const KEYWORDS: [(EntityKind, &[&str]); 6] = [
    (
        EntityKind::Location,
        &["location", "site", "address", "region", "rack", "building"],
    ),
    (
        EntityKind::Device,
        &["device", "node", "equipment", "element", "host", "resource"],
    ),
    (EntityKind::Interface, &["interface", "port", "ifname"]),
    (
        EntityKind::Prefix,
        &["prefix", "subnet", "network", "cidr", "ip_block"],
    ),
    (
        EntityKind::IpAddress,
        &["ip_address", "ipaddress", "ip_alloc", "address"],
    ),
    (
        EntityKind::Circuit,
        &["circuit", "link", "connection", "path", "service"],
    ),
];

pub fn is_system_schema(schema: &str) -> bool {
    matches!(schema, "information_schema" | "pg_catalog" | "pg_toast")
        || schema.starts_with("pg_temp_")
        || schema.starts_with("pg_toast_temp_")
}

/// Tables found and the candidate tables per entity kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    /// Table name (`schema.table` outside `public`) → column names.
    pub tables: IndexMap<String, Vec<String>>,
    pub candidates: IndexMap<EntityKind, Vec<String>>,
}

/// Introspect every user table and score it.
///
/// Failing to list schemas is fatal. A schema whose tables cannot be
/// listed, or a table whose columns cannot be read, is logged and left
/// out.
pub async fn discover<I: SchemaIntrospector + Sync>(
    introspector: &I,
) -> Result<SchemaReport, CoreError> {
    let mut schemas: Vec<String> = introspector
        .schemas()
        .await?
        .into_iter()
        .filter(|s| !is_system_schema(s))
        .collect();
    if schemas.is_empty() {
        schemas.push(FALLBACK_SCHEMA.to_owned());
    }
    debug!(?schemas, "scanning schemas");

    let mut tables = IndexMap::new();
    for schema in &schemas {
        let names = match introspector.tables(schema).await {
            Ok(names) => names,
            Err(e) => {
                warn!(%schema, error = %e, "could not list tables");
                continue;
            }
        };

        for table in names {
            let display_name = if schema == FALLBACK_SCHEMA {
                table.clone()
            } else {
                format!("{schema}.{table}")
            };
            match introspector.columns(schema, &table).await {
                Ok(columns) => {
                    tables.insert(display_name, columns);
                }
                Err(e) => warn!(table = %display_name, error = %e, "could not inspect table"),
            }
        }
    }

    let candidates = score(&tables);
    info!(
        tables = tables.len(),
        schemas = schemas.len(),
        "schema discovery complete"
    );
    Ok(SchemaReport { tables, candidates })
}

/// Candidate tables per kind.
///
/// A table is listed under a kind on its first keyword hit, so at most
/// once per kind, in table order.
pub fn score(tables: &IndexMap<String, Vec<String>>) -> IndexMap<EntityKind, Vec<String>> {
    let mut candidates: IndexMap<EntityKind, Vec<String>> =
        KEYWORDS.iter().map(|(kind, _)| (*kind, Vec::new())).collect();

    for (table, columns) in tables {
        let table_lower = table.to_lowercase();
        let columns_lower = columns.join(" ").to_lowercase();

        for (kind, keywords) in KEYWORDS {
            let hit = keywords
                .iter()
                .any(|kw| table_lower.contains(kw) || columns_lower.contains(kw));
            if hit {
                candidates.entry(kind).or_default().push(table.clone());
            }
        }
    }

    candidates
}

impl SchemaReport {
    /// Restrict both maps to tables whose name contains `filter`
    /// (case-insensitive). An empty filter keeps everything.
    #[must_use]
    pub fn filtered(&self, filter: &str) -> Self {
        let needle = filter.trim().to_lowercase();
        if needle.is_empty() {
            return self.clone();
        }
        let keep = |name: &str| name.to_lowercase().contains(&needle);

        Self {
            tables: self
                .tables
                .iter()
                .filter(|(name, _)| keep(name))
                .map(|(name, cols)| (name.clone(), cols.clone()))
                .collect(),
            candidates: self
                .candidates
                .iter()
                .map(|(kind, names)| {
                    (*kind, names.iter().filter(|n| keep(n)).cloned().collect())
                })
                .collect(),
        }
    }

    /// Human-readable report. `max_columns` caps the columns listed per
    /// table; the remainder is summarized as a count.
    pub fn render(&self, max_columns: Option<usize>) -> String {
        let mut out = String::new();
        let rule = "=".repeat(70);
        let thin = "-".repeat(40);

        let _ = writeln!(out, "{rule}\nSchema Discovery Report\n{rule}");
        let _ = writeln!(out, "\nTotal tables found: {}\n", self.tables.len());

        let _ = writeln!(out, "CANDIDATE TABLE MAPPINGS\n{thin}");
        for (kind, names) in &self.candidates {
            let _ = writeln!(out, "\n  {}:", kind.as_str().to_uppercase());
            if names.is_empty() {
                let _ = writeln!(out, "    (no candidates found)");
            }
            for name in names {
                let columns = self.tables.get(name).map_or(&[][..], Vec::as_slice);
                let _ = writeln!(out, "    - {name}");
                let _ = writeln!(out, "      columns: {}", column_list(columns, max_columns));
            }
        }

        let _ = writeln!(out, "\n{rule}\nALL TABLES\n{thin}");
        let mut names: Vec<&String> = self.tables.keys().collect();
        names.sort();
        for name in names {
            let columns = self.tables.get(name).map_or(&[][..], Vec::as_slice);
            let _ = writeln!(out, "\n  {name}");
            let _ = writeln!(out, "    columns: {}", column_list(columns, max_columns));
        }

        out
    }
}

fn column_list(columns: &[String], max: Option<usize>) -> String {
    match max {
        Some(max) if columns.len() > max => format!(
            "{} ... (+{} more)",
            columns.iter().take(max).cloned().collect::<Vec<_>>().join(", "),
            columns.len() - max
        ),
        _ => columns.join(", "),
    }
}
