// ── Source projections ──
//
// A projection maps one source table onto the fields of one entity kind.
// Defaults use placeholder `nc_*` names; real deployments override them
// per profile after running schema discovery.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::model::EntityKind;

/// Table and column mapping for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub table: String,
    /// Entity field name → source column name.
    pub columns: IndexMap<String, String>,
}

/// Partial projection from configuration, layered over the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub columns: IndexMap<String, String>,
}

impl Projection {
    /// Placeholder projection for `kind`.
    pub fn default_for(kind: EntityKind) -> Self {
        let (table, columns): (&str, &[(&str, &str)]) = match kind {
            EntityKind::Location => (
                "nc_location_table",
                &[
                    ("name", "nc_location_name"),
                    ("location_type", "nc_location_type"),
                    ("status", "nc_location_status"),
                    ("description", "nc_location_desc"),
                    ("latitude", "nc_location_latitude"),
                    ("longitude", "nc_location_longitude"),
                ],
            ),
            EntityKind::Device => (
                "nc_device_table",
                &[
                    ("name", "nc_device_name"),
                    ("device_type", "nc_device_type"),
                    ("manufacturer", "nc_manufacturer"),
                    ("role", "nc_device_role"),
                    ("status", "nc_device_status"),
                    ("location", "nc_location_name"),
                    ("serial", "nc_serial_number"),
                    ("platform", "nc_platform"),
                    ("comments", "nc_comments"),
                ],
            ),
            EntityKind::Interface => (
                "nc_interface_table",
                &[
                    ("device", "nc_device_name"),
                    ("name", "nc_interface_name"),
                    ("type", "nc_interface_type"),
                    ("status", "nc_interface_status"),
                    ("enabled", "nc_interface_enabled"),
                    ("description", "nc_interface_desc"),
                    ("mac_address", "nc_mac_address"),
                    ("mtu", "nc_mtu"),
                ],
            ),
            EntityKind::Prefix => (
                "nc_prefix_table",
                &[
                    ("prefix", "nc_prefix_cidr"),
                    ("namespace", "nc_namespace"),
                    ("status", "nc_prefix_status"),
                    ("description", "nc_prefix_desc"),
                    ("vrf", "nc_vrf_name"),
                    ("location", "nc_location_name"),
                ],
            ),
            EntityKind::IpAddress => (
                "nc_ip_address_table",
                &[
                    ("address", "nc_ip_address"),
                    ("namespace", "nc_namespace"),
                    ("status", "nc_ip_status"),
                    ("dns_name", "nc_dns_name"),
                    ("description", "nc_ip_desc"),
                ],
            ),
            EntityKind::Circuit => (
                "nc_circuit_table",
                &[
                    ("cid", "nc_circuit_id"),
                    ("provider", "nc_provider_name"),
                    ("circuit_type", "nc_circuit_type"),
                    ("status", "nc_circuit_status"),
                    ("description", "nc_circuit_desc"),
                    ("commit_rate", "nc_commit_rate"),
                    ("comments", "nc_circuit_comments"),
                ],
            ),
        };

        Self {
            schema: None,
            table: table.to_owned(),
            columns: columns
                .iter()
                .map(|(f, c)| ((*f).to_owned(), (*c).to_owned()))
                .collect(),
        }
    }

    /// Layer a configured override over this projection.
    #[must_use]
    pub fn merged(mut self, over: &ProjectionOverride) -> Self {
        if let Some(schema) = &over.schema {
            self.schema = Some(schema.clone());
        }
        if let Some(table) = &over.table {
            self.table.clone_from(table);
        }
        for (field, column) in &over.columns {
            self.columns.insert(field.clone(), column.clone());
        }
        self
    }

    pub fn column(&self, field: &str) -> Option<&str> {
        self.columns.get(field).map(String::as_str)
    }

    /// Reject unknown field names, blank names, and unmapped identity fields.
    pub fn validate(&self, kind: EntityKind) -> Result<(), CoreError> {
        let invalid = |message: String| CoreError::Config {
            message: format!("{kind} projection: {message}"),
        };

        if self.table.trim().is_empty() {
            return Err(invalid("table name is empty".into()));
        }
        for (field, column) in &self.columns {
            if !kind.fields().contains(&field.as_str()) {
                return Err(invalid(format!(
                    "unknown field '{field}' (expected one of: {})",
                    kind.fields().join(", ")
                )));
            }
            if column.trim().is_empty() {
                return Err(invalid(format!("column for '{field}' is empty")));
            }
        }
        for field in kind.identity_fields() {
            if self.column(field).is_none() {
                return Err(invalid(format!("identity field '{field}' is not mapped")));
            }
        }
        Ok(())
    }

    /// `"schema"."table"`, or just `"table"` without a schema.
    pub fn qualified_table(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", quote_ident(schema), quote_ident(&self.table)),
            None => quote_ident(&self.table),
        }
    }

    /// The read query for `kind`.
    ///
    /// Every entity field is selected as text under its field name;
    /// unmapped fields come back as NULL. Rows are ordered by the
    /// identity columns so loads are deterministic.
    pub fn select_sql(&self, kind: EntityKind) -> String {
        let select: Vec<String> = kind
            .fields()
            .iter()
            .map(|field| match self.column(field) {
                Some(column) => format!("{}::text AS {}", quote_ident(column), quote_ident(field)),
                None => format!("NULL::text AS {}", quote_ident(field)),
            })
            .collect();

        let order: Vec<String> = kind
            .identity_fields()
            .iter()
            .filter_map(|field| self.column(field))
            .map(quote_ident)
            .collect();

        let mut sql = format!("SELECT {} FROM {}", select.join(", "), self.qualified_table());
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order.join(", "));
        }
        sql
    }
}

/// The six projections used by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projections([Projection; 6]);

impl Default for Projections {
    fn default() -> Self {
        Self(EntityKind::ALL.map(Projection::default_for))
    }
}

impl Projections {
    /// Defaults with configured overrides applied, validated.
    pub fn with_overrides(
        overrides: &IndexMap<EntityKind, ProjectionOverride>,
    ) -> Result<Self, CoreError> {
        let mut projections = Self::default();
        for (kind, over) in overrides {
            let merged = projections.get(*kind).clone().merged(over);
            projections.set(*kind, merged);
        }
        for (kind, projection) in projections.iter() {
            projection.validate(kind)?;
        }
        Ok(projections)
    }

    pub fn get(&self, kind: EntityKind) -> &Projection {
        &self.0[slot(kind)]
    }

    pub fn set(&mut self, kind: EntityKind, projection: Projection) {
        self.0[slot(kind)] = projection;
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &Projection)> {
        EntityKind::ALL.into_iter().zip(self.0.iter())
    }
}

/// Position of `kind` in [`EntityKind::ALL`].
fn slot(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Location => 0,
        EntityKind::Device => 1,
        EntityKind::Interface => 2,
        EntityKind::Prefix => 3,
        EntityKind::IpAddress => 4,
        EntityKind::Circuit => 5,
    }
}

/// Double-quote a SQL identifier, doubling embedded quotes.
pub fn quote_ident(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_location_sql() {
        let sql = Projection::default_for(EntityKind::Location).select_sql(EntityKind::Location);
        assert_eq!(
            sql,
            "SELECT \"nc_location_name\"::text AS \"name\", \
             \"nc_location_type\"::text AS \"location_type\", \
             \"nc_location_status\"::text AS \"status\", \
             \"nc_location_desc\"::text AS \"description\", \
             \"nc_location_latitude\"::text AS \"latitude\", \
             \"nc_location_longitude\"::text AS \"longitude\" \
             FROM \"nc_location_table\" ORDER BY \"nc_location_name\""
        );
    }

    #[test]
    fn interface_orders_by_both_identity_columns() {
        let sql = Projection::default_for(EntityKind::Interface).select_sql(EntityKind::Interface);
        assert!(sql.ends_with("ORDER BY \"nc_device_name\", \"nc_interface_name\""));
    }

    #[test]
    fn unmapped_fields_select_null() {
        let mut projection = Projection::default_for(EntityKind::Circuit);
        projection.columns.shift_remove("comments");
        let sql = projection.select_sql(EntityKind::Circuit);
        assert!(sql.contains("NULL::text AS \"comments\""));
    }

    #[test]
    fn override_replaces_table_and_columns() {
        let over = ProjectionOverride {
            schema: Some("inventory".into()),
            table: Some("site_master".into()),
            columns: [("name".to_owned(), "site_name".to_owned())].into_iter().collect(),
        };
        let projection = Projection::default_for(EntityKind::Location).merged(&over);

        assert_eq!(projection.qualified_table(), "\"inventory\".\"site_master\"");
        assert_eq!(projection.column("name"), Some("site_name"));
        assert_eq!(projection.column("status"), Some("nc_location_status"));
    }

    #[test]
    fn identifiers_are_escaped() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn validation_rejects_unknown_field() {
        let overrides: IndexMap<_, _> = [(
            EntityKind::Device,
            ProjectionOverride {
                columns: [("hostname".to_owned(), "x".to_owned())].into_iter().collect(),
                ..ProjectionOverride::default()
            },
        )]
        .into_iter()
        .collect();

        let err = Projections::with_overrides(&overrides).unwrap_err();
        assert!(err.to_string().contains("unknown field 'hostname'"));
    }

    #[test]
    fn validation_requires_identity_columns() {
        let mut projection = Projection::default_for(EntityKind::Prefix);
        projection.columns.shift_remove("namespace");
        assert!(projection.validate(EntityKind::Prefix).is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let projections = Projections::with_overrides(&IndexMap::new()).unwrap();
        assert_eq!(projections.iter().count(), 6);
    }
}
