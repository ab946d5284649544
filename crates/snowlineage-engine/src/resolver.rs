//! Identifier and object type resolution
//!
//! Users type `SCHEMA.OBJECT` or `DATABASE.SCHEMA.OBJECT`. Parsing is pure;
//! only the two-part form needs the session's current database, and only the
//! type lookup needs the catalog.

use snowlineage_catalog::{CatalogLookup, CurrentDatabaseProvider};
use snowlineage_core::{LineageError, ObjectReference, ObjectType};
use tracing::{debug, warn};

/// Result of parsing a dotted identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedIdentifier {
    /// `DATABASE.SCHEMA.OBJECT`, fully resolved
    Qualified(ObjectReference),

    /// `SCHEMA.OBJECT`, database still to be determined (both parts upper-cased)
    SchemaQualified { schema: String, name: String },
}

/// Parse a dotted identifier without consulting any collaborator
pub fn parse_identifier(raw: &str) -> Result<ParsedIdentifier, LineageError> {
    let input = raw.trim();
    let invalid = || LineageError::InvalidFormat {
        input: input.to_string(),
    };

    if input.is_empty() {
        return Err(invalid());
    }

    let parts: Vec<&str> = input.split('.').map(str::trim).collect();
    if parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }

    match parts.as_slice() {
        [database, schema, name] => ObjectReference::new(database, schema, name)
            .map(ParsedIdentifier::Qualified)
            .ok_or_else(invalid),
        [schema, name] => Ok(ParsedIdentifier::SchemaQualified {
            schema: schema.to_uppercase(),
            name: name.to_uppercase(),
        }),
        _ => Err(invalid()),
    }
}

/// Resolve a raw identifier into a fully-qualified reference
///
/// The provider is consulted only for two-part identifiers. An empty answer
/// or a provider failure both mean there is no database to fall back on.
pub async fn resolve(
    raw: &str,
    provider: &dyn CurrentDatabaseProvider,
) -> Result<ObjectReference, LineageError> {
    let (schema, name) = match parse_identifier(raw)? {
        ParsedIdentifier::Qualified(reference) => return Ok(reference),
        ParsedIdentifier::SchemaQualified { schema, name } => (schema, name),
    };

    let ambiguous = || LineageError::AmbiguousDatabase {
        input: raw.trim().to_string(),
    };

    let database = match provider.current_database().await {
        Ok(Some(database)) => database,
        Ok(None) => return Err(ambiguous()),
        Err(e) => {
            warn!(input = raw.trim(), error = %e, "Current database lookup failed");
            return Err(ambiguous());
        }
    };

    let reference = ObjectReference::new(&database, &schema, &name).ok_or_else(ambiguous)?;
    debug!(input = raw.trim(), resolved = %reference, "Resolved against current database");
    Ok(reference)
}

/// Determine whether a reference names a table or a view
///
/// Exactly one catalog lookup is made; retries belong to the collaborator.
pub async fn resolve_type(
    reference: &ObjectReference,
    catalog: &dyn CatalogLookup,
) -> Result<ObjectType, LineageError> {
    let not_found = |reason: Option<String>| LineageError::NotFound {
        object: reference.fqn(),
        reason,
    };

    match catalog
        .table_type(reference.database(), reference.schema(), reference.name())
        .await
    {
        Ok(Some(table_type)) => ObjectType::from_catalog(&table_type).ok_or_else(|| {
            not_found(Some(format!("unsupported object type '{}'", table_type)))
        }),
        Ok(None) => Err(not_found(None)),
        Err(e) => {
            warn!(object = %reference, error = %e, "Catalog lookup failed");
            Err(not_found(Some(e.to_string())))
        }
    }
}
