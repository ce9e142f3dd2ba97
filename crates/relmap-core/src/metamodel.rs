//! Runtime mapping descriptors.
//!
//! These describe how one entity hierarchy maps onto physical tables:
//! identifier / discriminator / row-id columns, declared attributes in
//! metamodel order, the hierarchy's tables in constraint order, and any
//! separate collection tables owned by plural attributes. The descriptors
//! are built once (by whatever boots the mapping model) and shared across
//! compilations via `Arc`.

use crate::types::SqlType;
use std::sync::Arc;

/// A physical column: name plus SQL type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Column name as it appears in SQL
    pub name: String,
    /// SQL type of the column
    pub sql_type: SqlType,
}

impl ColumnMapping {
    /// Create a column mapping.
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
        }
    }
}

/// A physical table and its columns.
#[derive(Debug, Clone)]
pub struct TableMapping {
    /// Table name as it appears in SQL
    pub name: String,
    /// Columns owned by this table
    pub columns: Vec<ColumnMapping>,
}

impl TableMapping {
    /// Create a table mapping.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnMapping>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }
}

/// How an attribute is realized relative to the owning row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeClassification {
    /// Single column, basic-typed value
    Basic,
    /// Embedded composite spanning several columns of the owning table
    Embedded,
    /// Singular association carried as foreign-key columns
    ToOne,
    /// Collection-valued attribute; never inlined into the owning row
    Plural,
}

/// A declared persistent attribute.
#[derive(Debug, Clone)]
pub struct AttributeMapping {
    /// Attribute name in the domain model
    pub name: String,
    /// How the attribute maps onto columns
    pub classification: AttributeClassification,
    /// Columns in the owning table backing this attribute.
    /// Always empty for plural attributes.
    pub columns: Vec<ColumnMapping>,
}

impl AttributeMapping {
    /// Create a basic single-column attribute.
    pub fn basic(name: impl Into<String>, column: ColumnMapping) -> Self {
        Self {
            name: name.into(),
            classification: AttributeClassification::Basic,
            columns: vec![column],
        }
    }

    /// Create an embedded attribute over the given columns, in declared order.
    pub fn embedded(name: impl Into<String>, columns: Vec<ColumnMapping>) -> Self {
        Self {
            name: name.into(),
            classification: AttributeClassification::Embedded,
            columns,
        }
    }

    /// Create a to-one association carried by foreign-key columns.
    pub fn to_one(name: impl Into<String>, columns: Vec<ColumnMapping>) -> Self {
        Self {
            name: name.into(),
            classification: AttributeClassification::ToOne,
            columns,
        }
    }

    /// Create a plural (collection-valued) attribute. Owns no columns in
    /// the entity's own tables.
    pub fn plural(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classification: AttributeClassification::Plural,
            columns: Vec::new(),
        }
    }

    /// Whether this attribute is singular (owns columns in the entity row).
    pub fn is_singular(&self) -> bool {
        self.classification != AttributeClassification::Plural
    }
}

/// The identifier descriptor: one or more columns, composite-capable.
#[derive(Debug, Clone)]
pub struct IdentifierMapping {
    /// Attribute name of the identifier in the domain model
    pub attribute_name: String,
    /// Identifier columns, in declared order
    pub columns: Vec<ColumnMapping>,
}

impl IdentifierMapping {
    /// Create an identifier descriptor.
    pub fn new(attribute_name: impl Into<String>, columns: Vec<ColumnMapping>) -> Self {
        Self {
            attribute_name: attribute_name.into(),
            columns,
        }
    }

    /// Whether the identifier spans more than one column.
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }
}

/// A plural attribute backed by its own table (element collection,
/// many-to-many, or join-table one-to-many).
#[derive(Debug, Clone)]
pub struct CollectionTableMapping {
    /// Role name: `<entity>.<attribute>`
    pub role: String,
    /// The collection table
    pub table: String,
    /// Columns in the collection table referencing the owner's identifier,
    /// in the same order as the owner's identifier columns
    pub key_columns: Vec<ColumnMapping>,
}

impl CollectionTableMapping {
    /// Create a collection-table mapping.
    pub fn new(
        role: impl Into<String>,
        table: impl Into<String>,
        key_columns: Vec<ColumnMapping>,
    ) -> Self {
        Self {
            role: role.into(),
            table: table.into(),
            key_columns,
        }
    }
}

/// The mapping descriptor for one entity hierarchy.
#[derive(Debug, Clone)]
pub struct EntityMapping {
    /// Entity name in the domain model
    pub entity_name: String,
    /// The hierarchy's tables in constraint order: a table appears before
    /// any table holding a foreign key to it (superclass tables first).
    /// The ordering is supplied by whoever builds the mapping; this layer
    /// only consumes it.
    pub tables: Vec<TableMapping>,
    /// Identifier descriptor. Identifier columns live in the first table.
    pub identifier: IdentifierMapping,
    /// Optional row-id pseudo column
    pub row_id: Option<ColumnMapping>,
    /// Optional discriminator column
    pub discriminator: Option<ColumnMapping>,
    /// Declared persistent attributes (excluding the identifier), in
    /// metamodel order
    pub attributes: Vec<AttributeMapping>,
    /// Collection tables owned by plural attributes
    pub collection_tables: Vec<CollectionTableMapping>,
    /// Names of mapped subclasses of this entity
    pub subclass_names: Vec<String>,
}

impl EntityMapping {
    /// The table holding the identifier columns (the hierarchy root table).
    pub fn identifier_table(&self) -> &TableMapping {
        &self.tables[0]
    }

    /// Whether `entity_name` names this entity or one of its subclasses.
    pub fn is_or_extends(&self, entity_name: &str) -> bool {
        self.entity_name == entity_name
            || self.subclass_names.iter().any(|s| s == entity_name)
    }

    /// Look up a declared attribute by name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeMapping> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// Fluent builder for `EntityMapping`.
#[derive(Debug)]
pub struct EntityMappingBuilder {
    mapping: EntityMapping,
}

impl EntityMappingBuilder {
    /// Start a mapping for the given entity, root table, and identifier.
    pub fn new(
        entity_name: impl Into<String>,
        root_table: TableMapping,
        identifier: IdentifierMapping,
    ) -> Self {
        Self {
            mapping: EntityMapping {
                entity_name: entity_name.into(),
                tables: vec![root_table],
                identifier,
                row_id: None,
                discriminator: None,
                attributes: Vec::new(),
                collection_tables: Vec::new(),
                subclass_names: Vec::new(),
            },
        }
    }

    /// Append a secondary/subclass table. Call in constraint order.
    pub fn table(mut self, table: TableMapping) -> Self {
        self.mapping.tables.push(table);
        self
    }

    /// Set the row-id pseudo column.
    pub fn row_id(mut self, column: ColumnMapping) -> Self {
        self.mapping.row_id = Some(column);
        self
    }

    /// Set the discriminator column.
    pub fn discriminator(mut self, column: ColumnMapping) -> Self {
        self.mapping.discriminator = Some(column);
        self
    }

    /// Append a declared attribute. Call in metamodel order.
    pub fn attribute(mut self, attribute: AttributeMapping) -> Self {
        self.mapping.attributes.push(attribute);
        self
    }

    /// Append a collection table for a plural attribute.
    pub fn collection_table(mut self, table: CollectionTableMapping) -> Self {
        self.mapping.collection_tables.push(table);
        self
    }

    /// Register a mapped subclass name.
    pub fn subclass(mut self, name: impl Into<String>) -> Self {
        self.mapping.subclass_names.push(name.into());
        self
    }

    /// Finish, sharing the mapping for reuse across compilations.
    pub fn build(self) -> Arc<EntityMapping> {
        Arc::new(self.mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person() -> Arc<EntityMapping> {
        EntityMappingBuilder::new(
            "Person",
            TableMapping::new(
                "PERSON",
                vec![
                    ColumnMapping::new("id", SqlType::BigInt),
                    ColumnMapping::new("name", SqlType::VarChar(255)),
                ],
            ),
            IdentifierMapping::new("id", vec![ColumnMapping::new("id", SqlType::BigInt)]),
        )
        .attribute(AttributeMapping::basic(
            "name",
            ColumnMapping::new("name", SqlType::VarChar(255)),
        ))
        .subclass("Employee")
        .build()
    }

    #[test]
    fn identifier_table_is_first() {
        let p = person();
        assert_eq!(p.identifier_table().name, "PERSON");
        assert!(!p.identifier.is_composite());
    }

    #[test]
    fn is_or_extends_covers_self_and_subclasses() {
        let p = person();
        assert!(p.is_or_extends("Person"));
        assert!(p.is_or_extends("Employee"));
        assert!(!p.is_or_extends("Order"));
    }

    #[test]
    fn attribute_lookup() {
        let p = person();
        assert!(p.attribute("name").is_some());
        assert!(p.attribute("missing").is_none());
        assert!(p.attribute("name").unwrap().is_singular());
    }

    #[test]
    fn plural_attributes_own_no_columns() {
        let attr = AttributeMapping::plural("nicknames");
        assert!(attr.columns.is_empty());
        assert!(!attr.is_singular());
    }
}
