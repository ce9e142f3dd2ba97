//! Domain-level selectables.
//!
//! A `Selectable` is one selected expression of a compiled statement - basic,
//! embedded, or entity-valued - and knows how to turn itself into a
//! `QueryResult` by resolving its column bindings through the statement's
//! `SqlSelectionResolver`.

use crate::result::{
    CompositeResult, DISCRIMINATOR_KEY, EntityResult, QueryResult, ROW_ID_KEY, ScalarResult,
};
use crate::selection::{ColumnReference, SqlSelectable, SqlSelectionGroup, SqlSelectionResolver};
use relmap_core::{
    AttributeClassification, AttributeMapping, ColumnMapping, EntityMapping, Error, NavigablePath,
    Result,
};
use std::sync::Arc;

/// The table/alias context a selectable reads its columns through.
#[derive(Debug, Clone)]
pub struct ColumnReferenceSource {
    qualifier: String,
}

impl ColumnReferenceSource {
    /// Create a source for the given table alias.
    pub fn new(qualifier: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
        }
    }

    /// The alias columns are qualified with.
    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    /// Build a reference to one column in this context.
    pub fn column_reference(&self, column: &ColumnMapping) -> ColumnReference {
        ColumnReference::new(self.qualifier.clone(), column.clone())
    }

    fn references(&self, columns: &[ColumnMapping]) -> Vec<ColumnReference> {
        columns.iter().map(|c| self.column_reference(c)).collect()
    }
}

/// A domain-level selected expression. Immutable once constructed; lives as
/// long as the compiled statement that produced it.
#[derive(Debug)]
pub enum Selectable {
    /// One column / basic-type expression
    Basic {
        path: NavigablePath,
        source: ColumnReferenceSource,
        column: ColumnMapping,
    },
    /// An embeddable spanning several columns in declared order
    Embedded {
        path: NavigablePath,
        source: ColumnReferenceSource,
        columns: Vec<ColumnMapping>,
    },
    /// An entity-valued selection over a mapped entity
    Entity(EntitySelectable),
}

impl Selectable {
    /// Selectable for a basic attribute value.
    pub fn basic(
        path: NavigablePath,
        source: ColumnReferenceSource,
        column: ColumnMapping,
    ) -> Self {
        Selectable::Basic {
            path,
            source,
            column,
        }
    }

    /// Selectable for an embedded value.
    pub fn embedded(
        path: NavigablePath,
        source: ColumnReferenceSource,
        columns: Vec<ColumnMapping>,
    ) -> Self {
        Selectable::Embedded {
            path,
            source,
            columns,
        }
    }

    /// Selectable for an entity-typed query root or joined entity.
    pub fn entity(
        path: NavigablePath,
        source: ColumnReferenceSource,
        entity: Arc<EntityMapping>,
        shallow: bool,
    ) -> Self {
        Selectable::Entity(EntitySelectable {
            path,
            source,
            entity,
            shallow,
        })
    }

    /// Selectable for an association projected directly: delegates to the
    /// referenced entity's own selectable.
    ///
    /// Fails unless the attribute is entity-valued.
    pub fn entity_valued(
        attribute: &AttributeMapping,
        referenced: Arc<EntityMapping>,
        path: NavigablePath,
        source: ColumnReferenceSource,
        shallow: bool,
    ) -> Result<Self> {
        if attribute.classification != AttributeClassification::ToOne {
            return Err(Error::Custom(format!(
                "attribute {} is not entity-valued",
                attribute.name
            )));
        }
        Ok(Self::entity(path, source, referenced, shallow))
    }

    /// Path of this selectable in the fetch graph.
    pub fn path(&self) -> &NavigablePath {
        match self {
            Selectable::Basic { path, .. }
            | Selectable::Embedded { path, .. } => path,
            Selectable::Entity(entity) => &entity.path,
        }
    }

    /// Convert into a `QueryResult`, resolving column bindings through the
    /// statement's resolver.
    pub fn to_query_result(
        &self,
        resolver: &mut SqlSelectionResolver,
        result_variable: Option<String>,
    ) -> QueryResult {
        match self {
            Selectable::Basic {
                path,
                source,
                column,
            } => {
                let selection =
                    resolver.resolve(SqlSelectable::Column(source.column_reference(column)));
                QueryResult::Scalar(ScalarResult {
                    path: path.clone(),
                    result_variable,
                    selection,
                })
            }
            Selectable::Embedded {
                path,
                source,
                columns,
            } => {
                let selections = resolver.resolve_group(&source.references(columns));
                QueryResult::Composite(CompositeResult {
                    path: path.clone(),
                    result_variable,
                    selections,
                })
            }
            Selectable::Entity(entity) => entity.to_query_result(resolver, result_variable),
        }
    }
}

/// An entity-valued selectable.
///
/// A shallow selection projects only identifier, row-id, and discriminator -
/// the reference-only shape used for existence checks - and skips every
/// other declared attribute.
#[derive(Debug)]
pub struct EntitySelectable {
    path: NavigablePath,
    source: ColumnReferenceSource,
    entity: Arc<EntityMapping>,
    shallow: bool,
}

impl EntitySelectable {
    /// The selected entity's mapping.
    pub fn entity(&self) -> &Arc<EntityMapping> {
        &self.entity
    }

    /// Whether this is a reference-only projection.
    pub fn is_shallow(&self) -> bool {
        self.shallow
    }

    /// The ordered attribute-to-column-reference groups.
    ///
    /// Order: identifier, row-id (if mapped), discriminator (if mapped),
    /// then the remaining declared attributes in metamodel order unless the
    /// selection is shallow. Plural attributes contribute an empty group -
    /// collections are never inlined into the owning row's projection.
    pub fn column_reference_groups(&self) -> Vec<(String, Vec<ColumnReference>)> {
        let mut groups = Vec::new();

        groups.push((
            self.entity.identifier.attribute_name.clone(),
            self.source.references(&self.entity.identifier.columns),
        ));

        if let Some(row_id) = &self.entity.row_id {
            groups.push((
                ROW_ID_KEY.to_string(),
                vec![self.source.column_reference(row_id)],
            ));
        }

        if let Some(discriminator) = &self.entity.discriminator {
            groups.push((
                DISCRIMINATOR_KEY.to_string(),
                vec![self.source.column_reference(discriminator)],
            ));
        }

        if !self.shallow {
            for attribute in &self.entity.attributes {
                let references = if attribute.is_singular() {
                    self.source.references(&attribute.columns)
                } else {
                    Vec::new()
                };
                groups.push((attribute.name.clone(), references));
            }
        }

        groups
    }

    fn to_query_result(
        &self,
        resolver: &mut SqlSelectionResolver,
        result_variable: Option<String>,
    ) -> QueryResult {
        let groups = self
            .column_reference_groups()
            .into_iter()
            .map(|(key, references)| {
                let group = if references.is_empty() {
                    SqlSelectionGroup::empty()
                } else {
                    resolver.resolve_group(&references)
                };
                (key, group)
            })
            .collect();

        QueryResult::Entity(EntityResult {
            path: self.path.clone(),
            result_variable,
            entity: Arc::clone(&self.entity),
            shallow: self.shallow,
            groups,
            fetches: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relmap_core::{
        EntityMappingBuilder, IdentifierMapping, SqlType, TableMapping,
    };

    fn entity_with_everything() -> Arc<EntityMapping> {
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
        .row_id(ColumnMapping::new("ctid", SqlType::Custom("ROWID")))
        .discriminator(ColumnMapping::new("kind", SqlType::VarChar(31)))
        .attribute(AttributeMapping::basic(
            "name",
            ColumnMapping::new("name", SqlType::VarChar(255)),
        ))
        .attribute(AttributeMapping::embedded(
            "address",
            vec![
                ColumnMapping::new("street", SqlType::VarChar(255)),
                ColumnMapping::new("city", SqlType::VarChar(255)),
            ],
        ))
        .attribute(AttributeMapping::plural("nicknames"))
        .build()
    }

    #[test]
    fn entity_groups_follow_fixed_order() {
        let entity = entity_with_everything();
        let selectable = Selectable::entity(
            NavigablePath::root("Person"),
            ColumnReferenceSource::new("p"),
            entity,
            false,
        );
        let Selectable::Entity(entity_selectable) = &selectable else {
            unreachable!()
        };

        let groups = entity_selectable.column_reference_groups();
        let keys: Vec<&str> = groups.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec!["id", ROW_ID_KEY, DISCRIMINATOR_KEY, "name", "address", "nicknames"]
        );
        // Plural attribute carries no column references.
        assert!(groups.last().unwrap().1.is_empty());
    }

    #[test]
    fn shallow_selection_stops_after_discriminator() {
        let entity = entity_with_everything();
        let selectable = Selectable::entity(
            NavigablePath::root("Person"),
            ColumnReferenceSource::new("p"),
            entity,
            true,
        );
        let Selectable::Entity(entity_selectable) = &selectable else {
            unreachable!()
        };

        let keys: Vec<String> = entity_selectable
            .column_reference_groups()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["id", ROW_ID_KEY, DISCRIMINATOR_KEY]);
    }

    #[test]
    fn entity_result_resolves_selections_in_group_order() {
        let entity = entity_with_everything();
        let selectable = Selectable::entity(
            NavigablePath::root("Person"),
            ColumnReferenceSource::new("p"),
            entity,
            false,
        );
        let mut resolver = SqlSelectionResolver::new();
        let result = selectable.to_query_result(&mut resolver, None);

        let QueryResult::Entity(entity_result) = result else {
            unreachable!()
        };
        // id, ctid, kind, name, street, city
        assert_eq!(resolver.clause().len(), 6);
        assert_eq!(entity_result.identifier_group().len(), 1);
        assert_eq!(
            entity_result.identifier_group().selections()[0].values_position(),
            0
        );
        assert_eq!(entity_result.group("address").unwrap().len(), 2);
        // Plural group shares the empty constant.
        assert!(entity_result.group("nicknames").unwrap().is_empty());
        assert!(!entity_result.shallow);
    }

    #[test]
    fn shallow_entity_resolves_fewer_selections() {
        let entity = entity_with_everything();
        let mut resolver = SqlSelectionResolver::new();
        Selectable::entity(
            NavigablePath::root("Person"),
            ColumnReferenceSource::new("p"),
            entity,
            true,
        )
        .to_query_result(&mut resolver, None);
        // id, ctid, kind only
        assert_eq!(resolver.clause().len(), 3);
    }

    #[test]
    fn basic_selectable_resolves_exactly_one_selection() {
        let mut resolver = SqlSelectionResolver::new();
        let selectable = Selectable::basic(
            NavigablePath::root("Person").append("name"),
            ColumnReferenceSource::new("p"),
            ColumnMapping::new("name", SqlType::VarChar(255)),
        );
        let result = selectable.to_query_result(&mut resolver, Some("n".to_string()));
        assert_eq!(resolver.clause().len(), 1);
        assert_eq!(result.result_variable(), Some("n"));
        assert!(matches!(result, QueryResult::Scalar(_)));
    }

    #[test]
    fn embedded_selectable_resolves_columns_in_declared_order() {
        let mut resolver = SqlSelectionResolver::new();
        let selectable = Selectable::embedded(
            NavigablePath::root("Person").append("address"),
            ColumnReferenceSource::new("p"),
            vec![
                ColumnMapping::new("street", SqlType::VarChar(255)),
                ColumnMapping::new("city", SqlType::VarChar(255)),
            ],
        );
        let result = selectable.to_query_result(&mut resolver, None);
        let QueryResult::Composite(composite) = result else {
            unreachable!()
        };
        assert_eq!(composite.selections.len(), 2);
        assert_eq!(composite.selections.selections()[0].values_position(), 0);
        assert_eq!(composite.selections.selections()[1].values_position(), 1);
    }

    #[test]
    fn entity_valued_requires_to_one_attribute() {
        let entity = entity_with_everything();
        let plural = AttributeMapping::plural("nicknames");
        let err = Selectable::entity_valued(
            &plural,
            Arc::clone(&entity),
            NavigablePath::root("Person").append("nicknames"),
            ColumnReferenceSource::new("n"),
            false,
        );
        assert!(err.is_err());

        let to_one = AttributeMapping::to_one(
            "supervisor",
            vec![ColumnMapping::new("supervisor_id", SqlType::BigInt)],
        );
        let ok = Selectable::entity_valued(
            &to_one,
            entity,
            NavigablePath::root("Person").append("supervisor"),
            ColumnReferenceSource::new("s"),
            true,
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn shared_row_resolves_once_across_two_paths() {
        // The identifier column selected through the entity and again as a
        // scalar projection shares one selection.
        let entity = entity_with_everything();
        let mut resolver = SqlSelectionResolver::new();
        Selectable::entity(
            NavigablePath::root("Person"),
            ColumnReferenceSource::new("p"),
            entity,
            true,
        )
        .to_query_result(&mut resolver, None);
        let before = resolver.clause().len();

        Selectable::basic(
            NavigablePath::root("Person").append("id"),
            ColumnReferenceSource::new("p"),
            ColumnMapping::new("id", SqlType::BigInt),
        )
        .to_query_result(&mut resolver, None);
        assert_eq!(resolver.clause().len(), before);
    }
}
