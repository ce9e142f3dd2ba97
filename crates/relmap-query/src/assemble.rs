//! Result-set to value-graph assembly.
//!
//! The assembler walks a `BufferedResultSet` row by row, reading each value
//! through the resolved `SqlSelection` positions, and materializes the shape
//! the `QueryResult` descriptor tree describes. Entity instances are shared
//! through an execution-scoped identity map: a row keyed by an identifier
//! already seen reuses the existing instance instead of constructing a
//! duplicate, and join-fetched collection elements accumulate onto the owner
//! across rows.

use crate::result::{EntityResult, Fetch, FetchTiming, QueryResult};
use crate::selection::SqlSelectionGroup;
use relmap_core::{Result, Row, Value, row::BufferedResultSet, value_at};
use std::collections::HashMap;
use std::sync::Arc;

/// A fully materialized entity row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInstance {
    /// Entity name from the mapping
    pub entity_name: String,
    /// Identifier column values, in identifier order
    pub identifier: Vec<Value>,
    /// Discriminator value, when mapped and selected
    pub discriminator: Option<Value>,
    /// Attribute state in group order
    pub state: Vec<(String, AssembledValue)>,
}

impl EntityInstance {
    /// Look up one attribute's assembled state.
    pub fn attribute(&self, name: &str) -> Option<&AssembledValue> {
        self.state
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value)
    }
}

/// A materialized value in the assembled graph.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembledValue {
    /// SQL NULL, or an association whose key columns were all null
    Null,
    /// A scalar value
    Scalar(Value),
    /// An embedded composite: `(column label, value)` in declared order
    Composite(Vec<(String, Value)>),
    /// A shared entity instance
    Entity(Arc<EntityInstance>),
    /// A by-identity reference to an instance materialized elsewhere in the
    /// graph (breaks runtime cycles the descriptor tree cannot have)
    EntityRef {
        entity_name: String,
        identifier: Vec<Value>,
    },
    /// One element of a root-level collection result, tagged with its
    /// owner-key values
    CollectionElement {
        key: Vec<Value>,
        element: Box<AssembledValue>,
    },
    /// An accumulated collection
    Collection(Vec<AssembledValue>),
    /// An association not read from this result set (delayed fetch)
    Deferred(String),
    /// A dynamic instantiation
    Instantiation {
        target: String,
        arguments: Vec<AssembledValue>,
    },
}

/// Intermediate node; entity references stay index-valued until the identity
/// map is frozen at the end of the pass.
#[derive(Debug, Clone)]
enum Node {
    Null,
    Scalar(Value),
    Composite(Vec<(String, Value)>),
    Entity(usize),
    CollectionElement {
        key: Vec<Value>,
        element: Box<Node>,
    },
    Deferred(String),
    Instantiation {
        target: String,
        arguments: Vec<Node>,
    },
}

#[derive(Debug)]
struct EntityBuilder {
    entity_name: String,
    identifier: Vec<Value>,
    discriminator: Option<Value>,
    state: Vec<(String, Node)>,
    /// Join-fetched collection elements accumulated across rows,
    /// keyed by attribute
    collections: Vec<(String, Vec<Node>)>,
}

#[derive(Debug, Default)]
struct AssemblyState {
    builders: Vec<EntityBuilder>,
    identity_map: HashMap<String, usize>,
}

impl AssemblyState {
    fn identity_key(entity_name: &str, identifier: &[Value]) -> String {
        // Identifier values are comparable surrogates; their debug form is a
        // stable map key within one pass.
        format!("{entity_name}|{identifier:?}")
    }
}

/// Assembles rows into the shape described by a list of root results.
///
/// One assembler pass owns one identity map; instances are never shared
/// across passes.
#[derive(Debug)]
pub struct Assembler<'a> {
    results: &'a [QueryResult],
}

impl<'a> Assembler<'a> {
    /// Create an assembler over the statement's root results.
    pub fn new(results: &'a [QueryResult]) -> Self {
        Self { results }
    }

    /// Read every remaining row, producing one value per root result per row.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn assemble(&self, access: &mut BufferedResultSet) -> Result<Vec<Vec<AssembledValue>>> {
        let mut state = AssemblyState::default();
        let mut row_nodes: Vec<Vec<Node>> = Vec::new();

        while let Some(row) = access.next_row() {
            let row = row.clone();
            let mut nodes = Vec::with_capacity(self.results.len());
            for result in self.results {
                nodes.push(assemble_node(result, &row, &mut state)?);
            }
            row_nodes.push(nodes);
        }

        tracing::debug!(
            rows = row_nodes.len(),
            instances = state.builders.len(),
            "assembly pass complete"
        );

        let frozen = freeze_all(&state);
        Ok(row_nodes
            .into_iter()
            .map(|nodes| nodes.into_iter().map(|n| resolve_node(n, &frozen)).collect())
            .collect())
    }
}

fn read_group(group: &SqlSelectionGroup, row: &Row) -> Result<Vec<Value>> {
    group
        .selections()
        .iter()
        .map(|selection| value_at(row, selection.result_position()))
        .collect()
}

fn group_label(group: &SqlSelectionGroup, index: usize) -> String {
    group.selections()[index].selectable().key()
}

fn assemble_node(result: &QueryResult, row: &Row, state: &mut AssemblyState) -> Result<Node> {
    match result {
        QueryResult::Scalar(scalar) => {
            let value = value_at(row, scalar.selection.result_position())?;
            Ok(match value {
                Value::Null => Node::Null,
                value => Node::Scalar(value),
            })
        }
        QueryResult::Composite(composite) => {
            let values = read_group(&composite.selections, row)?;
            let labeled = values
                .into_iter()
                .enumerate()
                .map(|(i, v)| (group_label(&composite.selections, i), v))
                .collect();
            Ok(Node::Composite(labeled))
        }
        QueryResult::Entity(entity) => assemble_entity(entity, row, state),
        QueryResult::Collection(collection) => {
            let key = read_group(&collection.key_group, row)?;
            let element = assemble_node(&collection.element, row, state)?;
            Ok(Node::CollectionElement {
                key,
                element: Box::new(element),
            })
        }
        QueryResult::Instantiation(instantiation) => {
            let arguments = instantiation
                .arguments
                .iter()
                .map(|arg| assemble_node(arg, row, state))
                .collect::<Result<Vec<_>>>()?;
            Ok(Node::Instantiation {
                target: instantiation.target.clone(),
                arguments,
            })
        }
    }
}

fn assemble_entity(entity: &EntityResult, row: &Row, state: &mut AssemblyState) -> Result<Node> {
    let identifier = read_group(entity.identifier_group(), row)?;
    // An outer-joined association with no matching row reads all-null keys.
    if identifier.iter().all(Value::is_null) {
        return Ok(Node::Null);
    }

    let key = AssemblyState::identity_key(&entity.entity.entity_name, &identifier);
    let index = match state.identity_map.get(&key) {
        Some(&index) => index,
        None => {
            let index = construct_entity(entity, row, identifier, state)?;
            state.identity_map.insert(key, index);
            index
        }
    };

    // Collection fetches accumulate per row, whether or not the owner
    // instance already existed.
    accumulate_collection_fetches(entity, row, index, state)?;

    Ok(Node::Entity(index))
}

fn construct_entity(
    entity: &EntityResult,
    row: &Row,
    identifier: Vec<Value>,
    state: &mut AssemblyState,
) -> Result<usize> {
    let discriminator = match entity.group(crate::result::DISCRIMINATOR_KEY) {
        Some(group) if !group.is_empty() => Some(read_group(group, row)?.remove(0)),
        _ => None,
    };

    let id_key = entity.entity.identifier.attribute_name.clone();
    let mut attr_state: Vec<(String, Node)> = Vec::new();
    for (group_key, group) in &entity.groups {
        if *group_key == id_key
            || group_key.as_str() == crate::result::ROW_ID_KEY
            || group_key.as_str() == crate::result::DISCRIMINATOR_KEY
        {
            continue;
        }
        let node = if group.is_empty() {
            // Plural attribute: never read from the owning row.
            Node::Deferred(group_key.clone())
        } else if group.len() == 1 {
            match value_at(row, group.selections()[0].result_position())? {
                Value::Null => Node::Null,
                value => Node::Scalar(value),
            }
        } else {
            let values = read_group(group, row)?;
            Node::Composite(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (group_label(group, i), v))
                    .collect(),
            )
        };
        attr_state.push((group_key.clone(), node));
    }

    // Reserve the slot before descending into fetches so nested references
    // back to this instance resolve through the identity map.
    let index = state.builders.len();
    state.builders.push(EntityBuilder {
        entity_name: entity.entity.entity_name.clone(),
        identifier: identifier.clone(),
        discriminator,
        state: attr_state,
        collections: Vec::new(),
    });
    state.identity_map.insert(
        AssemblyState::identity_key(&entity.entity.entity_name, &identifier),
        index,
    );

    for fetch in &entity.fetches {
        if matches!(fetch.result, QueryResult::Collection(_)) {
            // Accumulated separately, row by row.
            continue;
        }
        let node = match fetch.timing {
            FetchTiming::Immediate => assemble_node(&fetch.result, row, state)?,
            FetchTiming::Delayed => Node::Deferred(fetch.attribute.clone()),
        };
        set_attribute(&mut state.builders[index], &fetch.attribute, node);
    }

    Ok(index)
}

fn accumulate_collection_fetches(
    entity: &EntityResult,
    row: &Row,
    index: usize,
    state: &mut AssemblyState,
) -> Result<()> {
    for fetch in &entity.fetches {
        let QueryResult::Collection(_) = fetch.result else {
            continue;
        };
        if fetch.timing != FetchTiming::Immediate {
            continue;
        }
        let Node::CollectionElement { element, .. } =
            assemble_node(&fetch.result, row, state)?
        else {
            continue;
        };
        // Unmatched outer-join rows contribute nothing.
        if matches!(*element, Node::Null) {
            continue;
        }
        push_collection_element(&mut state.builders[index], fetch, *element);
    }
    Ok(())
}

fn push_collection_element(builder: &mut EntityBuilder, fetch: &Fetch, element: Node) {
    match builder
        .collections
        .iter_mut()
        .find(|(attr, _)| attr == &fetch.attribute)
    {
        Some((_, elements)) => elements.push(element),
        None => builder
            .collections
            .push((fetch.attribute.clone(), vec![element])),
    }
}

fn set_attribute(builder: &mut EntityBuilder, attribute: &str, node: Node) {
    match builder.state.iter_mut().find(|(attr, _)| attr == attribute) {
        Some((_, slot)) => *slot = node,
        None => builder.state.push((attribute.to_string(), node)),
    }
}

fn freeze_all(state: &AssemblyState) -> Vec<Option<Arc<EntityInstance>>> {
    let mut frozen: Vec<Option<Arc<EntityInstance>>> = vec![None; state.builders.len()];
    let mut in_progress = vec![false; state.builders.len()];
    for index in 0..state.builders.len() {
        freeze_entity(index, state, &mut frozen, &mut in_progress);
    }
    frozen
}

fn freeze_entity(
    index: usize,
    state: &AssemblyState,
    frozen: &mut Vec<Option<Arc<EntityInstance>>>,
    in_progress: &mut Vec<bool>,
) -> AssembledValue {
    if let Some(instance) = &frozen[index] {
        return AssembledValue::Entity(Arc::clone(instance));
    }
    let builder = &state.builders[index];
    if in_progress[index] {
        // Runtime cycle: hand out a by-identity reference instead of
        // recursing forever.
        return AssembledValue::EntityRef {
            entity_name: builder.entity_name.clone(),
            identifier: builder.identifier.clone(),
        };
    }
    in_progress[index] = true;

    let mut attr_state: Vec<(String, AssembledValue)> = builder
        .state
        .iter()
        .map(|(attr, node)| {
            (
                attr.clone(),
                freeze_node(node, state, frozen, in_progress),
            )
        })
        .collect();

    for (attr, elements) in &builder.collections {
        let collection = AssembledValue::Collection(
            elements
                .iter()
                .map(|n| freeze_node(n, state, frozen, in_progress))
                .collect(),
        );
        match attr_state.iter_mut().find(|(a, _)| a == attr) {
            Some((_, slot)) => *slot = collection,
            None => attr_state.push((attr.clone(), collection)),
        }
    }

    let instance = Arc::new(EntityInstance {
        entity_name: builder.entity_name.clone(),
        identifier: builder.identifier.clone(),
        discriminator: builder.discriminator.clone(),
        state: attr_state,
    });
    frozen[index] = Some(Arc::clone(&instance));
    in_progress[index] = false;
    AssembledValue::Entity(instance)
}

fn freeze_node(
    node: &Node,
    state: &AssemblyState,
    frozen: &mut Vec<Option<Arc<EntityInstance>>>,
    in_progress: &mut Vec<bool>,
) -> AssembledValue {
    match node {
        Node::Null => AssembledValue::Null,
        Node::Scalar(value) => AssembledValue::Scalar(value.clone()),
        Node::Composite(values) => AssembledValue::Composite(values.clone()),
        Node::Entity(index) => freeze_entity(*index, state, frozen, in_progress),
        Node::CollectionElement { key, element } => AssembledValue::CollectionElement {
            key: key.clone(),
            element: Box::new(freeze_node(element, state, frozen, in_progress)),
        },
        Node::Deferred(attr) => AssembledValue::Deferred(attr.clone()),
        Node::Instantiation { target, arguments } => AssembledValue::Instantiation {
            target: target.clone(),
            arguments: arguments
                .iter()
                .map(|n| freeze_node(n, state, frozen, in_progress))
                .collect(),
        },
    }
}

fn resolve_node(node: Node, frozen: &[Option<Arc<EntityInstance>>]) -> AssembledValue {
    match node {
        Node::Null => AssembledValue::Null,
        Node::Scalar(value) => AssembledValue::Scalar(value),
        Node::Composite(values) => AssembledValue::Composite(values),
        Node::Entity(index) => match frozen.get(index).and_then(Option::as_ref) {
            Some(instance) => AssembledValue::Entity(Arc::clone(instance)),
            None => AssembledValue::Null,
        },
        Node::CollectionElement { key, element } => AssembledValue::CollectionElement {
            key,
            element: Box::new(resolve_node(*element, frozen)),
        },
        Node::Deferred(attr) => AssembledValue::Deferred(attr),
        Node::Instantiation { target, arguments } => AssembledValue::Instantiation {
            target,
            arguments: arguments
                .into_iter()
                .map(|n| resolve_node(n, frozen))
                .collect(),
        },
    }
}
