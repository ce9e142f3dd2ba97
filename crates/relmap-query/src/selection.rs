//! SQL-level selections and their deduplicated resolution.
//!
//! A `SqlSelectable` is the SQL-level addressable expression (a column
//! reference or formula fragment); a `SqlSelection` is its deduplicated,
//! position-bound occurrence in a statement's select list. Resolution goes
//! through `SqlSelectionResolver`, whose uniqueing contract is load-bearing:
//! a column requested by two different domain paths is fetched from the
//! result set once.

use relmap_core::{ColumnMapping, Dialect};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// A reference to a physical column within one table/alias context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReference {
    /// Table alias the column is read through
    pub qualifier: String,
    /// The referenced column
    pub column: ColumnMapping,
}

impl ColumnReference {
    /// Create a column reference.
    pub fn new(qualifier: impl Into<String>, column: ColumnMapping) -> Self {
        Self {
            qualifier: qualifier.into(),
            column,
        }
    }
}

/// A SQL-level selectable expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlSelectable {
    /// A qualified column reference
    Column(ColumnReference),
    /// A rendered formula fragment (read-only derived expression)
    Formula {
        qualifier: String,
        fragment: String,
    },
}

impl SqlSelectable {
    /// Stable deduplication key. Two selectables with equal keys resolve to
    /// the same `SqlSelection`.
    pub fn key(&self) -> String {
        match self {
            SqlSelectable::Column(col_ref) => {
                format!("{}.{}", col_ref.qualifier, col_ref.column.name)
            }
            SqlSelectable::Formula {
                qualifier,
                fragment,
            } => format!("{qualifier}:{fragment}"),
        }
    }

    /// Render this selectable for the select list.
    pub fn render(&self, dialect: Dialect) -> String {
        match self {
            SqlSelectable::Column(col_ref) => format!(
                "{}.{}",
                col_ref.qualifier,
                dialect.quote_identifier(&col_ref.column.name)
            ),
            SqlSelectable::Formula {
                qualifier: _,
                fragment,
            } => fragment.clone(),
        }
    }
}

/// A position-addressable selection in the statement's select list.
///
/// `values_position` is the 0-based index into the internal values array;
/// the driver-level result-set position is always `values_position + 1`
/// (result sets are 1-based). The only place allowed to decouple the two is
/// native-query column remapping, via [`SqlSelection::with_result_position`].
#[derive(Debug, PartialEq, Eq)]
pub struct SqlSelection {
    selectable: SqlSelectable,
    values_position: usize,
    result_position_override: Option<usize>,
}

impl SqlSelection {
    fn new(selectable: SqlSelectable, values_position: usize) -> Self {
        Self {
            selectable,
            values_position,
            result_position_override: None,
        }
    }

    /// The underlying SQL-level expression.
    pub fn selectable(&self) -> &SqlSelectable {
        &self.selectable
    }

    /// 0-based position in the internal values array.
    pub fn values_position(&self) -> usize {
        self.values_position
    }

    /// 1-based position in the driver result set.
    pub fn result_position(&self) -> usize {
        self.result_position_override
            .unwrap_or(self.values_position + 1)
    }

    /// Native-query remapping hook: pin this selection to an explicit
    /// result-set position instead of the derived one.
    pub fn with_result_position(selectable: SqlSelectable, position: usize) -> Arc<Self> {
        Arc::new(Self {
            selectable,
            // Native remappings still occupy a slot; derive it from the
            // pinned position so values arrays stay dense.
            values_position: position - 1,
            result_position_override: Some(position),
        })
    }
}

/// An ordered group of selections backing one attribute.
///
/// Cloning is cheap; the empty group is a single shared constant so plural
/// attributes never allocate one apiece.
#[derive(Debug, Clone)]
pub struct SqlSelectionGroup {
    selections: Arc<Vec<Arc<SqlSelection>>>,
}

impl SqlSelectionGroup {
    /// Create a group over the given selections.
    pub fn new(selections: Vec<Arc<SqlSelection>>) -> Self {
        Self {
            selections: Arc::new(selections),
        }
    }

    /// The shared empty group.
    pub fn empty() -> Self {
        static EMPTY: OnceLock<SqlSelectionGroup> = OnceLock::new();
        EMPTY
            .get_or_init(|| SqlSelectionGroup {
                selections: Arc::new(Vec::new()),
            })
            .clone()
    }

    /// Selections in declared order.
    pub fn selections(&self) -> &[Arc<SqlSelection>] {
        &self.selections
    }

    /// Number of selections in the group.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

/// The select list under construction: ordered, duplicate-free.
#[derive(Debug, Default)]
pub struct SelectClause {
    distinct: bool,
    selections: Vec<Arc<SqlSelection>>,
}

impl SelectClause {
    /// Create an empty select clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the clause DISTINCT.
    pub fn set_distinct(&mut self, distinct: bool) {
        self.distinct = distinct;
    }

    /// Whether the clause is DISTINCT.
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Append a selection. The resolver is the only caller; it guarantees
    /// uniqueness before appending.
    pub fn add_selection(&mut self, selection: Arc<SqlSelection>) {
        self.selections.push(selection);
    }

    /// Selections in position order.
    pub fn selections(&self) -> &[Arc<SqlSelection>] {
        &self.selections
    }

    /// Number of distinct selections.
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    /// Whether no selections were resolved.
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Render the select list.
    pub fn render(&self, dialect: Dialect) -> String {
        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        let rendered: Vec<String> = self
            .selections
            .iter()
            .map(|s| s.selectable().render(dialect))
            .collect();
        sql.push_str(&rendered.join(", "));
        sql
    }
}

/// The deduplication boundary for SQL selections.
///
/// Scoped to one statement compilation; never shared across statements or
/// threads. Repeated `resolve` calls for an equal selectable return the
/// identical `SqlSelection`, so the clause length equals the number of
/// distinct selectables requested.
#[derive(Debug, Default)]
pub struct SqlSelectionResolver {
    clause: SelectClause,
    by_key: HashMap<String, Arc<SqlSelection>>,
}

impl SqlSelectionResolver {
    /// Create a resolver for one statement compilation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a selectable into its unique selection, allocating the next
    /// values position on first sight.
    pub fn resolve(&mut self, selectable: SqlSelectable) -> Arc<SqlSelection> {
        let key = selectable.key();
        if let Some(existing) = self.by_key.get(&key) {
            return Arc::clone(existing);
        }
        let selection = Arc::new(SqlSelection::new(selectable, self.clause.len()));
        self.clause.add_selection(Arc::clone(&selection));
        self.by_key.insert(key, Arc::clone(&selection));
        selection
    }

    /// Resolve an ordered list of column references into a group.
    pub fn resolve_group(&mut self, column_refs: &[ColumnReference]) -> SqlSelectionGroup {
        if column_refs.is_empty() {
            return SqlSelectionGroup::empty();
        }
        let selections = column_refs
            .iter()
            .map(|col_ref| self.resolve(SqlSelectable::Column(col_ref.clone())))
            .collect();
        SqlSelectionGroup::new(selections)
    }

    /// The clause built so far.
    pub fn clause(&self) -> &SelectClause {
        &self.clause
    }

    /// Finish resolution, yielding the completed clause.
    pub fn into_clause(self) -> SelectClause {
        self.clause
    }
}
