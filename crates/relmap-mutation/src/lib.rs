//! CTE-based bulk update/delete strategy for relmap.
//!
//! Bulk mutations against an entity hierarchy cannot always run as one
//! statement: the hierarchy may span several tables plus separate collection
//! tables. The strategy here first selects the matching identifiers, then
//! replays them as a literal `VALUES`-list CTE (`id_cte`) joined against
//! every physically owned table, so all per-table statements see the same
//! frozen id set.
//!
//! The strategy is dialect-gated at construction: it requires non-query CTE
//! support, `VALUES` lists in FROM, and row-value `IN` predicates.

pub mod cte;
pub mod delete;
pub mod statement;
pub mod strategy;
pub mod update;

pub use cte::{CTE_TABLE_NAME, CteTable, CteTableColumn};
pub use delete::CteDeleteHandler;
pub use statement::{Assignment, BulkDelete, BulkUpdate};
pub use strategy::CteMutationStrategy;
pub use update::CteUpdateHandler;
