//! SQL dialects and the capability flags the compilers gate on.

/// SQL dialect for generating dialect-specific SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Dialect {
    /// PostgreSQL dialect (uses $1, $2 placeholders)
    #[default]
    Postgres,
    /// SQLite dialect (uses ?1, ?2 placeholders)
    Sqlite,
    /// MySQL dialect (uses ? placeholders)
    Mysql,
}

impl Dialect {
    /// Generate a placeholder for the given parameter index (1-based).
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Sqlite => format!("?{index}"),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Quote an identifier for this dialect, doubling embedded quotes.
    pub fn quote_identifier(self, name: &str) -> String {
        match self {
            Dialect::Postgres | Dialect::Sqlite => {
                let escaped = name.replace('"', "\"\"");
                format!("\"{}\"", escaped)
            }
            Dialect::Mysql => {
                let escaped = name.replace('`', "``");
                format!("`{}`", escaped)
            }
        }
    }

    /// Whether a CTE may prefix a non-query statement (WITH ... DELETE).
    pub const fn supports_non_query_cte(self) -> bool {
        match self {
            Dialect::Postgres | Dialect::Sqlite => true,
            // MySQL only attaches WITH to SELECT reliably across the
            // versions we target.
            Dialect::Mysql => false,
        }
    }

    /// Whether a VALUES table-value constructor can appear in FROM.
    pub const fn supports_values_list(self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Sqlite | Dialect::Mysql)
    }

    /// Whether a row-value tuple may appear on the left of IN (subquery).
    pub const fn supports_row_value_in_list(self) -> bool {
        matches!(self, Dialect::Postgres | Dialect::Sqlite | Dialect::Mysql)
    }

    /// Stable name for diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_per_dialect() {
        assert_eq!(Dialect::Postgres.placeholder(3), "$3");
        assert_eq!(Dialect::Sqlite.placeholder(3), "?3");
        assert_eq!(Dialect::Mysql.placeholder(3), "?");
    }

    #[test]
    fn identifier_quoting_escapes_embedded_quotes() {
        assert_eq!(Dialect::Postgres.quote_identifier("a\"b"), "\"a\"\"b\"");
        assert_eq!(Dialect::Mysql.quote_identifier("a`b"), "`a``b`");
    }

    #[test]
    fn cte_capability_flags() {
        assert!(Dialect::Postgres.supports_non_query_cte());
        assert!(Dialect::Sqlite.supports_non_query_cte());
        assert!(!Dialect::Mysql.supports_non_query_cte());
        assert!(Dialect::Postgres.supports_values_list());
        assert!(Dialect::Postgres.supports_row_value_in_list());
    }
}
