//! SQL expressions for restriction building.
//!
//! A trimmed expression DSL used by bulk statements and select restrictions.
//! Expressions render to SQL text while pushing bound parameters into a
//! shared parameter list, with placeholder numbering owned by the caller.

use relmap_core::{Dialect, Value};

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    const fn as_sql(self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

/// A SQL expression usable in WHERE clauses.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Column reference with optional qualifier
    Column {
        qualifier: Option<String>,
        name: String,
    },
    /// Literal value, bound as a parameter
    Literal(Value),
    /// Binary operation
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Conjunction
    And(Box<Expr>, Box<Expr>),
    /// Disjunction
    Or(Box<Expr>, Box<Expr>),
    /// Negation
    Not(Box<Expr>),
    /// IN over a literal value list
    InList {
        expr: Box<Expr>,
        values: Vec<Value>,
        negated: bool,
    },
    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },
    /// Raw SQL fragment (escape hatch)
    Raw(String),
}

impl Expr {
    /// Unqualified column reference.
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column {
            qualifier: None,
            name: name.into(),
        }
    }

    /// Qualified column reference.
    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    /// Literal value.
    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    /// Raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// `self = other`
    pub fn eq(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, other)
    }

    /// `self <> other`
    pub fn ne(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, other)
    }

    /// `self < other`
    pub fn lt(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, other)
    }

    /// `self <= other`
    pub fn le(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, other)
    }

    /// `self > other`
    pub fn gt(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, other)
    }

    /// `self >= other`
    pub fn ge(self, other: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, other)
    }

    fn binary(self, op: BinaryOp, other: impl Into<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(other.into()),
        }
    }

    /// `self AND other`
    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    /// `self OR other`
    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    /// `NOT self`
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// `self IN (v1, v2, ...)`
    pub fn in_list(self, values: impl IntoIterator<Item = Value>) -> Self {
        Expr::InList {
            expr: Box::new(self),
            values: values.into_iter().collect(),
            negated: false,
        }
    }

    /// `self IS NULL`
    pub fn is_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// `self IS NOT NULL`
    pub fn is_not_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Render to SQL, appending bound values to `params`.
    ///
    /// `offset` is the number of parameters already bound by the enclosing
    /// statement; placeholder numbering continues from there.
    pub fn build(&self, dialect: Dialect, params: &mut Vec<Value>, offset: usize) -> String {
        match self {
            Expr::Column { qualifier, name } => match qualifier {
                Some(q) => format!("{}.{}", q, dialect.quote_identifier(name)),
                None => dialect.quote_identifier(name),
            },
            Expr::Literal(value) => {
                params.push(value.clone());
                dialect.placeholder(offset + params.len())
            }
            Expr::Binary { left, op, right } => {
                let left_sql = left.build(dialect, params, offset);
                let right_sql = right.build(dialect, params, offset);
                format!("{} {} {}", left_sql, op.as_sql(), right_sql)
            }
            Expr::And(left, right) => {
                let left_sql = left.build(dialect, params, offset);
                let right_sql = right.build(dialect, params, offset);
                format!("{left_sql} AND {right_sql}")
            }
            Expr::Or(left, right) => {
                let left_sql = left.build(dialect, params, offset);
                let right_sql = right.build(dialect, params, offset);
                format!("({left_sql} OR {right_sql})")
            }
            Expr::Not(inner) => {
                let inner_sql = inner.build(dialect, params, offset);
                format!("NOT ({inner_sql})")
            }
            Expr::InList {
                expr,
                values,
                negated,
            } => {
                let target = expr.build(dialect, params, offset);
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| {
                        params.push(v.clone());
                        dialect.placeholder(offset + params.len())
                    })
                    .collect();
                let op = if *negated { "NOT IN" } else { "IN" };
                format!("{} {} ({})", target, op, placeholders.join(", "))
            }
            Expr::IsNull { expr, negated } => {
                let target = expr.build(dialect, params, offset);
                if *negated {
                    format!("{target} IS NOT NULL")
                } else {
                    format!("{target} IS NULL")
                }
            }
            Expr::Raw(sql) => sql.clone(),
        }
    }
}

impl<T: Into<Value>> From<T> for Expr {
    fn from(value: T) -> Self {
        Expr::Literal(value.into())
    }
}

/// A WHERE-clause restriction: a single expression plus the conjunction /
/// disjunction helpers statements compose it with.
#[derive(Debug, Clone)]
pub struct Restriction {
    expr: Expr,
}

impl Restriction {
    /// Create a restriction from an expression.
    pub fn new(expr: Expr) -> Self {
        Self { expr }
    }

    /// Add an AND condition.
    pub fn and(self, expr: Expr) -> Self {
        Self {
            expr: self.expr.and(expr),
        }
    }

    /// Add an OR condition.
    pub fn or(self, expr: Expr) -> Self {
        Self {
            expr: self.expr.or(expr),
        }
    }

    /// Render the restriction, continuing placeholder numbering at `offset`.
    pub fn build(&self, dialect: Dialect, offset: usize) -> (String, Vec<Value>) {
        let mut params = Vec::new();
        let sql = self.expr.build(dialect, &mut params, offset);
        (sql, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_comparison_binds_literal() {
        let expr = Expr::col("age").gt(18);
        let mut params = Vec::new();
        let sql = expr.build(Dialect::Postgres, &mut params, 0);
        assert_eq!(sql, "\"age\" > $1");
        assert_eq!(params, vec![Value::Int(18)]);
    }

    #[test]
    fn qualified_column_keeps_qualifier_unquoted() {
        let expr = Expr::qualified("p", "name").eq("x");
        let mut params = Vec::new();
        let sql = expr.build(Dialect::Postgres, &mut params, 0);
        assert_eq!(sql, "p.\"name\" = $1");
    }

    #[test]
    fn and_or_compose_with_parens_on_or() {
        let expr = Expr::col("a").eq(1).and(Expr::col("b").eq(2).or(Expr::col("c").eq(3)));
        let mut params = Vec::new();
        let sql = expr.build(Dialect::Postgres, &mut params, 0);
        assert_eq!(sql, "\"a\" = $1 AND (\"b\" = $2 OR \"c\" = $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn in_list_numbers_placeholders_sequentially() {
        let expr = Expr::col("id").in_list([Value::Int(1), Value::Int(2), Value::Int(3)]);
        let mut params = Vec::new();
        let sql = expr.build(Dialect::Postgres, &mut params, 0);
        assert_eq!(sql, "\"id\" IN ($1, $2, $3)");
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn offset_shifts_placeholder_numbering() {
        let restriction = Restriction::new(Expr::col("name").eq("a"));
        let (sql, params) = restriction.build(Dialect::Postgres, 4);
        assert_eq!(sql, "\"name\" = $5");
        assert_eq!(params, vec![Value::Text("a".to_string())]);
    }

    #[test]
    fn is_null_renders_without_params() {
        let expr = Expr::col("deleted_at").is_null();
        let mut params = Vec::new();
        let sql = expr.build(Dialect::Postgres, &mut params, 0);
        assert_eq!(sql, "\"deleted_at\" IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn mysql_placeholders_are_positionless() {
        let expr = Expr::col("a").eq(1).and(Expr::col("b").eq(2));
        let mut params = Vec::new();
        let sql = expr.build(Dialect::Mysql, &mut params, 0);
        assert_eq!(sql, "`a` = ? AND `b` = ?");
    }
}
