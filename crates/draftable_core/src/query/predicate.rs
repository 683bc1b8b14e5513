//! Composable boolean predicates rendered to SQLite SQL.
//!
//! # Invariants
//! - Values are always bound as parameters, never spliced into SQL text.
//! - `Operand::Now` is resolved at render time, so a predicate built once can
//!   be evaluated repeatedly against a moving clock.

use crate::timestamp::{to_epoch_ms, Timestamp};
use rusqlite::types::Value;

/// Column reference, optionally prefixed with its table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    table: Option<String>,
    column: String,
}

impl ColumnRef {
    pub fn bare(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        match &self.table {
            Some(table) => format!("{table}.{}", self.column),
            None => self.column.clone(),
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(Value),
    /// Current clock reading, bound as epoch milliseconds.
    Now,
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::Value(Value::Integer(value))
    }
}

impl From<&str> for Operand {
    fn from(value: &str) -> Self {
        Self::Value(Value::Text(value.to_string()))
    }
}

impl From<String> for Operand {
    fn from(value: String) -> Self {
        Self::Value(Value::Text(value))
    }
}

impl From<Timestamp> for Operand {
    fn from(value: Timestamp) -> Self {
        Self::Value(Value::Integer(to_epoch_ms(value)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl CompareOp {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
        }
    }
}

/// Boolean condition over columns of a query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IsNull(ColumnRef),
    IsNotNull(ColumnRef),
    Compare {
        column: ColumnRef,
        op: CompareOp,
        operand: Operand,
    },
    /// Conjunction; empty renders as always-true.
    All(Vec<Predicate>),
    /// Disjunction; empty renders as always-false.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn is_null(column: ColumnRef) -> Self {
        Self::IsNull(column)
    }

    pub fn is_not_null(column: ColumnRef) -> Self {
        Self::IsNotNull(column)
    }

    pub fn compare(column: ColumnRef, op: CompareOp, operand: impl Into<Operand>) -> Self {
        Self::Compare {
            column,
            op,
            operand: operand.into(),
        }
    }

    pub fn eq(column: ColumnRef, operand: impl Into<Operand>) -> Self {
        Self::compare(column, CompareOp::Eq, operand)
    }

    /// Combines with `other` using AND, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::All(mut left), Self::All(right)) => {
                left.extend(right);
                Self::All(left)
            }
            (Self::All(mut left), right) => {
                left.push(right);
                Self::All(left)
            }
            (left, right) => Self::All(vec![left, right]),
        }
    }

    /// Combines with `other` using OR, flattening nested disjunctions.
    pub fn or(self, other: Predicate) -> Self {
        match (self, other) {
            (Self::Any(mut left), Self::Any(right)) => {
                left.extend(right);
                Self::Any(left)
            }
            (Self::Any(mut left), right) => {
                left.push(right);
                Self::Any(left)
            }
            (left, right) => Self::Any(vec![left, right]),
        }
    }

    /// Appends SQL for this predicate to `sql` and its bind values to `binds`.
    pub(crate) fn render(&self, now: Timestamp, sql: &mut String, binds: &mut Vec<Value>) {
        match self {
            Self::IsNull(column) => {
                sql.push_str(&column.to_sql());
                sql.push_str(" IS NULL");
            }
            Self::IsNotNull(column) => {
                sql.push_str(&column.to_sql());
                sql.push_str(" IS NOT NULL");
            }
            Self::Compare {
                column,
                op,
                operand,
            } => {
                sql.push_str(&column.to_sql());
                sql.push(' ');
                sql.push_str(op.as_sql());
                sql.push_str(" ?");
                binds.push(match operand {
                    Operand::Value(value) => value.clone(),
                    Operand::Now => Value::Integer(to_epoch_ms(now)),
                });
            }
            Self::All(items) => render_group(items, " AND ", "1 = 1", now, sql, binds),
            Self::Any(items) => render_group(items, " OR ", "1 = 0", now, sql, binds),
        }
    }

    /// Renders this predicate on its own; mainly useful for diagnostics.
    pub fn to_sql(&self, now: Timestamp) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut binds = Vec::new();
        self.render(now, &mut sql, &mut binds);
        (sql, binds)
    }
}

fn render_group(
    items: &[Predicate],
    separator: &str,
    empty: &str,
    now: Timestamp,
    sql: &mut String,
    binds: &mut Vec<Value>,
) {
    if items.is_empty() {
        sql.push_str(empty);
        return;
    }

    sql.push('(');
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            sql.push_str(separator);
        }
        item.render(now, sql, binds);
    }
    sql.push(')');
}

#[cfg(test)]
mod tests {
    use super::{ColumnRef, CompareOp, Operand, Predicate};
    use chrono::{TimeZone, Utc};
    use rusqlite::types::Value;

    #[test]
    fn renders_disjunction_with_now_bound_at_render_time() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let column = ColumnRef::qualified("articles", "published_at");
        let predicate = Predicate::is_null(column.clone()).or(Predicate::compare(
            column,
            CompareOp::Gt,
            Operand::Now,
        ));

        let (sql, binds) = predicate.to_sql(now);
        assert_eq!(
            sql,
            "(articles.published_at IS NULL OR articles.published_at > ?)"
        );
        assert_eq!(binds, vec![Value::Integer(now.timestamp_millis())]);
    }

    #[test]
    fn and_flattens_conjunctions() {
        let a = Predicate::is_not_null(ColumnRef::bare("a"));
        let b = Predicate::is_not_null(ColumnRef::bare("b"));
        let c = Predicate::eq(ColumnRef::bare("c"), 3_i64);

        let combined = a.and(b).and(c);
        match &combined {
            Predicate::All(items) => assert_eq!(items.len(), 3),
            other => panic!("expected conjunction, got {other:?}"),
        }
    }

    #[test]
    fn empty_groups_render_as_constants() {
        let now = Utc::now();
        assert_eq!(Predicate::All(Vec::new()).to_sql(now).0, "1 = 1");
        assert_eq!(Predicate::Any(Vec::new()).to_sql(now).0, "1 = 0");
    }
}
