//! SELECT query builder with a named global-scope registry.
//!
//! # Responsibility
//! - Compose base table, joins, filters, ordering and pagination.
//! - Hold named global scopes that apply to every render until removed.
//!
//! # Invariants
//! - Scope names are unique within one query; re-adding a name replaces it.
//! - Deferred clauses see the final join set, because they are evaluated at
//!   render time rather than when they were attached.

use super::predicate::{ColumnRef, Predicate};
use crate::timestamp::Timestamp;
use log::debug;
use rusqlite::types::Value;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// Closure producing a predicate from the query it is attached to.
pub type DeferredPredicate = Rc<dyn Fn(&SelectQuery) -> Predicate>;

/// A filter attached to a query, either fixed or built at render time.
#[derive(Clone)]
pub enum Clause {
    Fixed(Predicate),
    Deferred(DeferredPredicate),
}

impl Clause {
    fn resolve(&self, query: &SelectQuery) -> Predicate {
        match self {
            Self::Fixed(predicate) => predicate.clone(),
            Self::Deferred(build) => build(query),
        }
    }
}

impl Debug for Clause {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fixed(predicate) => f.debug_tuple("Fixed").field(predicate).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<Predicate> for Clause {
    fn from(value: Predicate) -> Self {
        Self::Fixed(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
struct NamedScope {
    name: String,
    clause: Clause,
}

/// SQL text plus positional bind values, ready for `params_from_iter`.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    pub sql: String,
    pub binds: Vec<Value>,
}

/// Buildable SELECT statement over one base table.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    joins: Vec<Join>,
    global_scopes: Vec<NamedScope>,
    clauses: Vec<Clause>,
    order_by: Vec<(ColumnRef, SortDirection)>,
    limit: Option<u32>,
    offset: u32,
}

impl SelectQuery {
    /// Starts a `SELECT table.* FROM table` query.
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            joins: Vec::new(),
            global_scopes: Vec::new(),
            clauses: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn join(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        left: ColumnRef,
        right: ColumnRef,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            left,
            right,
        });
        self
    }

    pub fn inner_join(self, table: impl Into<String>, left: ColumnRef, right: ColumnRef) -> Self {
        self.join(JoinKind::Inner, table, left, right)
    }

    pub fn left_join(self, table: impl Into<String>, left: ColumnRef, right: ColumnRef) -> Self {
        self.join(JoinKind::Left, table, left, right)
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Registers a named scope applied on every render.
    ///
    /// An existing scope with the same name is replaced in place.
    pub fn add_global_scope(mut self, name: impl Into<String>, clause: impl Into<Clause>) -> Self {
        let name = name.into();
        let clause = clause.into();
        match self.global_scopes.iter_mut().find(|scope| scope.name == name) {
            Some(existing) => existing.clause = clause,
            None => self.global_scopes.push(NamedScope { name, clause }),
        }
        self
    }

    /// Removes a named scope; unknown names are a no-op.
    pub fn without_global_scope(mut self, name: &str) -> Self {
        self.global_scopes.retain(|scope| scope.name != name);
        self
    }

    pub fn has_global_scope(&self, name: &str) -> bool {
        self.global_scopes.iter().any(|scope| scope.name == name)
    }

    pub fn global_scope_names(&self) -> Vec<&str> {
        self.global_scopes
            .iter()
            .map(|scope| scope.name.as_str())
            .collect()
    }

    /// Adds a filter ANDed with every other clause.
    pub fn filter(mut self, clause: impl Into<Clause>) -> Self {
        self.clauses.push(clause.into());
        self
    }

    /// Adds a filter built from the query as it looks at render time.
    pub fn filter_deferred<F>(mut self, build: F) -> Self
    where
        F: Fn(&SelectQuery) -> Predicate + 'static,
    {
        self.clauses.push(Clause::Deferred(Rc::new(build)));
        self
    }

    pub fn order_by(mut self, column: ColumnRef, direction: SortDirection) -> Self {
        self.order_by.push((column, direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Resolves every scope and clause into one predicate.
    pub fn predicate(&self) -> Predicate {
        self.global_scopes
            .iter()
            .map(|scope| &scope.clause)
            .chain(self.clauses.iter())
            .fold(Predicate::All(Vec::new()), |acc, clause| {
                acc.and(clause.resolve(self))
            })
    }

    /// Renders SQL with `now` bound for every `Operand::Now`.
    pub fn render(&self, now: Timestamp) -> RenderedQuery {
        let mut sql = format!("SELECT {table}.* FROM {table}", table = self.table);
        let mut binds = Vec::new();

        for join in &self.joins {
            let keyword = match join.kind {
                JoinKind::Inner => "INNER JOIN",
                JoinKind::Left => "LEFT JOIN",
            };
            sql.push_str(&format!(
                " {keyword} {} ON {} = {}",
                join.table,
                join.left.to_sql(),
                join.right.to_sql()
            ));
        }

        let predicate = self.predicate();
        if !matches!(&predicate, Predicate::All(items) if items.is_empty()) {
            sql.push_str(" WHERE ");
            predicate.render(now, &mut sql, &mut binds);
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(column, direction)| {
                    let direction = match direction {
                        SortDirection::Asc => "ASC",
                        SortDirection::Desc => "DESC",
                    };
                    format!("{} {direction}", column.to_sql())
                })
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                binds.push(Value::Integer(i64::from(self.offset)));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            binds.push(Value::Integer(i64::from(self.offset)));
        }

        debug!(
            "event=query_render module=query table={} joins={} scopes={} binds={}",
            self.table,
            self.joins.len(),
            self.global_scopes.len(),
            binds.len()
        );

        RenderedQuery { sql, binds }
    }
}

#[cfg(test)]
mod tests {
    use super::{SelectQuery, SortDirection};
    use crate::query::predicate::{ColumnRef, Predicate};
    use chrono::Utc;
    use rusqlite::types::Value;

    #[test]
    fn renders_plain_select_without_where() {
        let rendered = SelectQuery::new("articles").render(Utc::now());
        assert_eq!(rendered.sql, "SELECT articles.* FROM articles");
        assert!(rendered.binds.is_empty());
    }

    #[test]
    fn global_scopes_are_named_replaceable_and_removable() {
        let query = SelectQuery::new("articles")
            .add_global_scope("visible", Predicate::is_not_null(ColumnRef::bare("a")))
            .add_global_scope("visible", Predicate::is_not_null(ColumnRef::bare("b")));
        assert_eq!(query.global_scope_names(), vec!["visible"]);
        assert_eq!(
            query.render(Utc::now()).sql,
            "SELECT articles.* FROM articles WHERE (b IS NOT NULL)"
        );

        let query = query.without_global_scope("visible").without_global_scope("missing");
        assert!(!query.has_global_scope("visible"));
        assert_eq!(query.render(Utc::now()).sql, "SELECT articles.* FROM articles");
    }

    #[test]
    fn deferred_clause_sees_joins_added_later() {
        let query = SelectQuery::new("articles")
            .filter_deferred(|query| {
                let column = if query.has_joins() {
                    ColumnRef::qualified(query.table(), "title")
                } else {
                    ColumnRef::bare("title")
                };
                Predicate::is_not_null(column)
            })
            .inner_join(
                "authors",
                ColumnRef::qualified("authors", "uuid"),
                ColumnRef::qualified("articles", "author_uuid"),
            );

        let rendered = query.render(Utc::now());
        assert!(rendered.sql.contains("INNER JOIN authors ON authors.uuid = articles.author_uuid"));
        assert!(rendered.sql.contains("articles.title IS NOT NULL"));
    }

    #[test]
    fn left_join_renders_before_where() {
        let rendered = SelectQuery::new("articles")
            .left_join(
                "authors",
                ColumnRef::qualified("authors", "uuid"),
                ColumnRef::qualified("articles", "author_uuid"),
            )
            .filter(Predicate::is_null(ColumnRef::qualified("authors", "uuid")))
            .render(Utc::now());

        assert_eq!(
            rendered.sql,
            "SELECT articles.* FROM articles \
             LEFT JOIN authors ON authors.uuid = articles.author_uuid \
             WHERE (authors.uuid IS NULL)"
        );
        assert!(rendered.binds.is_empty());
    }

    #[test]
    fn pagination_binds_follow_filter_binds() {
        let rendered = SelectQuery::new("articles")
            .filter(Predicate::eq(ColumnRef::bare("title"), "x"))
            .order_by(ColumnRef::bare("title"), SortDirection::Asc)
            .limit(5)
            .offset(10)
            .render(Utc::now());

        assert!(rendered.sql.ends_with("ORDER BY title ASC LIMIT ? OFFSET ?"));
        assert_eq!(
            rendered.binds,
            vec![
                Value::Text("x".to_string()),
                Value::Integer(5),
                Value::Integer(10)
            ]
        );
    }
}
