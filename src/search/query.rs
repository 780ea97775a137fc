//! Composable entity queries.
//!
//! An [`EntityQuery`] selects the primary keys of one search domain. Leaves
//! are built by category handlers from a fixed per-domain projection plus
//! joins and a predicate; inner nodes combine two queries of the same domain
//! with `INTERSECT`, `UNION` or `EXCEPT`. Rendering pushes the whole tree down
//! into a single SQLite compound select whose only column is `id`, so every
//! leaf is row-compatible with every other leaf of its domain.

use rusqlite::Connection;
use rusqlite::types::Value;

use crate::model::types::{Operator, SearchDomain};

/// Base table of a search domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityTable {
    pub table: &'static str,
    pub alias: &'static str,
    pub key: &'static str,
}

impl EntityTable {
    pub fn of(domain: SearchDomain) -> Self {
        match domain {
            SearchDomain::Cluster => Self {
                table: "regions",
                alias: "r",
                key: "region_id",
            },
            SearchDomain::Gene => Self {
                table: "genes",
                alias: "g",
                key: "gene_id",
            },
            SearchDomain::Domain => Self {
                table: "as_domains",
                alias: "d",
                key: "as_domain_id",
            },
        }
    }

    /// Qualified primary key column, e.g. `g.gene_id`.
    pub fn key_column(&self) -> String {
        format!("{}.{}", self.alias, self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Intersect,
    Union,
    Except,
}

impl SetOperator {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Intersect => "INTERSECT",
            Self::Union => "UNION",
            Self::Except => "EXCEPT",
        }
    }
}

impl From<Operator> for SetOperator {
    fn from(op: Operator) -> Self {
        match op {
            Operator::And => Self::Intersect,
            Operator::Or => Self::Union,
            Operator::Except => Self::Except,
        }
    }
}

/// A `WHERE` fragment with its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    params: Vec<Value>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Case-insensitive match; wildcards are whatever the value carries.
    pub fn like(column: &str, value: &str) -> Self {
        Self::new(format!("{column} LIKE ?"), vec![text(value)])
    }

    /// Case-insensitive substring match.
    pub fn contains(column: &str, value: &str) -> Self {
        Self::new(format!("{column} LIKE '%' || ? || '%'"), vec![text(value)])
    }

    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::new(format!("{column} = ?"), vec![value.into()])
    }

    pub fn and(self, other: Predicate) -> Self {
        self.join("AND", other)
    }

    pub fn or(self, other: Predicate) -> Self {
        self.join("OR", other)
    }

    fn join(mut self, keyword: &str, other: Predicate) -> Self {
        self.sql = format!("({} {keyword} {})", self.sql, other.sql);
        self.params.extend(other.params);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// Matches nothing.
    Empty,
    Select {
        joins: Vec<&'static str>,
        predicate: Predicate,
    },
    Compound {
        op: SetOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Primary-key query over one search domain.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    domain: SearchDomain,
    node: Node,
}

impl EntityQuery {
    /// The query that matches no rows of `domain`.
    pub fn empty(domain: SearchDomain) -> Self {
        Self {
            domain,
            node: Node::Empty,
        }
    }

    /// Leaf query: the domain's base table, `joins` applied in order, rows
    /// kept where `predicate` holds.
    pub fn select(domain: SearchDomain, joins: &[&'static str], predicate: Predicate) -> Self {
        Self {
            domain,
            node: Node::Select {
                joins: joins.to_vec(),
                predicate,
            },
        }
    }

    pub fn domain(&self) -> SearchDomain {
        self.domain
    }

    /// True when the query is known to match nothing without running it.
    pub fn is_trivially_empty(&self) -> bool {
        matches!(self.node, Node::Empty)
    }

    /// Combine two queries of the same domain.
    ///
    /// Empty operands are folded away: they never reach SQL.
    pub fn combine(self, op: SetOperator, other: EntityQuery) -> Self {
        debug_assert_eq!(self.domain, other.domain, "combining queries across domains");
        let domain = self.domain;
        let node = match (op, self.node, other.node) {
            (SetOperator::Intersect, Node::Empty, _) | (SetOperator::Intersect, _, Node::Empty) => {
                Node::Empty
            }
            (SetOperator::Union, Node::Empty, node) | (SetOperator::Union, node, Node::Empty) => {
                node
            }
            (SetOperator::Except, Node::Empty, _) => Node::Empty,
            (SetOperator::Except, node, Node::Empty) => node,
            (op, left, right) => Node::Compound {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        };
        Self { domain, node }
    }

    /// Render to a select statement whose single column `id` holds the
    /// distinct matching primary keys (unordered).
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();
        write_node(&self.node, EntityTable::of(self.domain), &mut sql, &mut params);
        (sql, params)
    }

    pub fn count(&self, conn: &Connection) -> rusqlite::Result<usize> {
        if self.is_trivially_empty() {
            return Ok(0);
        }
        let (sql, params) = self.to_sql();
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM ({sql})"),
            rusqlite::params_from_iter(params.iter()),
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// All matching primary keys in ascending order.
    pub fn keys(&self, conn: &Connection) -> rusqlite::Result<Vec<i64>> {
        if self.is_trivially_empty() {
            return Ok(Vec::new());
        }
        let (sql, params) = self.to_sql();
        let mut stmt = conn.prepare(&format!("SELECT id FROM ({sql}) ORDER BY id"))?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            row.get::<_, i64>(0)
        })?;
        rows.collect()
    }
}

fn write_node(node: &Node, table: EntityTable, sql: &mut String, params: &mut Vec<Value>) {
    match node {
        Node::Empty => {
            sql.push_str(&format!(
                "SELECT {} AS id FROM {} {} WHERE 0",
                table.key_column(),
                table.table,
                table.alias
            ));
        }
        Node::Select { joins, predicate } => {
            sql.push_str(&format!(
                "SELECT DISTINCT {} AS id FROM {} {}",
                table.key_column(),
                table.table,
                table.alias
            ));
            for join in joins {
                sql.push(' ');
                sql.push_str(join);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&predicate.sql);
            params.extend(predicate.params.iter().cloned());
        }
        Node::Compound { op, left, right } => {
            sql.push_str("SELECT id FROM (");
            write_node(left, table, sql, params);
            sql.push_str(&format!(") {} SELECT id FROM (", op.keyword()));
            write_node(right, table, sql, params);
            sql.push(')');
        }
    }
}
