//! Parameterised SELECT builder for the PostgreSQL store.
//!
//! Table and column names are `&'static str` supplied by the store itself;
//! only values are caller-controlled and they always travel as bind
//! parameters.

use chrono::NaiveDate;
use sqlx::{postgres::PgArguments, postgres::PgRow, FromRow, PgPool, Row};

use super::DatabaseError;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq { column: &'static str, value: SqlValue },
    /// Case-insensitive substring match.
    Contains { column: &'static str, value: String },
    /// `column IN (SELECT select FROM table WHERE inner)`
    InSelect {
        column: &'static str,
        table: &'static str,
        select: &'static str,
        inner: Box<Condition>,
    },
}

impl Condition {
    pub fn eq(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Condition::Eq {
            column,
            value: value.into(),
        }
    }

    pub fn contains(column: &'static str, value: &str) -> Self {
        Condition::Contains {
            column,
            value: value.to_string(),
        }
    }

    pub fn in_select(column: &'static str, table: &'static str, select: &'static str, inner: Condition) -> Self {
        Condition::InSelect {
            column,
            table,
            select,
            inner: Box::new(inner),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(value: &str) -> String {
    let escaped = value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

struct WhereBuilder {
    params: Vec<SqlValue>,
}

impl WhereBuilder {
    fn param(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn render(&mut self, condition: &Condition) -> String {
        match condition {
            Condition::Eq { column, value } => {
                format!("\"{}\" = {}", column, self.param(value.clone()))
            }
            Condition::Contains { column, value } => {
                format!("\"{}\" ILIKE {}", column, self.param(SqlValue::Text(like_pattern(value))))
            }
            Condition::InSelect {
                column,
                table,
                select,
                inner,
            } => {
                let inner_sql = self.render(inner);
                format!(
                    "\"{}\" IN (SELECT \"{}\" FROM \"{}\" WHERE {})",
                    column, select, table, inner_sql
                )
            }
        }
    }
}

pub struct Select {
    table: &'static str,
    conditions: Vec<Condition>,
    order: Vec<(&'static str, SortDirection)>,
}

impl Select {
    pub fn from(table: &'static str) -> Self {
        Self {
            table,
            conditions: vec![],
            order: vec![],
        }
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn filter_opt(self, condition: Option<Condition>) -> Self {
        match condition {
            Some(c) => self.filter(c),
            None => self,
        }
    }

    pub fn order_by(mut self, column: &'static str, direction: SortDirection) -> Self {
        self.order.push((column, direction));
        self
    }

    fn where_clause(&self) -> (String, Vec<SqlValue>) {
        let mut builder = WhereBuilder { params: vec![] };
        let parts: Vec<String> = self.conditions.iter().map(|c| builder.render(c)).collect();
        let clause = if parts.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", parts.join(" AND "))
        };
        (clause, builder.params)
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = self.where_clause();
        let order_clause = if self.order.is_empty() {
            String::new()
        } else {
            let parts: Vec<String> = self
                .order
                .iter()
                .map(|(column, dir)| format!("\"{}\" {}", column, dir.to_sql()))
                .collect();
            format!("ORDER BY {}", parts.join(", "))
        };

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table),
            where_clause,
            order_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_exists_sql(&self) -> SqlResult {
        let (where_clause, params) = self.where_clause();
        let inner = [format!("SELECT 1 FROM \"{}\"", self.table), where_clause]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        SqlResult {
            query: format!("SELECT EXISTS ({}) AS \"exists\"", inner),
            params,
        }
    }

    pub async fn fetch_all<T>(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_query_as(q, p);
        }
        Ok(q.fetch_all(pool).await?)
    }

    pub async fn fetch_optional<T>(&self, pool: &PgPool) -> Result<Option<T>, DatabaseError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        let sql = self.to_sql();
        let mut q = sqlx::query_as::<_, T>(&sql.query);
        for p in sql.params.iter() {
            q = bind_query_as(q, p);
        }
        Ok(q.fetch_optional(pool).await?)
    }

    pub async fn exists(&self, pool: &PgPool) -> Result<bool, DatabaseError> {
        let sql = self.to_exists_sql();
        let mut q = sqlx::query(&sql.query);
        for p in sql.params.iter() {
            q = bind_query(q, p);
        }
        let row = q.fetch_one(pool).await?;
        Ok(row.try_get("exists")?)
    }
}

pub fn bind_query<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q SqlValue,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Float(f) => q.bind(*f),
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::Text(s) => q.bind(s),
        SqlValue::Date(d) => q.bind(*d),
    }
}

pub fn bind_query_as<'q, O>(
    q: sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>,
    v: &'q SqlValue,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        SqlValue::Int(i) => q.bind(*i),
        SqlValue::Float(f) => q.bind(*f),
        SqlValue::Bool(b) => q.bind(*b),
        SqlValue::Text(s) => q.bind(s),
        SqlValue::Date(d) => q.bind(*d),
    }
}
