//! Statement builders for the shapes the ledger needs: a single-column
//! ordered SELECT, INSERT, DELETE, CREATE TABLE, and CREATE UNIQUE INDEX.
//! Filters are always equality against the next positional placeholder.

use super::Dialect;

fn push_where(sql: &mut String, filters: &[String], dialect: Dialect) {
    for (i, column) in filters.iter().enumerate() {
        sql.push_str(if i == 0 { " WHERE " } else { " AND " });
        sql.push_str(&dialect.quote_identifier(column));
        sql.push_str(" = ");
        sql.push_str(&dialect.placeholder(i + 1));
    }
}

/// SELECT of one column with equality filters and an optional ORDER BY.
#[derive(Debug, Clone)]
pub struct Select {
    table: String,
    column: String,
    filters: Vec<String>,
    order_by: Option<String>,
}

impl Select {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            filters: Vec::new(),
            order_by: None,
        }
    }

    /// Add an equality filter; the bind position follows declaration order.
    pub fn filter(mut self, column: impl Into<String>) -> Self {
        self.filters.push(column.into());
        self
    }

    pub fn order_by(mut self, column: impl Into<String>) -> Self {
        self.order_by = Some(column.into());
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            dialect.quote_identifier(&self.column),
            dialect.quote_identifier(&self.table),
        );
        push_where(&mut sql, &self.filters, dialect);
        if let Some(order) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(&dialect.quote_identifier(order));
        }
        sql
    }
}

/// INSERT with every value bound positionally.
#[derive(Debug, Clone)]
pub struct Insert {
    table: String,
    columns: Vec<String>,
}

impl Insert {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), columns: Vec::new() }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=self.columns.len())
            .map(|i| dialect.placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            dialect.quote_identifier(&self.table),
            columns,
            placeholders,
        )
    }
}

/// DELETE with equality filters.
#[derive(Debug, Clone)]
pub struct Delete {
    table: String,
    filters: Vec<String>,
}

impl Delete {
    pub fn new(table: impl Into<String>) -> Self {
        Self { table: table.into(), filters: Vec::new() }
    }

    pub fn filter(mut self, column: impl Into<String>) -> Self {
        self.filters.push(column.into());
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        let mut sql = format!("DELETE FROM {}", dialect.quote_identifier(&self.table));
        push_where(&mut sql, &self.filters, dialect);
        sql
    }
}

/// Column types the ledger table uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    VarChar(usize),
    Int,
}

impl ColumnType {
    fn render(self) -> String {
        match self {
            ColumnType::VarChar(len) => format!("VARCHAR({len})"),
            ColumnType::Int => "INT".to_string(),
        }
    }
}

/// CREATE TABLE with an autoincrement primary key and NOT NULL columns.
#[derive(Debug, Clone)]
pub struct CreateTable {
    table: String,
    primary_key: String,
    columns: Vec<(String, ColumnType)>,
}

impl CreateTable {
    pub fn new(table: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            primary_key: primary_key.into(),
            columns: Vec::new(),
        }
    }

    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.push((name.into(), ty));
        self
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        let mut defs = vec![format!(
            "{} {}",
            dialect.quote_identifier(&self.primary_key),
            dialect.autoincrement_pk(),
        )];
        for (name, ty) in &self.columns {
            defs.push(format!(
                "{} {} NOT NULL",
                dialect.quote_identifier(name),
                ty.render(),
            ));
        }
        format!(
            "CREATE TABLE {} ({})",
            dialect.quote_identifier(&self.table),
            defs.join(", "),
        )
    }
}

/// CREATE UNIQUE INDEX over the given columns.
#[derive(Debug, Clone)]
pub struct CreateIndex {
    name: String,
    table: String,
    columns: Vec<String>,
}

impl CreateIndex {
    pub fn unique(name: impl Into<String>, table: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE UNIQUE INDEX {} ON {} ({})",
            dialect.quote_identifier(&self.name),
            dialect.quote_identifier(&self.table),
            columns,
        )
    }
}
