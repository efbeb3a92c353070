/// Target SQL dialect for the ledger's own statements.
///
/// This only covers what the ledger emits itself (quoting, placeholders,
/// the autoincrement primary-key clause). Compensating statements are
/// already dialect-specific text produced by the host's generator and pass
/// through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    Mysql,
    Sqlite,
}

impl Dialect {
    /// Positional bind placeholder, 1-based.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Mysql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Quote an identifier for this dialect.
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            Dialect::Mysql => format!("`{}`", name.replace('`', "``")),
            Dialect::Postgres | Dialect::Sqlite => {
                format!("\"{}\"", name.replace('"', "\"\""))
            }
        }
    }

    /// Column clause for an auto-incrementing integer primary key.
    pub(crate) fn autoincrement_pk(&self) -> &'static str {
        match self {
            Dialect::Postgres => "INTEGER GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY",
            Dialect::Mysql => "INT NOT NULL AUTO_INCREMENT PRIMARY KEY",
            Dialect::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }
}
