//! Database-specific pieces of the handful of statements the SQL sinks issue.

pub trait Dialect: Send + Sync {
    /// Wraps an identifier in double quotes, doubling embedded quotes.
    fn quote_identifier(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    /// Placeholder for the zero-based parameter `index`.
    ///
    /// - PostgreSQL uses `$1`, `$2`, etc.
    /// - SQLite uses `?1`, `?2`, etc.
    fn get_placeholder(&self, index: usize) -> String;

    /// Renders `expr` so that it reads back as text.
    fn cast_to_text(&self, expr: &str) -> String {
        expr.to_string()
    }

    fn text_type(&self) -> &'static str {
        "TEXT"
    }

    fn integer_type(&self) -> &'static str;

    fn real_type(&self) -> &'static str;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl Dialect for Postgres {
    fn get_placeholder(&self, index: usize) -> String {
        format!("${}", index + 1)
    }

    fn cast_to_text(&self, expr: &str) -> String {
        format!("{expr}::text")
    }

    fn integer_type(&self) -> &'static str {
        "BIGINT"
    }

    fn real_type(&self) -> &'static str {
        "DOUBLE PRECISION"
    }

    fn name(&self) -> &'static str {
        "PostgreSQL"
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn get_placeholder(&self, index: usize) -> String {
        format!("?{}", index + 1)
    }

    fn cast_to_text(&self, expr: &str) -> String {
        format!("CAST({expr} AS TEXT)")
    }

    fn integer_type(&self) -> &'static str {
        "INTEGER"
    }

    fn real_type(&self) -> &'static str {
        "REAL"
    }

    fn name(&self) -> &'static str {
        "SQLite"
    }
}
