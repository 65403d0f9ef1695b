use crate::sql::base::dialect::Dialect;
use model::records::metric::METRIC_COLUMNS;

/// Builds the statements shared by the SQL sinks.
pub struct QueryGenerator<'a> {
    dialect: &'a dyn Dialect,
}

impl<'a> QueryGenerator<'a> {
    pub fn new(dialect: &'a dyn Dialect) -> Self {
        Self { dialect }
    }

    /// `CREATE TABLE IF NOT EXISTS` with one column per header entry.
    ///
    /// The trailing metric columns get numeric types, everything before them
    /// (dimensions, date included) is stored as text.
    pub fn create_table(&self, table: &str, header: &[String]) -> String {
        let metric_start = header.len().saturating_sub(METRIC_COLUMNS.len());
        let columns = header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let ty = match i.checked_sub(metric_start) {
                    Some(0) | Some(1) => self.dialect.integer_type(),
                    Some(_) => self.dialect.real_type(),
                    None => self.dialect.text_type(),
                };
                format!("{} {}", self.dialect.quote_identifier(name), ty)
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({columns})",
            self.dialect.quote_identifier(table)
        )
    }

    /// Single-row positional insert with `width` parameters.
    pub fn insert_row(&self, table: &str, width: usize) -> String {
        let placeholders = (0..width)
            .map(|i| self.dialect.get_placeholder(i))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} VALUES ({placeholders})",
            self.dialect.quote_identifier(table)
        )
    }

    /// Distinct non-null values of the date column, read back as text.
    ///
    /// The maximum is taken by the caller so that stray cells can be skipped.
    pub fn date_values(&self, table: &str, column: &str) -> String {
        let column = self.dialect.quote_identifier(column);
        format!(
            "SELECT DISTINCT {} FROM {} WHERE {column} IS NOT NULL",
            self.dialect.cast_to_text(&column),
            self.dialect.quote_identifier(table)
        )
    }
}
