use crate::{
    error::SinkError,
    sink::{Row, TableHandle, TabularSink, max_date},
    sql::{
        base::{dialect, generator::QueryGenerator},
        postgres::{params::PgParamStore, utils::connect_client},
    },
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::Client;
use tracing::info;

const QUERY_TABLE_COLUMNS_SQL: &str = "SELECT column_name::text FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 \
     ORDER BY ordinal_position";

/// Relational sink backed by PostgreSQL: one table per target.
#[derive(Clone)]
pub struct PgSink {
    client: Arc<RwLock<Client>>,
    dialect: dialect::Postgres,
}

impl PgSink {
    pub async fn connect(url: &str) -> Result<Self, SinkError> {
        let client = connect_client(url).await?;
        Ok(PgSink {
            client: Arc::new(RwLock::new(client)),
            dialect: dialect::Postgres,
        })
    }
}

#[async_trait]
impl TabularSink for PgSink {
    async fn ensure(&self, name: &str, header: &[String]) -> Result<TableHandle, SinkError> {
        let client = self.client.read().await;
        let columns = client
            .query(QUERY_TABLE_COLUMNS_SQL, &[&name])
            .await
            .map_err(|e| SinkError::Unavailable(format!("cannot inspect table '{name}': {e}")))?
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()?;

        if !columns.is_empty() {
            return Ok(TableHandle::new(name, columns));
        }

        let sql = QueryGenerator::new(&self.dialect).create_table(name, header);
        client
            .batch_execute(&sql)
            .await
            .map_err(|e| SinkError::Unavailable(format!("cannot create table '{name}': {e}")))?;
        info!(table = name, "Created Postgres table");

        Ok(TableHandle::new(name, header.to_vec()))
    }

    async fn last_date(&self, handle: &TableHandle) -> Result<Option<NaiveDate>, SinkError> {
        let sql =
            QueryGenerator::new(&self.dialect).date_values(&handle.name, handle.date_column_name());
        let client = self.client.read().await;
        let values = client
            .query(&sql, &[])
            .await?
            .iter()
            .map(|row| row.try_get::<_, String>(0))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(max_date(&handle.name, values))
    }

    async fn append_rows(&self, handle: &TableHandle, rows: &[Row]) -> Result<usize, SinkError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let sql = QueryGenerator::new(&self.dialect).insert_row(&handle.name, rows[0].len());
        let mut client = self.client.write().await;
        let tx = client.transaction().await?;
        let statement = tx.prepare(&sql).await?;
        for row in rows {
            let bindings = PgParamStore::from_values(row);
            tx.execute(&statement, &bindings.as_refs()).await?;
        }
        tx.commit().await?;

        Ok(rows.len())
    }

    fn kind(&self) -> &'static str {
        "postgres"
    }
}
