//! Table loading
//!
//! A [`TableSource`] knows how to fetch the recommendation table from one
//! backing store (CSV file or PostgreSQL). [`load`] wraps any source with the
//! serving policy: whatever goes wrong, the server gets a well-formed table,
//! empty if necessary.

use crate::{
    config::{Config, DataSourceKind},
    error::LoadResult,
    models::{Table, TableKind},
};

pub mod csv_file;
pub mod postgres;

pub use csv_file::CsvSource;
pub use postgres::{create_pool, PostgresSource};

/// Source column names for each record role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub category: Option<String>,
    pub tag: String,
    pub label: String,
    pub score: String,
}

impl Columns {
    pub fn kind(&self) -> TableKind {
        match self.category {
            Some(_) => TableKind::Categorized,
            None => TableKind::TagOnly,
        }
    }
}

/// Backing store the recommendation table is read from
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TableSource: Send + Sync {
    /// Reads and coerces every row of the source
    async fn fetch(&self) -> LoadResult<Table>;

    /// Human-readable description used in logs
    fn describe(&self) -> String;

    /// Layout of the table this source produces
    fn kind(&self) -> TableKind;
}

/// Loads the table from `source`, degrading any failure to an empty table
pub async fn load(source: &dyn TableSource) -> Table {
    let description = source.describe();

    match source.fetch().await {
        Ok(table) if table.is_empty() => {
            tracing::warn!(source = %description, "Source returned no rows, serving an empty table");
            table
        }
        Ok(table) => {
            tracing::info!(source = %description, rows = table.len(), "Loaded table");
            table
        }
        Err(e) => {
            tracing::error!(
                source = %description,
                error = %e,
                "Failed to load table, serving an empty table"
            );
            Table::empty(source.kind())
        }
    }
}

/// Builds the source selected by the configuration
pub fn source_from_config(config: &Config) -> LoadResult<Box<dyn TableSource>> {
    let columns = config.columns();

    let source: Box<dyn TableSource> = match config.data_source {
        DataSourceKind::Csv => Box::new(CsvSource::new(config.csv_path.clone(), columns)),
        DataSourceKind::Postgres => Box::new(PostgresSource::from_config(config, columns)?),
    };

    Ok(source)
}

/// Loads the configured table once at startup
pub async fn load_from_config(config: &Config) -> Table {
    match source_from_config(config) {
        Ok(source) => load(source.as_ref()).await,
        Err(e) => {
            tracing::error!(error = %e, "Invalid data source configuration, serving an empty table");
            Table::empty(config.columns().kind())
        }
    }
}
