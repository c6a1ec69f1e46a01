use std::str::FromStr;

use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions, PgRow},
    Column, PgPool, Row, TypeInfo,
};

use crate::{
    config::Config,
    error::{LoadError, LoadResult},
    models::{parse_score, Record, Table, TableKind},
};

use super::{Columns, TableSource};

/// Creates a PostgreSQL connection pool
///
/// The pool is only used for the startup load, so it stays small.
pub async fn create_pool(options: PgConnectOptions) -> LoadResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Loads the table from a PostgreSQL table
#[derive(Debug, Clone)]
pub struct PostgresSource {
    options: PgConnectOptions,
    table: String,
    columns: Columns,
}

impl PostgresSource {
    pub fn new(options: PgConnectOptions, table: impl Into<String>, columns: Columns) -> Self {
        Self {
            options,
            table: table.into(),
            columns,
        }
    }

    /// Builds connection options from `DATABASE_URL`, or from the `DB_*`
    /// parts when no URL is set
    pub fn from_config(config: &Config, columns: Columns) -> LoadResult<Self> {
        let options = match config.database_url.as_deref() {
            Some(url) => PgConnectOptions::from_str(url)
                .map_err(|e| LoadError::Config(format!("invalid DATABASE_URL: {}", e)))?,
            None => PgConnectOptions::new()
                .host(&config.db_host)
                .port(config.db_port)
                .username(&config.db_user)
                .password(&config.db_password)
                .database(&config.db_name),
        };

        Ok(Self::new(options, config.table_name.clone(), columns))
    }

    fn query(&self) -> String {
        let mut selected = Vec::with_capacity(4);
        if let Some(category) = &self.columns.category {
            selected.push(quote_ident(category));
        }
        selected.push(quote_ident(&self.columns.tag));
        selected.push(quote_ident(&self.columns.label));
        selected.push(quote_ident(&self.columns.score));

        format!(
            "SELECT {} FROM {}",
            selected.join(", "),
            quote_qualified(&self.table)
        )
    }

    fn decode_row(&self, row: &PgRow) -> LoadResult<Option<Record>> {
        let offset = usize::from(self.columns.category.is_some());

        let category = match &self.columns.category {
            Some(column) => text_cell(row, 0, column)?,
            None => None,
        };
        let tag = text_cell(row, offset, &self.columns.tag)?;
        let label = text_cell(row, offset + 1, &self.columns.label)?;
        let score = score_cell(row, offset + 2, &self.columns.score)?;

        Ok(label.map(|label| Record {
            category,
            tag,
            label,
            score,
        }))
    }
}

#[async_trait::async_trait]
impl TableSource for PostgresSource {
    async fn fetch(&self) -> LoadResult<Table> {
        let pool = create_pool(self.options.clone()).await?;
        let query = self.query();
        tracing::debug!(%query, "Querying source table");

        let rows = sqlx::query(&query).fetch_all(&pool).await;
        pool.close().await;
        let rows = rows?;

        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for row in &rows {
            match self.decode_row(row)? {
                Some(record) => records.push(record),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Skipped database rows without a label");
        }

        Ok(Table::new(self.columns.kind(), records))
    }

    fn describe(&self) -> String {
        format!(
            "postgres:{}:{}/{}",
            self.options.get_host(),
            self.options.get_port(),
            self.table
        )
    }

    fn kind(&self) -> TableKind {
        self.columns.kind()
    }
}

/// Reads a column as text, decoding `bytea` as UTF-8 and rendering numbers
fn text_cell(row: &PgRow, idx: usize, column: &str) -> LoadResult<Option<String>> {
    let type_name = row.column(idx).type_info().name().to_string();

    let value = match type_name.as_str() {
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" | "CITEXT" => {
            row.try_get::<Option<String>, _>(idx)?
        }
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(idx)?
            .map(String::from_utf8)
            .transpose()
            .map_err(|source| LoadError::Decode {
                column: column.to_string(),
                source,
            })?,
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(|v| v.to_string()),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(|v| v.to_string()),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(|v| v.to_string()),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(|v| v.to_string()),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?.map(|v| v.to_string()),
        "NUMERIC" => row
            .try_get::<Option<sqlx::types::BigDecimal>, _>(idx)?
            .map(|v| v.to_string()),
        _ => {
            return Err(LoadError::UnsupportedType {
                column: column.to_string(),
                type_name,
            })
        }
    };

    Ok(value.filter(|v| !v.is_empty()))
}

/// Reads the score column, coercing anything non-numeric to a missing score
fn score_cell(row: &PgRow, idx: usize, column: &str) -> LoadResult<Option<f64>> {
    let type_name = row.column(idx).type_info().name().to_string();

    let score = match type_name.as_str() {
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(f64::from),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(f64::from),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(|v| v as f64),
        "FLOAT4" => row.try_get::<Option<f32>, _>(idx)?.map(f64::from),
        "FLOAT8" => row.try_get::<Option<f64>, _>(idx)?,
        _ => text_cell(row, idx, column)?.as_deref().and_then(parse_score),
    };

    Ok(score.filter(|s| !s.is_nan()))
}

/// Quotes an identifier so mixed-case column names survive Postgres folding
fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quotes each part of a possibly schema-qualified table name
fn quote_qualified(name: &str) -> String {
    name.split('.').map(quote_ident).collect::<Vec<_>>().join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(category: Option<&str>) -> Columns {
        Columns {
            category: category.map(str::to_string),
            tag: "Genres".into(),
            label: "Item_name".into(),
            score: "Score".into(),
        }
    }

    fn source(category: Option<&str>, table: &str) -> PostgresSource {
        PostgresSource::new(PgConnectOptions::new(), table, columns(category))
    }

    #[test]
    fn test_query_categorized() {
        let query = source(Some("Type"), "dataset").query();
        assert_eq!(
            query,
            r#"SELECT "Type", "Genres", "Item_name", "Score" FROM "dataset""#
        );
    }

    #[test]
    fn test_query_tag_only_with_schema() {
        let query = source(None, "public.books").query();
        assert_eq!(
            query,
            r#"SELECT "Genres", "Item_name", "Score" FROM "public"."books""#
        );
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = envy::from_iter::<_, Config>(vec![(
            "DATABASE_URL".to_string(),
            "not a url".to_string(),
        )])
        .unwrap();

        let result = PostgresSource::from_config(&config, config.columns());
        assert!(matches!(result, Err(LoadError::Config(_))));
    }

    #[test]
    fn test_from_config_parts() {
        let config = envy::from_iter::<_, Config>(vec![
            ("DB_HOST".to_string(), "db.example".to_string()),
            ("DB_PORT".to_string(), "6543".to_string()),
            ("TABLE_NAME".to_string(), "media".to_string()),
        ])
        .unwrap();

        let source = PostgresSource::from_config(&config, config.columns()).unwrap();
        assert_eq!(source.describe(), "postgres:db.example:6543/media");
        assert_eq!(source.kind(), TableKind::Categorized);
    }
}
