use std::path::PathBuf;

use serde::Deserialize;

use crate::db::Columns;

/// Where the recommendation table is loaded from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DataSourceKind {
    Csv,
    Postgres,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Table source: `csv` or `postgres`
    #[serde(default = "default_data_source")]
    pub data_source: DataSourceKind,

    /// CSV file used when `data_source` is `csv`
    #[serde(default = "default_csv_path")]
    pub csv_path: PathBuf,

    /// Full PostgreSQL connection URL, takes precedence over the `db_*` parts
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_db_user")]
    pub db_user: String,

    #[serde(default)]
    pub db_password: String,

    #[serde(default = "default_db_host")]
    pub db_host: String,

    #[serde(default = "default_db_port")]
    pub db_port: u16,

    #[serde(default = "default_db_name")]
    pub db_name: String,

    /// Source table, optionally schema-qualified
    #[serde(default = "default_table_name")]
    pub table_name: String,

    /// Category column; an empty value selects the tag-only layout
    #[serde(default = "default_category_column")]
    pub category_column: String,

    #[serde(default = "default_tag_column")]
    pub tag_column: String,

    #[serde(default = "default_label_column")]
    pub label_column: String,

    #[serde(default = "default_score_column")]
    pub score_column: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Exit at startup when the loaded table is empty
    #[serde(default)]
    pub exit_on_empty: bool,

    /// Seed for reproducible sampling
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

fn default_data_source() -> DataSourceKind {
    DataSourceKind::Csv
}

fn default_csv_path() -> PathBuf {
    PathBuf::from("merged_douban.csv")
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "postgres".to_string()
}

fn default_table_name() -> String {
    "dataset".to_string()
}

fn default_category_column() -> String {
    "Type".to_string()
}

fn default_tag_column() -> String {
    "Genres".to_string()
}

fn default_label_column() -> String {
    "Item_name".to_string()
}

fn default_score_column() -> String {
    "Score".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Column mapping for the configured dataset
    pub fn columns(&self) -> Columns {
        let category = Some(self.category_column.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        Columns {
            category,
            tag: self.tag_column.clone(),
            label: self.label_column.clone(),
            score: self.score_column.clone(),
        }
    }
}
