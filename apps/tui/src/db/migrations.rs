use color_eyre::Result;
use sqlx::{
    migrate::MigrateDatabase, query, query_scalar, sqlite::SqlitePoolOptions, Sqlite, SqlitePool,
};
use tracing::{debug, info, warn};

/// Sets up the database by creating the necessary tables if they don't exist
pub async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Single-row table: the panel options the map view is configured from
    query(
        "CREATE TABLE IF NOT EXISTS panel_options (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            center_lat REAL NOT NULL DEFAULT 48.262725,
            center_lon REAL NOT NULL DEFAULT 11.66725,
            zoom_level REAL NOT NULL DEFAULT 18,
            max_zoom REAL NOT NULL DEFAULT 22,
            tile_url TEXT NOT NULL DEFAULT '',
            geojson TEXT
        )",
    )
    .execute(pool)
    .await?;

    ensure_column_exists(
        pool,
        "panel_options",
        "saved_at",
        "ALTER TABLE panel_options ADD COLUMN saved_at TEXT",
    )
    .await?;

    Ok(())
}

async fn ensure_column_exists(
    pool: &SqlitePool,
    table: &str,
    column: &str,
    alter_statement: &str,
) -> Result<(), sqlx::Error> {
    let count: i64 = query_scalar(&format!(
        "SELECT COUNT(*) FROM pragma_table_info('{table}') WHERE name = ?",
    ))
    .bind(column)
    .fetch_one(pool)
    .await?;

    if count == 0 {
        debug!("Adding column {}.{}", table, column);
        query(alter_statement).execute(pool).await?;
    }

    Ok(())
}

/// Creates a database connection pool for `database_url`, creating the file
/// and schema when missing
pub async fn create_database_pool(database_url: &str) -> Result<SqlitePool> {
    info!("Initializing database with URL: {database_url}");

    let db_path = extract_db_path_from_url(database_url)?;
    debug!("Extracted database path: {db_path}");

    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directory: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                color_eyre::eyre::eyre!("Failed to create database directory: {e}")
            })?;
        }
    }

    let db_file = std::path::Path::new(&db_path);
    if db_file.exists() {
        std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(db_file)
            .map_err(|e| color_eyre::eyre::eyre!("Database file permission error: {e}"))?;
    }

    let db_exists = Sqlite::database_exists(database_url)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Error checking database: {e}"))?;

    if !db_exists {
        info!("Database does not exist, creating it now");
        Sqlite::create_database(database_url)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create SQLite database: {e}"))?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _| {
            Box::pin(async move {
                use sqlx::Executor as _;
                conn.execute("PRAGMA journal_mode = WAL;").await?;
                conn.execute("PRAGMA synchronous = NORMAL;").await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
        .map_err(|e| {
            warn!("Failed to connect to database: {e}");
            color_eyre::eyre::eyre!("Failed to connect to SQLite database: {e}")
        })?;

    setup_database(&pool)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to set up database schema: {e}"))?;

    info!("Database initialization completed successfully");
    Ok(pool)
}

/// Helper function to extract the database path from a SQLite URL
fn extract_db_path_from_url(url: &str) -> Result<String, color_eyre::eyre::Error> {
    if !url.starts_with("sqlite://") {
        return Err(color_eyre::eyre::eyre!("Not a valid SQLite URL: {url}"));
    }

    let path_part = url.trim_start_matches("sqlite://");

    if cfg!(windows) {
        // Windows: sqlite:///C:/path or sqlite://C:/path
        if let Some(drive_idx) = path_part.find(':') {
            if drive_idx > 0 {
                let path = path_part
                    .strip_prefix('/')
                    .map_or_else(|| path_part.to_string(), std::string::ToString::to_string);

                return Ok(path);
            }
        }
    }

    // Unix-like absolute path: sqlite:///path
    if path_part.starts_with('/') {
        return Ok(format!("/{}", path_part.trim_start_matches('/')));
    }

    Ok(path_part.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_absolute_and_relative_paths() {
        assert_eq!(
            extract_db_path_from_url("sqlite:///tmp/aoi.db").unwrap(),
            "/tmp/aoi.db"
        );
        assert_eq!(
            extract_db_path_from_url("sqlite://data/aoi.db").unwrap(),
            "data/aoi.db"
        );
        assert!(extract_db_path_from_url("postgres://db").is_err());
    }

    #[tokio::test]
    async fn schema_setup_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        setup_database(&pool).await?;
        setup_database(&pool).await?;

        let columns: i64 = query_scalar(
            "SELECT COUNT(*) FROM pragma_table_info('panel_options') WHERE name = 'saved_at'",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(columns, 1);
        Ok(())
    }
}
