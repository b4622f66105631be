use std::path::{Path, PathBuf};

use snapsettle::adapter::outbound::sqlite::{create_pool, run_migrations, DbPool, SqliteStore};
use tempfile::TempDir;

/// Temporary SQLite database for integration tests. Removed on drop.
pub struct TempDb {
    _dir: TempDir,
    path: PathBuf,
    pool: DbPool,
}

impl TempDb {
    pub fn create(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(format!("snapsettle-{name}.db"));

        let pool = create_pool(&path.to_string_lossy()).expect("create sqlite pool");
        run_migrations(&pool).expect("run migrations");

        Self {
            _dir: dir,
            path,
            pool,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn store(&self) -> SqliteStore {
        SqliteStore::new(self.pool.clone())
    }
}
