use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use thiserror::Error;

use crate::domain::assessment::{AssessmentRecord, NewAssessment};

pub mod assessment;
pub mod schema;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("invalid stored data: {0}")]
    Validation(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Build an r2d2 pool for the SQLite database at `database_url`.
pub fn establish_connection_pool(database_url: &str) -> RepositoryResult<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    Ok(Pool::builder().build(manager)?)
}

/// Assessment together with its stored embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAssessment {
    pub record: AssessmentRecord,
    pub embedding: Vec<f32>,
}

pub trait CatalogReader {
    /// Every stored assessment ordered by id.
    fn list_assessments(&self) -> RepositoryResult<Vec<StoredAssessment>>;
    fn count_assessments(&self) -> RepositoryResult<i64>;
    /// Timestamp of the last ingest, `None` for an empty catalog.
    fn last_ingested_at(&self) -> RepositoryResult<Option<NaiveDateTime>>;
}

pub trait CatalogWriter {
    /// Drop the whole catalog and replace it with `assessments`.
    ///
    /// `embeddings` is parallel to `assessments`.
    fn replace_catalog(
        &self,
        assessments: &[NewAssessment],
        embeddings: &[Vec<f32>],
    ) -> RepositoryResult<usize>;
}

/// Diesel-backed repository for the assessment catalog.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    /// Wrap `pool`, creating the catalog table when it does not exist yet.
    pub fn new(pool: DbPool) -> RepositoryResult<Self> {
        let repo = Self { pool };
        let mut conn = repo.conn()?;
        assessment::create_table_if_missing(&mut conn)?;
        Ok(repo)
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}
