use bytemuck::{cast_slice, pod_read_unaligned};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::assessment::{AssessmentRecord, NewAssessment};
use crate::repository::schema::assessments;
use crate::repository::{
    CatalogReader, CatalogWriter, DbConnection, DieselRepository, RepositoryError,
    RepositoryResult, StoredAssessment,
};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS assessments (
    id INTEGER PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT NOT NULL,
    duration TEXT NOT NULL,
    languages TEXT NOT NULL,
    job_level TEXT NOT NULL,
    remote_testing TEXT NOT NULL,
    adaptive_support TEXT NOT NULL,
    test_type TEXT NOT NULL,
    embedding_text TEXT NOT NULL,
    embedding BLOB NOT NULL,
    ingested_at TIMESTAMP NOT NULL
)";

#[derive(Queryable, Selectable)]
#[diesel(table_name = assessments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct DbAssessment {
    id: i32,
    name: String,
    url: String,
    description: String,
    duration: String,
    languages: String,
    job_level: String,
    remote_testing: String,
    adaptive_support: String,
    test_type: String,
    embedding_text: String,
    embedding: Vec<u8>,
}

#[derive(Insertable)]
#[diesel(table_name = assessments)]
struct DbNewAssessment<'a> {
    id: i32,
    name: &'a str,
    url: &'a str,
    description: &'a str,
    duration: &'a str,
    languages: &'a str,
    job_level: &'a str,
    remote_testing: &'a str,
    adaptive_support: &'a str,
    test_type: &'a str,
    embedding_text: &'a str,
    embedding: Vec<u8>,
    ingested_at: NaiveDateTime,
}

impl TryFrom<DbAssessment> for StoredAssessment {
    type Error = RepositoryError;

    fn try_from(row: DbAssessment) -> Result<Self, Self::Error> {
        Ok(Self {
            embedding: decode_embedding(&row.embedding).ok_or_else(|| {
                RepositoryError::Validation(format!(
                    "embedding of assessment {} has {} bytes",
                    row.id,
                    row.embedding.len()
                ))
            })?,
            record: AssessmentRecord {
                id: row.id,
                name: row.name,
                url: row.url,
                description: row.description,
                duration: row.duration,
                languages: row.languages,
                job_level: row.job_level,
                remote_testing: row.remote_testing,
                adaptive_support: row.adaptive_support,
                test_type: row.test_type,
                embedding_text: row.embedding_text,
            },
        })
    }
}

/// Decode an `f32` blob. SQLite blobs carry no alignment guarantee.
fn decode_embedding(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % std::mem::size_of::<f32>() != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(std::mem::size_of::<f32>())
            .map(pod_read_unaligned::<f32>)
            .collect(),
    )
}

pub(crate) fn create_table_if_missing(conn: &mut DbConnection) -> RepositoryResult<()> {
    diesel::sql_query(CREATE_TABLE).execute(conn)?;
    Ok(())
}

impl CatalogReader for DieselRepository {
    fn list_assessments(&self) -> RepositoryResult<Vec<StoredAssessment>> {
        let mut conn = self.conn()?;

        let rows = assessments::table
            .order(assessments::id.asc())
            .select(DbAssessment::as_select())
            .load::<DbAssessment>(&mut conn)?;

        rows.into_iter().map(StoredAssessment::try_from).collect()
    }

    fn count_assessments(&self) -> RepositoryResult<i64> {
        let mut conn = self.conn()?;

        Ok(assessments::table.count().get_result(&mut conn)?)
    }

    fn last_ingested_at(&self) -> RepositoryResult<Option<NaiveDateTime>> {
        let mut conn = self.conn()?;

        Ok(assessments::table
            .select(diesel::dsl::max(assessments::ingested_at))
            .first::<Option<NaiveDateTime>>(&mut conn)?)
    }
}

impl CatalogWriter for DieselRepository {
    fn replace_catalog(
        &self,
        new_assessments: &[NewAssessment],
        embeddings: &[Vec<f32>],
    ) -> RepositoryResult<usize> {
        if new_assessments.len() != embeddings.len() {
            return Err(RepositoryError::Validation(format!(
                "{} assessments but {} embeddings",
                new_assessments.len(),
                embeddings.len()
            )));
        }

        let mut conn = self.conn()?;
        let ingested_at = Utc::now().naive_utc();

        let inserted = conn.transaction(|conn| {
            diesel::sql_query("DROP TABLE IF EXISTS assessments").execute(conn)?;
            diesel::sql_query(CREATE_TABLE).execute(conn)?;

            let mut inserted_rows = 0;
            for (assessment, embedding) in new_assessments.iter().zip(embeddings) {
                let row = DbNewAssessment {
                    id: assessment.id,
                    name: &assessment.name,
                    url: &assessment.url,
                    description: &assessment.description,
                    duration: &assessment.duration,
                    languages: &assessment.languages,
                    job_level: &assessment.job_level,
                    remote_testing: &assessment.remote_testing,
                    adaptive_support: &assessment.adaptive_support,
                    test_type: &assessment.test_type,
                    embedding_text: &assessment.embedding_text,
                    embedding: cast_slice(embedding.as_slice()).to_vec(),
                    ingested_at,
                };
                inserted_rows += diesel::insert_into(assessments::table)
                    .values(&row)
                    .execute(conn)?;
            }
            Ok::<usize, diesel::result::Error>(inserted_rows)
        })?;

        Ok(inserted)
    }
}
