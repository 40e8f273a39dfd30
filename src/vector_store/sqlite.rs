//! SQLite-based vector store implementation.
//!
//! Uses SQLite with cosine similarity computed in Rust for simplicity.
//! For production use cases with large datasets, consider using sqlite-vec
//! extension or a dedicated vector database.

use super::{
    cosine_similarity, rank_chunk_matches, CatalogEntry, CatalogMatch, ChunkEntry, ChunkMatch,
    ContentFilter, LessonSummary, VectorStore,
};
use crate::error::{PensumError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS catalog (
    title TEXT PRIMARY KEY,
    instructor TEXT,
    link TEXT,
    lessons_json TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS chunks (
    course_title TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    lesson_number INTEGER,
    content TEXT NOT NULL,
    embedding BLOB NOT NULL,
    indexed_at TEXT NOT NULL,
    PRIMARY KEY (course_title, chunk_index)
);

CREATE INDEX IF NOT EXISTS idx_chunks_course ON chunks(course_title);
"#;

/// SQLite-based vector store holding both collections.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Create a new SQLite vector store.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PensumError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_catalog_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<CatalogEntry> {
        let lessons_json: String = row.get(3)?;
        let embedding_bytes: Vec<u8> = row.get(4)?;
        let indexed_at_str: String = row.get(5)?;

        Ok(CatalogEntry {
            title: row.get(0)?,
            instructor: row.get(1)?,
            link: row.get(2)?,
            lessons: serde_json::from_str::<Vec<LessonSummary>>(&lessons_json)
                .unwrap_or_default(),
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, entry), fields(title = %entry.title))]
    async fn upsert_catalog(&self, entry: &CatalogEntry) -> Result<()> {
        let conn = self.lock()?;

        let lessons_json = serde_json::to_string(&entry.lessons)?;
        let embedding_bytes = Self::embedding_to_bytes(&entry.embedding);

        conn.execute(
            r#"
            INSERT OR REPLACE INTO catalog
            (title, instructor, link, lessons_json, embedding, indexed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.title,
                entry.instructor,
                entry.link,
                lessons_json,
                embedding_bytes,
                entry.indexed_at.to_rfc3339(),
            ],
        )?;

        debug!("Upserted catalog entry '{}'", entry.title);
        Ok(())
    }

    async fn catalog_contains(&self, title: &str) -> Result<bool> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM catalog WHERE title = ?1",
            params![title],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    async fn get_catalog_entry(&self, title: &str) -> Result<Option<CatalogEntry>> {
        let conn = self.lock()?;

        let entry = conn.query_row(
            r#"
            SELECT title, instructor, link, lessons_json, embedding, indexed_at
            FROM catalog
            WHERE title = ?1
            "#,
            params![title],
            Self::row_to_catalog_entry,
        );

        match entry {
            Ok(e) => Ok(Some(e)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, query_embedding))]
    async fn query_catalog(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CatalogMatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT title, embedding FROM catalog")?;
        let rows = stmt.query_map([], |row| {
            let title: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            Ok((title, Self::bytes_to_embedding(&embedding_bytes)))
        })?;

        let mut matches: Vec<CatalogMatch> = rows
            .filter_map(|r| r.ok())
            .map(|(title, embedding)| CatalogMatch {
                score: cosine_similarity(query_embedding, &embedding),
                title,
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });
        matches.truncate(limit);

        debug!("Catalog query matched {} courses", matches.len());
        Ok(matches)
    }

    async fn list_course_titles(&self) -> Result<Vec<String>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT title FROM catalog ORDER BY title")?;
        let rows = stmt.query_map([], |row| row.get(0))?;

        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    async fn course_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self, entries))]
    async fn upsert_chunks(&self, entries: &[ChunkEntry]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for entry in entries {
            let embedding_bytes = Self::embedding_to_bytes(&entry.embedding);

            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (course_title, chunk_index, lesson_number, content, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    entry.course_title,
                    entry.chunk_index,
                    entry.lesson_number,
                    entry.content,
                    embedding_bytes,
                    entry.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", entries.len());
        Ok(entries.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn query_content(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &ContentFilter,
    ) -> Result<Vec<ChunkMatch>> {
        let conn = self.lock()?;

        // Metadata filtering happens in SQL; similarity ranking in Rust.
        let mut sql = String::from(
            "SELECT course_title, chunk_index, lesson_number, content, embedding FROM chunks",
        );
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(title) = &filter.course_title {
            clauses.push(format!("course_title = ?{}", args.len() + 1));
            args.push(Box::new(title.clone()));
        }
        if let Some(lesson) = filter.lesson_number {
            clauses.push(format!("lesson_number = ?{}", args.len() + 1));
            args.push(Box::new(lesson));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = args.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            let embedding_bytes: Vec<u8> = row.get(4)?;
            let embedding = Self::bytes_to_embedding(&embedding_bytes);
            Ok(ChunkMatch {
                course_title: row.get(0)?,
                chunk_index: row.get(1)?,
                lesson_number: row.get(2)?,
                content: row.get(3)?,
                score: cosine_similarity(query_embedding, &embedding),
            })
        })?;

        let mut matches: Vec<ChunkMatch> = rows.filter_map(|r| r.ok()).collect();
        rank_chunk_matches(&mut matches, limit);

        debug!("Content query matched {} chunks", matches.len());
        Ok(matches)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn delete_course(&self, title: &str) -> Result<usize> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM catalog WHERE title = ?1", params![title])?;
        let deleted = conn.execute("DELETE FROM chunks WHERE course_title = ?1", params![title])?;

        info!("Deleted course '{}' ({} chunks)", title, deleted);
        Ok(deleted)
    }
}
