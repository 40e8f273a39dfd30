//! In-memory vector store implementation.
//!
//! Useful for testing and small datasets.

use super::{
    cosine_similarity, rank_chunk_matches, CatalogEntry, CatalogMatch, ChunkEntry, ChunkMatch,
    ContentFilter, VectorStore,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory vector store with both collections behind read/write locks.
pub struct MemoryVectorStore {
    catalog: RwLock<HashMap<String, CatalogEntry>>,
    chunks: RwLock<HashMap<(String, u32), ChunkEntry>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(HashMap::new()),
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_catalog(&self, entry: &CatalogEntry) -> Result<()> {
        let mut catalog = self.catalog.write().unwrap();
        catalog.insert(entry.title.clone(), entry.clone());
        Ok(())
    }

    async fn catalog_contains(&self, title: &str) -> Result<bool> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.contains_key(title))
    }

    async fn get_catalog_entry(&self, title: &str) -> Result<Option<CatalogEntry>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.get(title).cloned())
    }

    async fn query_catalog(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CatalogMatch>> {
        let catalog = self.catalog.read().unwrap();

        let mut matches: Vec<CatalogMatch> = catalog
            .values()
            .map(|entry| CatalogMatch {
                title: entry.title.clone(),
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.title.cmp(&b.title))
        });
        matches.truncate(limit);

        Ok(matches)
    }

    async fn list_course_titles(&self) -> Result<Vec<String>> {
        let catalog = self.catalog.read().unwrap();
        let mut titles: Vec<String> = catalog.keys().cloned().collect();
        titles.sort();
        Ok(titles)
    }

    async fn course_count(&self) -> Result<usize> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.len())
    }

    async fn upsert_chunks(&self, entries: &[ChunkEntry]) -> Result<usize> {
        let mut chunks = self.chunks.write().unwrap();
        for entry in entries {
            chunks.insert(
                (entry.course_title.clone(), entry.chunk_index),
                entry.clone(),
            );
        }
        Ok(entries.len())
    }

    async fn query_content(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &ContentFilter,
    ) -> Result<Vec<ChunkMatch>> {
        let chunks = self.chunks.read().unwrap();

        let mut matches: Vec<ChunkMatch> = chunks
            .values()
            .filter(|entry| filter.matches(entry))
            .map(|entry| ChunkMatch {
                content: entry.content.clone(),
                course_title: entry.course_title.clone(),
                lesson_number: entry.lesson_number,
                chunk_index: entry.chunk_index,
                score: cosine_similarity(query_embedding, &entry.embedding),
            })
            .collect();

        rank_chunk_matches(&mut matches, limit);
        Ok(matches)
    }

    async fn chunk_count(&self) -> Result<usize> {
        let chunks = self.chunks.read().unwrap();
        Ok(chunks.len())
    }

    async fn delete_course(&self, title: &str) -> Result<usize> {
        let mut catalog = self.catalog.write().unwrap();
        catalog.remove(title);

        let mut chunks = self.chunks.write().unwrap();
        let before = chunks.len();
        chunks.retain(|_, entry| entry.course_title != title);
        Ok(before - chunks.len())
    }
}
