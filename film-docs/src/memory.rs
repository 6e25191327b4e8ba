use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::{
    DocError, DocId, DocResult, Document, DocumentStore, Fields, Filter, WriteBatch, WriteOp,
};

/// In-memory backend for testing and development
///
/// Defines the reference batch semantics: a commit validates every
/// operation under the write lock before applying any of them, so a failed
/// batch leaves the store untouched and no partially-applied state is ever
/// observable.
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
}

#[derive(Default)]
struct Collection {
    docs: HashMap<DocId, Map<String, Value>>,
    /// Creation sequence, which is also query order
    order: Vec<DocId>,
}

impl Collection {
    fn remove(&mut self, id: &DocId) {
        if self.docs.remove(id).is_some() {
            self.order.retain(|existing| existing != id);
        }
    }
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Number of documents in a collection
    pub fn collection_len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map(|coll| coll.docs.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, fields: Fields) -> DocResult<DocId> {
        let id = DocId::new();
        let resolved = fields.resolve(Utc::now());

        let mut collections = self.collections.write();
        let coll = collections.entry(collection.to_string()).or_default();
        coll.docs.insert(id.clone(), resolved);
        coll.order.push(id.clone());

        Ok(id)
    }

    async fn get(&self, collection: &str, id: &DocId) -> DocResult<Option<Document>> {
        let collections = self.collections.read();
        Ok(collections.get(collection).and_then(|coll| {
            coll.docs.get(id).map(|fields| Document {
                id: id.clone(),
                fields: fields.clone(),
            })
        }))
    }

    async fn query(&self, collection: &str, filter: Filter) -> DocResult<Vec<Document>> {
        let collections = self.collections.read();
        let Some(coll) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for id in &coll.order {
            if let Some(fields) = coll.docs.get(id) {
                let document = Document {
                    id: id.clone(),
                    fields: fields.clone(),
                };
                if filter.matches(&document) {
                    results.push(document);
                }
            }
        }
        Ok(results)
    }

    async fn commit(&self, batch: WriteBatch) -> DocResult<()> {
        let ops = batch.into_ops();
        let now = Utc::now();

        let mut collections = self.collections.write();

        // Validate every operation before touching anything
        for op in &ops {
            if let WriteOp::Update { collection, id, .. } = op {
                let exists = collections
                    .get(collection)
                    .map(|coll| coll.docs.contains_key(id))
                    .unwrap_or(false);
                if !exists {
                    return Err(DocError::not_found(collection.clone(), id.to_string()));
                }
            }
        }

        for op in ops {
            match op {
                WriteOp::Delete { collection, id } => {
                    if let Some(coll) = collections.get_mut(&collection) {
                        coll.remove(&id);
                    }
                }
                WriteOp::Update {
                    collection,
                    id,
                    fields,
                } => {
                    // Validated above; merge the resolved fields in
                    if let Some(existing) = collections
                        .get_mut(&collection)
                        .and_then(|coll| coll.docs.get_mut(&id))
                    {
                        for (field, value) in fields.resolve(now) {
                            existing.insert(field, value);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

impl Default for MemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
