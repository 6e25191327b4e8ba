use crate::{DocId, Fields};

/// A single mutation inside a write batch
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Delete a document (idempotent: deleting an absent document is a no-op)
    Delete { collection: String, id: DocId },
    /// Merge the given fields into an existing document
    Update {
        collection: String,
        id: DocId,
        fields: Fields,
    },
}

/// A set of document mutations that commit together or not at all
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document deletion to the batch
    pub fn delete<C: Into<String>>(&mut self, collection: C, id: DocId) -> &mut Self {
        self.ops.push(WriteOp::Delete {
            collection: collection.into(),
            id,
        });
        self
    }

    /// Add a field-merge update to the batch
    pub fn update<C: Into<String>>(&mut self, collection: C, id: DocId, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update {
            collection: collection.into(),
            id,
            fields,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate the batched operations in insertion order
    pub fn ops(&self) -> impl Iterator<Item = &WriteOp> {
        self.ops.iter()
    }

    /// Consume the batch into its operations
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
