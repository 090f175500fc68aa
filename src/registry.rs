//! Configuration variable registry
//!
//! Caches every schema CV in RAM, mirrors changes into the persistent
//! store, and reports whether a write altered anything so the caller
//! knows when to recompute light output. This is the single place that
//! decides "does this CV change cost a store write".

use heapless::Vec;

use crate::PersistentStore;
use crate::schema::{CvDefinition, MAX_CVS};

/// Error returned when a CV number is not part of the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CvError {
    NotFound,
}

/// Result of a CV write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The new value equals the cached value; nothing was stored.
    Unchanged,
    /// The value was persisted and the cache updated.
    Updated,
}

/// Registry of configuration variables backed by a persistent store.
///
/// The schema is fixed for the lifetime of the registry; only the cached
/// values change. A CV's store address is its schema index.
pub struct CvRegistry<'a> {
    schema: &'a [CvDefinition],
    values: Vec<u8, MAX_CVS>,
}

impl<'a> CvRegistry<'a> {
    /// Restore all CV values from the store into the cache.
    #[allow(clippy::cast_possible_truncation)]
    pub fn load(schema: &'a [CvDefinition], store: &mut impl PersistentStore) -> Self {
        assert!(schema.len() <= MAX_CVS);
        let mut values = Vec::new();
        for index in 0..schema.len() {
            let _ = values.push(store.read_byte(index as u16));
        }
        Self { schema, values }
    }

    /// Check whether a CV number is valid for reading or writing.
    pub fn is_valid(&self, id: u16, for_write: bool) -> bool {
        match self.find(id) {
            Some(index) => !for_write || self.schema[index].writable,
            None => false,
        }
    }

    /// Read the cached value of a CV.
    pub fn read(&self, id: u16) -> Result<u8, CvError> {
        self.find(id)
            .map(|index| self.values[index])
            .ok_or(CvError::NotFound)
    }

    /// Write a CV value, persisting it if it differs from the cache.
    ///
    /// Writability is not checked here: the Protocol Link gates operator
    /// writes through [`Self::is_valid`], while a factory reset must be
    /// able to rewrite any resettable CV.
    #[allow(clippy::cast_possible_truncation)]
    pub fn write(
        &mut self,
        id: u16,
        value: u8,
        store: &mut impl PersistentStore,
    ) -> Result<WriteOutcome, CvError> {
        let index = self.find(id).ok_or(CvError::NotFound)?;
        if self.values[index] == value {
            return Ok(WriteOutcome::Unchanged);
        }
        self.values[index] = value;
        store.write_byte(index as u16, value);
        Ok(WriteOutcome::Updated)
    }

    /// Apply the factory default of the schema entry at `index`.
    ///
    /// Entries without the restore flag are skipped. Routes through the
    /// normal write path, so an entry already at its default costs
    /// nothing.
    pub fn apply_factory_default(
        &mut self,
        index: usize,
        store: &mut impl PersistentStore,
    ) -> WriteOutcome {
        let Some(cv) = self.schema.get(index).copied() else {
            return WriteOutcome::Unchanged;
        };
        if !cv.restore_on_reset {
            return WriteOutcome::Unchanged;
        }
        self.write(cv.id, cv.default_value, store)
            .unwrap_or(WriteOutcome::Unchanged)
    }

    /// Number of schema entries.
    pub const fn len(&self) -> usize {
        self.schema.len()
    }

    /// Whether the schema is empty.
    pub const fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    fn find(&self, id: u16) -> Option<usize> {
        self.schema.iter().position(|cv| cv.id == id)
    }
}
