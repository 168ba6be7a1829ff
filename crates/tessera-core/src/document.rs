use std::sync::RwLock;

use crate::error::CoreError;

/// Handle onto a replicated document owned by an external store.
///
/// Reads are snapshots. Writes hand the store a pure transformation, and the
/// store decides how it is serialized, persisted and synced.
pub trait DocumentHandle<D>: Send + Sync {
    fn snapshot(&self) -> Result<D, CoreError>;

    fn change(&self, mutation: &mut dyn FnMut(&mut D)) -> Result<(), CoreError>;
}

/// In-process document, for tests and the CLI.
#[derive(Debug, Default)]
pub struct MemoryDocument<D> {
    inner: RwLock<D>,
}

impl<D> MemoryDocument<D> {
    pub fn new(doc: D) -> Self {
        Self {
            inner: RwLock::new(doc),
        }
    }

    pub fn into_inner(self) -> Result<D, CoreError> {
        self.inner
            .into_inner()
            .map_err(|_| CoreError::Document("document lock poisoned".into()))
    }
}

impl<D: Clone + Send + Sync> DocumentHandle<D> for MemoryDocument<D> {
    fn snapshot(&self) -> Result<D, CoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| CoreError::Document("document lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn change(&self, mutation: &mut dyn FnMut(&mut D)) -> Result<(), CoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| CoreError::Document("document lock poisoned".into()))?;
        mutation(&mut guard);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_then_snapshot() {
        let doc = MemoryDocument::new(vec![1u32]);
        doc.change(&mut |d| d.push(2)).unwrap();
        assert_eq!(doc.snapshot().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let doc = MemoryDocument::new(String::from("a"));
        let mut snap = doc.snapshot().unwrap();
        snap.push('b');
        assert_eq!(doc.snapshot().unwrap(), "a");
    }

    #[test]
    fn test_into_inner() {
        let doc = MemoryDocument::new(7u8);
        doc.change(&mut |d| *d += 1).unwrap();
        assert_eq!(doc.into_inner().unwrap(), 8);
    }
}
