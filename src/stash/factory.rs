use super::{Stash, StashError};

/// Cache-aside over two stashes: items come from `delegate` when present,
/// otherwise from `factory` and are then dumped into `delegate`.
///
/// Keys belong to the factory, so `keys`, `exists` and `len` ask it rather
/// than the (possibly partial) delegate.
pub struct FactoryStash<D, F> {
    pub delegate: D,
    pub factory: F,
}

impl<D, F> FactoryStash<D, F> {
    pub fn new(delegate: D, factory: F) -> Self {
        Self { delegate, factory }
    }
}

impl<D, F> Stash for FactoryStash<D, F>
where
    D: Stash,
    F: Stash<Item = D::Item>,
{
    type Item = D::Item;

    fn load(&self, key: &str) -> Result<Option<D::Item>, StashError> {
        if let Some(item) = self.delegate.load(key)? {
            return Ok(Some(item));
        }
        let Some(item) = self.factory.load(key)? else {
            return Ok(None);
        };
        self.delegate.dump(key, &item)?;
        tracing::debug!(key, "Created and cached item");
        Ok(Some(item))
    }

    fn keys(&self) -> Result<Vec<String>, StashError> {
        self.factory.keys()
    }

    fn exists(&self, key: &str) -> Result<bool, StashError> {
        self.factory.exists(key)
    }

    fn dump(&self, key: &str, value: &D::Item) -> Result<(), StashError> {
        self.delegate.dump(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StashError> {
        self.delegate.delete(key)
    }

    /// Clears the cache only.
    fn clear(&self) -> Result<(), StashError> {
        self.delegate.clear()
    }

    fn len(&self) -> Result<usize, StashError> {
        self.factory.len()
    }
}
