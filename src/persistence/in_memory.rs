use super::*;
use parking_lot::Mutex;

/// Fake in-memory persistence.
///
/// Serves the sample catalog when no file is given; useful for unit-tests.
#[derive(Debug)]
pub struct InMemoryPersistence {
    items: Mutex<Vec<Item>>,
}

impl InMemoryPersistence {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: Mutex::new(items),
        }
    }

    pub fn new_shared(items: Vec<Item>) -> SharedCatalogPersistence {
        Arc::new(Self::new(items))
    }
}

impl CatalogPersistence for InMemoryPersistence {
    fn load(&self) -> Result<Vec<Item>> {
        Ok(self.items.lock().clone())
    }

    fn snapshot(&self, items: &[Item]) -> Result<()> {
        *self.items.lock() = items.to_vec();
        Ok(())
    }
}
