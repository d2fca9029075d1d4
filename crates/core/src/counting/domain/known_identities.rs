use crate::recognition::domain::embedding::Embedding;
use crate::recognition::domain::identity_matcher::VisitorId;
use crate::recognition::domain::visitor_store::VisitorStore;

/// In-process cache of enrolled identities, ordered by enrollment.
///
/// Loaded once at startup from the store and appended to on each new
/// enrollment so the same session recognizes a person again after cooldown
/// without re-reading storage. Owned and passed explicitly — never ambient
/// state — so multiple controller instances don't collide.
#[derive(Default)]
pub struct KnownIdentityCache {
    entries: Vec<(VisitorId, Embedding)>,
}

impl KnownIdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every enrolled identity from the store.
    pub fn load(store: &dyn VisitorStore) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            entries: store.list_all()?,
        })
    }

    pub fn push(&mut self, id: VisitorId, embedding: Embedding) {
        self.entries.push((id, embedding));
    }

    pub fn entries(&self) -> &[(VisitorId, Embedding)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
