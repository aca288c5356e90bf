//! Event registry: every event with its two vaults, plus the active index.
//!
//! Events are numbered from 1 and never removed. An event is *active* from
//! creation until its outcome is declared; the active set is maintained
//! explicitly so counting active events never scans the registry.

use std::collections::{BTreeMap, BTreeSet};

use duelbook_escrow::{Vault, VaultCheckpoint};
use duelbook_types::{DuelbookError, Event, EventId, Result, Side};

/// An event together with the vaults it exclusively owns.
#[derive(Debug, Clone)]
pub struct EventBook {
    pub event: Event,
    pub vault_a: Vault,
    pub vault_b: Vault,
}

impl EventBook {
    /// Wrap `event` with a fresh pair of vaults.
    #[must_use]
    pub fn new(event: Event) -> Self {
        let vault_a = Vault::new(event.id, Side::A);
        let vault_b = Vault::new(event.id, Side::B);
        Self {
            event,
            vault_a,
            vault_b,
        }
    }

    #[must_use]
    pub fn vault(&self, side: Side) -> &Vault {
        match side {
            Side::A => &self.vault_a,
            Side::B => &self.vault_b,
        }
    }

    pub fn vault_mut(&mut self, side: Side) -> &mut Vault {
        match side {
            Side::A => &mut self.vault_a,
            Side::B => &mut self.vault_b,
        }
    }

    /// Whether either side has recorded a stake.
    #[must_use]
    pub fn has_stakes(&self) -> bool {
        self.vault_a.has_stakes() || self.vault_b.has_stakes()
    }

    /// Open a checkpoint on both vaults.
    ///
    /// # Errors
    /// `Internal` if either vault already has one open.
    pub fn checkpoint(&mut self) -> Result<BookCheckpoint> {
        let a = self.vault_a.checkpoint()?;
        match self.vault_b.checkpoint() {
            Ok(b) => Ok(BookCheckpoint { a, b }),
            Err(err) => {
                self.vault_a.rollback(a);
                Err(err)
            }
        }
    }

    pub fn commit(&mut self) {
        self.vault_a.commit();
        self.vault_b.commit();
    }

    pub fn rollback(&mut self, checkpoint: BookCheckpoint) {
        self.vault_a.rollback(checkpoint.a);
        self.vault_b.rollback(checkpoint.b);
    }
}

/// Restore point for both vaults of an [`EventBook`].
#[derive(Debug, Clone, Copy)]
pub struct BookCheckpoint {
    a: VaultCheckpoint,
    b: VaultCheckpoint,
}

/// All events, keyed by id.
#[derive(Debug)]
pub struct EventRegistry {
    books: BTreeMap<EventId, EventBook>,
    active: BTreeSet<EventId>,
    next_id: EventId,
}

impl EventRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            books: BTreeMap::new(),
            active: BTreeSet::new(),
            next_id: EventId(1),
        }
    }

    /// Id the next registered event will receive.
    #[must_use]
    pub fn next_id(&self) -> EventId {
        self.next_id
    }

    /// Register `event` under the next id and mark it active.
    ///
    /// # Errors
    /// `Internal` if `event.id` is not [`Self::next_id`].
    pub fn register(&mut self, event: Event) -> Result<EventId> {
        let id = event.id;
        if id != self.next_id {
            return Err(DuelbookError::Internal(format!(
                "event registered as {id}, expected {}",
                self.next_id
            )));
        }
        self.books.insert(id, EventBook::new(event));
        self.active.insert(id);
        self.next_id = id.next();
        Ok(id)
    }

    pub fn get(&self, id: EventId) -> Result<&EventBook> {
        self.books.get(&id).ok_or(DuelbookError::EventNotFound(id))
    }

    pub fn get_mut(&mut self, id: EventId) -> Result<&mut EventBook> {
        self.books
            .get_mut(&id)
            .ok_or(DuelbookError::EventNotFound(id))
    }

    /// Drop `id` from the active set. Returns whether it was active.
    pub fn deactivate(&mut self, id: EventId) -> bool {
        self.active.remove(&id)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Active event ids in ascending order.
    pub fn active_ids(&self) -> impl Iterator<Item = EventId> + '_ {
        self.active.iter().copied()
    }

    /// Total events ever registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
