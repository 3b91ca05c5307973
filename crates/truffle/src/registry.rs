//! One cached connection per model type.
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use lazy_static::lazy_static;
use log::*;

use truffle_datastore::{Connection, ConnectionConfig};

use crate::errors::{Error, Result};

lazy_static! {
    static ref GLOBAL: ConnectionRegistry = ConnectionRegistry::new();
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SlotState {
    /// Opened but not yet initialized.
    Pending,
    Ready,
    /// Initialization failed and the slot has been evicted.
    Failed,
}

/// One model's connection.  The state lock serializes initialization for this model only.
#[derive(Debug)]
struct Slot {
    conn: Arc<Connection>,
    state: Mutex<SlotState>,
}

/// Maps model types to their connections.
///
/// A connection is created the first time a model resolves one and lives until the model is reset.  The map lock is
/// only held to look up or insert a slot, so concurrent first uses still share one connection while models initialize
/// independently of each other.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<TypeId, Arc<Slot>>>,
}

impl ConnectionRegistry {
    pub fn new() -> ConnectionRegistry {
        Default::default()
    }

    /// The registry the model entry points use.
    pub fn global() -> &'static ConnectionRegistry {
        &GLOBAL
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<TypeId, Arc<Slot>>>> {
        self.connections.lock().map_err(|_| Error::Poisoned)
    }

    fn slot<M: 'static>(&self, config: &ConnectionConfig) -> Result<Arc<Slot>> {
        let mut connections = self.lock()?;
        if let Some(slot) = connections.get(&TypeId::of::<M>()) {
            return Ok(slot.clone());
        }

        let conn = Arc::new(Connection::open(config).map_err(Error::Connection)?);
        debug!("Caching {} for {}", conn.id(), type_name::<M>());
        let slot = Arc::new(Slot {
            conn,
            state: Mutex::new(SlotState::Pending),
        });
        connections.insert(TypeId::of::<M>(), slot.clone());
        Ok(slot)
    }

    /// Remove `slot` if it is still `M`'s.
    fn evict<M: 'static>(&self, slot: &Arc<Slot>) -> Result<()> {
        let mut connections = self.lock()?;
        if connections
            .get(&TypeId::of::<M>())
            .map_or(false, |current| Arc::ptr_eq(current, slot))
        {
            connections.remove(&TypeId::of::<M>());
            debug!("Evicted {} for {}", slot.conn.id(), type_name::<M>());
        }
        Ok(())
    }

    /// The cached connection for `M`, if there is one, initialized or not.
    pub fn get<M: 'static>(&self) -> Result<Option<Arc<Connection>>> {
        Ok(self.lock()?.get(&TypeId::of::<M>()).map(|slot| slot.conn.clone()))
    }

    /// The cached connection for `M`, opening and caching one from `config` if there isn't one yet.  Does not
    /// initialize it.
    pub fn resolve<M: 'static>(&self, config: &ConnectionConfig) -> Result<Arc<Connection>> {
        Ok(self.slot::<M>(config)?.conn.clone())
    }

    /// Like [ConnectionRegistry::resolve], but the connection is passed to `init` first unless it has already been
    /// initialized, including connections cached by a plain `resolve`.
    ///
    /// Callers for the same model wait for one another; other models are not blocked.  If `init` fails the connection
    /// is evicted, so the next resolve starts from a fresh store.  `init` may resolve other models but must not resolve
    /// `M` itself.
    pub fn resolve_with<M: 'static>(
        &self,
        config: &ConnectionConfig,
        init: impl FnOnce(&Connection) -> Result<()>,
    ) -> Result<Arc<Connection>> {
        loop {
            let slot = self.slot::<M>(config)?;
            let mut state = slot.state.lock().map_err(|_| Error::Poisoned)?;
            match *state {
                SlotState::Ready => return Ok(slot.conn.clone()),
                // Someone else's init failed and evicted it; the next lookup opens a fresh slot.
                SlotState::Failed => continue,
                SlotState::Pending => {
                    return match init(&slot.conn) {
                        Ok(()) => {
                            *state = SlotState::Ready;
                            Ok(slot.conn.clone())
                        }
                        Err(e) => {
                            *state = SlotState::Failed;
                            self.evict::<M>(&slot)?;
                            Err(e)
                        }
                    };
                }
            }
        }
    }

    /// Forget `M`'s connection.  The store goes away once the last handle to it is dropped.
    pub fn reset<M: 'static>(&self) -> Result<()> {
        if let Some(slot) = self.lock()?.remove(&TypeId::of::<M>()) {
            debug!("Dropped {} for {}", slot.conn.id(), type_name::<M>());
        }
        Ok(())
    }

    pub fn reset_all(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
