//! Lock accessors that recover from poisoning.
//!
//! Every cache in the engine is mutated by short, synchronous critical sections. A panic inside one of them leaves the
//! cache in a state that is still internally consistent, so a poisoned lock is logged and used anyway.
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::*;

pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e: PoisonError<_>| {
        error!("🔒️ A cache lock was poisoned. Carrying on with its current contents.");
        e.into_inner()
    })
}

pub fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| {
        error!("🔒️ A registry lock was poisoned. Carrying on with its current contents.");
        e.into_inner()
    })
}

pub fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| {
        error!("🔒️ A registry lock was poisoned. Carrying on with its current contents.");
        e.into_inner()
    })
}
