//! A pool of match scratch states, so that concurrent searches with one
//! regex each get exclusive use of a state without allocating per search.

use crate::classicalbacktrack;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

/// The closure used to create new states.
pub(crate) type StatePoolFn = Box<dyn Fn() -> classicalbacktrack::State + Send + Sync>;

/// The pool of VM states owned by each regex.
pub(crate) type StatePool = Pool<classicalbacktrack::State, StatePoolFn>;

/// A thread safe pool. Values are checked out with `get` and returned when
/// the guard drops.
pub(crate) struct Pool<T, F> {
    /// Values ready to hand out.
    stack: Mutex<Vec<Box<T>>>,

    /// Creates more values when the stack is empty.
    create: F,
}

impl<T, F> Pool<T, F> {
    pub(crate) fn new(create: F) -> Pool<T, F> {
        Pool {
            stack: Mutex::new(Vec::new()),
            create,
        }
    }

    /// A panic while holding the lock cannot leave the stack inconsistent,
    /// so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<Box<T>>> {
        self.stack.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The number of idle values.
    #[cfg(test)]
    fn idle(&self) -> usize {
        self.lock().len()
    }
}

impl<T: Send, F: Fn() -> T> Pool<T, F> {
    /// Get a value from the pool, creating one if none is idle.
    pub(crate) fn get(&self) -> PoolGuard<'_, T, F> {
        let value = self.lock().pop();
        let value = value.unwrap_or_else(|| Box::new((self.create)()));
        PoolGuard {
            pool: self,
            value: Some(value),
        }
    }

    fn put_value(&self, value: Box<T>) {
        self.lock().push(value);
    }
}

impl<T: fmt::Debug, F> fmt::Debug for Pool<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("stack", &self.stack).finish()
    }
}

/// A guard that is returned when a caller requests a value from the pool.
pub(crate) struct PoolGuard<'a, T: Send, F: Fn() -> T> {
    pool: &'a Pool<T, F>,
    /// This is None after the guard has been put back into the pool.
    value: Option<Box<T>>,
}

impl<'a, T: Send, F: Fn() -> T> Drop for PoolGuard<'a, T, F> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.put_value(value);
        }
    }
}

impl<'a, T: Send, F: Fn() -> T> std::ops::Deref for PoolGuard<'a, T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.value.as_deref() {
            Some(value) => value,
            None => unreachable!("Pool value used after being returned"),
        }
    }
}

impl<'a, T: Send, F: Fn() -> T> std::ops::DerefMut for PoolGuard<'a, T, F> {
    fn deref_mut(&mut self) -> &mut T {
        match self.value.as_deref_mut() {
            Some(value) => value,
            None => unreachable!("Pool value used after being returned"),
        }
    }
}

impl<'a, T: Send + fmt::Debug, F: Fn() -> T> fmt::Debug for PoolGuard<'a, T, F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PoolGuard")
            .field("value", &self.value)
            .finish()
    }
}
