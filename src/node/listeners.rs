//! src/node/listeners.rs
//!
//! Keyed listener lists with snapshot dispatch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::{Rc, Weak};

type Callback<A> = Rc<dyn Fn(&A)>;

struct ListenerMap<K, A: ?Sized> {
    next_id: u64,
    by_key: HashMap<K, Vec<(u64, Callback<A>)>>,
}

/// Listener registry keyed by `K`, dispatching `&A` to callbacks.
///
/// Dispatch iterates over a snapshot of the list, so listeners registered or
/// removed by a running callback only take effect on the next `trigger`.
pub struct Listeners<K, A: ?Sized> {
    inner: Rc<RefCell<ListenerMap<K, A>>>,
}

impl<K, A> Listeners<K, A>
where
    K: Hash + Eq + Clone + 'static,
    A: ?Sized + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(ListenerMap {
                next_id: 0,
                by_key: HashMap::new(),
            })),
        }
    }

    pub fn on<F>(&self, key: K, f: F) -> Subscription
    where
        F: Fn(&A) + 'static,
    {
        let id = {
            let mut map = self.inner.borrow_mut();
            map.next_id += 1;
            let id = map.next_id;
            map.by_key
                .entry(key.clone())
                .or_default()
                .push((id, Rc::new(f)));
            id
        };

        let weak: Weak<RefCell<ListenerMap<K, A>>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                let mut map = inner.borrow_mut();
                if let Some(list) = map.by_key.get_mut(&key) {
                    list.retain(|(listener_id, _)| *listener_id != id);
                }
            }
        })
    }

    pub fn trigger(&self, key: &K, args: &A) {
        let snapshot: Vec<Callback<A>> = match self.inner.borrow().by_key.get(key) {
            Some(list) => list.iter().map(|(_, f)| f.clone()).collect(),
            None => return,
        };
        for f in snapshot {
            f(args);
        }
    }

    pub fn len(&self, key: &K) -> usize {
        self.inner.borrow().by_key.get(key).map_or(0, Vec::len)
    }

    pub fn off_all(&self) {
        self.inner.borrow_mut().by_key.clear();
    }
}

impl<K, A> Default for Listeners<K, A>
where
    K: Hash + Eq + Clone + 'static,
    A: ?Sized + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Unsubscribe handle returned by every `on`.
///
/// Dropping it keeps the listener registered; call [`Subscription::unsubscribe`].
#[must_use = "keep the subscription to be able to unsubscribe"]
pub struct Subscription {
    off: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    fn new(off: impl FnOnce() + 'static) -> Self {
        Self {
            off: Some(Box::new(off)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(off) = self.off.take() {
            off();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.off.is_some())
            .finish()
    }
}
