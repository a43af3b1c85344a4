//! Single-slot reactive cell with manual force-notify
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type Callback<T> = Box<dyn FnMut(&T)>;

struct Entry<T> {
    id: u64,
    // Taken out for the duration of its own invocation so the callback can
    // re-enter the cell (read the value, cancel, subscribe).
    callback: Option<Callback<T>>,
}

struct Inner<T> {
    value: T,
    entries: Vec<Entry<T>>,
    next_id: u64,
    dispatch_depth: u32,
    // Cancellations requested mid-dispatch; applied when the round ends.
    pending_cancels: Vec<u64>,
    disposed: bool,
}

/// Handle returned by [`ObservableField::subscribe`].
///
/// Dropping the handle does not cancel the subscription; call
/// [`cancel`](Self::cancel) explicitly.
pub struct Subscription<T> {
    id: u64,
    inner: Weak<RefCell<Inner<T>>>,
}

impl<T> Subscription<T> {
    /// Stop the callback from being invoked again.
    ///
    /// Cancelling while a notification round is in flight leaves that round
    /// untouched; the callback stops firing from the next round on.
    pub fn cancel(self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut inner = inner.borrow_mut();
        if inner.dispatch_depth > 0 {
            inner.pending_cancels.push(self.id);
        } else {
            inner.entries.retain(|entry| entry.id != self.id);
        }
    }
}

/// Single-value reactive cell.
///
/// Holds the current value and a list of subscribers that are invoked
/// synchronously, in subscription order, whenever the value is written.
/// [`set`](Self::set) gates notification on equality; [`force_set`](Self::force_set)
/// notifies unconditionally, which is what mutations keyed by *identity*
/// (e.g. "this level was touched") need.
pub struct ObservableField<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> ObservableField<T> {
    /// Create a cell holding `value` with no subscribers.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                value,
                entries: Vec::new(),
                next_id: 0,
                dispatch_depth: 0,
                pending_cancels: Vec::new(),
                disposed: false,
            })),
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> T
    where
        T: Clone,
    {
        self.inner.borrow().value.clone()
    }

    /// Store `value`, notifying subscribers only when it differs from the
    /// previous value.
    ///
    /// # Panics
    ///
    /// Panics if the cell was disposed.
    pub fn set(&self, value: T)
    where
        T: PartialEq + Clone,
    {
        {
            let mut inner = self.inner.borrow_mut();
            assert!(!inner.disposed, "ObservableField::set after dispose");
            if inner.value == value {
                return;
            }
            inner.value = value;
        }
        Self::dispatch(&self.inner);
    }

    /// Store `value` and notify subscribers even when it is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the cell was disposed.
    pub fn force_set(&self, value: T)
    where
        T: Clone,
    {
        {
            let mut inner = self.inner.borrow_mut();
            assert!(!inner.disposed, "ObservableField::force_set after dispose");
            inner.value = value;
        }
        Self::dispatch(&self.inner);
    }

    /// Register `callback` to run synchronously on every notification.
    ///
    /// Subscribers added during a notification round are first invoked on
    /// the next round.
    ///
    /// # Panics
    ///
    /// Panics if the cell was disposed.
    pub fn subscribe(&self, callback: impl FnMut(&T) + 'static) -> Subscription<T> {
        let mut inner = self.inner.borrow_mut();
        assert!(!inner.disposed, "ObservableField::subscribe after dispose");
        let id = inner.next_id;
        inner.next_id += 1;
        inner.entries.push(Entry {
            id,
            callback: Some(Box::new(callback)),
        });
        Subscription {
            id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Drop every subscriber. Any later write or subscription panics.
    pub fn dispose(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.entries.clear();
        inner.pending_cancels.clear();
        inner.disposed = true;
    }

    fn dispatch(inner_rc: &Rc<RefCell<Inner<T>>>)
    where
        T: Clone,
    {
        let (ids, value) = {
            let mut inner = inner_rc.borrow_mut();
            inner.dispatch_depth += 1;
            let ids: Vec<u64> = inner.entries.iter().map(|entry| entry.id).collect();
            (ids, inner.value.clone())
        };

        for id in ids {
            let taken = {
                let mut inner = inner_rc.borrow_mut();
                if inner.disposed {
                    None
                } else {
                    inner
                        .entries
                        .iter_mut()
                        .find(|entry| entry.id == id)
                        .and_then(|entry| entry.callback.take())
                }
            };
            let Some(mut callback) = taken else {
                continue;
            };
            callback(&value);
            let mut inner = inner_rc.borrow_mut();
            if let Some(entry) = inner.entries.iter_mut().find(|entry| entry.id == id) {
                entry.callback = Some(callback);
            }
        }

        let mut inner = inner_rc.borrow_mut();
        inner.dispatch_depth -= 1;
        if inner.dispatch_depth == 0 && !inner.pending_cancels.is_empty() {
            let cancelled = std::mem::take(&mut inner.pending_cancels);
            inner.entries.retain(|entry| !cancelled.contains(&entry.id));
        }
    }
}
