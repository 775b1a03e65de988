//! Registered hook lists
//!
//! The page invokes hooks after every navigation mutation or click
//! dispatch. Registration hands back an id; removal by id makes
//! attach/detach cycles exact, with no wrapping of page internals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Identifies one registered hook within its list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// An ordered list of registered hooks
///
/// Hooks run in registration order. The list is snapshotted before
/// invocation, so a hook may register or remove hooks on its own list.
pub struct HookList<F: ?Sized> {
    entries: Mutex<Vec<(HookId, Arc<F>)>>,
    next_id: AtomicU64,
}

impl<F: ?Sized> HookList<F> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Add a hook to the end of the list
    pub fn register(&self, hook: Arc<F>) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .expect("hook list lock poisoned")
            .push((id, hook));
        id
    }

    /// Remove a previously registered hook; false if the id is not present
    pub fn remove(&self, id: HookId) -> bool {
        let mut entries = self.entries.lock().expect("hook list lock poisoned");
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("hook list lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every hook in registration order
    pub fn emit<G>(&self, mut call: G)
    where
        G: FnMut(&F),
    {
        let hooks: Vec<Arc<F>> = {
            let entries = self.entries.lock().expect("hook list lock poisoned");
            entries.iter().map(|(_, hook)| Arc::clone(hook)).collect()
        };
        for hook in &hooks {
            call(hook);
        }
    }
}

impl<F: ?Sized> Default for HookList<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type Probe = dyn Fn(&mut Vec<&'static str>) + Send + Sync;

    #[test]
    fn test_hooks_run_in_registration_order() {
        let list: HookList<Probe> = HookList::new();
        list.register(Arc::new(|log: &mut Vec<&'static str>| log.push("first")));
        list.register(Arc::new(|log: &mut Vec<&'static str>| log.push("second")));

        let mut log = Vec::new();
        list.emit(|hook| hook(&mut log));
        assert_eq!(log, vec!["first", "second"]);
    }

    #[test]
    fn test_removed_hook_no_longer_runs() {
        let list: HookList<Probe> = HookList::new();
        list.register(Arc::new(|log: &mut Vec<&'static str>| log.push("keep")));
        let id = list.register(Arc::new(|log: &mut Vec<&'static str>| log.push("gone")));
        assert!(list.remove(id));

        let mut log = Vec::new();
        list.emit(|hook| hook(&mut log));
        assert_eq!(log, vec!["keep"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let list: HookList<Probe> = HookList::new();
        let id = list.register(Arc::new(|_: &mut Vec<&'static str>| {}));

        assert!(list.remove(id));
        assert!(!list.remove(id));
        assert!(list.is_empty());
    }

    #[test]
    fn test_ids_stay_unique_across_removal() {
        let list: HookList<Probe> = HookList::new();
        let first = list.register(Arc::new(|_: &mut Vec<&'static str>| {}));
        list.remove(first);
        let second = list.register(Arc::new(|_: &mut Vec<&'static str>| {}));
        assert_ne!(first, second);
    }

    #[test]
    fn test_hook_may_touch_its_own_list() {
        // Registration from inside emit must not deadlock; the new hook
        // only runs on the next emit.
        let list: Arc<HookList<dyn Fn() + Send + Sync>> = Arc::new(HookList::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let inner_list = Arc::clone(&list);
        let inner_calls = Arc::clone(&calls);
        list.register(Arc::new(move || {
            let counted = Arc::clone(&inner_calls);
            inner_list.register(Arc::new(move || {
                counted.fetch_add(1, Ordering::SeqCst);
            }));
        }));

        list.emit(|hook| hook());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(list.len(), 2);

        list.emit(|hook| hook());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
