//! In-process page model
//!
//! Stands in for the host platform: a history stack with the two
//! mutation primitives (push and replace), traversal and fragment
//! navigation, and click dispatch. Every change invokes the matching
//! hook list after the page state has been updated, so hooks always
//! observe the post-navigation URL.

mod element;
mod hooks;

pub use element::{ElementSnapshot, ElementSpec, NodeId, SnapshotError};
pub use hooks::{HookId, HookList};

use std::sync::Mutex;
use tracing::debug;

/// How a navigation happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// A new history entry was pushed
    Push,
    /// The current history entry was replaced
    Replace,
    /// Back or forward movement through existing entries
    Traverse,
    /// Only the URL fragment changed
    HashChange,
}

/// A completed navigation, delivered to hooks
#[derive(Debug, Clone)]
pub struct NavigationEvent {
    pub kind: NavigationKind,
    pub url: String,
}

pub type ClickHook = dyn Fn(&ElementSnapshot) + Send + Sync;
pub type NavigationHook = dyn Fn(&NavigationEvent) + Send + Sync;

#[derive(Debug)]
struct History {
    entries: Vec<String>,
    index: usize,
}

/// One page context
///
/// Hook lists are public so collaborators can register and remove their
/// own hooks; all state mutation goes through the navigation methods.
pub struct Page {
    history: Mutex<History>,
    pub click_hooks: HookList<ClickHook>,
    pub mutation_hooks: HookList<NavigationHook>,
    pub traversal_hooks: HookList<NavigationHook>,
    pub fragment_hooks: HookList<NavigationHook>,
}

impl Page {
    pub fn new(initial_url: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(History {
                entries: vec![initial_url.into()],
                index: 0,
            }),
            click_hooks: HookList::new(),
            mutation_hooks: HookList::new(),
            traversal_hooks: HookList::new(),
            fragment_hooks: HookList::new(),
        }
    }

    /// The current URL
    pub fn url(&self) -> String {
        let history = self.history.lock().expect("page history lock poisoned");
        history.entries[history.index].clone()
    }

    /// Push a new history entry, dropping any forward entries
    pub fn push_url(&self, url: impl Into<String>) {
        let url = url.into();
        {
            let mut history = self.history.lock().expect("page history lock poisoned");
            let keep = history.index + 1;
            history.entries.truncate(keep);
            history.entries.push(url.clone());
            history.index += 1;
        }
        debug!("URL pushed: {}", url);
        self.notify_mutation(NavigationKind::Push, url);
    }

    /// Replace the current history entry in place
    pub fn replace_url(&self, url: impl Into<String>) {
        let url = url.into();
        {
            let mut history = self.history.lock().expect("page history lock poisoned");
            let index = history.index;
            history.entries[index] = url.clone();
        }
        debug!("URL replaced: {}", url);
        self.notify_mutation(NavigationKind::Replace, url);
    }

    /// Move one entry back through history; false when already at the
    /// oldest entry (no hooks run in that case)
    pub fn back(&self) -> bool {
        let url = {
            let mut history = self.history.lock().expect("page history lock poisoned");
            if history.index == 0 {
                return false;
            }
            history.index -= 1;
            history.entries[history.index].clone()
        };
        debug!("History traversed back to: {}", url);
        let event = NavigationEvent {
            kind: NavigationKind::Traverse,
            url,
        };
        self.traversal_hooks.emit(|hook| hook(&event));
        true
    }

    /// Move one entry forward through history; false when already at the
    /// newest entry
    pub fn forward(&self) -> bool {
        let url = {
            let mut history = self.history.lock().expect("page history lock poisoned");
            if history.index + 1 >= history.entries.len() {
                return false;
            }
            history.index += 1;
            history.entries[history.index].clone()
        };
        debug!("History traversed forward to: {}", url);
        let event = NavigationEvent {
            kind: NavigationKind::Traverse,
            url,
        };
        self.traversal_hooks.emit(|hook| hook(&event));
        true
    }

    /// Change the URL fragment, pushing a history entry
    ///
    /// An unchanged fragment is a no-op. Only fragment hooks run, the
    /// mutation hooks model the two explicit history primitives.
    pub fn set_fragment(&self, fragment: &str) {
        let fragment = fragment.trim_start_matches('#');
        let url = {
            let mut history = self.history.lock().expect("page history lock poisoned");
            let current = history.entries[history.index].clone();
            let base = match current.find('#') {
                Some(pos) => &current[..pos],
                None => current.as_str(),
            };
            let url = format!("{}#{}", base, fragment);
            if url == current {
                return;
            }
            let keep = history.index + 1;
            history.entries.truncate(keep);
            history.entries.push(url.clone());
            history.index += 1;
            url
        };
        debug!("Fragment changed: {}", url);
        let event = NavigationEvent {
            kind: NavigationKind::HashChange,
            url,
        };
        self.fragment_hooks.emit(|hook| hook(&event));
    }

    /// Deliver a click to the click hooks
    pub fn dispatch_click(&self, snapshot: &ElementSnapshot) {
        self.click_hooks.emit(|hook| hook(snapshot));
    }

    fn notify_mutation(&self, kind: NavigationKind, url: String) {
        let event = NavigationEvent { kind, url };
        self.mutation_hooks.emit(|hook| hook(&event));
    }
}
