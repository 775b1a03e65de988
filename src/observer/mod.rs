//! Page observer
//!
//! Bridges a page to the coordinator. While a recording session is live
//! the observer keeps capture hooks installed on the page and forwards
//! every formatted snippet, fire-and-forget. It learns about session
//! starts and stops from the coordinator's control broadcast and never
//! reads coordinator state after its initial startup query.

mod snippet;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::coordinator::{ControlSignal, CoordinatorHandle};
use crate::page::{ElementSnapshot, HookId, NavigationEvent, Page};

/// Hook registrations from one attach, removed together on detach
struct InstalledHooks {
    click: HookId,
    mutation: HookId,
    traversal: HookId,
    fragment: HookId,
}

pub struct Observer {
    page: Arc<Page>,
    coordinator: CoordinatorHandle,
    installed: Option<InstalledHooks>,
}

impl Observer {
    /// Creates an observer for `page`.
    ///
    /// Queries the coordinator exactly once and attaches immediately when
    /// a recording session is already live, so sessions survive a page
    /// swap. An unreachable coordinator counts as idle.
    pub async fn connect(page: Arc<Page>, coordinator: CoordinatorHandle) -> Self {
        let mut observer = Observer {
            page,
            coordinator,
            installed: None,
        };
        if observer.coordinator.status().await.is_recording() {
            observer.attach();
        }
        observer
    }

    /// Applies one control signal
    pub fn handle_signal(&mut self, signal: ControlSignal) {
        match signal {
            ControlSignal::StartCapture => self.attach(),
            ControlSignal::StopCapture | ControlSignal::Shutdown => self.detach(),
        }
    }

    /// Processes control signals until shutdown
    pub async fn run(mut self, mut signals: broadcast::Receiver<ControlSignal>) {
        loop {
            match signals.recv().await {
                Ok(ControlSignal::Shutdown) => {
                    self.detach();
                    break;
                }
                Ok(signal) => self.handle_signal(signal),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Missed {} control signals", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("Observer stopped");
    }

    fn attach(&mut self) {
        if self.installed.is_some() {
            debug!("Capture hooks already attached");
            return;
        }
        info!("Attaching capture hooks");

        self.coordinator
            .record_event(snippet::url_change(&self.page.url()));

        let coordinator = self.coordinator.clone();
        let click = self
            .page
            .click_hooks
            .register(Arc::new(move |snapshot: &ElementSnapshot| {
                for snip in snippet::click_snippets(snapshot) {
                    coordinator.record_event(snip);
                }
            }));

        let coordinator = self.coordinator.clone();
        let mutation = self
            .page
            .mutation_hooks
            .register(Arc::new(move |event: &NavigationEvent| {
                coordinator.record_event(snippet::url_change(&event.url));
            }));

        let coordinator = self.coordinator.clone();
        let traversal = self
            .page
            .traversal_hooks
            .register(Arc::new(move |event: &NavigationEvent| {
                coordinator.record_event(snippet::url_change(&event.url));
            }));

        let coordinator = self.coordinator.clone();
        let fragment = self
            .page
            .fragment_hooks
            .register(Arc::new(move |event: &NavigationEvent| {
                coordinator.record_event(snippet::url_change(&event.url));
            }));

        self.installed = Some(InstalledHooks {
            click,
            mutation,
            traversal,
            fragment,
        });
    }

    fn detach(&mut self) {
        let hooks = match self.installed.take() {
            Some(hooks) => hooks,
            None => {
                debug!("Capture hooks not attached");
                return;
            }
        };
        info!("Detaching capture hooks");
        self.page.click_hooks.remove(hooks.click);
        self.page.mutation_hooks.remove(hooks.mutation);
        self.page.traversal_hooks.remove(hooks.traversal);
        self.page.fragment_hooks.remove(hooks.fragment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::create_coordinator;
    use crate::page::ElementSpec;

    fn hook_footprint(page: &Page) -> (usize, usize, usize, usize) {
        (
            page.click_hooks.len(),
            page.mutation_hooks.len(),
            page.traversal_hooks.len(),
            page.fragment_hooks.len(),
        )
    }

    fn snapshot_from_json(json: &str) -> ElementSnapshot {
        let spec: ElementSpec = serde_json::from_str(json).unwrap();
        ElementSnapshot::from_spec(&spec).unwrap()
    }

    #[tokio::test]
    async fn test_attach_twice_installs_hooks_once() {
        let (coordinator, handle) = create_coordinator();
        tokio::spawn(coordinator.run());
        let page = Arc::new(Page::new("https://shop.example/"));

        let mut observer = Observer::connect(page.clone(), handle).await;
        observer.attach();
        observer.attach();

        assert_eq!(hook_footprint(&page), (1, 1, 1, 1));
    }

    #[tokio::test]
    async fn test_detach_without_attach_is_a_noop() {
        let (coordinator, handle) = create_coordinator();
        tokio::spawn(coordinator.run());
        let page = Arc::new(Page::new("https://shop.example/"));

        let mut observer = Observer::connect(page.clone(), handle).await;
        observer.detach();

        assert_eq!(hook_footprint(&page), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_detach_restores_the_pre_attach_footprint() {
        let (coordinator, handle) = create_coordinator();
        tokio::spawn(coordinator.run());
        let page = Arc::new(Page::new("https://shop.example/"));
        page.click_hooks.register(Arc::new(|_: &ElementSnapshot| {}));
        page.mutation_hooks.register(Arc::new(|_: &NavigationEvent| {}));

        let mut observer = Observer::connect(page.clone(), handle).await;
        let before = hook_footprint(&page);

        observer.attach();
        observer.detach();
        assert_eq!(hook_footprint(&page), before);

        observer.attach();
        observer.detach();
        assert_eq!(hook_footprint(&page), before);
    }

    #[tokio::test]
    async fn test_connect_attaches_when_a_session_is_live() {
        let (coordinator, handle) = create_coordinator();
        tokio::spawn(coordinator.run());
        handle.start().await;

        let page = Arc::new(Page::new("https://shop.example/"));
        let observer = Observer::connect(page.clone(), handle).await;

        assert!(observer.installed.is_some());
        assert_eq!(hook_footprint(&page), (1, 1, 1, 1));
    }

    #[tokio::test]
    async fn test_connect_stays_detached_without_a_coordinator() {
        let (coordinator, handle) = create_coordinator();
        drop(coordinator);

        let page = Arc::new(Page::new("https://shop.example/"));
        let observer = Observer::connect(page.clone(), handle).await;

        assert!(observer.installed.is_none());
        assert_eq!(hook_footprint(&page), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_stop_signal_detaches() {
        let (coordinator, handle) = create_coordinator();
        tokio::spawn(coordinator.run());
        let page = Arc::new(Page::new("https://shop.example/"));

        let mut observer = Observer::connect(page.clone(), handle).await;
        observer.handle_signal(ControlSignal::StartCapture);
        assert_eq!(hook_footprint(&page), (1, 1, 1, 1));

        observer.handle_signal(ControlSignal::StopCapture);
        assert!(observer.installed.is_none());
        assert_eq!(hook_footprint(&page), (0, 0, 0, 0));
    }

    #[tokio::test]
    async fn test_clicks_and_navigations_reach_session_data() {
        let (coordinator, handle) = create_coordinator();
        tokio::spawn(coordinator.run());
        handle.start().await;

        let page = Arc::new(Page::new("https://shop.example/"));
        let _observer = Observer::connect(page.clone(), handle.clone()).await;

        page.dispatch_click(&snapshot_from_json(r#"{"tag":"div"}"#));
        page.push_url("https://shop.example/cart");

        let data = handle.data().await.unwrap();
        assert_eq!(
            data,
            "/* URL CHANGE */\nhttps://shop.example/\n-----\n\
             /* ELEMENT HTML */\n<div></div>\n-----\n\
             /* URL CHANGE */\nhttps://shop.example/cart"
        );
    }
}
