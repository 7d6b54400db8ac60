//! Maps navigation and app lifecycle signals onto reminder pause/resume.
//!
//! The coordinator keeps no state besides the current route. Each signal is
//! handled by exactly one rule:
//!
//! | Signal                    | Reaction                                 |
//! |---------------------------|------------------------------------------|
//! | route -> session screen   | pause                                    |
//! | route -> any other route  | resume                                   |
//! | app went to background    | resume                                   |
//! | app came to foreground    | resume unless on the session screen      |
//! | session started           | pause                                    |
//! | session finished          | resume unless on the session screen      |
//! | shutdown                  | stop                                     |
//!
//! Scheduler pause/resume are idempotent, so any interleaving converges.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, mpsc};

use crate::events::Event;
use crate::reminder::ReminderScheduler;

/// Route of the active training screen.
pub const DEFAULT_SESSION_ROUTE: &str = "active-training";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "signal", content = "route", rename_all = "snake_case")]
pub enum LifecycleSignal {
    RouteChanged(String),
    Foreground,
    Background,
    SessionStarted,
    SessionFinished,
    Shutdown,
}

impl LifecycleSignal {
    /// The lifecycle meaning of a session event, if any.
    pub fn from_event(event: &Event) -> Option<Self> {
        match event {
            Event::SessionStarted { .. } => Some(Self::SessionStarted),
            Event::SessionFinished { .. } => Some(Self::SessionFinished),
            _ => None,
        }
    }
}

/// What the coordinator asked of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    Pause,
    Resume,
    Stop,
    None,
}

/// Anything that yields lifecycle signals without blocking.
pub trait SignalSource {
    fn next_signal(&mut self) -> Option<LifecycleSignal>;
}

impl SignalSource for mpsc::UnboundedReceiver<LifecycleSignal> {
    fn next_signal(&mut self) -> Option<LifecycleSignal> {
        self.try_recv().ok()
    }
}

impl SignalSource for VecDeque<LifecycleSignal> {
    fn next_signal(&mut self) -> Option<LifecycleSignal> {
        self.pop_front()
    }
}

pub struct LifecycleCoordinator {
    scheduler: Arc<ReminderScheduler>,
    session_route: String,
    current_route: Option<String>,
    on_session_screen: bool,
}

impl LifecycleCoordinator {
    pub fn new(scheduler: Arc<ReminderScheduler>, session_route: impl Into<String>) -> Self {
        let session_route = normalize_route(&session_route.into()).to_string();
        Self {
            scheduler,
            session_route,
            current_route: None,
            on_session_screen: false,
        }
    }

    pub fn scheduler(&self) -> &Arc<ReminderScheduler> {
        &self.scheduler
    }

    pub fn on_session_screen(&self) -> bool {
        self.on_session_screen
    }

    pub fn current_route(&self) -> Option<&str> {
        self.current_route.as_deref()
    }

    pub fn is_session_route(&self, route: &str) -> bool {
        let route = normalize_route(route);
        route == self.session_route
            || route
                .strip_prefix(self.session_route.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn handle(&mut self, signal: LifecycleSignal) -> Reaction {
        let reaction = match &signal {
            LifecycleSignal::RouteChanged(route) => {
                self.on_session_screen = self.is_session_route(route);
                self.current_route = Some(route.clone());
                if self.on_session_screen {
                    Reaction::Pause
                } else {
                    Reaction::Resume
                }
            }
            LifecycleSignal::Background => Reaction::Resume,
            LifecycleSignal::Foreground | LifecycleSignal::SessionFinished => {
                if self.on_session_screen {
                    Reaction::None
                } else {
                    Reaction::Resume
                }
            }
            LifecycleSignal::SessionStarted => Reaction::Pause,
            LifecycleSignal::Shutdown => Reaction::Stop,
        };

        match reaction {
            Reaction::Pause => {
                self.scheduler.pause();
            }
            Reaction::Resume => {
                self.scheduler.resume();
            }
            Reaction::Stop => self.scheduler.stop(),
            Reaction::None => {}
        }
        tracing::debug!(?signal, ?reaction, "lifecycle signal");
        reaction
    }

    /// Handle every signal currently available. Returns how many ran.
    pub fn pump(&mut self, source: &mut dyn SignalSource) -> usize {
        let mut handled = 0;
        while let Some(signal) = source.next_signal() {
            self.handle(signal);
            handled += 1;
        }
        handled
    }

    /// Handle signals until the channel closes or `Shutdown` arrives.
    pub async fn run(mut self, mut signals: mpsc::UnboundedReceiver<LifecycleSignal>) -> Self {
        while let Some(signal) = signals.recv().await {
            let shutdown = signal == LifecycleSignal::Shutdown;
            self.handle(signal);
            if shutdown {
                break;
            }
        }
        self
    }
}

/// Forward session start/finish events as lifecycle signals until either
/// side closes.
pub async fn forward_session_events(
    mut events: broadcast::Receiver<Event>,
    signals: mpsc::UnboundedSender<LifecycleSignal>,
) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(signal) = LifecycleSignal::from_event(&event) {
                    if signals.send(signal).is_err() {
                        break;
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "lifecycle forwarder lagged behind session events");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn normalize_route(route: &str) -> &str {
    let end = route.find(|c: char| c == '?' || c == '#').unwrap_or(route.len());
    route[..end].trim_matches('/')
}
