use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use seqrun::{Scheduler, SchedulerEvent, Sequence, SequenceEvent};

/// Short lowercase name of an event, for compact assertions.
pub trait EventName {
    fn name(&self) -> &'static str;
}

impl EventName for SequenceEvent {
    fn name(&self) -> &'static str {
        match self {
            SequenceEvent::Started => "started",
            SequenceEvent::Progress { .. } => "progress",
            SequenceEvent::Finished => "finished",
            SequenceEvent::Stopped => "stopped",
            SequenceEvent::Error(_) => "error",
        }
    }
}

impl EventName for SchedulerEvent {
    fn name(&self) -> &'static str {
        match self {
            SchedulerEvent::Started => "started",
            SchedulerEvent::Finished => "finished",
            SchedulerEvent::Stopped => "stopped",
            SchedulerEvent::Error(_) => "error",
        }
    }
}

/// Collects every event emitted by a sequence or scheduler through a
/// synchronous listener, so nothing is ever lagged or missed.
pub struct EventLog<E> {
    events: Arc<Mutex<Vec<E>>>,
    notify: Arc<Notify>,
}

impl<E> Clone for EventLog<E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            notify: Arc::clone(&self.notify),
        }
    }
}

impl<E: Clone + EventName + Send + 'static> EventLog<E> {
    fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
        }
    }

    fn record(&self, event: &E) {
        self.events.lock().unwrap().push(event.clone());
        self.notify.notify_waiters();
    }

    pub fn events(&self) -> Vec<E> {
        self.events.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|e| e.name()).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().into_iter().filter(|n| *n == name).count()
    }

    /// Wait (up to 5 seconds) for the first event named `name`.
    pub async fn wait_for(&self, name: &str) -> E {
        crate::with_timeout(async {
            loop {
                let notified = self.notify.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();

                let found = self
                    .events
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|e| e.name() == name)
                    .cloned();
                if let Some(event) = found {
                    return event;
                }

                notified.await;
            }
        })
        .await
    }
}

impl EventLog<SequenceEvent> {
    pub fn attach(sequence: &Sequence) -> Self {
        let log = Self::new();
        let sink = log.clone();
        sequence.on(move |event| sink.record(event));
        log
    }
}

impl EventLog<SchedulerEvent> {
    pub fn attach_scheduler(scheduler: &Scheduler) -> Self {
        let log = Self::new();
        let sink = log.clone();
        scheduler.on(move |event| sink.record(event));
        log
    }
}
