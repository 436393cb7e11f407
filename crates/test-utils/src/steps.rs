use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;

use seqrun::Step;

/// Records which steps were invoked and which ran to completion.
///
/// Every step built from a probe pushes its label to `calls` when the
/// producer is invoked and to `completed` when its future resolves Ok.
#[derive(Clone, Default)]
pub struct Probe {
    calls: Arc<Mutex<Vec<String>>>,
    completed: Arc<Mutex<Vec<String>>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    /// A step that succeeds immediately.
    pub fn step(&self, label: &str) -> Step {
        self.delayed(label, 0)
    }

    /// A step that succeeds after `ms` milliseconds.
    pub fn delayed(&self, label: &str, ms: u64) -> Step {
        let probe = self.clone();
        let label = label.to_string();
        Step::labelled(label.clone(), move || {
            let probe = probe.clone();
            let label = label.clone();
            probe.calls.lock().unwrap().push(label.clone());
            async move {
                if ms > 0 {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                }
                probe.completed.lock().unwrap().push(label);
                Ok(())
            }
        })
    }

    /// A step that fails with `message` right away.
    pub fn failing(&self, label: &str, message: &'static str) -> Step {
        let probe = self.clone();
        let label = label.to_string();
        Step::labelled(label.clone(), move || {
            probe.calls.lock().unwrap().push(label.clone());
            async move { Err(anyhow::anyhow!(message)) }
        })
    }

    /// A step that succeeds once `gate` is opened.
    pub fn gated(&self, label: &str, gate: &Gate) -> Step {
        let probe = self.clone();
        let label = label.to_string();
        let gate = gate.clone();
        Step::labelled(label.clone(), move || {
            let probe = probe.clone();
            let label = label.clone();
            let gate = gate.clone();
            probe.calls.lock().unwrap().push(label.clone());
            async move {
                gate.wait().await;
                probe.completed.lock().unwrap().push(label);
                Ok(())
            }
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

/// One-way latch that gated steps wait on.
#[derive(Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn open(&self) {
        self.tx.send_replace(true);
    }

    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

/// A step failing with a plain message.
pub fn failing_step(message: &'static str) -> Step {
    Step::new(move || async move { Err(anyhow::anyhow!(message)) })
}

/// A step whose future panics with `message`.
pub fn panicking_step(message: &'static str) -> Step {
    Step::new(move || async move { panic!("{}", message) })
}
