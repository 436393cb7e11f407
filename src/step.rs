// src/step.rs

//! Step producers and step failure reasons.
//!
//! A [`Step`] is a cloneable, no-argument operation that starts some
//! asynchronous work and hands back a future settling exactly once. The
//! queue of a [`Sequence`](crate::Sequence) is a list of these.
//!
//! A failed step surfaces as a [`StepError`]. The underlying reason is kept
//! behind an `Arc` so the exact same value reaches every listener of the
//! sequence and of any scheduler it is registered with.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinError;

/// Future returned by a step producer.
pub type StepFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

type Producer = Arc<dyn Fn() -> StepFuture + Send + Sync>;

/// A single unit of work in a sequence queue.
///
/// Cloning a `Step` is cheap and shares the same producer, which is what
/// lets one sequence splice the pending steps of another.
#[derive(Clone)]
pub struct Step {
    label: Arc<str>,
    produce: Producer,
}

impl Step {
    /// Wrap a closure returning a future.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::labelled("step", f)
    }

    /// Same as [`Step::new`], with a label shown in tracing output.
    pub fn labelled<F, Fut>(label: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            produce: Arc::new(move || Box::pin(f()) as StepFuture),
        }
    }

    /// A step that resolves after `duration` and does nothing else.
    pub fn delay(duration: Duration) -> Self {
        Self::labelled(format!("delay({duration:?})"), move || async move {
            tokio::time::sleep(duration).await;
            Ok(())
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Call the producer, starting the step's work.
    pub fn invoke(&self) -> StepFuture {
        (self.produce)()
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// Opaque reason a step failed.
#[derive(Clone)]
pub struct StepError(Arc<anyhow::Error>);

impl StepError {
    pub fn new(err: anyhow::Error) -> Self {
        Self(Arc::new(err))
    }

    /// Build a reason from a plain message.
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self::new(anyhow::Error::msg(message))
    }

    /// Convert a failed step task into a reason. Panics carry their message.
    pub(crate) fn from_join(err: JoinError) -> Self {
        if err.is_panic() {
            let message = panic_message(err.into_panic());
            Self::new(anyhow::anyhow!("step panicked: {message}"))
        } else {
            Self::new(anyhow::anyhow!("step task was cancelled"))
        }
    }

    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// True when both values carry the very same underlying reason.
    pub fn ptr_eq(&self, other: &StepError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<anyhow::Error> for StepError {
    fn from(err: anyhow::Error) -> Self {
        Self::new(err)
    }
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl fmt::Debug for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl std::error::Error for StepError {}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<&'static str>() {
        Ok(s) => (*s).to_string(),
        Err(payload) => match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(_) => "<non-string panic payload>".to_string(),
        },
    }
}

/// Anything that can be appended to a sequence queue.
///
/// Implemented for [`Step`], for plain closures returning a future, and for
/// `&Sequence` (which splices that sequence's pending steps).
pub trait Enqueue {
    fn into_steps(self) -> Vec<Step>;
}

impl Enqueue for Step {
    fn into_steps(self) -> Vec<Step> {
        vec![self]
    }
}

impl<F, Fut> Enqueue for F
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn into_steps(self) -> Vec<Step> {
        vec![Step::new(self)]
    }
}
