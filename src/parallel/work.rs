//! Work functions, their outputs and the arguments they are sliced over
//!
//! A [`Work`] declares which protocol it speaks:
//!
//! - [`Work::Returning`]: the closure returns its [`Output`] directly.
//! - [`Work::Reporting`]: the closure receives a [`Reporter`] bound to its worker
//!   index and writes its result into that slot instead of returning it.
//!
//! Backends adapt either protocol to whatever they need internally, so the same
//! work value can be handed to any backend or run sequentially.

use crate::parallel::partition::Slice;
use crossbeam::channel::{Sender, bounded};

/// What a single work invocation yields
pub type WorkResult<V> = anyhow::Result<Output<V>>;

/// Value produced by one work invocation, or the final reduced value
#[derive(Debug, Clone, PartialEq)]
pub enum Output<V> {
    /// A single value (one result field)
    Scalar(V),
    /// A fixed-size ordered tuple of result fields
    Fields(Vec<V>),
    /// Nothing was computed
    Empty,
}

impl<V> Output<V> {
    pub fn fields(values: impl IntoIterator<Item = V>) -> Self {
        Output::Fields(values.into_iter().collect())
    }

    pub fn pair(first: V, second: V) -> Self {
        Output::Fields(vec![first, second])
    }

    /// Number of result fields, `None` for `Empty`
    pub fn width(&self) -> Option<usize> {
        match self {
            Output::Scalar(_) => Some(1),
            Output::Fields(values) => Some(values.len()),
            Output::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Empty)
    }

    pub fn as_scalar(&self) -> Option<&V> {
        match self {
            Output::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_scalar(self) -> Option<V> {
        match self {
            Output::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Flatten into the list of result fields
    pub fn into_fields(self) -> Vec<V> {
        match self {
            Output::Scalar(value) => vec![value],
            Output::Fields(values) => values,
            Output::Empty => Vec::new(),
        }
    }
}

/// Indexed result slot handed to [`Work::Reporting`] closures
///
/// Consumed on use, so a worker reports at most once. Dropping it without
/// reporting leaves the slot unfilled, which the backend treats as a failed run.
pub struct Reporter<V> {
    worker: usize,
    tx: Sender<WorkResult<V>>,
}

impl<V> Reporter<V> {
    pub(crate) fn new(worker: usize, tx: Sender<WorkResult<V>>) -> Self {
        Self { worker, tx }
    }

    /// Index of the worker (and slice) this slot belongs to
    pub fn worker(&self) -> usize {
        self.worker
    }

    pub fn put(self, output: Output<V>) {
        self.report(Ok(output));
    }

    /// Report an application error from inside the worker
    pub fn fail(self, error: impl Into<anyhow::Error>) {
        self.report(Err(error.into()));
    }

    pub fn report(self, result: WorkResult<V>) {
        if self.tx.send(result).is_err() {
            tracing::trace!("Result slot for worker-{} was already closed", self.worker);
        }
    }
}

/// Result protocol a work function speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    ReturnValue,
    IndexedSlot,
}

type ReturningFn<P, V> = Box<dyn Fn(P) -> WorkResult<V> + Send + Sync>;
type ReportingFn<P, V> = Box<dyn Fn(P, Reporter<V>) + Send + Sync>;

/// Caller-supplied computation over one argument part
pub enum Work<P, V> {
    Returning(ReturningFn<P, V>),
    Reporting(ReportingFn<P, V>),
}

impl<P, V> Work<P, V> {
    pub fn returning<F>(f: F) -> Self
    where
        F: Fn(P) -> WorkResult<V> + Send + Sync + 'static,
    {
        Work::Returning(Box::new(f))
    }

    pub fn reporting<F>(f: F) -> Self
    where
        F: Fn(P, Reporter<V>) + Send + Sync + 'static,
    {
        Work::Reporting(Box::new(f))
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Work::Returning(_) => Protocol::ReturnValue,
            Work::Reporting(_) => Protocol::IndexedSlot,
        }
    }

    /// Run the work and hand back its result as a return value
    ///
    /// `None` means the reporter was dropped without filling its slot. A
    /// reporter handed to another thread is waited for.
    pub fn call(&self, part: P, worker: usize) -> Option<WorkResult<V>> {
        match self {
            Work::Returning(f) => Some(f(part)),
            Work::Reporting(f) => {
                let (tx, rx) = bounded(1);
                f(part, Reporter::new(worker, tx));
                rx.recv().ok()
            }
        }
    }

    /// Run the work and deliver its result through `reporter`
    pub fn report(&self, part: P, reporter: Reporter<V>) {
        match self {
            Work::Returning(f) => reporter.report(f(part)),
            Work::Reporting(f) => f(part, reporter),
        }
    }
}

impl<P, V> std::fmt::Debug for Work<P, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Work").field(&self.protocol()).finish()
    }
}

/// Argument sequences that can be cut into contiguous parts
///
/// Tuples slice every member with the same bounds; the first member governs the
/// length.
pub trait Sliceable: Sync {
    type Part: Send;

    fn governing_len(&self) -> usize;

    fn slice(&self, bounds: Slice) -> Self::Part;

    /// The full, unsliced argument
    fn whole(&self) -> Self::Part {
        self.slice(Slice::new(0, self.governing_len()))
    }
}

impl<T: Clone + Send + Sync> Sliceable for Vec<T> {
    type Part = Vec<T>;

    fn governing_len(&self) -> usize {
        self.len()
    }

    fn slice(&self, bounds: Slice) -> Vec<T> {
        self[bounds.clamped(self.len())].to_vec()
    }

    fn whole(&self) -> Vec<T> {
        self.clone()
    }
}

impl<'a, T: Sync> Sliceable for &'a [T] {
    type Part = &'a [T];

    fn governing_len(&self) -> usize {
        self.len()
    }

    fn slice(&self, bounds: Slice) -> &'a [T] {
        &self[bounds.clamped(self.len())]
    }

    fn whole(&self) -> &'a [T] {
        self
    }
}

impl<A: Sliceable, B: Sliceable> Sliceable for (A, B) {
    type Part = (A::Part, B::Part);

    fn governing_len(&self) -> usize {
        self.0.governing_len()
    }

    fn slice(&self, bounds: Slice) -> Self::Part {
        (self.0.slice(bounds), self.1.slice(bounds))
    }

    fn whole(&self) -> Self::Part {
        (self.0.whole(), self.1.whole())
    }
}

impl<A: Sliceable, B: Sliceable, C: Sliceable> Sliceable for (A, B, C) {
    type Part = (A::Part, B::Part, C::Part);

    fn governing_len(&self) -> usize {
        self.0.governing_len()
    }

    fn slice(&self, bounds: Slice) -> Self::Part {
        (self.0.slice(bounds), self.1.slice(bounds), self.2.slice(bounds))
    }

    fn whole(&self) -> Self::Part {
        (self.0.whole(), self.1.whole(), self.2.whole())
    }
}

/// Work bound to its arguments, erased to what backends need
pub trait Job<V>: Sync {
    fn governing_len(&self) -> usize;

    fn protocol(&self) -> Protocol;

    /// Run one slice, returning its result
    fn run(&self, worker: usize, slice: Slice) -> Option<WorkResult<V>>;

    /// Run one slice, delivering its result through `reporter`
    fn report(&self, slice: Slice, reporter: Reporter<V>);

    /// Run once over the full arguments
    fn run_whole(&self) -> Option<WorkResult<V>>;
}

pub(crate) struct BoundJob<'a, A: Sliceable, V> {
    work: &'a Work<A::Part, V>,
    args: &'a A,
}

impl<'a, A: Sliceable, V> BoundJob<'a, A, V> {
    pub(crate) fn new(work: &'a Work<A::Part, V>, args: &'a A) -> Self {
        Self { work, args }
    }
}

impl<A: Sliceable, V> Job<V> for BoundJob<'_, A, V> {
    fn governing_len(&self) -> usize {
        self.args.governing_len()
    }

    fn protocol(&self) -> Protocol {
        self.work.protocol()
    }

    fn run(&self, worker: usize, slice: Slice) -> Option<WorkResult<V>> {
        self.work.call(self.args.slice(slice), worker)
    }

    fn report(&self, slice: Slice, reporter: Reporter<V>) {
        self.work.report(self.args.slice(slice), reporter);
    }

    fn run_whole(&self) -> Option<WorkResult<V>> {
        self.work.call(self.args.whole(), 0)
    }
}
