//! Producer/consumer plumbing shared by every stage
//!
//! Each stage implements [`Stream`]: it turns one input batch into one output
//! batch with [`Stream::produce`], hands that output to every registered
//! [`Consumer`], and then returns it to the caller. Stages are chained by
//! registering the next stage, wrapped in `Rc<RefCell<_>>`, as a consumer of
//! the previous one.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::event::DrawEvent;
use crate::index_range::IndexRange;

/// A structural change to one of a stage's output items.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    /// A new item was appended at this index
    Added(usize),
    /// The item at this index changed within the given element range
    Updated(usize, IndexRange),
    /// The item at this index will not change again
    Completed(usize),
    /// An input event no stage understood, passed along untouched
    Unhandled(DrawEvent),
}

impl Delta {
    /// Index of the item this delta refers to, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Delta::Added(index) | Delta::Updated(index, _) | Delta::Completed(index) => {
                Some(*index)
            }
            Delta::Unhandled(_) => None,
        }
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delta::Added(index) => write!(f, "added({index})"),
            Delta::Updated(index, range) => write!(f, "updated({index}, {range})"),
            Delta::Completed(index) => write!(f, "completed({index})"),
            Delta::Unhandled(event) => write!(f, "unhandled({})", event.identifier()),
        }
    }
}

/// Output of a stage: every item it currently holds plus what changed in
/// this batch.
///
/// Items are reference counted so handing a batch downstream is cheap. A
/// stage that later edits an item goes through `Rc::make_mut`, which only
/// copies it when a consumer is still holding the old version.
#[derive(Debug)]
pub struct Output<T> {
    pub items: Vec<Rc<T>>,
    pub deltas: Vec<Delta>,
}

impl<T> Output<T> {
    pub fn new(items: Vec<Rc<T>>, deltas: Vec<Delta>) -> Self {
        Self { items, deltas }
    }
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            deltas: self.deltas.clone(),
        }
    }
}

impl<T> Default for Output<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            deltas: Vec::new(),
        }
    }
}

/// Receives every batch a stage produces.
pub trait Consumer<T: ?Sized> {
    fn consume(&mut self, input: &T);
    fn reset(&mut self);
}

/// A closure registered with [`Stream::add_handler`]. Resetting it does
/// nothing.
struct FnConsumer<F>(F);

impl<T: ?Sized, F: FnMut(&T)> Consumer<T> for FnConsumer<F> {
    fn consume(&mut self, input: &T) {
        (self.0)(input)
    }

    fn reset(&mut self) {}
}

/// A chained stage consumes by producing.
impl<S: Stream> Consumer<S::Consumes> for Rc<RefCell<S>> {
    fn consume(&mut self, input: &S::Consumes) {
        self.borrow_mut().produce(input);
    }

    fn reset(&mut self) {
        self.borrow_mut().reset();
    }
}

/// The consumers registered on one stage, notified in registration order.
pub struct Consumers<T: ?Sized> {
    list: Vec<Box<dyn Consumer<T>>>,
}

impl<T: ?Sized> Consumers<T> {
    pub fn new() -> Self {
        Self { list: Vec::new() }
    }

    pub fn push(&mut self, consumer: Box<dyn Consumer<T>>) {
        self.list.push(consumer);
    }

    pub fn notify(&mut self, output: &T) {
        for consumer in &mut self.list {
            consumer.consume(output);
        }
    }

    pub fn reset(&mut self) {
        for consumer in &mut self.list {
            consumer.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl<T: ?Sized> Default for Consumers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Consumers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumers")
            .field("len", &self.list.len())
            .finish()
    }
}

/// One pipeline stage.
///
/// `produce` is synchronous: by the time it returns, every consumer has seen
/// the output. `reset` clears the stage back to its freshly constructed state
/// and resets every consumer after it.
///
/// Calling `reset` on a chained stage from inside one of its own consumers
/// re-borrows a stage that is already producing and panics.
pub trait Stream {
    type Consumes: ?Sized;
    type Produces;

    fn produce(&mut self, input: &Self::Consumes) -> Self::Produces;

    fn reset(&mut self);

    fn consumers_mut(&mut self) -> &mut Consumers<Self::Produces>;

    fn add_consumer<C>(&mut self, consumer: C)
    where
        C: Consumer<Self::Produces> + 'static,
    {
        self.consumers_mut().push(Box::new(consumer));
    }

    fn add_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Self::Produces) + 'static,
        Self::Produces: 'static,
    {
        self.consumers_mut().push(Box::new(FnConsumer(handler)));
    }

    /// Register `next` as a consumer of this stage and hand back a shared
    /// handle to it, so the caller can keep chaining and inspecting it.
    fn next_step<N>(&mut self, next: N) -> Rc<RefCell<N>>
    where
        N: Stream<Consumes = Self::Produces> + 'static,
    {
        let next = Rc::new(RefCell::new(next));
        self.add_consumer(Rc::clone(&next));
        next
    }
}
