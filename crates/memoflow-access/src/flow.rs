#![forbid(unsafe_code)]

//! Stateless flow primitives: values pass through without being stored.
//!
//! | Type | Capabilities |
//! |---|---|
//! | [`Pusher`] | [`Push`] + [`Put`]: `set` forwards to listeners |
//! | [`Generator`] | [`Generate`] |
//! | [`Puller`] | [`Generate`] + [`Pull`]: pulling generates |
//! | [`FlowController`] | [`Generate`] + [`Push`]: `transfer` generates and pushes |
//! | [`ReadableFlowController`] | [`FlowController`] + [`Pull`]: pulling returns the last transferred value |
//! | [`CheckableFlowController`] | [`FlowController`] + [`Pull`]: pulling generates |
//! | [`Sink`] | [`Put`] only |
//!
//! [`ReadableFlowController`] is the one exception to "nothing is stored": it
//! keeps the last value it transferred.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::capability::{Access, Generate, Pull, Push, Put};
use crate::listener::{Listener, ListenerSet, Subscription};

/// Push-only source: every `set` is forwarded to listeners, nothing is kept.
pub struct Pusher<V> {
    listeners: Rc<ListenerSet<V>>,
}

impl<V> Clone for Pusher<V> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<V> fmt::Debug for Pusher<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pusher")
            .field("listeners", &self.listeners)
            .finish()
    }
}

impl<V: 'static> Default for Pusher<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: 'static> Pusher<V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(ListenerSet::new()),
        }
    }

    /// Push `value` to every listener.
    pub fn set(&self, value: impl Into<Option<V>>) {
        let value = value.into();
        self.listeners.notify(value.as_ref());
    }

    /// Number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<V: 'static> Push<V> for Pusher<V> {
    fn subscribe(&self, listener: Listener<V>) -> Subscription {
        self.listeners.subscribe(listener)
    }
}

impl<V: 'static> Put<V> for Pusher<V> {
    fn put(&self, value: Option<V>) {
        self.set(value);
    }
}

impl<V: 'static> Access<V> for Pusher<V> {
    fn push_access(self: Rc<Self>) -> Option<Rc<dyn Push<V>>> {
        Some(self)
    }
}

type GenerateFn<V> = Rc<dyn Fn() -> Option<V>>;

/// Generate-only source wrapping a closure.
pub struct Generator<V> {
    generate: GenerateFn<V>,
}

impl<V> Clone for Generator<V> {
    fn clone(&self) -> Self {
        Self {
            generate: Rc::clone(&self.generate),
        }
    }
}

impl<V> fmt::Debug for Generator<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator").finish_non_exhaustive()
    }
}

impl<V> Generator<V> {
    #[must_use]
    pub fn new(generate: impl Fn() -> Option<V> + 'static) -> Self {
        Self {
            generate: Rc::new(generate),
        }
    }
}

impl<V> Generate<V> for Generator<V> {
    fn generate(&self) -> Option<V> {
        (self.generate)()
    }
}

impl<V: 'static> Access<V> for Generator<V> {
    fn generate_access(self: Rc<Self>) -> Option<Rc<dyn Generate<V>>> {
        Some(self)
    }
}

/// Generator that can also be pulled: each pull generates a new value.
pub struct Puller<V> {
    generator: Generator<V>,
}

impl<V> Clone for Puller<V> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
        }
    }
}

impl<V> fmt::Debug for Puller<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Puller").finish_non_exhaustive()
    }
}

impl<V> Puller<V> {
    #[must_use]
    pub fn new(generate: impl Fn() -> Option<V> + 'static) -> Self {
        Self {
            generator: Generator::new(generate),
        }
    }
}

impl<V> Generate<V> for Puller<V> {
    fn generate(&self) -> Option<V> {
        self.generator.generate()
    }
}

impl<V> Pull<V> for Puller<V> {
    fn get(&self) -> Option<V> {
        self.generator.generate()
    }
}

impl<V: 'static> Access<V> for Puller<V> {
    fn pull_access(self: Rc<Self>) -> Option<Rc<dyn Pull<V>>> {
        Some(self)
    }

    fn generate_access(self: Rc<Self>) -> Option<Rc<dyn Generate<V>>> {
        Some(self)
    }
}

/// Generator wired to listeners: [`transfer()`](Self::transfer) moves one
/// generated value to every listener.
pub struct FlowController<V> {
    generator: Generator<V>,
    readers: Rc<ListenerSet<V>>,
}

impl<V> Clone for FlowController<V> {
    fn clone(&self) -> Self {
        Self {
            generator: self.generator.clone(),
            readers: Rc::clone(&self.readers),
        }
    }
}

impl<V> fmt::Debug for FlowController<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowController")
            .field("readers", &self.readers)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> FlowController<V> {
    #[must_use]
    pub fn new(generate: impl Fn() -> Option<V> + 'static) -> Self {
        Self {
            generator: Generator::new(generate),
            readers: Rc::new(ListenerSet::new()),
        }
    }

    /// Generate one value and push it to every reader.
    ///
    /// The generator is not called when nobody listens. Returns whether a
    /// value was transferred.
    pub fn transfer(&self) -> bool {
        if self.readers.is_empty() {
            return false;
        }
        let value = self.generator.generate();
        self.readers.notify(value.as_ref());
        true
    }
}

impl<V> Generate<V> for FlowController<V> {
    fn generate(&self) -> Option<V> {
        self.generator.generate()
    }
}

impl<V: 'static> Push<V> for FlowController<V> {
    fn subscribe(&self, listener: Listener<V>) -> Subscription {
        self.readers.subscribe(listener)
    }
}

impl<V: 'static> Access<V> for FlowController<V> {
    fn push_access(self: Rc<Self>) -> Option<Rc<dyn Push<V>>> {
        Some(self)
    }

    fn generate_access(self: Rc<Self>) -> Option<Rc<dyn Generate<V>>> {
        Some(self)
    }
}

/// Flow controller remembering what it transferred.
///
/// [`get()`](Pull::get) returns the value of the last
/// [`transfer()`](Self::transfer), `None` before the first one. Unlike
/// [`FlowController`], every transfer generates, since the controller itself
/// is a reader.
pub struct ReadableFlowController<V> {
    flow: FlowController<V>,
    last: Rc<RefCell<Option<V>>>,
}

impl<V> Clone for ReadableFlowController<V> {
    fn clone(&self) -> Self {
        Self {
            flow: self.flow.clone(),
            last: Rc::clone(&self.last),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for ReadableFlowController<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadableFlowController")
            .field("last", &self.last.borrow())
            .field("readers", &self.flow.readers)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> ReadableFlowController<V> {
    #[must_use]
    pub fn new(generate: impl Fn() -> Option<V> + 'static) -> Self {
        Self {
            flow: FlowController::new(generate),
            last: Rc::new(RefCell::new(None)),
        }
    }

    /// Generate one value, remember it, then push it to every reader.
    ///
    /// # Panics
    ///
    /// Panics if a reader calls `transfer` on the same controller. Reading
    /// the remembered value from a reader is fine.
    pub fn transfer(&self) {
        let value = self.flow.generator.generate();
        *self.last.borrow_mut() = value;
        let last = self.last.borrow();
        self.flow.readers.notify(last.as_ref());
    }

    /// Number of live readers, not counting the controller itself.
    #[must_use]
    pub fn reader_count(&self) -> usize {
        self.flow.readers.len()
    }
}

impl<V: Clone> Pull<V> for ReadableFlowController<V> {
    fn get(&self) -> Option<V> {
        self.last.borrow().clone()
    }
}

impl<V> Generate<V> for ReadableFlowController<V> {
    fn generate(&self) -> Option<V> {
        self.flow.generate()
    }
}

impl<V: 'static> Push<V> for ReadableFlowController<V> {
    fn subscribe(&self, listener: Listener<V>) -> Subscription {
        self.flow.subscribe(listener)
    }
}

impl<V: Clone + 'static> Access<V> for ReadableFlowController<V> {
    fn pull_access(self: Rc<Self>) -> Option<Rc<dyn Pull<V>>> {
        Some(self)
    }

    fn push_access(self: Rc<Self>) -> Option<Rc<dyn Push<V>>> {
        Some(self)
    }

    fn generate_access(self: Rc<Self>) -> Option<Rc<dyn Generate<V>>> {
        Some(self)
    }
}

/// Flow controller whose pull previews the source: each
/// [`get()`](Pull::get) generates a value without transferring it.
pub struct CheckableFlowController<V> {
    flow: FlowController<V>,
}

impl<V> Clone for CheckableFlowController<V> {
    fn clone(&self) -> Self {
        Self {
            flow: self.flow.clone(),
        }
    }
}

impl<V> fmt::Debug for CheckableFlowController<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckableFlowController")
            .field("readers", &self.flow.readers)
            .finish_non_exhaustive()
    }
}

impl<V: 'static> CheckableFlowController<V> {
    #[must_use]
    pub fn new(generate: impl Fn() -> Option<V> + 'static) -> Self {
        Self {
            flow: FlowController::new(generate),
        }
    }

    /// See [`FlowController::transfer`].
    pub fn transfer(&self) -> bool {
        self.flow.transfer()
    }
}

impl<V> Pull<V> for CheckableFlowController<V> {
    fn get(&self) -> Option<V> {
        self.flow.generate()
    }
}

impl<V> Generate<V> for CheckableFlowController<V> {
    fn generate(&self) -> Option<V> {
        self.flow.generate()
    }
}

impl<V: 'static> Push<V> for CheckableFlowController<V> {
    fn subscribe(&self, listener: Listener<V>) -> Subscription {
        self.flow.subscribe(listener)
    }
}

impl<V: 'static> Access<V> for CheckableFlowController<V> {
    fn pull_access(self: Rc<Self>) -> Option<Rc<dyn Pull<V>>> {
        Some(self)
    }

    fn push_access(self: Rc<Self>) -> Option<Rc<dyn Push<V>>> {
        Some(self)
    }

    fn generate_access(self: Rc<Self>) -> Option<Rc<dyn Generate<V>>> {
        Some(self)
    }
}

/// Write-only endpoint forwarding stored values to a closure.
pub struct Sink<V> {
    accept: Rc<dyn Fn(Option<V>)>,
}

impl<V> Clone for Sink<V> {
    fn clone(&self) -> Self {
        Self {
            accept: Rc::clone(&self.accept),
        }
    }
}

impl<V> fmt::Debug for Sink<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}

impl<V> Sink<V> {
    #[must_use]
    pub fn new(accept: impl Fn(Option<V>) + 'static) -> Self {
        Self {
            accept: Rc::new(accept),
        }
    }
}

impl<V> Put<V> for Sink<V> {
    fn put(&self, value: Option<V>) {
        (self.accept)(value);
    }
}

impl<V> Access<V> for Sink<V> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn counter(start: i32) -> Puller<i32> {
        let next = Cell::new(start);
        Puller::new(move || {
            let value = next.get();
            next.set(value + 1);
            Some(value)
        })
    }

    #[test]
    fn puller_generates_on_each_pull() {
        let counter = counter(-345);
        assert_eq!(counter.get(), Some(-345));
        assert_eq!(counter.get(), Some(-344));
        assert_eq!(counter.generate(), Some(-343));
    }

    #[test]
    fn pusher_forwards_without_storing() {
        let pusher = Pusher::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = pusher.subscribe(Box::new(move |v: Option<&i32>| {
            seen_clone.borrow_mut().push(v.copied());
        }));

        pusher.set(8);
        pusher.set(None);
        pusher.put(Some(-4));
        assert_eq!(*seen.borrow(), vec![Some(8), None, Some(-4)]);
    }

    #[test]
    fn pusher_exposes_push_only() {
        let pusher = Rc::new(Pusher::<i32>::new());
        assert!(Rc::clone(&pusher).pull_access().is_none());
        assert!(Rc::clone(&pusher).push_access().is_some());
        assert!(pusher.generate_access().is_none());
    }

    #[test]
    fn generator_reads_external_state() {
        let shared = Rc::new(Cell::new(5));
        let reader = Rc::clone(&shared);
        let generator = Generator::new(move || Some(reader.get()));
        assert_eq!(generator.generate(), Some(5));
        shared.set(-2);
        assert_eq!(generator.generate(), Some(-2));
    }

    #[test]
    fn flow_controller_skips_generation_without_readers() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = Rc::clone(&calls);
        let flow = FlowController::new(move || {
            calls_clone.set(calls_clone.get() + 1);
            Some(calls_clone.get())
        });

        assert!(!flow.transfer());
        assert_eq!(calls.get(), 0);

        let received = Rc::new(Cell::new(0));
        let received_clone = Rc::clone(&received);
        let _sub = flow.subscribe(Box::new(move |v: Option<&i32>| {
            received_clone.set(v.copied().unwrap_or_default());
        }));
        assert!(flow.transfer());
        assert_eq!(calls.get(), 1);
        assert_eq!(received.get(), 1);
    }

    #[test]
    fn flow_controller_exposes_push_and_generate() {
        let flow = Rc::new(FlowController::new(|| Some(1)));
        assert!(Rc::clone(&flow).pull_access().is_none());
        assert!(Rc::clone(&flow).push_access().is_some());
        assert!(flow.generate_access().is_some());
    }

    #[test]
    fn readable_flow_controller_remembers_last_transfer() {
        let source = Rc::new(Cell::new(3));
        let reader = Rc::clone(&source);
        let flow = ReadableFlowController::new(move || Some(reader.get()));
        assert_eq!(flow.get(), None);

        flow.transfer();
        assert_eq!(flow.get(), Some(3));

        source.set(-7);
        assert_eq!(flow.get(), Some(3));
        assert_eq!(flow.generate(), Some(-7));
        assert_eq!(flow.get(), Some(3));

        flow.transfer();
        assert_eq!(flow.get(), Some(-7));
    }

    #[test]
    fn readable_flow_controller_transfers_without_readers() {
        let calls = Rc::new(Cell::new(0));
        let calls_clone = Rc::clone(&calls);
        let flow = ReadableFlowController::new(move || {
            calls_clone.set(calls_clone.get() + 1);
            Some(calls_clone.get())
        });
        assert_eq!(flow.reader_count(), 0);

        flow.transfer();
        assert_eq!(calls.get(), 1);
        assert_eq!(flow.get(), Some(1));
    }

    #[test]
    fn readable_flow_controller_readers_can_read_back() {
        let flow = ReadableFlowController::new(|| Some(11));
        let reader = flow.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = flow.subscribe(Box::new(move |v: Option<&i32>| {
            seen_clone.borrow_mut().push((v.copied(), reader.get()));
        }));

        flow.transfer();
        assert_eq!(*seen.borrow(), vec![(Some(11), Some(11))]);
    }

    #[test]
    fn checkable_flow_controller_pull_generates() {
        let next = Rc::new(Cell::new(0));
        let counter = Rc::clone(&next);
        let flow = CheckableFlowController::new(move || {
            counter.set(counter.get() + 1);
            Some(counter.get())
        });
        assert_eq!(flow.get(), Some(1));
        assert_eq!(flow.get(), Some(2));

        assert!(!flow.transfer());
        let received = Rc::new(Cell::new(0));
        let received_clone = Rc::clone(&received);
        let _sub = flow.subscribe(Box::new(move |v: Option<&i32>| {
            received_clone.set(v.copied().unwrap_or_default());
        }));
        assert!(flow.transfer());
        assert_eq!(received.get(), 3);
    }

    #[test]
    fn controllers_expose_pull_push_and_generate() {
        let readable = Rc::new(ReadableFlowController::new(|| Some(1)));
        assert!(Rc::clone(&readable).pull_access().is_some());
        assert!(Rc::clone(&readable).push_access().is_some());
        assert!(readable.generate_access().is_some());

        let checkable = Rc::new(CheckableFlowController::new(|| Some(1)));
        assert!(Rc::clone(&checkable).pull_access().is_some());
        assert!(Rc::clone(&checkable).push_access().is_some());
        assert!(checkable.generate_access().is_some());
    }

    #[test]
    fn sink_exposes_nothing_readable() {
        let stored = Rc::new(Cell::new(None));
        let stored_clone = Rc::clone(&stored);
        let sink = Rc::new(Sink::new(move |v: Option<i32>| stored_clone.set(v)));
        sink.put(Some(3));
        assert_eq!(stored.get(), Some(3));

        assert!(Rc::clone(&sink).pull_access().is_none());
        assert!(Rc::clone(&sink).push_access().is_none());
        assert!(sink.generate_access().is_none());
    }
}
