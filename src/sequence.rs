//! The lazy, single-pass sequence and its sentinel-terminated constructors.

use std::fmt;
use std::iter::FusedIterator;

/// A pull-based, single-consumer sequence that is traversed at most once.
///
/// Elements are produced on demand by the wrapped iterator. A sequence can also carry close
/// handlers, which run when [`close`](LazySequence::close) is called. Dropping a sequence does
/// not run them.
pub struct LazySequence<'a, T> {
    source: Box<dyn Iterator<Item = T> + 'a>,
    close_handlers: Vec<Box<dyn FnOnce() + 'a>>,
}

impl<'a, T: 'a> LazySequence<'a, T> {
    pub fn new<I>(source: I) -> Self
    where
        I: Iterator<Item = T> + 'a,
    {
        LazySequence {
            source: Box::new(source),
            close_handlers: Vec::new(),
        }
    }

    /// A sequence without elements.
    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    /// Registers a handler to run when the sequence is closed.
    pub fn on_close<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() + 'a,
    {
        self.close_handlers.push(Box::new(handler));
        self
    }

    /// Runs the close handlers in registration order. Closing again does nothing.
    pub fn close(&mut self) {
        for handler in self.close_handlers.drain(..) {
            handler();
        }
    }
}

impl<T> Iterator for LazySequence<'_, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.source.next()
    }
}

impl<T> fmt::Debug for LazySequence<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazySequence")
            .field("close_handlers", &self.close_handlers.len())
            .finish_non_exhaustive()
    }
}

/// Yields elements of `source` while `predicate` holds.
///
/// The first element that fails the predicate is dropped, and from then on the source is
/// never pulled again.
pub struct LimitWhile<I, P> {
    source: I,
    predicate: P,
    stopped: bool,
}

impl<I, P> LimitWhile<I, P> {
    pub fn new(source: I, predicate: P) -> Self {
        LimitWhile {
            source,
            predicate,
            stopped: false,
        }
    }
}

impl<I, P> Iterator for LimitWhile<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if self.stopped {
            return None;
        }
        match self.source.next() {
            Some(item) if (self.predicate)(&item) => Some(item),
            _ => {
                self.stopped = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.stopped {
            (0, Some(0))
        } else {
            (0, self.source.size_hint().1)
        }
    }
}

impl<I, P> FusedIterator for LimitWhile<I, P>
where
    I: Iterator,
    P: FnMut(&I::Item) -> bool,
{
}

/// Yields the values of a sequence of `Option`s up to the first `None`.
pub struct UntilNone<I> {
    source: I,
    stopped: bool,
}

impl<I> UntilNone<I> {
    pub fn new(source: I) -> Self {
        UntilNone {
            source,
            stopped: false,
        }
    }
}

impl<I, T> Iterator for UntilNone<I>
where
    I: Iterator<Item = Option<T>>,
{
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.stopped {
            return None;
        }
        let item = self.source.next().flatten();
        if item.is_none() {
            self.stopped = true;
        }
        item
    }
}

impl<I, T> FusedIterator for UntilNone<I> where I: Iterator<Item = Option<T>> {}

/// Calls `generator` with the ordinals 0, 1, 2, … and yields its results up to the first
/// `None`. The generator is not called again after it has returned `None`.
///
/// ```rust
/// use json_array_stream::generate_until_sentinel;
///
/// let squares: Vec<usize> = generate_until_sentinel(|i| (i < 4).then_some(i * i)).collect();
/// assert_eq!(squares, [0, 1, 4, 9]);
/// ```
pub fn generate_until_sentinel<'a, T, F>(generator: F) -> LazySequence<'a, T>
where
    T: 'a,
    F: FnMut(usize) -> Option<T> + 'a,
{
    LazySequence::new(UntilNone::new((0usize..).map(generator)))
}

/// Yields elements of `source` until the first one for which `predicate` returns false.
pub fn limit_while<'a, I, P>(source: I, predicate: P) -> LazySequence<'a, I::Item>
where
    I: IntoIterator,
    I::Item: 'a,
    I::IntoIter: 'a,
    P: FnMut(&I::Item) -> bool + 'a,
{
    LazySequence::new(LimitWhile::new(source.into_iter(), predicate))
}

/// Yields the values of `source` up to its first `None`.
pub fn until_sentinel<'a, I, T>(source: I) -> LazySequence<'a, T>
where
    T: 'a,
    I: IntoIterator<Item = Option<T>>,
    I::IntoIter: 'a,
{
    LazySequence::new(UntilNone::new(source.into_iter()))
}
