use std::iter::FusedIterator;
use std::marker::PhantomData;

use crate::sequence::LazySequence;

/// A sequence with no elements whose first pull runs a deferred action.
///
/// The action runs while the end of the sequence is being produced, so it fires even though
/// the consumer never observes an element. It never runs if the sequence is not pulled.
pub struct ActionSequence<T, F> {
    action: Option<F>,
    _item: PhantomData<fn() -> T>,
}

impl<T, F: FnOnce()> ActionSequence<T, F> {
    pub fn new(action: F) -> Self {
        ActionSequence {
            action: Some(action),
            _item: PhantomData,
        }
    }

    /// Whether the action has already run.
    pub fn fired(&self) -> bool {
        self.action.is_none()
    }
}

impl<T, F: FnOnce()> Iterator for ActionSequence<T, F> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if let Some(action) = self.action.take() {
            action();
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(0))
    }
}

impl<T, F: FnOnce()> FusedIterator for ActionSequence<T, F> {}

/// An empty sequence that calls `action` when it is read.
pub fn action_sequence<'a, T, F>(action: F) -> LazySequence<'a, T>
where
    T: 'a,
    F: FnOnce() + 'a,
{
    LazySequence::new(ActionSequence::new(action))
}
