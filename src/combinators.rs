use std::iter::FusedIterator;

use crate::action::ActionSequence;
use crate::sequence::{LazySequence, LimitWhile, UntilNone};

enum ConcatState {
    First,
    Second,
    Done,
}

/// All elements of `first`, then all elements of `second`.
///
/// `second` is not pulled until `first` is exhausted, and `first` is not pulled again
/// afterwards.
pub struct Concat<A, B> {
    first: A,
    second: B,
    state: ConcatState,
}

impl<A, B> Concat<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Concat {
            first,
            second,
            state: ConcatState::First,
        }
    }
}

impl<A, B> Iterator for Concat<A, B>
where
    A: Iterator,
    B: Iterator<Item = A::Item>,
{
    type Item = A::Item;

    fn next(&mut self) -> Option<A::Item> {
        loop {
            match self.state {
                ConcatState::First => match self.first.next() {
                    Some(item) => return Some(item),
                    None => self.state = ConcatState::Second,
                },
                ConcatState::Second => match self.second.next() {
                    Some(item) => return Some(item),
                    None => {
                        self.state = ConcatState::Done;
                        return None;
                    }
                },
                ConcatState::Done => return None,
            }
        }
    }
}

impl<A, B> FusedIterator for Concat<A, B>
where
    A: Iterator,
    B: Iterator<Item = A::Item>,
{
}

/// Drains a sequence and then closes it.
pub struct AutoClose<'a, T> {
    source: LazySequence<'a, T>,
    closed: bool,
}

impl<'a, T: 'a> Iterator for AutoClose<'a, T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.closed {
            return None;
        }
        let item = self.source.next();
        if item.is_none() {
            self.source.close();
            self.closed = true;
        }
        item
    }
}

impl<'a, T: 'a> FusedIterator for AutoClose<'a, T> {}

/// Joins two sequences.
pub fn concat<'a, A, B>(first: A, second: B) -> LazySequence<'a, A::Item>
where
    A: IntoIterator,
    B: IntoIterator<Item = A::Item>,
    A::Item: 'a,
    A::IntoIter: 'a,
    B::IntoIter: 'a,
{
    LazySequence::new(Concat::new(first.into_iter(), second.into_iter()))
}

/// Runs `action` once the consumer has pulled past the last element of `target`.
///
/// A consumer that stops early never triggers the action.
pub fn append_action<'a, I, F>(target: I, action: F) -> LazySequence<'a, I::Item>
where
    I: IntoIterator,
    I::Item: 'a,
    I::IntoIter: 'a,
    F: FnOnce() + 'a,
{
    LazySequence::new(Concat::new(target.into_iter(), ActionSequence::new(action)))
}

/// Closes `source` once it has been fully drained.
///
/// Abandoning the returned sequence early leaves `source` unclosed; callers that may stop
/// early have to release the underlying resource themselves.
pub fn with_auto_close<'a, T: 'a>(source: LazySequence<'a, T>) -> LazySequence<'a, T> {
    LazySequence::new(AutoClose {
        source,
        closed: false,
    })
}

/// Chaining versions of the sequence combinators.
pub trait SequenceExt: Iterator + Sized {
    /// See [`limit_while`](crate::limit_while).
    fn limit_while<P>(self, predicate: P) -> LimitWhile<Self, P>
    where
        P: FnMut(&Self::Item) -> bool,
    {
        LimitWhile::new(self, predicate)
    }

    /// See [`concat`](crate::concat).
    fn concat<B>(self, other: B) -> Concat<Self, B::IntoIter>
    where
        B: IntoIterator<Item = Self::Item>,
    {
        Concat::new(self, other.into_iter())
    }

    /// See [`append_action`](crate::append_action).
    fn on_consume<F>(self, action: F) -> Concat<Self, ActionSequence<Self::Item, F>>
    where
        F: FnOnce(),
    {
        Concat::new(self, ActionSequence::new(action))
    }

    /// Values up to the first `None`; see [`until_sentinel`](crate::until_sentinel).
    fn till_none<T>(self) -> UntilNone<Self>
    where
        Self: Iterator<Item = Option<T>>,
    {
        UntilNone::new(self)
    }

    /// Erases the iterator type.
    fn into_lazy<'a>(self) -> LazySequence<'a, Self::Item>
    where
        Self: 'a,
        Self::Item: 'a,
    {
        LazySequence::new(self)
    }
}

impl<I: Iterator> SequenceExt for I {}

impl<'a, T: 'a> LazySequence<'a, T> {
    /// See [`with_auto_close`].
    pub fn auto_close(self) -> LazySequence<'a, T> {
        with_auto_close(self)
    }
}
