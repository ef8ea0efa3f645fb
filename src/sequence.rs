
use std::iter::FusedIterator;
use std::ops::Index;

/// A finite sequence of states that can be walked one step at a time
///
/// Implementors supply the first state and a successor function.  `advance` replaces the
/// state with its successor and returns `true`, or, when the state was the final element,
/// resets it to the first element and returns `false`.  That wraparound is what ends a
/// traversal.
///
/// Three traversal disciplines are built on top of this contract:
/// - [Materialized], which stores every state up front for O(1) indexed access
/// - [ForwardIter], a lazy forward-only [Iterator] holding one state at a time
/// - [BidirectionalCursor], for sequences that also implement [ReversibleSequence]
///
pub trait Sequence {
    type State: Clone;

    /// The first state, or `None` if the sequence has no states at all
    fn first(&self) -> Option<Self::State>;

    /// Steps `state` to its successor.  Returns `false` if it wrapped around to [first](Sequence::first)
    fn advance(&self, state: &mut Self::State) -> bool;

    /// Computes and stores every state of the sequence, in order
    fn materialize(&self) -> Materialized<Self::State>
        where Self: Sized
    {
        Materialized::new(self)
    }

    /// Returns a lazy iterator over the sequence, starting at [first](Sequence::first)
    fn iter_forward(&self) -> ForwardIter<'_, Self>
        where Self: Sized
    {
        ForwardIter::new(self)
    }

    /// Counts the states by stepping through the whole sequence
    fn count_states(&self) -> u64
        where Self: Sized
    {
        let mut count = 0;
        if let Some(mut state) = self.first() {
            count += 1;
            while self.advance(&mut state) {
                count += 1;
            }
        }
        count
    }
}

/// A [Sequence] that can also be walked backwards from its final state
pub trait ReversibleSequence: Sequence {

    /// The final state, or `None` if the sequence has no states at all
    fn last(&self) -> Option<Self::State>;

    /// Steps `state` to its predecessor.  Returns `false` if it wrapped around to [last](ReversibleSequence::last)
    fn retreat(&self, state: &mut Self::State) -> bool;

    /// Returns a cursor positioned before the first state
    fn cursor(&self) -> BidirectionalCursor<'_, Self>
        where Self: Sized
    {
        BidirectionalCursor::new(self)
    }

    /// Returns a lazy iterator over the sequence in reverse, starting at [last](ReversibleSequence::last)
    fn iter_backward(&self) -> BackwardIter<'_, Self>
        where Self: Sized
    {
        BackwardIter {
            cursor: BidirectionalCursor::at_end(self),
        }
    }
}

/// Every state of a [Sequence], stored in traversal order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized<S> {
    states: Vec<S>,
}

impl<S: Clone> Materialized<S> {
    pub fn new<Q: Sequence<State=S>>(sequence: &Q) -> Self {

        let mut states = vec![];
        if let Some(mut state) = sequence.first() {
            loop {
                states.push(state.clone());
                if !sequence.advance(&mut state) {
                    break;
                }
            }
        }
        Self { states }
    }
    pub fn len(&self) -> usize {
        self.states.len()
    }
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
    pub fn get(&self, index: usize) -> Option<&S> {
        self.states.get(index)
    }
    pub fn first(&self) -> Option<&S> {
        self.states.first()
    }
    pub fn last(&self) -> Option<&S> {
        self.states.last()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.states.iter()
    }
    pub fn as_slice(&self) -> &[S] {
        &self.states
    }
    pub fn into_vec(self) -> Vec<S> {
        self.states
    }
}

impl<S> Index<usize> for Materialized<S> {
    type Output = S;

    fn index(&self, index: usize) -> &S {
        &self.states[index]
    }
}

impl<'m, S> IntoIterator for &'m Materialized<S> {
    type Item = &'m S;
    type IntoIter = std::slice::Iter<'m, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.states.iter()
    }
}

/// Where a [ForwardIter] is in its traversal
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor<S> {
    Fresh,
    At(S),
    Exhausted,
}

/// A lazy, forward-only iterator over a [Sequence]
///
/// Holds exactly one state.  The iterator ends on the step where `advance` reports
/// wraparound, and can be rewound with [restart](ForwardIter::restart).
pub struct ForwardIter<'s, Q: Sequence> {
    sequence: &'s Q,
    cursor: Cursor<Q::State>,
}

impl<'s, Q: Sequence> ForwardIter<'s, Q> {
    pub fn new(sequence: &'s Q) -> Self {
        Self {
            sequence,
            cursor: Cursor::Fresh,
        }
    }
    /// Rewinds the iterator so the next call to `next` yields the first state again
    pub fn restart(&mut self) {
        self.cursor = Cursor::Fresh;
    }
    pub fn is_exhausted(&self) -> bool {
        matches!(self.cursor, Cursor::Exhausted)
    }
}

impl<Q: Sequence> Iterator for ForwardIter<'_, Q> {
    type Item = Q::State;

    fn next(&mut self) -> Option<Q::State> {

        match std::mem::replace(&mut self.cursor, Cursor::Exhausted) {
            Cursor::Fresh => {
                let state = self.sequence.first()?;
                self.cursor = Cursor::At(state.clone());
                Some(state)
            },
            Cursor::At(mut state) => {
                if self.sequence.advance(&mut state) {
                    self.cursor = Cursor::At(state.clone());
                    Some(state)
                } else {
                    None
                }
            },
            Cursor::Exhausted => None,
        }
    }
}

impl<Q: Sequence> FusedIterator for ForwardIter<'_, Q> {}

/// The position of a [BidirectionalCursor]
///
/// The two boundary variants are distinct so that stepping off one end and then stepping
/// back returns to the element at that same end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position<S> {
    BeforeFirst,
    At(S),
    AfterLast,
}

/// A cursor that can step both ways through a [ReversibleSequence]
///
/// Stepping past either end parks the cursor on the matching boundary, and further steps
/// in the same direction stay there.  A step in the opposite direction re-enters the
/// sequence at that end.
pub struct BidirectionalCursor<'s, Q: ReversibleSequence> {
    sequence: &'s Q,
    position: Position<Q::State>,
}

impl<'s, Q: ReversibleSequence> BidirectionalCursor<'s, Q> {
    pub fn new(sequence: &'s Q) -> Self {
        Self {
            sequence,
            position: Position::BeforeFirst,
        }
    }
    pub fn at_end(sequence: &'s Q) -> Self {
        Self {
            sequence,
            position: Position::AfterLast,
        }
    }
    pub fn position(&self) -> &Position<Q::State> {
        &self.position
    }
    pub fn current(&self) -> Option<&Q::State> {
        match &self.position {
            Position::At(state) => Some(state),
            _ => None,
        }
    }
    /// Steps forward, returning the new current state, or `None` if the cursor went past the end
    pub fn move_next(&mut self) -> Option<Q::State> {

        self.position = match std::mem::replace(&mut self.position, Position::AfterLast) {
            Position::BeforeFirst => match self.sequence.first() {
                Some(state) => Position::At(state),
                None => Position::AfterLast,
            },
            Position::At(mut state) => {
                if self.sequence.advance(&mut state) {
                    Position::At(state)
                } else {
                    Position::AfterLast
                }
            },
            Position::AfterLast => Position::AfterLast,
        };
        self.current().cloned()
    }
    /// Steps backward, returning the new current state, or `None` if the cursor went past the front
    pub fn move_prev(&mut self) -> Option<Q::State> {

        self.position = match std::mem::replace(&mut self.position, Position::BeforeFirst) {
            Position::AfterLast => match self.sequence.last() {
                Some(state) => Position::At(state),
                None => Position::BeforeFirst,
            },
            Position::At(mut state) => {
                if self.sequence.retreat(&mut state) {
                    Position::At(state)
                } else {
                    Position::BeforeFirst
                }
            },
            Position::BeforeFirst => Position::BeforeFirst,
        };
        self.current().cloned()
    }
}

impl<Q: ReversibleSequence> Iterator for BidirectionalCursor<'_, Q> {
    type Item = Q::State;

    fn next(&mut self) -> Option<Q::State> {
        self.move_next()
    }
}

/// A lazy iterator over a [ReversibleSequence], from the last state to the first
pub struct BackwardIter<'s, Q: ReversibleSequence> {
    cursor: BidirectionalCursor<'s, Q>,
}

impl<Q: ReversibleSequence> Iterator for BackwardIter<'_, Q> {
    type Item = Q::State;

    fn next(&mut self) -> Option<Q::State> {
        self.cursor.move_prev()
    }
}

impl<Q: ReversibleSequence> FusedIterator for BackwardIter<'_, Q> {}
