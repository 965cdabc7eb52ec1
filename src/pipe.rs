//! One-shot continuations bound to the draw loop.
//!
//! A [`Pipe`] is a minimal future for single-threaded use: it resolves once, runs its
//! continuation between frames (never during a node's draw), and can simply be abandoned.
//! Used by tests and for chaining work across frames, such as follow-up navigation after a
//! tree action completes.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::ResizeError;
use crate::tree::LayoutTree;

enum PipeState<T> {
    /// Not resolved yet; holds the continuation, if one was chained.
    Pending(Option<Box<dyn FnOnce(T)>>),

    /// Resolved with a value nobody asked for yet.
    Resolved(T),

    /// The value has been handed to a continuation.
    Consumed,
}

/// A one-shot value bound to the main thread.
///
/// Cloning shares the same slot: resolving any clone resolves them all. At most one
/// continuation may be attached.
pub struct Pipe<T> {
    state: Rc<RefCell<PipeState<T>>>,
}

impl<T> Clone for Pipe<T> {
    fn clone(&self) -> Self {
        Self { state: self.state.clone() }
    }
}

impl<T: 'static> Pipe<T> {
    /// A pipe with no value yet.
    pub fn pending() -> Self {
        Self {
            state: Rc::new(RefCell::new(PipeState::Pending(None))),
        }
    }

    /// A pipe that already holds its value.
    pub fn resolved(value: T) -> Self {
        Self {
            state: Rc::new(RefCell::new(PipeState::Resolved(value))),
        }
    }

    /// Provide the value. Runs the chained continuation immediately if one is attached; a
    /// second resolution is ignored.
    pub fn resolve(&self, value: T) {
        let taken = std::mem::replace(&mut *self.state.borrow_mut(), PipeState::Consumed);
        match taken {
            PipeState::Pending(Some(continuation)) => continuation(value),
            PipeState::Pending(None) => {
                *self.state.borrow_mut() = PipeState::Resolved(value);
            }
            other => {
                *self.state.borrow_mut() = other;
                tracing::warn!("pipe resolved more than once; extra value dropped");
            }
        }
    }

    /// Chain a continuation, producing a pipe for its result. If the value is already
    /// here, the continuation runs at once.
    ///
    /// A pipe supports one continuation; chaining twice is a programming error.
    pub fn then<U: 'static>(&self, callback: impl FnOnce(T) -> U + 'static) -> Pipe<U> {
        let next = Pipe::pending();
        let taken = std::mem::replace(&mut *self.state.borrow_mut(), PipeState::Consumed);
        match taken {
            PipeState::Resolved(value) => {
                next.resolve(callback(value));
            }
            PipeState::Pending(None) => {
                let downstream = next.clone();
                *self.state.borrow_mut() = PipeState::Pending(Some(Box::new(move |value| {
                    downstream.resolve(callback(value));
                })));
            }
            PipeState::Pending(Some(_)) => panic!("pipe already has a continuation"),
            PipeState::Consumed => panic!("pipe value was already consumed"),
        }
        next
    }

    /// True once the pipe holds or has handed over its value.
    pub fn is_settled(&self) -> bool {
        !matches!(*self.state.borrow(), PipeState::Pending(_))
    }

    /// Alternate drawing and continuation processing until this pipe settles or the frame
    /// budget runs out. Returns whether the pipe settled.
    pub fn run_while_drawing(
        &self,
        tree: &mut LayoutTree,
        max_frames: usize,
    ) -> Result<bool, ResizeError> {
        for _ in 0..max_frames {
            if self.is_settled() {
                return Ok(true);
            }
            tree.draw()?;
        }
        Ok(self.is_settled())
    }
}

impl<T: PartialEq + std::fmt::Debug + 'static> Pipe<T> {
    /// Chain an assertion that the resolved value equals `expected`.
    pub fn then_assert_equals(&self, expected: T) -> Pipe<()> {
        self.then(move |value| assert_eq!(value, expected))
    }
}

/// Wait for two pipes; the result resolves once both have.
pub fn join<A: 'static, B: 'static>(a: &Pipe<A>, b: &Pipe<B>) -> Pipe<(A, B)> {
    let out = Pipe::pending();
    let slots = Rc::new(RefCell::new((None::<A>, None::<B>)));

    let downstream = out.clone();
    let shared = slots.clone();
    a.then(move |value| {
        let pair = {
            let mut shared = shared.borrow_mut();
            shared.0 = Some(value);
            if shared.1.is_some() {
                shared.0.take().zip(shared.1.take())
            } else {
                None
            }
        };
        if let Some(pair) = pair {
            downstream.resolve(pair);
        }
    });

    let downstream = out.clone();
    let shared = slots;
    b.then(move |value| {
        let pair = {
            let mut shared = shared.borrow_mut();
            shared.1 = Some(value);
            if shared.0.is_some() {
                shared.0.take().zip(shared.1.take())
            } else {
                None
            }
        };
        if let Some(pair) = pair {
            downstream.resolve(pair);
        }
    });

    out
}
