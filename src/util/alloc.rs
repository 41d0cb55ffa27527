//! Element types for tests that need to observe what a collection does with its values.
#![cfg(test)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use derive_more::{Display, Error};

use crate::collections::traits::TryClone;

#[derive(Debug, Clone)]
pub struct CountedDrop(pub Rc<RefCell<usize>>);

impl CountedDrop {
    pub fn new(value: usize) -> CountedDrop {
        CountedDrop(Rc::new(RefCell::new(value)))
    }
}

impl Deref for CountedDrop {
    type Target = Rc<RefCell<usize>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CountedDrop {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl Drop for CountedDrop {
    fn drop(&mut self) {
        self.0.replace_with(|v| *v + 1);
    }
}

impl TryClone for CountedDrop {
    type Error = Infallible;

    fn try_clone(&self) -> Result<Self, Infallible> {
        Ok(self.clone())
    }
}

#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
#[display("refused to copy {value}")]
pub struct CopyRefused {
    #[error(not(source))]
    pub value: u32,
}

/// Shared bookkeeping for a family of [`Flaky`] values: how many are alive and how many more
/// copies will succeed before one fails.
#[derive(Debug, Default)]
pub struct FlakyState {
    live: Cell<usize>,
    budget: Cell<Option<usize>>,
    panics: Cell<bool>,
}

impl FlakyState {
    pub fn new() -> Rc<FlakyState> {
        Rc::new(FlakyState::default())
    }

    /// Allows `copies` more copies to succeed, failing the one after with an [`Err`].
    pub fn fail_after(&self, copies: usize) {
        self.budget.set(Some(copies));
        self.panics.set(false);
    }

    /// Allows `copies` more copies to succeed, panicking during the one after.
    pub fn panic_after(&self, copies: usize) {
        self.budget.set(Some(copies));
        self.panics.set(true);
    }

    pub fn disarm(&self) {
        self.budget.set(None);
    }

    pub fn live(&self) -> usize {
        self.live.get()
    }
}

/// A value whose copies can be made to fail on demand, while counting live instances so that
/// leaks show up as a non-zero count.
#[derive(Debug)]
pub struct Flaky {
    pub value: u32,
    state: Rc<FlakyState>,
}

impl Flaky {
    pub fn new(value: u32, state: &Rc<FlakyState>) -> Flaky {
        state.live.set(state.live.get() + 1);
        Flaky {
            value,
            state: Rc::clone(state),
        }
    }
}

impl TryClone for Flaky {
    type Error = CopyRefused;

    fn try_clone(&self) -> Result<Self, CopyRefused> {
        match self.state.budget.get() {
            Some(0) if self.state.panics.get() => panic!("copy of {} panicked", self.value),
            Some(0) => Err(CopyRefused { value: self.value }),
            Some(left) => {
                self.state.budget.set(Some(left - 1));
                Ok(Flaky::new(self.value, &self.state))
            },
            None => Ok(Flaky::new(self.value, &self.state)),
        }
    }
}

impl Drop for Flaky {
    fn drop(&mut self) {
        self.state.live.set(self.state.live.get() - 1);
    }
}

impl PartialEq for Flaky {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}
