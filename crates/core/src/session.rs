//! Scoped ownership of an open presentation.

use crate::error::Result;
use crate::ports::SlideDeck;
use std::ops::{Deref, DerefMut};

/// Owns an open deck and closes it exactly once.
///
/// Call [`close`](Self::close) to observe the close result; otherwise the
/// deck is closed on drop, including during unwinding, and a failure is
/// only logged.
pub struct DeckSession<D: SlideDeck> {
    deck: Option<D>,
}

impl<D: SlideDeck> DeckSession<D> {
    pub fn new(deck: D) -> Self {
        Self { deck: Some(deck) }
    }

    /// Close the deck now and report the result.
    pub fn close(mut self) -> Result<()> {
        match self.deck.take() {
            Some(mut deck) => deck.close(),
            None => Ok(()),
        }
    }

    fn deck_ref(&self) -> &D {
        // Only `close` and `drop` take the deck, and both consume the session.
        match &self.deck {
            Some(deck) => deck,
            None => unreachable!("deck session used after close"),
        }
    }

    fn deck_mut(&mut self) -> &mut D {
        match &mut self.deck {
            Some(deck) => deck,
            None => unreachable!("deck session used after close"),
        }
    }
}

impl<D: SlideDeck> Deref for DeckSession<D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.deck_ref()
    }
}

impl<D: SlideDeck> DerefMut for DeckSession<D> {
    fn deref_mut(&mut self) -> &mut D {
        self.deck_mut()
    }
}

impl<D: SlideDeck> Drop for DeckSession<D> {
    fn drop(&mut self) {
        if let Some(mut deck) = self.deck.take() {
            if let Err(e) = deck.close() {
                log::warn!("Failed to close presentation: {}", e);
            }
        }
    }
}
