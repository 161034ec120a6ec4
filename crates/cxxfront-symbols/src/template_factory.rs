//! Template factories.
//!
//! A [`TemplateFactory`] augments one container symbol while template
//! declarations inside it are being parsed. Each `template<...>` prefix pushes
//! a frame holding the new template symbol; recognizing the templated
//! declaration pops the frames again. Pushes and pops nest like brackets,
//! so `template<class A> template<class B> void f();` produces
//! push A, push B, pop B, pop A.

use std::fmt;

use cxxfront_core::SymbolError;
use tracing::trace;

use crate::SymbolId;

/// Handle to a factory owned by a [`SymbolTable`](crate::SymbolTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactoryId(pub(crate) u32);

impl FactoryId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FactoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "factory_{}", self.0)
    }
}

/// One entry of a factory's stack history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryEvent {
    Push(SymbolId),
    Pop(SymbolId),
    /// A frame released without its declaration ever arriving.
    Discard(SymbolId),
}

/// Stack of in-progress template symbols for one container.
#[derive(Debug, Clone)]
pub struct TemplateFactory {
    id: FactoryId,
    containing: Option<SymbolId>,
    stack: Vec<SymbolId>,
    history: Vec<FactoryEvent>,
}

impl TemplateFactory {
    pub(crate) fn new(id: FactoryId) -> Self {
        Self {
            id,
            containing: None,
            stack: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> FactoryId {
        self.id
    }

    /// Bind the factory to the container it augments.
    ///
    /// # Panics
    ///
    /// Panics if the factory is already bound. A factory serves exactly one
    /// container for its whole life.
    pub fn set_containing_symbol(&mut self, container: SymbolId) {
        assert!(
            self.containing.is_none(),
            "{} is already bound to {:?}",
            self.id,
            self.containing
        );
        self.containing = Some(container);
    }

    pub fn containing_symbol(&self) -> Option<SymbolId> {
        self.containing
    }

    /// Begin a new template frame.
    pub fn push_template(&mut self, template: SymbolId) {
        trace!(factory = %self.id, %template, depth = self.stack.len() + 1, "push template");
        self.stack.push(template);
        self.history.push(FactoryEvent::Push(template));
    }

    /// Remove and return the innermost frame.
    pub fn pop_template(&mut self) -> Result<SymbolId, SymbolError> {
        let template = self.stack.pop().ok_or(SymbolError::EmptyFactoryStack)?;
        trace!(factory = %self.id, %template, depth = self.stack.len(), "pop template");
        self.history.push(FactoryEvent::Pop(template));
        Ok(template)
    }

    /// Release `template` and every frame pushed after it.
    ///
    /// Returns `false` when `template` is not on the stack.
    pub fn discard(&mut self, template: SymbolId) -> bool {
        let Some(position) = self.stack.iter().rposition(|&t| t == template) else {
            return false;
        };
        while self.stack.len() > position {
            if let Some(frame) = self.stack.pop() {
                trace!(factory = %self.id, template = %frame, "discard template frame");
                self.history.push(FactoryEvent::Discard(frame));
            }
        }
        true
    }

    /// The innermost template being parsed.
    pub fn current(&self) -> Option<SymbolId> {
        self.stack.last().copied()
    }

    /// Whether `template` still has an open frame.
    pub fn is_pending(&self, template: SymbolId) -> bool {
        self.stack.contains(&template)
    }

    /// Number of open frames.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn history(&self) -> &[FactoryEvent] {
        &self.history
    }

    /// Check that every push has been matched.
    pub fn release(&self) -> Result<(), SymbolError> {
        if self.stack.is_empty() {
            Ok(())
        } else {
            Err(SymbolError::UnbalancedFactory {
                pending: self.stack.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graph::NodeIndex;

    fn sym(index: usize) -> SymbolId {
        SymbolId(NodeIndex::new(index))
    }

    #[test]
    fn pop_on_empty_stack_fails() {
        let mut factory = TemplateFactory::new(FactoryId(0));
        assert_eq!(factory.pop_template(), Err(SymbolError::EmptyFactoryStack));
        assert!(factory.history().is_empty());
    }

    #[test]
    fn push_pop_nest_like_brackets() {
        let mut factory = TemplateFactory::new(FactoryId(0));
        factory.push_template(sym(1));
        factory.push_template(sym(2));
        assert_eq!(factory.current(), Some(sym(2)));
        assert_eq!(factory.pop_template(), Ok(sym(2)));
        assert_eq!(factory.pop_template(), Ok(sym(1)));
        assert_eq!(factory.pop_template(), Err(SymbolError::EmptyFactoryStack));

        assert_eq!(
            factory.history(),
            &[
                FactoryEvent::Push(sym(1)),
                FactoryEvent::Push(sym(2)),
                FactoryEvent::Pop(sym(2)),
                FactoryEvent::Pop(sym(1)),
            ]
        );
        assert!(factory.release().is_ok());
    }

    #[test]
    fn release_with_pending_frames_is_unbalanced() {
        let mut factory = TemplateFactory::new(FactoryId(3));
        factory.push_template(sym(1));
        assert_eq!(
            factory.release(),
            Err(SymbolError::UnbalancedFactory { pending: 1 })
        );
    }

    #[test]
    fn discard_drops_frame_and_everything_above() {
        let mut factory = TemplateFactory::new(FactoryId(0));
        factory.push_template(sym(1));
        factory.push_template(sym(2));
        factory.push_template(sym(3));

        assert!(factory.discard(sym(2)));
        assert_eq!(factory.depth(), 1);
        assert!(factory.is_pending(sym(1)));
        assert!(!factory.is_pending(sym(3)));
        assert!(!factory.discard(sym(9)));
    }

    #[test]
    fn containing_symbol_binds_once() {
        let mut factory = TemplateFactory::new(FactoryId(0));
        factory.set_containing_symbol(sym(0));
        assert_eq!(factory.containing_symbol(), Some(sym(0)));
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn rebinding_containing_symbol_panics() {
        let mut factory = TemplateFactory::new(FactoryId(0));
        factory.set_containing_symbol(sym(0));
        factory.set_containing_symbol(sym(1));
    }
}
