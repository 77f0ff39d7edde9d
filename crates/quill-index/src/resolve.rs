use std::collections::BTreeSet;

use crate::index::SourceIndex;
use crate::reference::{Entity, EntryReference};
use crate::token::Token;
use crate::LOG_TARGET;

/// Which declaration a resolver should pick in an inheritance chain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ResolutionStrategy {
    /// The nearest supertype declaring the member.
    #[default]
    ResolveClosest,
    /// The topmost declaration of the member.
    ResolveRoot,
}

/// Maps a naive reference to the canonical entities it may denote.
pub trait EntryResolver<E: Entity> {
    /// Every candidate for `reference`, best first. An empty result means the
    /// reference is already canonical.
    fn resolve_reference(
        &self,
        reference: &EntryReference<E>,
        strategy: ResolutionStrategy,
    ) -> Vec<EntryReference<E>>;

    fn resolve_first_reference(
        &self,
        reference: &EntryReference<E>,
        strategy: ResolutionStrategy,
    ) -> EntryReference<E> {
        self.resolve_reference(reference, strategy)
            .into_iter()
            .next()
            .unwrap_or_else(|| reference.clone())
    }
}

impl<E, F> EntryResolver<E> for F
where
    E: Entity,
    F: Fn(&EntryReference<E>) -> EntryReference<E>,
{
    fn resolve_reference(
        &self,
        reference: &EntryReference<E>,
        _strategy: ResolutionStrategy,
    ) -> Vec<EntryReference<E>> {
        vec![self(reference)]
    }
}

impl<E: Entity> SourceIndex<E> {
    /// Re-key every reference to its canonical form under `resolver`.
    ///
    /// Tokens of references that resolve to the same canonical reference are
    /// merged under it. The declaration index is left as is.
    pub fn resolve_references<R: EntryResolver<E> + ?Sized>(mut self, resolver: &R) -> Self {
        let mut keys: Vec<EntryReference<E>> = self.store.references().cloned().collect();
        keys.sort();

        let plan: Vec<_> = keys
            .into_iter()
            .filter_map(|reference| {
                let resolved =
                    resolver.resolve_first_reference(&reference, ResolutionStrategy::ResolveClosest);
                (resolved != reference).then_some((reference, resolved))
            })
            .collect();

        tracing::debug!(
            target: LOG_TARGET,
            rewritten = plan.len(),
            tokens = self.store.len(),
            "resolved references"
        );

        if !plan.is_empty() {
            self.store.rekey(plan);
        }
        self
    }

    /// Tokens of every candidate `resolver` offers for `reference`, in
    /// ascending order.
    pub fn tokens_for_resolved<R: EntryResolver<E> + ?Sized>(
        &self,
        reference: &EntryReference<E>,
        resolver: &R,
    ) -> BTreeSet<Token> {
        let mut candidates =
            resolver.resolve_reference(reference, ResolutionStrategy::ResolveClosest);
        if candidates.is_empty() {
            candidates.push(reference.clone());
        }

        candidates
            .iter()
            .flat_map(|candidate| self.tokens_for(candidate).iter().cloned())
            .collect()
    }
}
