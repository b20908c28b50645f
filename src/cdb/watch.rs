//! Watcher lists for the two-watched-literal scheme.
use crate::types::*;

/// An entry in a literal's watch list. The hot path is a two-way dispatch,
/// so this is a tagged variant, not a trait object.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Watcher {
    /// A binary clause: the companion literal. Binary clauses are not
    /// stored in the arena; the pair of watchers *is* the clause.
    Binary { other: Lit, redundant: bool },
    /// A long clause with a cached *blocking literal*: any literal of the
    /// clause that may satisfy it, checked before touching the arena.
    Long { blocking: Lit, cref: ClauseRef },
}

/// API for maintaining watcher lists.
pub trait WatchListIF {
    /// register a binary clause.
    fn attach_bi_watch(&mut self, l0: Lit, l1: Lit, redundant: bool);
    /// remove a binary clause; returns `false` if it was not present.
    fn detach_bi_watch(&mut self, l0: Lit, l1: Lit) -> bool;
    /// register a long clause watched by its first two literals.
    fn attach_long_watch(&mut self, cref: ClauseRef, l0: Lit, l1: Lit);
    /// remove a long clause's two watchers.
    fn detach_long_watch(&mut self, cref: ClauseRef, l0: Lit, l1: Lit);
}

impl WatchListIF for Vec<Vec<Watcher>> {
    fn attach_bi_watch(&mut self, l0: Lit, l1: Lit, redundant: bool) {
        self[usize::from(l0)].push(Watcher::Binary {
            other: l1,
            redundant,
        });
        self[usize::from(l1)].push(Watcher::Binary {
            other: l0,
            redundant,
        });
    }
    fn detach_bi_watch(&mut self, l0: Lit, l1: Lit) -> bool {
        let mut found = false;
        if let Some(i) = self[usize::from(l0)]
            .iter()
            .position(|w| matches!(w, Watcher::Binary { other, .. } if *other == l1))
        {
            self[usize::from(l0)].remove(i);
            found = true;
        }
        if let Some(i) = self[usize::from(l1)]
            .iter()
            .position(|w| matches!(w, Watcher::Binary { other, .. } if *other == l0))
        {
            self[usize::from(l1)].remove(i);
        }
        found
    }
    fn attach_long_watch(&mut self, cref: ClauseRef, l0: Lit, l1: Lit) {
        self[usize::from(l0)].push(Watcher::Long {
            blocking: l1,
            cref,
        });
        self[usize::from(l1)].push(Watcher::Long {
            blocking: l0,
            cref,
        });
    }
    fn detach_long_watch(&mut self, cref: ClauseRef, l0: Lit, l1: Lit) {
        for l in [l0, l1] {
            if let Some(i) = self[usize::from(l)]
                .iter()
                .position(|w| matches!(w, Watcher::Long { cref: c, .. } if *c == cref))
            {
                // `remove`, not `swap_remove`: watcher order must stay
                // stable so propagation is reproducible.
                self[usize::from(l)].remove(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: i32) -> Lit {
        Lit::from_assign(i.unsigned_abs() as usize - 1, 0 < i)
    }

    #[test]
    fn test_bi_watch_roundtrip() {
        let mut watch: Vec<Vec<Watcher>> = vec![Vec::new(); 8];
        watch.attach_bi_watch(lit(1), lit(-2), true);
        assert_eq!(watch[usize::from(lit(1))].len(), 1);
        assert_eq!(watch[usize::from(lit(-2))].len(), 1);
        assert!(watch.detach_bi_watch(lit(1), lit(-2)));
        assert!(watch[usize::from(lit(1))].is_empty());
        assert!(watch[usize::from(lit(-2))].is_empty());
        assert!(!watch.detach_bi_watch(lit(1), lit(-2)));
    }

    #[test]
    fn test_long_watch_preserves_order() {
        let mut watch: Vec<Vec<Watcher>> = vec![Vec::new(); 8];
        let c0 = ClauseRef::from(0u32);
        let c1 = ClauseRef::from(8u32);
        let c2 = ClauseRef::from(16u32);
        watch.attach_long_watch(c0, lit(1), lit(2));
        watch.attach_long_watch(c1, lit(1), lit(3));
        watch.attach_long_watch(c2, lit(1), lit(4));
        watch.detach_long_watch(c1, lit(1), lit(3));
        let refs: Vec<ClauseRef> = watch[usize::from(lit(1))]
            .iter()
            .filter_map(|w| match w {
                Watcher::Long { cref, .. } => Some(*cref),
                _ => None,
            })
            .collect();
        assert_eq!(refs, vec![c0, c2]);
    }
}
