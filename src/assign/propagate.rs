//! implement boolean constraint propagation, backjump
use {
    super::{AssignIF, AssignReason, AssignStack},
    crate::{
        cdb::{ClauseDB, Watcher},
        types::*,
    },
    rustc_hash::FxHashMap,
};

/// API for Boolean Constraint Propagation like `propagate`,
/// `assign_by_decision`, `cancel_until`, and so on.
pub trait PropagateIF {
    /// add an assignment at root level as a precondition.
    ///
    /// # Errors
    ///
    /// emits `SolverError::RootLevelConflict` if the solver becomes inconsistent.
    fn assign_at_root_level(&mut self, l: Lit) -> MaybeInconsistent;
    /// unsafe enqueue (assign by implication); doesn't emit an exception.
    ///
    /// ## Warning
    /// Callers must assure the consistency after this assignment.
    fn assign_by_implication(&mut self, l: Lit, reason: AssignReason);
    /// unsafe assume (assign by decision); doesn't emit an exception.
    /// ## Caveat
    /// Callers have to assure the consistency after this assignment.
    fn assign_by_decision(&mut self, l: Lit);
    /// execute *backjump*.
    fn cancel_until(&mut self, lv: DecisionLevel);
    /// execute *boolean constraint propagation* or *unit propagation*.
    fn propagate(&mut self, cdb: &mut ClauseDB) -> PropagationResult;
    /// `true` if the root trail segment can be moved to fixed state.
    fn flushable(&self) -> bool;
    /// move fully propagated root assignments off the trail.
    fn flush_trail(&mut self);
}

impl PropagateIF for AssignStack {
    fn assign_at_root_level(&mut self, l: Lit) -> MaybeInconsistent {
        self.cancel_until(self.root_level);
        let vi = l.vi();
        debug_assert!(vi < self.num_vars);
        debug_assert!(!self.flag[vi].is(FlagVar::ELIMINATED));
        debug_assert!(self.trail_lim.is_empty());
        self.level[vi] = self.root_level;
        match self.assign[vi] {
            None => {
                self.assign[vi] = Some(bool::from(l));
                self.reason[vi] = AssignReason::Decision(0);
                debug_assert!(!self.trail.contains(&!l));
                self.trail.push(l);
                Ok(())
            }
            Some(x) if x == bool::from(l) => Ok(()),
            _ => Err(SolverError::RootLevelConflict((l, self.reason[vi]))),
        }
    }
    fn assign_by_implication(&mut self, l: Lit, reason: AssignReason) {
        debug_assert!(usize::from(l) != usize::from(NULL_LIT));
        let vi = l.vi();
        debug_assert!(vi < self.num_vars);
        debug_assert!(!self.flag[vi].is(FlagVar::ELIMINATED));
        debug_assert!(self.assign[vi].is_none() || self.assign[vi] == Some(bool::from(l)));
        self.assign[vi] = Some(bool::from(l));
        self.level[vi] = self.decision_level();
        self.reason[vi] = reason;
        debug_assert!(!self.trail.contains(&l));
        debug_assert!(!self.trail.contains(&!l));
        self.trail.push(l);
    }
    fn assign_by_decision(&mut self, l: Lit) {
        debug_assert!(l.vi() < self.num_vars);
        debug_assert!(!self.trail.contains(&l));
        debug_assert!(!self.trail.contains(&!l), "trail contains a strange literal");
        self.level_up();
        let dl = self.trail_lim.len() as DecisionLevel;
        let vi = l.vi();
        debug_assert!(!self.flag[vi].is(FlagVar::ELIMINATED));
        self.level[vi] = dl;
        self.assign[vi] = Some(bool::from(l));
        self.reason[vi] = AssignReason::Decision(dl);
        self.trail.push(l);
        self.num_decision += 1;
        debug_assert!(self.q_head < self.trail.len());
    }
    fn cancel_until(&mut self, lv: DecisionLevel) {
        if self.trail_lim.len() as u32 <= lv {
            return;
        }
        if self.best_assign {
            self.save_best_phases();
            self.best_assign = false;
        }
        let lim = self.trail_lim[lv as usize];
        for i in lim..self.trail.len() {
            let l = self.trail[i];
            let vi = l.vi();
            debug_assert!(
                self.assign[vi].is_some(),
                "cancel_until found unassigned var in trail {vi}"
            );
            debug_assert!(lv < self.level[vi]);
            self.flag[vi].set(FlagVar::PHASE, self.assign[vi] == Some(true));
            self.assign[vi] = None;
            self.reason[vi] = AssignReason::None;
            self.reward_at_unassign(vi);
            self.insert_order(vi);
        }
        self.trail.truncate(lim);
        self.q_head = self.trail.len();
        self.trail_lim.truncate(lv as usize);
        if lv == self.root_level {
            self.num_restart += 1;
        }
    }
    /// UNIT PROPAGATION.
    /// Note:
    ///  - *Precondition*: no dead clause in any watch list. They cause crashes.
    ///  - The order of watchers is preserved across calls: watchers dropped
    ///    for replacement are moved to another list, never rotated in place.
    fn propagate(&mut self, cdb: &mut ClauseDB) -> PropagationResult {
        while let Some(p) = self.trail.get(self.q_head).copied() {
            self.num_propagation += 1;
            self.q_head += 1;
            let false_lit = !p;
            let w_idx = usize::from(false_lit);
            let mut ws = std::mem::take(&mut cdb.watch[w_idx]);
            let mut j = 0;
            let mut i = 0;
            let mut conflict: Option<ConflictContext> = None;
            'next_watcher: while i < ws.len() {
                let w = ws[i];
                i += 1;
                match w {
                    Watcher::Binary { other, .. } => {
                        match self.assigned(other) {
                            Some(true) => (),
                            Some(false) => {
                                self.num_conflict += 1;
                                conflict = Some((other, AssignReason::BinaryLink(false_lit)));
                                ws[j] = w;
                                j += 1;
                                break 'next_watcher;
                            }
                            None => {
                                self.assign_by_implication(
                                    other,
                                    AssignReason::BinaryLink(false_lit),
                                );
                            }
                        }
                        ws[j] = w;
                        j += 1;
                    }
                    Watcher::Long { blocking, cref } => {
                        debug_assert!(!cdb.arena.is_garbage(cref));
                        if self.assigned(blocking) == Some(true) {
                            ws[j] = w;
                            j += 1;
                            continue 'next_watcher;
                        }
                        // make the false watch sit at slot 1
                        if cdb.arena.lit0(cref) == false_lit {
                            cdb.arena.swap_lits(cref, 0, 1);
                        }
                        let other = cdb.arena.lit0(cref);
                        let other_value = self.assigned(other);
                        if other_value == Some(true) {
                            ws[j] = Watcher::Long {
                                blocking: other,
                                cref,
                            };
                            j += 1;
                            continue 'next_watcher;
                        }
                        //
                        //## Search an un-falsified literal
                        //
                        let size = cdb.arena.size(cref);
                        let start = cdb.arena.search_from(cref).clamp(2, size);
                        for k in (start..size).chain(2..start) {
                            let lk = cdb.arena.lit(cref, k);
                            if self.assigned(lk) != Some(false) {
                                cdb.arena.swap_lits(cref, 1, k);
                                cdb.arena
                                    .set_search_from(cref, if k + 1 < size { k + 1 } else { 2 });
                                cdb.watch[usize::from(lk)].push(Watcher::Long {
                                    blocking: other,
                                    cref,
                                });
                                continue 'next_watcher;
                            }
                        }
                        ws[j] = w;
                        j += 1;
                        if other_value == Some(false) {
                            self.num_conflict += 1;
                            conflict = Some((other, AssignReason::Implication(cref)));
                            break 'next_watcher;
                        }
                        self.assign_by_implication(other, AssignReason::Implication(cref));
                    }
                }
            }
            if i < ws.len() {
                ws.copy_within(i.., j);
                j += ws.len() - i;
            }
            ws.truncate(j);
            debug_assert!(cdb.watch[w_idx].is_empty());
            cdb.watch[w_idx] = ws;
            if let Some(cc) = conflict {
                return Err(cc);
            }
        }
        let na = self.trail.len() + self.num_asserted_vars + self.num_eliminated_vars;
        if self.num_best_assign <= na && 0 < self.decision_level() {
            self.best_assign = true;
            self.num_best_assign = na;
        }
        Ok(())
    }
    fn flushable(&self) -> bool {
        self.decision_level() == self.root_level && !self.trail.is_empty() && !self.remains()
    }
    fn flush_trail(&mut self) {
        debug_assert!(self.flushable());
        self.num_asserted_vars += self.trail.len();
        self.trail.clear();
        self.q_head = 0;
    }
}

impl AssignStack {
    fn level_up(&mut self) {
        self.trail_lim.push(self.trail.len());
    }
    /// apply the arena's forwarding table after compaction. A reason whose
    /// clause was dropped by a simplifier (legal at the root level only)
    /// degrades to an assertion.
    pub fn rewrite_reason_refs(&mut self, forward: &FxHashMap<u32, u32>) {
        for vi in 0..self.num_vars {
            if self.assign[vi].is_some() {
                if let AssignReason::Implication(cr) = self.reason[vi] {
                    self.reason[vi] = match forward.get(&u32::from(cr)) {
                        Some(n) => AssignReason::Implication(ClauseRef::from(*n)),
                        None => {
                            debug_assert_eq!(self.level[vi], self.root_level);
                            AssignReason::Decision(0)
                        }
                    };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cdb::{ClauseDBIF, RefClause},
        vam::{VarMap, VarMapIF},
    };

    fn lit(i: i32) -> Lit {
        Lit::from_assign(i.unsigned_abs() as usize - 1, 0 < i)
    }

    fn setup(nv: usize) -> (AssignStack, ClauseDB, VarMap) {
        let cnf = CNFDescription {
            num_of_variables: nv,
            ..CNFDescription::default()
        };
        let config = Config::default();
        let mut asg = AssignStack::instantiate(&config, &cnf);
        let cdb = ClauseDB::instantiate(&config, &cnf);
        let mut vam = VarMap::instantiate(&config, &cnf);
        for i in 1..=nv as i32 {
            vam.map_in(i);
            asg.activate_var(i as usize - 1);
        }
        (asg, cdb, vam)
    }

    #[test]
    fn test_binary_propagation() {
        let (mut asg, mut cdb, vam) = setup(2);
        let mut c = vec![lit(-1), lit(2)];
        cdb.new_clause(&asg, &vam, &mut c, false, 1);
        asg.assign_by_decision(lit(1));
        assert!(asg.propagate(&mut cdb).is_ok());
        assert_eq!(asg.assigned(lit(2)), Some(true));
        assert_eq!(asg.reason(lit(2).vi()), AssignReason::BinaryLink(lit(-1)));
    }

    #[test]
    fn test_long_clause_unit_propagation() {
        let (mut asg, mut cdb, vam) = setup(3);
        let mut c = vec![lit(1), lit(2), lit(3)];
        let RefClause::Clause(cr) = cdb.new_clause(&asg, &vam, &mut c, false, 3) else {
            panic!("expected a long clause");
        };
        asg.assign_by_decision(lit(-1));
        assert!(asg.propagate(&mut cdb).is_ok());
        asg.assign_by_decision(lit(-2));
        assert!(asg.propagate(&mut cdb).is_ok());
        assert_eq!(asg.assigned(lit(3)), Some(true));
        assert_eq!(asg.reason(lit(3).vi()), AssignReason::Implication(cr));
        // the implied literal sits at slot 0 of its reason
        assert_eq!(cdb.arena.lit0(cr), lit(3));
        assert!(cdb.watches_are_sane());
    }

    #[test]
    fn test_watch_replacement() {
        let (mut asg, mut cdb, vam) = setup(4);
        let mut c = vec![lit(1), lit(2), lit(3), lit(4)];
        cdb.new_clause(&asg, &vam, &mut c, false, 4);
        asg.assign_by_decision(lit(-1));
        assert!(asg.propagate(&mut cdb).is_ok());
        // nothing is implied; the false watch was replaced by a tail literal
        assert_eq!(asg.assigned(lit(2)), None);
        assert!(cdb.watch[usize::from(lit(1))].is_empty());
        assert!(cdb.watches_are_sane());
    }

    #[test]
    fn test_conflict_detection() {
        let (mut asg, mut cdb, vam) = setup(3);
        let mut c0 = vec![lit(1), lit(2), lit(3)];
        cdb.new_clause(&asg, &vam, &mut c0, false, 3);
        let mut c1 = vec![lit(-3), lit(1)];
        cdb.new_clause(&asg, &vam, &mut c1, false, 1);
        asg.assign_by_decision(lit(-1));
        assert!(asg.propagate(&mut cdb).is_ok());
        // deciding -2 implies 3 through c0, which falsifies c1
        asg.assign_by_decision(lit(-2));
        let result = asg.propagate(&mut cdb);
        assert!(result.is_err());
        assert_eq!(asg.num_conflict, 1);
    }

    #[test]
    fn test_backjump_unassigns_above_level() {
        let (mut asg, mut cdb, vam) = setup(3);
        let mut c = vec![lit(-1), lit(2)];
        cdb.new_clause(&asg, &vam, &mut c, false, 1);
        asg.assign_by_decision(lit(1));
        assert!(asg.propagate(&mut cdb).is_ok());
        asg.assign_by_decision(lit(3));
        assert_eq!(asg.decision_level(), 2);
        asg.cancel_until(1);
        assert_eq!(asg.decision_level(), 1);
        assert_eq!(asg.assigned(lit(3)), None);
        assert_eq!(asg.assigned(lit(1)), Some(true));
        assert_eq!(asg.assigned(lit(2)), Some(true));
        asg.cancel_until(0);
        assert_eq!(asg.assigned(lit(1)), None);
        // phase saving remembers the last polarity
        assert!(asg.var(lit(1).vi()).is(FlagVar::PHASE));
    }

    #[test]
    fn test_trail_flush() {
        let (mut asg, mut cdb, _vam) = setup(2);
        asg.assign_at_root_level(lit(1)).expect("consistent");
        assert!(asg.propagate(&mut cdb).is_ok());
        assert!(asg.flushable());
        asg.flush_trail();
        assert_eq!(asg.stack_len(), 0);
        assert_eq!(asg.num_asserted_vars, 1);
        assert_eq!(asg.assigned(lit(1)), Some(true));
    }
}
