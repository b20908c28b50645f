//! Conflict Analysis
use {
    super::restart::{ProgressUpdate, RestartIF, Restarter},
    crate::{
        assign::{AssignIF, AssignReason, AssignStack, PropagateIF},
        cdb::{ClauseDB, ClauseDBIF, RefClause},
        share::Sharing,
        state::State,
        types::*,
        vam::{VarMap, VarMapIF},
    },
};

pub fn handle_conflict(
    asg: &mut AssignStack,
    cdb: &mut ClauseDB,
    rst: &mut Restarter,
    state: &mut State,
    vam: &VarMap,
    shr: &mut Sharing,
    cc: &ConflictContext,
) -> MaybeInconsistent {
    let conflicting_level = asg.decision_level();
    // a conflict clause whose literals all sit at the root level means
    // UNSAT regardless of the current level
    if let AssignReason::Implication(cr) = cc.1 {
        if cdb
            .arena
            .iter_lits(cr)
            .all(|l| asg.level(l.vi()) == asg.root_level())
        {
            return Err(SolverError::RootLevelConflict(*cc));
        }
    }
    asg.update_activity_tick();
    rst.update(ProgressUpdate::Counter);

    let assign_level = conflict_analyze(asg, cdb, state, cc).max(asg.root_level());
    let learnt_len = state.new_learnt.len();
    if learnt_len == 0 {
        return Err(SolverError::EmptyClause);
    }
    let l0 = state.new_learnt[0];
    if learnt_len == 1 {
        //
        //## A NEW ASSERTION by UNIT LEARNT CLAUSE GENERATION
        //
        cdb.certification.push_add([vam.externalize(l0)]);
        asg.cancel_until(asg.root_level());
        asg.assign_at_root_level(l0)?;
        shr.export(vam, 1, &[l0]);
        rst.update(ProgressUpdate::LBD(1));
        state.c_lvl.update(conflicting_level as f64);
        state.b_lvl.update(0.0);
        return Ok(());
    }
    let glue = compute_learnt_glue(asg, state);
    asg.cancel_until(assign_level);
    debug_assert_eq!(asg.assigned(l0), None);
    let mut learnt = std::mem::take(&mut state.new_learnt);
    let reason = match cdb.new_clause(asg, vam, &mut learnt, true, glue) {
        RefClause::BiClause => AssignReason::BinaryLink(learnt[1]),
        RefClause::Clause(cr) => AssignReason::Implication(cr),
        _ => return Err(SolverError::SolverBug),
    };
    asg.assign_by_implication(l0, reason);
    rst.update(ProgressUpdate::LBD(glue));
    shr.export(vam, glue, &learnt);
    state.new_learnt = learnt;
    state.c_lvl.update(conflicting_level as f64);
    state.b_lvl.update(assign_level as f64);
    Ok(())
}

fn compute_learnt_glue(asg: &AssignStack, state: &mut State) -> u16 {
    let lits = std::mem::take(&mut state.new_learnt);
    let glue = state.compute_lbd(&lits, |vi| asg.level(vi));
    state.new_learnt = lits;
    glue
}

///
/// ## Conflict Analysis
///
fn conflict_analyze(
    asg: &mut AssignStack,
    cdb: &mut ClauseDB,
    state: &mut State,
    cc: &ConflictContext,
) -> DecisionLevel {
    state.new_learnt.clear();
    state.new_learnt.push(NULL_LIT);
    let root_level = asg.root_level();
    let dl = asg.decision_level();
    let mut path_cnt = 0;
    let (mut p, mut reason) = *cc;
    {
        let vi = p.vi();
        let lvl = asg.level(vi);
        debug_assert!(!asg.var(vi).is(FlagVar::CA_SEEN));
        if root_level < lvl {
            asg.var_mut(vi).turn_on(FlagVar::CA_SEEN);
            asg.reward_at_analysis(vi);
            if dl == lvl {
                path_cnt += 1;
            } else {
                state.new_learnt.push(p);
            }
        }
    }
    let mut ti = asg.stack_len() - 1; // trail index
    loop {
        match reason {
            AssignReason::BinaryLink(l) => {
                let vi = l.vi();
                if !asg.var(vi).is(FlagVar::CA_SEEN) {
                    let lvl = asg.level(vi);
                    if root_level < lvl {
                        debug_assert!(asg.assign(vi).is_some());
                        asg.var_mut(vi).turn_on(FlagVar::CA_SEEN);
                        asg.reward_at_analysis(vi);
                        if dl == lvl {
                            path_cnt += 1;
                        } else {
                            state.new_learnt.push(l);
                        }
                    }
                }
            }
            AssignReason::Implication(cr) => {
                cdb.mark_clause_as_used(cr);
                debug_assert_eq!(cdb.arena.lit0(cr), p);
                let size = cdb.arena.size(cr);
                for k in 1..size {
                    let q = cdb.arena.lit(cr, k);
                    let vi = q.vi();
                    if !asg.var(vi).is(FlagVar::CA_SEEN) {
                        let lvl = asg.level(vi);
                        if root_level == lvl {
                            continue;
                        }
                        debug_assert!(
                            asg.assign(vi).is_some(),
                            "conflict_analyze found unassigned var {vi}"
                        );
                        debug_assert!(lvl <= dl);
                        asg.var_mut(vi).turn_on(FlagVar::CA_SEEN);
                        asg.reward_at_analysis(vi);
                        if dl == lvl {
                            path_cnt += 1;
                        } else {
                            state.new_learnt.push(q);
                        }
                    }
                }
            }
            AssignReason::Decision(_) | AssignReason::None => {
                unreachable!("conflict_analyze: found a strange reason {reason:?}")
            }
        }
        // set the index of the next literal to ti
        while {
            let vi = asg.stack(ti).vi();
            !asg.var(vi).is(FlagVar::CA_SEEN) || asg.level(vi) != dl
        } {
            debug_assert!(0 < ti, "conflict_analyze broke the bottom of the trail");
            ti -= 1;
        }
        p = asg.stack(ti);
        asg.var_mut(p.vi()).turn_off(FlagVar::CA_SEEN);
        path_cnt -= 1;
        if path_cnt == 0 {
            break;
        }
        debug_assert!(0 < ti);
        ti -= 1;
        reason = asg.reason(p.vi());
    }
    debug_assert_eq!(asg.level(p.vi()), dl);
    state.new_learnt[0] = !p;
    state.minimize_learnt(asg, cdb)
}

impl State {
    /// shrink the learnt clause by recursive minimization, then order it
    /// so the asserting literal leads and a backjump-level literal is the
    /// second watch. Returns the backjump level.
    fn minimize_learnt(&mut self, asg: &mut AssignStack, cdb: &ClauseDB) -> DecisionLevel {
        let mut to_clear: Vec<Lit> = vec![self.new_learnt[0]];
        let mut levels = vec![false; asg.decision_level() as usize + 1];
        for l in &self.new_learnt[1..] {
            to_clear.push(*l);
            levels[asg.level(l.vi()) as usize] = true;
        }
        let l0 = self.new_learnt[0];
        self.new_learnt
            .retain(|l| *l == l0 || !l.is_redundant(asg, cdb, &mut to_clear, &levels));
        // find the correct backtrack level from the remaining literals
        let mut level_to_return = 0;
        if 1 < self.new_learnt.len() {
            let mut max_i = 1;
            level_to_return = asg.level(self.new_learnt[max_i].vi());
            for (i, l) in self.new_learnt.iter().enumerate().skip(2) {
                let lv = asg.level(l.vi());
                if level_to_return < lv {
                    level_to_return = lv;
                    max_i = i;
                }
            }
            self.new_learnt.swap(1, max_i);
        }
        for l in &to_clear {
            let v = asg.var_mut(l.vi());
            v.turn_off(FlagVar::CA_SEEN);
            v.turn_off(FlagVar::CA_POISON);
        }
        level_to_return
    }
}

/// return `true` if the `lit` is redundant: every path of its implication
/// graph ends in literals already in the learnt clause. Failed candidates
/// are poisoned so they are never explored twice.
impl Lit {
    fn is_redundant(
        self,
        asg: &mut AssignStack,
        cdb: &ClauseDB,
        clear: &mut Vec<Lit>,
        levels: &[bool],
    ) -> bool {
        if asg.var(self.vi()).is(FlagVar::CA_POISON) {
            return false;
        }
        if matches!(asg.reason(self.vi()), AssignReason::Decision(_)) {
            return false;
        }
        let mut stack = vec![self];
        let top = clear.len();
        while let Some(sl) = stack.pop() {
            match asg.reason(sl.vi()) {
                AssignReason::BinaryLink(l) => {
                    let vi = l.vi();
                    let lv = asg.level(vi);
                    if 0 < lv && !asg.var(vi).is(FlagVar::CA_SEEN) {
                        if matches!(
                            asg.reason(vi),
                            AssignReason::Implication(_) | AssignReason::BinaryLink(_)
                        ) && !asg.var(vi).is(FlagVar::CA_POISON)
                            && levels[lv as usize]
                        {
                            asg.var_mut(vi).turn_on(FlagVar::CA_SEEN);
                            stack.push(l);
                            clear.push(l);
                        } else {
                            // one of the roots is a decision var at an unchecked level
                            return self.poison(asg, clear, top);
                        }
                    }
                }
                AssignReason::Implication(cr) => {
                    let size = cdb.arena.size(cr);
                    for k in 1..size {
                        let q = cdb.arena.lit(cr, k);
                        let vi = q.vi();
                        let lv = asg.level(vi);
                        if 0 < lv && !asg.var(vi).is(FlagVar::CA_SEEN) {
                            if matches!(
                                asg.reason(vi),
                                AssignReason::Implication(_) | AssignReason::BinaryLink(_)
                            ) && !asg.var(vi).is(FlagVar::CA_POISON)
                                && levels[lv as usize]
                            {
                                asg.var_mut(vi).turn_on(FlagVar::CA_SEEN);
                                stack.push(q);
                                clear.push(q);
                            } else {
                                return self.poison(asg, clear, top);
                            }
                        }
                    }
                }
                AssignReason::Decision(_) | AssignReason::None => {
                    unreachable!("is_redundant: found a strange reason")
                }
            }
        }
        true
    }
    /// roll tentative marks back and remember the failure.
    fn poison(self, asg: &mut AssignStack, clear: &mut Vec<Lit>, top: usize) -> bool {
        for l in &clear[top..] {
            asg.var_mut(l.vi()).turn_off(FlagVar::CA_SEEN);
        }
        clear.truncate(top);
        asg.var_mut(self.vi()).turn_on(FlagVar::CA_POISON);
        false
    }
}
