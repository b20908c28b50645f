//! Conflict-Driven Clause Learning search engine.
use {
    super::{
        conflict::handle_conflict,
        restart::{RestartIF, SearchMode},
        Certificate, SearchLimits, Solver, SolverEvent, SolverResult,
    },
    crate::{
        assign::{AssignIF, AssignReason, AssignStack, PropagateIF, RephaseIF, VarSelectIF},
        cdb::{ClauseDB, ClauseDBIF, RefClause},
        share::Sharing,
        state::{Stat, State, StateIF},
        types::*,
        vam::{MappedLit, VarMap, VarMapIF},
    },
    std::sync::atomic::Ordering,
};

/// API for the search part of a SAT solver.
pub trait SolverSearchIF {
    /// search an assignment.
    ///
    /// # Errors
    ///
    /// `InvalidOperation` if a clause under construction was not
    /// terminated; internal errors if the solver found a bug in itself.
    fn solve(&mut self) -> SolverResult;
}

impl SolverSearchIF for Solver {
    fn solve(&mut self) -> SolverResult {
        if self.composer.in_clause() {
            return Err(SolverError::InvalidOperation);
        }
        self.searched = true;
        if self.inconsistent {
            return Ok(Certificate::UNSAT);
        }
        self.cdb.check_size()?;
        self.asg.cancel_until(self.asg.root_level());
        self.state.progress_header();
        let answer = search(self);
        // a termination request only covers one search
        self.terminate.store(false, Ordering::Relaxed);
        match answer {
            Ok(Some(true)) => {
                if self.cdb.validate(&self.asg, false).is_some() {
                    return Err(SolverError::SolverBug);
                }
                self.vam.extend_model(&self.asg);
                let model = self.vam.model(&self.asg, self.state.config.partial_model);
                self.state.progress(&self.asg, &self.cdb, &self.rst);
                Ok(Certificate::SAT(model))
            }
            Ok(Some(false)) | Err(SolverError::RootLevelConflict(_)) => {
                self.inconsistent = true;
                self.cdb.certification.close();
                self.state.progress(&self.asg, &self.cdb, &self.rst);
                Ok(Certificate::UNSAT)
            }
            Ok(None) => {
                self.state.progress(&self.asg, &self.cdb, &self.rst);
                Ok(Certificate::UNKNOWN)
            }
            Err(e) => Err(e),
        }
    }
}

/// main loop; returns `Ok(Some(true))` for SAT, `Ok(Some(false))` for
/// UNSAT, and `Ok(None)` when a limit fired or termination was requested.
#[allow(clippy::too_many_lines)]
fn search(solver: &mut Solver) -> Result<Option<bool>, SolverError> {
    let Solver {
        ref mut asg,
        ref mut cdb,
        ref mut rst,
        ref mut state,
        ref mut vam,
        ref mut shr,
        ref mut processor,
        ref limits,
        ref terminate,
        ..
    } = solver;
    let mut a_decision_was_made = false;
    loop {
        if asg.decision_level() == asg.root_level() && shr.is_active() {
            import_units(asg, cdb, state, vam, shr)?;
            if import_clauses(asg, cdb, state, vam, shr)? {
                return Ok(Some(false));
            }
        }
        match asg.propagate(cdb) {
            Err(cc) => {
                if asg.decision_level() == asg.root_level() {
                    return Ok(Some(false));
                }
                handle_conflict(asg, cdb, rst, state, vam, shr, &cc)?;
                if a_decision_was_made {
                    a_decision_was_made = false;
                } else {
                    state[Stat::NoDecisionConflict] += 1;
                }
            }
            Ok(()) => {
                if state.iterating {
                    state.iterating = false;
                    state.progress(asg, cdb, rst);
                } else if asg.is_covered() {
                    return Ok(Some(true));
                } else if terminate.load(Ordering::Relaxed) {
                    return Ok(None);
                } else if conflict_limit_hit(limits, asg) {
                    return Ok(None);
                } else if cdb.reducing(asg.num_conflict) {
                    cdb.reduce(asg, vam);
                    state.progress(asg, cdb, rst);
                } else if let Some(mode) = rst.check_mode_transition(asg.num_conflict) {
                    // a mode flip implies a restart
                    asg.set_stabilizing(mode == SearchMode::Stable);
                    asg.cancel_until(asg.root_level());
                    rst.handle(SolverEvent::Restart);
                    asg.arbitrate_heuristic();
                } else if rst.restarting(asg.num_conflict) {
                    asg.cancel_until(asg.root_level());
                    rst.handle(SolverEvent::Restart);
                    asg.arbitrate_heuristic();
                } else if asg.rephasing() {
                    asg.rephase();
                } else if processor.firing(asg.num_conflict) {
                    asg.cancel_until(asg.root_level());
                    processor.invoke(asg, cdb, vam)?;
                    state[Stat::Simplification] += 1;
                } else if asg.flushable() {
                    asg.flush_trail();
                    state[Stat::Flush] += 1;
                } else if decision_limit_hit(limits, asg) {
                    return Ok(None);
                } else {
                    let lit = asg.select_decision_literal();
                    asg.assign_by_decision(lit);
                    a_decision_was_made = true;
                }
            }
        }
    }
}

fn conflict_limit_hit(limits: &SearchLimits, asg: &AssignStack) -> bool {
    limits
        .conflicts
        .is_some_and(|target| target <= asg.num_conflict)
}

fn decision_limit_hit(limits: &SearchLimits, asg: &AssignStack) -> bool {
    limits
        .decisions
        .is_some_and(|target| target <= asg.num_decision)
}

/// drain foreign units at the root level. Each accepted literal is
/// asserted and recorded in the proof.
fn import_units(
    asg: &mut AssignStack,
    cdb: &mut ClauseDB,
    state: &mut State,
    vam: &mut VarMap,
    shr: &mut Sharing,
) -> MaybeInconsistent {
    while let Some(elit) = shr.poll_unit() {
        let (mapped, fresh) = vam.map_in(elit);
        if fresh {
            asg.handle(SolverEvent::NewVar);
            cdb.handle(SolverEvent::NewVar);
            state.handle(SolverEvent::NewVar);
        }
        let MappedLit::Ok(l) = mapped else { continue };
        if fresh {
            asg.activate_var(l.vi());
        }
        if !asg.var(l.vi()).is(FlagVar::ACTIVE) {
            continue;
        }
        if asg.assign(l.vi()).is_none() {
            cdb.certification.push_add([elit]);
            asg.assign_at_root_level(l)?;
            state.iterating = true;
            state[Stat::ImportedUnit] += 1;
        }
    }
    Ok(())
}

/// drain foreign clauses at the root level. Returns `Ok(true)` when an
/// imported clause is falsified outright, which proves UNSAT.
fn import_clauses(
    asg: &mut AssignStack,
    cdb: &mut ClauseDB,
    state: &mut State,
    vam: &mut VarMap,
    shr: &mut Sharing,
) -> Result<bool, SolverError> {
    let mut glue = 0u16;
    let mut buf: Vec<i32> = Vec::new();
    'next_import: while shr.poll_clause(&mut glue, &mut buf) {
        let mut lits: Vec<Lit> = Vec::with_capacity(buf.len());
        for elit in buf.iter() {
            let (mapped, fresh) = vam.map_in(*elit);
            if fresh {
                asg.handle(SolverEvent::NewVar);
                cdb.handle(SolverEvent::NewVar);
                state.handle(SolverEvent::NewVar);
            }
            match mapped {
                MappedLit::Ok(l) => {
                    if fresh {
                        asg.activate_var(l.vi());
                    }
                    if !asg.var(l.vi()).is(FlagVar::ACTIVE) {
                        continue 'next_import;
                    }
                    lits.push(l);
                }
                // unmapped or eliminated on our side; not worth absorbing
                _ => continue 'next_import,
            }
        }
        lits.sort_unstable();
        lits.dedup();
        if lits.windows(2).any(|w| w[0] == !w[1]) {
            continue;
        }
        let mut num_false = 0;
        let mut satisfied = false;
        for l in lits.iter() {
            match asg.assigned(*l) {
                Some(false) => num_false += 1,
                Some(true) => satisfied = true,
                None => (),
            }
        }
        if num_false == lits.len() {
            state.flush("an imported clause is falsified at the root level");
            return Ok(true);
        }
        if lits.len() == 1 {
            let l = lits[0];
            if asg.assign(l.vi()).is_none() {
                cdb.certification.push_add([vam.externalize(l)]);
                asg.assign_at_root_level(l)?;
                state.iterating = true;
            }
            state[Stat::ImportedClause] += 1;
            continue;
        }
        // order non-false literals to the front to keep the watch scheme
        // sound; an asserting clause then has its unassigned literal first
        lits.sort_by_key(|l| match asg.assigned(*l) {
            None => 0,
            Some(true) => 1,
            Some(false) => 2,
        });
        let asserting = !satisfied && num_false + 1 == lits.len();
        match cdb.new_clause(asg, vam, &mut lits, true, glue) {
            RefClause::BiClause => {
                if asserting {
                    asg.assign_by_implication(lits[0], AssignReason::BinaryLink(lits[1]));
                    state.iterating = true;
                }
            }
            RefClause::Clause(cr) => {
                if asserting {
                    asg.assign_by_implication(lits[0], AssignReason::Implication(cr));
                    state.iterating = true;
                } else {
                    cdb.arena.set_used(cr, 1 + (glue <= cdb.tier2) as u32);
                }
            }
            _ => continue,
        }
        state[Stat::ImportedClause] += 1;
    }
    Ok(false)
}
