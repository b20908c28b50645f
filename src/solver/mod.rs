//! Module `solver` provides the top-level API as a SAT solver.
/// clause ingestion
mod build;
/// conflict analysis
mod conflict;
/// restart heuristics
mod restart;
/// the search loop
mod search;

pub use self::{
    build::SolverBuildIF,
    restart::{ProgressUpdate, RestartIF, Restarter, SearchMode},
    search::SolverSearchIF,
};

use {
    crate::{
        assign::{AssignStack, VarSelectIF},
        cdb::ClauseDB,
        config::Config,
        processor::{Processor, SimplifyIF},
        share::{ClauseExchangeIF, Sharing},
        state::State,
        types::*,
        vam::{MappedLit, VarMap, VarMapIF},
    },
    std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Events for sub-module synchronization.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SolverEvent {
    /// a fresh internal variable was allocated.
    NewVar,
    /// a var was asserted at the root level.
    Assert(VarId),
    /// a var was removed by a simplifier.
    Eliminate(VarId),
    /// search jumped back to the root level.
    Restart,
}

/// Normal results returned by Solver.
#[derive(Debug, Eq, PartialEq)]
pub enum Certificate {
    SAT(Vec<i32>),
    UNSAT,
    UNKNOWN,
}

impl Certificate {
    /// the conventional exit status for CLI wrappers.
    pub fn exit_code(&self) -> i32 {
        match self {
            Certificate::SAT(_) => 10,
            Certificate::UNSAT => 20,
            Certificate::UNKNOWN => 0,
        }
    }
}

/// The return type of `Solver::solve`.
/// This captures the following cases:
/// * `Certificate::SAT` -- solved with a satisfiable assignment set,
/// * `Certificate::UNSAT` -- proved that it's an unsatisfiable problem,
/// * `Certificate::UNKNOWN` -- a limit fired or termination was requested,
/// * `SolverError::*` -- caused by a contract violation or a bug.
pub type SolverResult = Result<Certificate, SolverError>;

/// Absolute counter targets; a limit of `n` set after `c` conflicts fires
/// at `c + n`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    pub conflicts: Option<usize>,
    pub decisions: Option<usize>,
}

/// The SAT solver object consisting of sub-modules.
///
/// ```
/// use parsat::{config::Config, solver::*, types::*};
///
/// let mut s = Solver::try_from(vec![vec![1i32, 2], vec![-1, 2], vec![1, -2]])
///     .expect("a solvable formula");
/// if let Ok(Certificate::SAT(model)) = s.solve() {
///     assert!(model.contains(&1));
///     assert!(model.contains(&2));
/// } else {
///     panic!("it should be satisfied");
/// }
/// ```
#[derive(Debug)]
pub struct Solver {
    /// assignment management
    pub asg: AssignStack,
    /// clause container
    pub cdb: ClauseDB,
    /// restart management
    pub rst: Restarter,
    /// misc data holder
    pub state: State,
    /// external-to-internal variable mapping
    pub vam: VarMap,
    /// peer exchange endpoint
    pub shr: Sharing,
    /// simplification boundary
    pub processor: Processor,
    pub(super) limits: SearchLimits,
    pub(super) terminate: Arc<AtomicBool>,
    /// an empty clause was derived; every `solve` returns UNSAT.
    pub(super) inconsistent: bool,
    /// `solve` ran at least once; `add` is rejected from now on.
    pub(super) searched: bool,
    pub(super) composer: build::ClauseComposer,
}

impl Instantiate for Solver {
    fn instantiate(config: &Config, cnf: &CNFDescription) -> Solver {
        Solver {
            asg: AssignStack::instantiate(config, cnf),
            cdb: ClauseDB::instantiate(config, cnf),
            rst: Restarter::instantiate(config, cnf),
            state: State::instantiate(config, cnf),
            vam: VarMap::instantiate(config, cnf),
            shr: Sharing::instantiate(config, cnf),
            processor: Processor::instantiate(config, cnf),
            limits: SearchLimits::default(),
            terminate: Arc::new(AtomicBool::new(false)),
            inconsistent: false,
            searched: false,
            composer: build::ClauseComposer::instantiate(config, cnf),
        }
    }
}

impl Default for Solver {
    fn default() -> Solver {
        Solver::instantiate(&Config::default(), &CNFDescription::default())
    }
}

impl Solver {
    /// set an absolute conflict budget for the next `solve`.
    pub fn set_conflict_limit(&mut self, quota: usize) {
        self.limits.conflicts = Some(self.asg.num_conflict + quota);
    }
    /// set an absolute decision budget for the next `solve`.
    pub fn set_decision_limit(&mut self, quota: usize) {
        self.limits.decisions = Some(self.asg.num_decision + quota);
    }
    /// drop both budgets.
    pub fn clear_limits(&mut self) {
        self.limits = SearchLimits::default();
    }
    /// a handle peers may use to stop this instance.
    pub fn terminator(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.terminate)
    }
    /// request cooperative termination; search returns UNKNOWN at the next
    /// loop boundary.
    pub fn terminate(&self) {
        self.terminate.store(true, Ordering::Relaxed);
    }
    /// register a sharing endpoint.
    pub fn set_sharing(&mut self, channel: Box<dyn ClauseExchangeIF + Send>) {
        self.shr.connect(channel);
    }
    /// register a simplifier behind the in-processing boundary.
    pub fn set_simplifier(&mut self, plugin: Box<dyn SimplifyIF + Send>) {
        self.processor.connect(plugin);
    }
    pub fn increase_clause_production(&mut self) {
        self.shr.increase_production();
    }
    pub fn decrease_clause_production(&mut self) {
        self.shr.decrease_production();
    }
    /// pin the branching heuristic; the portfolio driver diversifies
    /// workers through this.
    pub fn set_heuristic(&mut self, use_vsids: bool) {
        self.asg.force_heuristic(use_vsids);
    }
    /// write a polarity into the saved-phase cache of an external var.
    pub fn set_polarity(&mut self, elit: i32, polarity: i32) {
        let (mapped, fresh) = self.vam.map_in(elit);
        if fresh {
            self.broadcast_new_var();
        }
        if let MappedLit::Ok(l) = mapped {
            self.asg.set_saved_phase(l.vi(), 0 < polarity);
        }
    }
    /// the truth of an external literal: `elit`, `-elit`, or 0 if unknown.
    /// Eliminated variables trigger model extension on first query.
    pub fn value(&mut self, elit: i32) -> i32 {
        if self.vam.needs_extension() {
            self.vam.extend_model(&self.asg);
        }
        self.vam.value_of(&self.asg, elit)
    }
    /// counters for the portfolio driver.
    pub fn statistics(&self) -> SolvingStatistics {
        let (conflicts, decisions, propagations, restarts) = self.asg.exports();
        SolvingStatistics {
            conflicts,
            decisions,
            propagations,
            restarts,
            reductions: self.cdb.num_reduction,
        }
    }
    pub(super) fn broadcast_new_var(&mut self) {
        self.asg.handle(SolverEvent::NewVar);
        self.cdb.handle(SolverEvent::NewVar);
        self.state.handle(SolverEvent::NewVar);
        self.composer.handle(SolverEvent::NewVar);
    }
}

/// Monotone counters exposed to the portfolio driver.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SolvingStatistics {
    pub conflicts: usize,
    pub decisions: usize,
    pub propagations: usize,
    pub restarts: usize,
    pub reductions: usize,
}
