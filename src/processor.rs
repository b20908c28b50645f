//! The simplification boundary.
//!
//! Real pre/in-processors (variable elimination, probing, vivification,
//! subsumption) are external collaborators. The core guarantees they run
//! at decision level zero over a consistent trail and clause database;
//! they may mark clauses garbage, deactivate variables, and push
//! reconstruction entries. Watches are rebuilt here if the arena was
//! compacted while they ran.
use crate::{
    assign::{AssignIF, AssignStack},
    cdb::{ClauseDB, ClauseDBIF},
    types::*,
    vam::VarMap,
};

/// The capability a plugged simplifier implements.
pub trait SimplifyIF {
    /// run one simplification epoch.
    ///
    /// # Errors
    ///
    /// `SolverError::RootLevelConflict` if the simplifier derives UNSAT.
    fn simplify(
        &mut self,
        asg: &mut AssignStack,
        cdb: &mut ClauseDB,
        vam: &mut VarMap,
    ) -> MaybeInconsistent;
}

/// Scheduler and dispatcher for the plugged simplifier.
#[derive(Default)]
pub struct Processor {
    plugin: Option<Box<dyn SimplifyIF + Send>>,
    next: usize,
    interval: usize,
    pub num_simplify: usize,
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Processor[active:{}, invoked:{}]",
            self.plugin.is_some(),
            self.num_simplify,
        )
    }
}

impl Instantiate for Processor {
    fn instantiate(config: &Config, _cnf: &CNFDescription) -> Self {
        Processor {
            next: config.simplify_interval,
            interval: config.simplify_interval,
            ..Processor::default()
        }
    }
}

impl Processor {
    pub fn connect(&mut self, plugin: Box<dyn SimplifyIF + Send>) {
        self.plugin = Some(plugin);
    }
    pub fn is_active(&self) -> bool {
        self.plugin.is_some()
    }
    /// `true` if the scheduler fired.
    pub fn firing(&self, num_conflict: usize) -> bool {
        self.plugin.is_some() && self.next <= num_conflict
    }
    /// invoke the simplifier.
    /// # CAVEAT
    /// *precondition*: decision level == 0.
    pub fn invoke(
        &mut self,
        asg: &mut AssignStack,
        cdb: &mut ClauseDB,
        vam: &mut VarMap,
    ) -> MaybeInconsistent {
        debug_assert_eq!(asg.decision_level(), asg.root_level());
        let Some(ref mut plugin) = self.plugin else {
            return Ok(());
        };
        let result = plugin.simplify(asg, cdb, vam);
        cdb.garbage_collect_if_needed(asg);
        self.num_simplify += 1;
        self.next = asg.num_conflict + self.interval.max(1);
        result
    }
}
