//! Crate `state` is a collection of internal data, used by the whole
//! search process, plus the progress reporter.
use {
    crate::{
        assign::AssignStack,
        cdb::ClauseDB,
        solver::{RestartIF, Restarter},
        types::*,
    },
    std::{
        fmt,
        ops::{Index, IndexMut},
        time::Instant,
    },
};

/// stat index.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stat {
    /// the number of conflicts without a decision in between
    NoDecisionConflict = 0,
    /// the number of units accepted from peers
    ImportedUnit,
    /// the number of clauses accepted from peers
    ImportedClause,
    /// the number of clauses handed to peers
    ExportedClause,
    /// the number of simplifier invocations
    Simplification,
    /// the number of trail flushes at the root level
    Flush,
    /// don't use this dummy (sentinel at the end of the list).
    EndOfStatIndex,
}

/// Data storage for the search process and its observers.
#[derive(Clone, Debug)]
pub struct State {
    /// solver configuration
    pub config: Config,
    /// collection of statistics data
    pub stats: [usize; Stat::EndOfStatIndex as usize],
    /// the problem description
    pub target: CNFDescription,
    /// the scratchpad holding the clause under construction by analysis
    pub new_learnt: Vec<Lit>,
    /// level stamps for LBD computation
    pub lbd_temp: Vec<usize>,
    pub lbd_stamp: usize,
    /// a progress event from import wants a report
    pub iterating: bool,
    /// EMA of conflicting levels
    pub c_lvl: Ema,
    /// EMA of backjump levels
    pub b_lvl: Ema,
    /// hold the previous number of non-conflicting assignments
    pub last_asg: usize,
    progress_cnt: usize,
    start: Instant,
}

impl Default for State {
    fn default() -> State {
        State {
            config: Config::default(),
            stats: [0; Stat::EndOfStatIndex as usize],
            target: CNFDescription::default(),
            new_learnt: Vec::new(),
            lbd_temp: Vec::new(),
            lbd_stamp: 0,
            iterating: false,
            c_lvl: Ema::new(5_000),
            b_lvl: Ema::new(5_000),
            last_asg: 0,
            progress_cnt: 0,
            start: Instant::now(),
        }
    }
}

impl Index<Stat> for State {
    type Output = usize;
    #[inline]
    fn index(&self, i: Stat) -> &usize {
        &self.stats[i as usize]
    }
}

impl IndexMut<Stat> for State {
    #[inline]
    fn index_mut(&mut self, i: Stat) -> &mut usize {
        &mut self.stats[i as usize]
    }
}

impl Instantiate for State {
    fn instantiate(config: &Config, cnf: &CNFDescription) -> State {
        State {
            config: config.clone(),
            target: cnf.clone(),
            lbd_temp: vec![0; cnf.num_of_variables + 1],
            ..State::default()
        }
    }
    fn handle(&mut self, e: SolverEvent) {
        if let SolverEvent::NewVar = e {
            self.lbd_temp.push(0);
            self.target.num_of_variables += 1;
        }
    }
}

/// API for state/statistics management and progress reporting.
pub trait StateIF {
    /// return elapsed time as seconds.
    fn elapsed(&self) -> f64;
    /// write a header of the progress report.
    fn progress_header(&mut self);
    /// write a progress report.
    fn progress(&mut self, asg: &AssignStack, cdb: &ClauseDB, rst: &Restarter);
    /// write a one-shot message.
    fn flush<S: AsRef<str>>(&self, mes: S);
}

impl StateIF for State {
    fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
    fn progress_header(&mut self) {
        if self.config.quiet_mode {
            return;
        }
        println!("c {}", self.target);
        println!(
            "c {:>9} {:>9} {:>9} {:>9} {:>7} {:>7} {:>7}",
            "conflict", "decision", "restart", "clause", "learnt", "c-lvl", "b-lvl",
        );
    }
    fn progress(&mut self, asg: &AssignStack, cdb: &ClauseDB, rst: &Restarter) {
        if self.config.quiet_mode {
            return;
        }
        self.progress_cnt += 1;
        let (num_conflict, num_decision, _num_propagation, num_restart) = asg.exports();
        println!(
            "c {:>9} {:>9} {:>9} {:>9} {:>7} {:>7.1} {:>7.1} {:?} {}",
            num_conflict,
            num_decision,
            num_restart,
            cdb.num_clause,
            cdb.num_learnt,
            self.c_lvl.get_fast(),
            self.b_lvl.get_fast(),
            rst.mode(),
            asg.heuristic_name(),
        );
    }
    fn flush<S: AsRef<str>>(&self, mes: S) {
        if self.config.quiet_mode {
            return;
        }
        println!("c {}", mes.as_ref());
    }
}

impl State {
    /// compute the LBD (the number of distinct decision levels) of `vec`.
    pub fn compute_lbd(&mut self, vec: &[Lit], level_of: impl Fn(VarId) -> DecisionLevel) -> u16 {
        self.lbd_stamp += 1;
        let key = self.lbd_stamp;
        let mut cnt = 0;
        for l in vec {
            let lv = level_of(l.vi()) as usize;
            if lv != 0 && self.lbd_temp[lv] != key {
                self.lbd_temp[lv] = key;
                cnt += 1;
            }
        }
        cnt.max(1)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "State[{}, elapsed:{:.2}]", self.target, self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lbd_counts_distinct_levels() {
        let cnf = CNFDescription {
            num_of_variables: 6,
            ..CNFDescription::default()
        };
        let mut state = State::instantiate(&Config::default(), &cnf);
        let levels: Vec<DecisionLevel> = vec![1, 1, 2, 3, 0, 3];
        let vec: Vec<Lit> = (0..6).map(|vi| Lit::from_assign(vi, true)).collect();
        // level 0 literals don't count; {1, 2, 3} remain
        assert_eq!(state.compute_lbd(&vec, |vi| levels[vi]), 3);
        // stamps don't leak between calls
        assert_eq!(state.compute_lbd(&vec[0..2], |vi| levels[vi]), 1);
    }

    #[test]
    fn test_stat_indexing() {
        let mut state = State::default();
        state[Stat::NoDecisionConflict] += 2;
        assert_eq!(state[Stat::NoDecisionConflict], 2);
    }
}
