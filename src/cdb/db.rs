//! methods on `ClauseDB`
use {
    super::{
        arena::Arena,
        certificate::CertificationDumper,
        watch::{WatchListIF, Watcher},
        RefClause,
    },
    crate::{
        assign::{AssignIF, AssignReason, AssignStack},
        types::*,
        vam::{VarMap, VarMapIF},
    },
};

/// Clause container: the arena for long clauses, the watcher lists that
/// both index them and *are* the binary clauses, and the certificate
/// stream.
#[derive(Clone, Debug, Default)]
pub struct ClauseDB {
    pub(crate) arena: Arena,
    pub(crate) watch: Vec<Vec<Watcher>>,
    pub(crate) certification: CertificationDumper,
    /// soft limit of the number of clauses; 0 means no limit.
    soft_limit: usize,
    pub(crate) tier1: u16,
    pub(crate) tier2: u16,
    next_reduce: usize,
    reduce_step: usize,
    reduce_step_inc: usize,

    //
    //## Statistics
    //
    pub num_clause: usize,
    pub num_bi_clause: usize,
    pub num_learnt: usize,
    pub num_reduction: usize,
    pub num_compaction: usize,
}

impl Instantiate for ClauseDB {
    fn instantiate(config: &Config, cnf: &CNFDescription) -> ClauseDB {
        ClauseDB {
            arena: Arena::with_capacity(8 * cnf.num_of_clauses),
            watch: vec![Vec::new(); 2 * cnf.num_of_variables],
            certification: CertificationDumper::instantiate(config, cnf),
            soft_limit: config.clause_limit,
            tier1: config.tier1_glue,
            tier2: config.tier2_glue,
            next_reduce: config.reduce_interval,
            reduce_step: config.reduce_interval,
            reduce_step_inc: config.reduce_interval_inc,
            ..ClauseDB::default()
        }
    }
    fn handle(&mut self, e: SolverEvent) {
        if let SolverEvent::NewVar = e {
            self.watch.push(Vec::new());
            self.watch.push(Vec::new());
        }
    }
}

/// API for clause management like `new_clause`, `remove_clause`, and `reduce`.
pub trait ClauseDBIF {
    /// allocate a new clause and return a reference to it. For learnt
    /// clauses the caller guarantees the asserting literal at index 0 and
    /// a backjump-level literal at index 1.
    fn new_clause(
        &mut self,
        asg: &AssignStack,
        vam: &VarMap,
        vec: &mut Vec<Lit>,
        learnt: bool,
        glue: u16,
    ) -> RefClause;
    /// flag a long clause dead and detach its watchers.
    fn remove_clause(&mut self, vam: &VarMap, cr: ClauseRef);
    /// drop a binary clause from the watch lists.
    fn remove_bi_clause(&mut self, vam: &VarMap, l0: Lit, l1: Lit);
    /// record that a clause took part in conflict analysis.
    fn mark_clause_as_used(&mut self, cr: ClauseRef);
    /// `true` if the reduction scheduler fired.
    fn reducing(&self, num_conflict: usize) -> bool;
    /// reduce the learnt clause database. Locked clauses (reasons on the
    /// trail) survive at any decision level.
    fn reduce(&mut self, asg: &mut AssignStack, vam: &VarMap);
    /// compact the arena if enough garbage accumulated, rewriting every
    /// stored reference.
    fn garbage_collect_if_needed(&mut self, asg: &mut AssignStack);
    /// check the number of clauses:
    /// * `Err(SolverError::OutOfMemory)` -- the db size is over the limit.
    /// * `Ok(true)` -- enough small.
    /// * `Ok(false)` -- close to the limit.
    fn check_size(&self) -> Result<bool, SolverError>;
    /// returns None if the given assignment is a model of the clauses held
    /// here. Otherwise returns a falsified clause's literals.
    fn validate(&self, asg: &AssignStack, strict: bool) -> Option<Vec<Lit>>;
}

impl ClauseDBIF for ClauseDB {
    fn new_clause(
        &mut self,
        asg: &AssignStack,
        vam: &VarMap,
        vec: &mut Vec<Lit>,
        learnt: bool,
        glue: u16,
    ) -> RefClause {
        match vec.len() {
            0 => return RefClause::EmptyClause,
            1 => return RefClause::UnitClause(vec[0]),
            _ => (),
        }
        debug_assert!(vec.iter().all(|l| l.vi() < asg.num_vars));
        if learnt {
            self.certification
                .push_add(vec.iter().map(|l| vam.externalize(*l)));
        }
        self.num_clause += 1;
        if vec.len() == 2 {
            self.watch.attach_bi_watch(vec[0], vec[1], learnt);
            self.num_bi_clause += 1;
            return RefClause::BiClause;
        }
        let cr = self.arena.alloc(vec, learnt, glue.max(1));
        if learnt {
            self.num_learnt += 1;
            if glue <= self.tier1 {
                self.arena.set_keep(cr);
            }
        } else {
            self.arena.set_keep(cr);
        }
        self.watch.attach_long_watch(cr, vec[0], vec[1]);
        RefClause::Clause(cr)
    }
    fn remove_clause(&mut self, vam: &VarMap, cr: ClauseRef) {
        debug_assert!(!self.arena.is_garbage(cr));
        self.certification
            .push_delete(self.arena.iter_lits(cr).map(|l| vam.externalize(l)));
        let l0 = self.arena.lit0(cr);
        let l1 = self.arena.lit1(cr);
        self.watch.detach_long_watch(cr, l0, l1);
        if self.arena.is_redundant(cr) {
            self.num_learnt -= 1;
        }
        self.num_clause -= 1;
        self.arena.mark_garbage(cr);
    }
    fn remove_bi_clause(&mut self, vam: &VarMap, l0: Lit, l1: Lit) {
        if self.watch.detach_bi_watch(l0, l1) {
            self.certification
                .push_delete([vam.externalize(l0), vam.externalize(l1)]);
            self.num_bi_clause -= 1;
            self.num_clause -= 1;
        }
    }
    fn mark_clause_as_used(&mut self, cr: ClauseRef) {
        let bonus = 1 + (self.arena.glue(cr) <= self.tier2) as u32;
        let used = self.arena.used(cr).max(bonus);
        self.arena.set_used(cr, used);
    }
    fn reducing(&self, num_conflict: usize) -> bool {
        self.next_reduce <= num_conflict
    }
    fn reduce(&mut self, asg: &mut AssignStack, vam: &VarMap) {
        let mut victims: Vec<(u16, u32, ClauseRef)> = Vec::new();
        let refs = self.arena.iter_refs().collect::<Vec<_>>();
        for cr in refs {
            if !self.arena.is_redundant(cr) || self.arena.is_keep(cr) {
                continue;
            }
            let glue = self.arena.glue(cr);
            if glue <= self.tier1 {
                continue;
            }
            let used = self.arena.used(cr);
            if 0 < used {
                // age the clause; tier2 survivors get another round
                self.arena.set_used(cr, used - 1);
                if glue <= self.tier2 {
                    continue;
                }
            }
            if self.is_locked(asg, cr) {
                continue;
            }
            victims.push((glue, used, cr));
        }
        // worst first: big glue, then rarely used
        victims.sort_unstable_by(|a, b| (b.0, a.1).cmp(&(a.0, b.1)));
        for (_, _, cr) in victims.iter().take(victims.len() / 2) {
            self.remove_clause(vam, *cr);
        }
        self.num_reduction += 1;
        self.next_reduce = asg.num_conflict + self.reduce_step;
        self.reduce_step += self.reduce_step_inc;
        self.garbage_collect_if_needed(asg);
    }
    fn garbage_collect_if_needed(&mut self, asg: &mut AssignStack) {
        if self.arena.garbage_ratio() < 0.25 {
            return;
        }
        let forward = self.arena.compact();
        for ws in self.watch.iter_mut() {
            for w in ws.iter_mut() {
                if let Watcher::Long { cref, .. } = w {
                    *cref = ClauseRef::from(forward[&u32::from(*cref)]);
                }
            }
        }
        asg.rewrite_reason_refs(&forward);
        self.num_compaction += 1;
    }
    fn check_size(&self) -> Result<bool, SolverError> {
        if self.soft_limit == 0 || self.num_clause <= self.soft_limit {
            let nc = self.num_clause;
            Ok(self.soft_limit == 0 || 4 * nc < 3 * self.soft_limit)
        } else {
            Err(SolverError::OutOfMemory)
        }
    }
    fn validate(&self, asg: &AssignStack, strict: bool) -> Option<Vec<Lit>> {
        for (code, ws) in self.watch.iter().enumerate() {
            let l0 = Lit::from(code);
            for w in ws.iter() {
                if let Watcher::Binary { other, .. } = w {
                    // visit each binary clause once
                    if usize::from(*other) < usize::from(l0) {
                        continue;
                    }
                    let falsified = [l0, *other].iter().all(|l| {
                        asg.assigned(*l) == Some(false)
                            || (strict && asg.assigned(*l).is_none())
                    });
                    if falsified {
                        return Some(vec![l0, *other]);
                    }
                }
            }
        }
        for cr in self.arena.iter_refs() {
            let falsified = self.arena.iter_lits(cr).all(|l| {
                asg.assigned(l) == Some(false) || (strict && asg.assigned(l).is_none())
            });
            if falsified {
                return Some(self.arena.lits(cr));
            }
        }
        None
    }
}

impl ClauseDB {
    /// `true` while the clause is the reason of its first literal.
    fn is_locked(&self, asg: &AssignStack, cr: ClauseRef) -> bool {
        let l0 = self.arena.lit0(cr);
        asg.assigned(l0) == Some(true) && asg.reason(l0.vi()) == AssignReason::Implication(cr)
    }
    /// audit the watch invariant: every live long clause is watched by
    /// exactly its first two literals, and every blocking literal occurs in
    /// its clause.
    pub(crate) fn watches_are_sane(&self) -> bool {
        for cr in self.arena.iter_refs() {
            let l0 = self.arena.lit0(cr);
            let l1 = self.arena.lit1(cr);
            for watched in [l0, l1] {
                let n = self.watch[usize::from(watched)]
                    .iter()
                    .filter(|w| matches!(w, Watcher::Long { cref, .. } if *cref == cr))
                    .count();
                if n != 1 {
                    return false;
                }
            }
            for ws in self.watch.iter() {
                for w in ws.iter() {
                    if let Watcher::Long { blocking, cref } = w {
                        if *cref == cr && !self.arena.iter_lits(cr).any(|l| l == *blocking) {
                            return false;
                        }
                    }
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(i: i32) -> Lit {
        Lit::from_assign(i.unsigned_abs() as usize - 1, 0 < i)
    }

    fn setup(nv: usize) -> (AssignStack, ClauseDB, VarMap) {
        let cnf = CNFDescription {
            num_of_variables: nv,
            ..CNFDescription::default()
        };
        let config = Config::default();
        let asg = AssignStack::instantiate(&config, &cnf);
        let cdb = ClauseDB::instantiate(&config, &cnf);
        let mut vam = VarMap::instantiate(&config, &cnf);
        for i in 1..=nv as i32 {
            vam.map_in(i);
        }
        (asg, cdb, vam)
    }

    #[test]
    fn test_new_clause_dispatch() {
        let (asg, mut cdb, vam) = setup(4);
        let mut empty: Vec<Lit> = Vec::new();
        assert_eq!(
            cdb.new_clause(&asg, &vam, &mut empty, false, 0),
            RefClause::EmptyClause
        );
        let mut unit = vec![lit(1)];
        assert_eq!(
            cdb.new_clause(&asg, &vam, &mut unit, false, 0),
            RefClause::UnitClause(lit(1))
        );
        let mut bi = vec![lit(1), lit(-2)];
        assert_eq!(
            cdb.new_clause(&asg, &vam, &mut bi, false, 1),
            RefClause::BiClause
        );
        assert_eq!(cdb.num_bi_clause, 1);
        let mut long = vec![lit(1), lit(2), lit(3)];
        let RefClause::Clause(cr) = cdb.new_clause(&asg, &vam, &mut long, true, 2) else {
            panic!("expected a long clause");
        };
        assert_eq!(cdb.num_clause, 2);
        assert_eq!(cdb.num_learnt, 1);
        assert!(cdb.arena.is_keep(cr));
        assert!(cdb.watches_are_sane());
    }

    #[test]
    fn test_remove_clause_detaches_watchers() {
        let (asg, mut cdb, vam) = setup(4);
        let mut long = vec![lit(1), lit(2), lit(3)];
        let RefClause::Clause(cr) = cdb.new_clause(&asg, &vam, &mut long, true, 3) else {
            panic!("expected a long clause");
        };
        cdb.remove_clause(&vam, cr);
        assert_eq!(cdb.num_clause, 0);
        assert_eq!(cdb.num_learnt, 0);
        assert!(cdb.watch.iter().all(|ws| ws.is_empty()));
    }

    #[test]
    fn test_reduce_spares_tier1_and_keep() {
        let (mut asg, mut cdb, vam) = setup(12);
        // a precious low-glue learnt
        let mut precious = vec![lit(1), lit(2), lit(3)];
        let RefClause::Clause(kept) = cdb.new_clause(&asg, &vam, &mut precious, true, 2) else {
            panic!("expected a long clause");
        };
        // a pile of high-glue learnts
        let mut bulk = Vec::new();
        for i in 0..3 {
            let mut c = vec![lit(4 + i), lit(7 + i), lit(-1 - i)];
            let RefClause::Clause(cr) = cdb.new_clause(&asg, &vam, &mut c, true, 9) else {
                panic!("expected a long clause");
            };
            bulk.push(cr);
        }
        let before = cdb.num_learnt;
        cdb.reduce(&mut asg, &vam);
        assert!(cdb.num_learnt < before);
        assert!(!cdb.arena.is_garbage(kept));
        assert_eq!(cdb.num_reduction, 1);
    }

    #[test]
    fn test_garbage_collection_rewrites_watches() {
        let (mut asg, mut cdb, vam) = setup(9);
        let mut c0 = vec![lit(1), lit(2), lit(3)];
        let RefClause::Clause(cr0) = cdb.new_clause(&asg, &vam, &mut c0, false, 3) else {
            panic!("expected a long clause");
        };
        let mut c1 = vec![lit(4), lit(5), lit(6), lit(7)];
        let RefClause::Clause(cr1) = cdb.new_clause(&asg, &vam, &mut c1, true, 4) else {
            panic!("expected a long clause");
        };
        let mut c2 = vec![lit(-1), lit(-4), lit(9)];
        let RefClause::Clause(_) = cdb.new_clause(&asg, &vam, &mut c2, true, 3) else {
            panic!("expected a long clause");
        };
        let _ = cr0;
        cdb.remove_clause(&vam, cr1);
        cdb.garbage_collect_if_needed(&mut asg);
        assert_eq!(cdb.num_compaction, 1);
        assert!(cdb.watches_are_sane());
    }
}
