//! Decision var selection
use {
    super::{AssignStack, Heuristic},
    crate::types::*,
};

/// exploration constant of the UCB1 rule.
const UCB_C: f64 = 1.4;

/// API for var selection, depending on an internal heap.
pub trait VarSelectIF {
    /// select a new decision variable and its phase.
    fn select_decision_literal(&mut self) -> Lit;
    /// update the internal heap on var order.
    fn update_order(&mut self, vi: VarId);
    /// rebuild the active heap from scratch.
    fn rebuild_order(&mut self);
    /// the active branching heuristic.
    fn current_heuristic(&self) -> Heuristic;
    /// pin the heuristic, disabling the bandit. The portfolio driver uses
    /// this to diversify workers.
    fn force_heuristic(&mut self, use_vsids: bool);
    /// close the current bandit epoch and pick the arm for the next one.
    /// Called at restarts.
    fn arbitrate_heuristic(&mut self);
}

impl VarSelectIF for AssignStack {
    fn select_decision_literal(&mut self) -> Lit {
        loop {
            let vi = match self.heuristic {
                Heuristic::Vsids => self.vsids_order.get_root(&self.vsids),
                Heuristic::Chb => self.chb_order.get_root(&self.chb),
            };
            let Some(vi) = vi else {
                // every eligible var sits on the trail already
                unreachable!("decision requested with no free var");
            };
            if self.assign[vi].is_some()
                || !self.flag[vi].is(FlagVar::ACTIVE)
                || self.flag[vi].is(FlagVar::ELIMINATED)
            {
                continue;
            }
            return Lit::from_assign(vi, self.select_phase(vi));
        }
    }
    fn update_order(&mut self, vi: VarId) {
        match self.heuristic {
            Heuristic::Vsids => self.vsids_order.update(&self.vsids, vi),
            Heuristic::Chb => self.chb_order.update(&self.chb, vi),
        }
    }
    fn rebuild_order(&mut self) {
        match self.heuristic {
            Heuristic::Vsids => {
                self.vsids_order.clear();
                for vi in 0..self.num_vars {
                    if self.assign[vi].is_none() && self.flag[vi].is(FlagVar::ACTIVE) {
                        self.vsids_order.insert(&self.vsids, vi);
                    }
                }
            }
            Heuristic::Chb => {
                self.chb_order.clear();
                for vi in 0..self.num_vars {
                    if self.assign[vi].is_none() && self.flag[vi].is(FlagVar::ACTIVE) {
                        self.chb_order.insert(&self.chb, vi);
                    }
                }
            }
        }
    }
    fn current_heuristic(&self) -> Heuristic {
        self.heuristic
    }
    fn force_heuristic(&mut self, use_vsids: bool) {
        self.mab_enable = false;
        self.heuristic_forced = true;
        let target = if use_vsids {
            Heuristic::Vsids
        } else {
            Heuristic::Chb
        };
        if self.heuristic != target {
            self.heuristic = target;
            self.rebuild_order();
        }
    }
    fn arbitrate_heuristic(&mut self) {
        if !self.mab_enable || self.heuristic_forced {
            return;
        }
        let arm = self.heuristic as usize;
        let (base_conflict, base_decision) = self.mab_epoch_base;
        let conflicts = (self.num_conflict - base_conflict) as f64;
        let decisions = (self.num_decision - base_decision).max(1) as f64;
        self.mab_count[arm] += 1;
        self.mab_reward[arm] += conflicts / decisions;
        self.mab_epoch_base = (self.num_conflict, self.num_decision);
        let next = self.select_arm();
        if next != self.heuristic {
            self.heuristic = next;
            self.rebuild_order();
        }
    }
}

impl AssignStack {
    /// phase selection: the saved polarity, overridden by the rephase
    /// target while stabilizing.
    fn select_phase(&self, vi: VarId) -> bool {
        if self.stabilizing && self.num_rephase != 0 {
            return self.flag[vi].is(FlagVar::TARGET_PHASE);
        }
        self.flag[vi].is(FlagVar::PHASE)
    }
    /// UCB1 over the two arms; unplayed arms go first.
    fn select_arm(&self) -> Heuristic {
        let total = (self.mab_count[0] + self.mab_count[1]) as f64;
        let score = |arm: usize| -> f64 {
            if self.mab_count[arm] == 0 {
                return f64::INFINITY;
            }
            let n = self.mab_count[arm] as f64;
            self.mab_reward[arm] / n + UCB_C * (total.ln() / n).sqrt()
        };
        if score(1) <= score(0) {
            Heuristic::Vsids
        } else {
            Heuristic::Chb
        }
    }
    /// the number of decisions in the bandit statistics, per arm.
    pub fn mab_profile(&self) -> [usize; 2] {
        self.mab_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assign::AssignIF;
    use crate::assign::PropagateIF;

    fn stack_of(n: usize) -> AssignStack {
        let cnf = CNFDescription {
            num_of_variables: n,
            ..CNFDescription::default()
        };
        let mut asg = AssignStack::instantiate(&Config::default(), &cnf);
        for vi in 0..n {
            asg.activate_var(vi);
        }
        asg
    }

    #[test]
    fn test_decision_follows_activity() {
        let mut asg = stack_of(3);
        asg.vsids[1] = 5.0;
        asg.rebuild_order();
        let l = asg.select_decision_literal();
        assert_eq!(l.vi(), 1);
    }

    #[test]
    fn test_decision_skips_assigned_vars() {
        let mut asg = stack_of(2);
        asg.vsids[0] = 5.0;
        asg.rebuild_order();
        // var 0 is assigned but still sits in the heap; selection must
        // pop past the stale entry
        asg.assign_by_decision(Lit::from_assign(0, true));
        let l = asg.select_decision_literal();
        assert_eq!(l.vi(), 1);
    }

    #[test]
    fn test_saved_phase_drives_polarity() {
        let mut asg = stack_of(1);
        asg.var_mut(0).turn_on(FlagVar::PHASE);
        asg.rebuild_order();
        assert!(bool::from(asg.select_decision_literal()));
        asg.var_mut(0).turn_off(FlagVar::PHASE);
        asg.rebuild_order();
        assert!(!bool::from(asg.select_decision_literal()));
    }

    #[test]
    fn test_bandit_plays_both_arms_first() {
        let mut asg = stack_of(1);
        assert_eq!(asg.current_heuristic(), Heuristic::Vsids);
        asg.num_conflict = 10;
        asg.num_decision = 10;
        asg.arbitrate_heuristic();
        // the unplayed CHB arm has infinite UCB score
        assert_eq!(asg.current_heuristic(), Heuristic::Chb);
        assert_eq!(asg.mab_profile(), [1, 0]);
    }

    #[test]
    fn test_forced_heuristic_disables_bandit() {
        let mut asg = stack_of(1);
        asg.force_heuristic(false);
        assert_eq!(asg.current_heuristic(), Heuristic::Chb);
        asg.num_conflict = 10;
        asg.num_decision = 10;
        asg.arbitrate_heuristic();
        assert_eq!(asg.current_heuristic(), Heuristic::Chb);
    }
}
