//! Var Rewarding based on EVSIDS and CHB
use {
    super::{AssignStack, Heuristic},
    crate::types::*,
};

impl ActivityIF<VarId> for AssignStack {
    #[inline]
    fn activity(&self, vi: VarId) -> f64 {
        match self.heuristic {
            Heuristic::Vsids => self.vsids[vi],
            Heuristic::Chb => self.chb[vi],
        }
    }
    fn set_activity(&mut self, vi: VarId, val: f64) {
        match self.heuristic {
            Heuristic::Vsids => self.vsids[vi] = val,
            Heuristic::Chb => self.chb[vi] = val,
        }
    }
    fn reward_at_analysis(&mut self, vi: VarId) {
        match self.heuristic {
            Heuristic::Vsids => {
                if self.bumped_at[vi] == self.num_conflict {
                    return;
                }
                self.bumped_at[vi] = self.num_conflict;
                self.vsids[vi] += self.vsids_inc;
                const SCALE: f64 = 1e-100;
                const SCALE_MAX: f64 = 1e100;
                if SCALE_MAX < self.vsids[vi] {
                    for s in self.vsids.iter_mut() {
                        *s *= SCALE;
                    }
                    self.vsids_inc *= SCALE;
                }
                self.vsids_order.update(&self.vsids, vi);
            }
            Heuristic::Chb => {
                self.participated[vi] = true;
                self.update_chb(vi, 1.0);
                self.conflicted_at[vi] = self.num_conflict;
            }
        }
    }
    fn reward_at_unassign(&mut self, vi: VarId) {
        if self.heuristic == Heuristic::Chb && !self.participated[vi] {
            self.update_chb(vi, 0.9);
        }
        self.participated[vi] = false;
    }
    /// per-conflict bookkeeping: the EVSIDS increment grows, the CHB step
    /// size decays toward its floor.
    fn update_activity_tick(&mut self) {
        self.vsids_inc /= self.vsids_decay;
        if self.chb_step_min < self.chb_step {
            self.chb_step = (self.chb_step - self.chb_step_dec).max(self.chb_step_min);
        }
    }
}

impl AssignStack {
    fn update_chb(&mut self, vi: VarId, multiplier: f64) {
        let age = (self.num_conflict - self.conflicted_at[vi]) as f64 + 1.0;
        let reward = multiplier / age;
        self.chb[vi] += self.chb_step * (reward - self.chb[vi]);
        self.chb_order.update(&self.chb, vi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_vsids_bump_is_deduplicated_per_conflict() {
        let mut asg = stack_of(2);
        asg.num_conflict = 1;
        asg.reward_at_analysis(0);
        let once = asg.vsids[0];
        asg.reward_at_analysis(0);
        assert_eq!(asg.vsids[0], once);
        asg.num_conflict = 2;
        asg.reward_at_analysis(0);
        assert!(once < asg.vsids[0]);
    }

    #[test]
    fn test_vsids_increment_growth() {
        let mut asg = stack_of(1);
        let inc = asg.vsids_inc;
        asg.update_activity_tick();
        assert!(inc < asg.vsids_inc);
    }

    #[test]
    fn test_chb_rewards_recent_participants_more() {
        let mut asg = stack_of(2);
        asg.heuristic = Heuristic::Chb;
        asg.num_conflict = 10;
        asg.conflicted_at[0] = 9;
        asg.conflicted_at[1] = 1;
        asg.reward_at_analysis(0);
        asg.reward_at_analysis(1);
        assert!(asg.chb[1] < asg.chb[0]);
        assert_eq!(asg.conflicted_at[0], 10);
    }

    #[test]
    fn test_chb_step_decays_to_floor() {
        let mut asg = stack_of(1);
        asg.chb_step = asg.chb_step_min + 2.0 * asg.chb_step_dec;
        for _ in 0..8 {
            asg.update_activity_tick();
        }
        assert_eq!(asg.chb_step, asg.chb_step_min);
    }

    #[test]
    fn test_activity_follows_active_heuristic() {
        let mut asg = stack_of(1);
        asg.vsids[0] = 0.5;
        asg.chb[0] = 0.25;
        assert_eq!(asg.activity(0), 0.5);
        asg.heuristic = Heuristic::Chb;
        assert_eq!(asg.activity(0), 0.25);
    }
}
