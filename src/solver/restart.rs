//! Crate `restart` provides restart heuristics.
use {crate::types::*, std::fmt};

/// Search modes. Focused mode restarts aggressively on the LBD trend;
/// stable mode follows a reluctant-doubling schedule with phase
/// stabilization.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SearchMode {
    #[default]
    Focused,
    Stable,
}

/// Update progress observer sub-modules.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum ProgressUpdate {
    /// a conflict happened.
    Counter,
    /// a learnt clause with this glue was registered.
    LBD(u16),
}

/// API for restart like `restarting` and `update`.
pub trait RestartIF: Instantiate {
    /// feed an observation.
    fn update(&mut self, kind: ProgressUpdate);
    /// check the restart condition; `true` forces a restart now.
    fn restarting(&mut self, num_conflict: usize) -> bool;
    /// check and execute a mode transition at conflict milestones.
    fn check_mode_transition(&mut self, num_conflict: usize) -> Option<SearchMode>;
    /// the current search mode.
    fn mode(&self) -> SearchMode;
}

/// `Restarter` provides restart API and holds data about restart conditions.
#[derive(Clone, Debug)]
pub struct Restarter {
    /// EMA pair of learnt clauses' LBD.
    lbd: Ema2,
    /// forcing restart threshold over the LBD trend; this is Glucose's `K`.
    lbd_threshold: f64,
    mode: SearchMode,
    /// conflicts since the last restart.
    after_restart: usize,
    /// minimum restart interval in focused mode.
    restart_step: usize,
    /// reluctant-doubling state for stable mode.
    luby: LubySeries,
    stb_step: usize,
    next_stable_restart: usize,
    /// the conflict milestone of the next mode flip.
    mode_threshold: usize,
    mode_interval: usize,

    //
    //## statistics
    //
    pub num_restart: usize,
    pub num_mode_flip: usize,
}

impl Default for Restarter {
    fn default() -> Restarter {
        Restarter {
            lbd: Ema2::new(50).with_slow(10_000).with_value(2.0),
            lbd_threshold: 1.2,
            mode: SearchMode::Focused,
            after_restart: 0,
            restart_step: 50,
            luby: LubySeries::default(),
            stb_step: 1024,
            next_stable_restart: 0,
            mode_threshold: 1000,
            mode_interval: 1000,
            num_restart: 0,
            num_mode_flip: 0,
        }
    }
}

impl fmt::Display for Restarter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "RST::{:?}[restart:{}, lbd-trend:{:.2}]",
            self.mode,
            self.num_restart,
            self.lbd.trend(),
        )
    }
}

impl Instantiate for Restarter {
    fn instantiate(config: &Config, _cnf: &CNFDescription) -> Self {
        Restarter {
            lbd: Ema2::new(config.rst_lbd_len)
                .with_slow(config.rst_lbd_slw)
                .with_value(2.0),
            lbd_threshold: config.rst_lbd_thr,
            restart_step: config.rst_step,
            stb_step: config.rst_stb_step,
            mode_threshold: config.mode_switch_interval,
            mode_interval: config.mode_switch_interval,
            ..Restarter::default()
        }
    }
    fn handle(&mut self, e: SolverEvent) {
        if let SolverEvent::Restart = e {
            self.after_restart = 0;
            self.num_restart += 1;
        }
    }
}

impl RestartIF for Restarter {
    fn update(&mut self, kind: ProgressUpdate) {
        match kind {
            ProgressUpdate::Counter => {
                self.after_restart += 1;
            }
            ProgressUpdate::LBD(lbd) => {
                self.lbd.update(lbd as f64);
            }
        }
    }
    fn restarting(&mut self, num_conflict: usize) -> bool {
        match self.mode {
            SearchMode::Focused => {
                self.restart_step <= self.after_restart && self.lbd_threshold < self.lbd.trend()
            }
            SearchMode::Stable => {
                if self.next_stable_restart == 0 {
                    self.schedule_stable_restart(num_conflict);
                    return false;
                }
                if self.next_stable_restart <= num_conflict {
                    self.schedule_stable_restart(num_conflict);
                    return true;
                }
                false
            }
        }
    }
    fn check_mode_transition(&mut self, num_conflict: usize) -> Option<SearchMode> {
        if num_conflict < self.mode_threshold {
            return None;
        }
        self.mode = match self.mode {
            SearchMode::Focused => SearchMode::Stable,
            SearchMode::Stable => SearchMode::Focused,
        };
        self.num_mode_flip += 1;
        self.mode_interval *= 2;
        self.mode_threshold = num_conflict + self.mode_interval;
        self.luby.reset();
        self.next_stable_restart = 0;
        // a fresh mode should not inherit the other mode's trend
        self.lbd.reset_to(self.lbd.get_slow());
        Some(self.mode)
    }
    fn mode(&self) -> SearchMode {
        self.mode
    }
}

impl Restarter {
    fn schedule_stable_restart(&mut self, num_conflict: usize) {
        self.next_stable_restart = num_conflict + self.stb_step * self.luby.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restarter() -> Restarter {
        Restarter::instantiate(&Config::default(), &CNFDescription::default())
    }

    #[test]
    fn test_focused_restart_needs_high_lbd_trend() {
        let mut rst = restarter();
        for _ in 0..100 {
            rst.update(ProgressUpdate::Counter);
            rst.update(ProgressUpdate::LBD(2));
        }
        assert!(!rst.restarting(100));
        // a burst of bad (high-glue) learnts lifts the fast EMA
        for _ in 0..50 {
            rst.update(ProgressUpdate::Counter);
            rst.update(ProgressUpdate::LBD(40));
        }
        assert!(rst.restarting(150));
    }

    #[test]
    fn test_stable_restart_follows_reluctant_doubling() {
        let mut rst = restarter();
        rst.mode = SearchMode::Stable;
        assert!(!rst.restarting(0));
        let first = rst.next_stable_restart;
        assert_eq!(first, rst.stb_step);
        assert!(!rst.restarting(first - 1));
        assert!(rst.restarting(first));
        // second leg of the sequence is again 1 * step
        assert_eq!(rst.next_stable_restart, first + rst.stb_step);
    }

    #[test]
    fn test_mode_transitions_double() {
        let mut rst = restarter();
        assert_eq!(rst.mode(), SearchMode::Focused);
        assert!(rst.check_mode_transition(999).is_none());
        assert_eq!(rst.check_mode_transition(1000), Some(SearchMode::Stable));
        // next flip needs twice the interval
        assert!(rst.check_mode_transition(2000).is_none());
        assert_eq!(rst.check_mode_transition(3000), Some(SearchMode::Focused));
    }

    #[test]
    fn test_restart_event_resets_counter() {
        let mut rst = restarter();
        for _ in 0..100 {
            rst.update(ProgressUpdate::Counter);
            rst.update(ProgressUpdate::LBD(30));
        }
        assert!(rst.restarting(100));
        rst.handle(SolverEvent::Restart);
        assert_eq!(rst.num_restart, 1);
        assert!(!rst.restarting(100));
    }
}
