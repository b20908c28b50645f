//! Inter-worker clause exchange.
//!
//! A solver instance is strictly single-threaded; the only contact with
//! its peers is the capability below, polled and fired at decision level
//! zero. The portfolio driver supplies an implementation backed by its
//! own queues with their own synchronization.
use crate::{
    types::*,
    vam::{VarMap, VarMapIF},
};

/// The abstract sharing capability: push one learnt clause, poll one
/// foreign unit, poll one foreign clause. Literals cross this boundary in
/// external numbering.
pub trait ClauseExchangeIF {
    /// hand a learnt clause to the peers.
    fn export_clause(&mut self, glue: u16, lits: &[i32]);
    /// fetch one foreign unit; 0 when the queue is drained.
    fn import_unit(&mut self) -> i32;
    /// fetch one foreign clause into `lits`; `false` when drained.
    fn import_clause(&mut self, glue: &mut u16, lits: &mut Vec<i32>) -> bool;
}

/// The solver-side endpoint: an optional channel plus the export quality
/// filter.
#[derive(Default)]
pub struct Sharing {
    channel: Option<Box<dyn ClauseExchangeIF + Send>>,
    /// learnt clauses with a glue above this are kept private.
    export_limit: u16,

    //
    //## statistics
    //
    pub num_export: usize,
    pub num_import_unit: usize,
    pub num_import_clause: usize,
}

impl std::fmt::Debug for Sharing {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Sharing[active:{}, limit:{}, out:{}, in:{}+{}]",
            self.channel.is_some(),
            self.export_limit,
            self.num_export,
            self.num_import_unit,
            self.num_import_clause,
        )
    }
}

impl Instantiate for Sharing {
    fn instantiate(config: &Config, _cnf: &CNFDescription) -> Self {
        Sharing {
            export_limit: config.export_glue_limit,
            ..Sharing::default()
        }
    }
}

impl Sharing {
    /// plug a channel in; replaces any previous one.
    pub fn connect(&mut self, channel: Box<dyn ClauseExchangeIF + Send>) {
        self.channel = Some(channel);
    }
    pub fn disconnect(&mut self) {
        self.channel = None;
    }
    pub fn is_active(&self) -> bool {
        self.channel.is_some()
    }
    /// offer a registered learnt clause to the peers if its glue passes
    /// the filter.
    pub fn export(&mut self, vam: &VarMap, glue: u16, lits: &[Lit]) {
        let Some(ref mut channel) = self.channel else {
            return;
        };
        if self.export_limit < glue {
            return;
        }
        let ext = lits.iter().map(|l| vam.externalize(*l)).collect::<Vec<_>>();
        channel.export_clause(glue, &ext);
        self.num_export += 1;
    }
    pub fn poll_unit(&mut self) -> Option<i32> {
        let elit = self.channel.as_mut()?.import_unit();
        if elit == 0 {
            return None;
        }
        self.num_import_unit += 1;
        Some(elit)
    }
    pub fn poll_clause(&mut self, glue: &mut u16, lits: &mut Vec<i32>) -> bool {
        let Some(ref mut channel) = self.channel else {
            return false;
        };
        lits.clear();
        if channel.import_clause(glue, lits) {
            self.num_import_clause += 1;
            return true;
        }
        false
    }
    /// loosen the export filter. No monotonicity across calls is promised.
    pub fn increase_production(&mut self) {
        self.export_limit += 1;
    }
    /// tighten the export filter, keeping at least glue-2 clauses flowing.
    pub fn decrease_production(&mut self) {
        if 2 < self.export_limit {
            self.export_limit -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        exported: Vec<(u16, Vec<i32>)>,
        units: Vec<i32>,
        clauses: Vec<(u16, Vec<i32>)>,
    }

    impl ClauseExchangeIF for Recorder {
        fn export_clause(&mut self, glue: u16, lits: &[i32]) {
            self.exported.push((glue, lits.to_vec()));
        }
        fn import_unit(&mut self) -> i32 {
            self.units.pop().unwrap_or(0)
        }
        fn import_clause(&mut self, glue: &mut u16, lits: &mut Vec<i32>) -> bool {
            match self.clauses.pop() {
                Some((g, c)) => {
                    *glue = g;
                    *lits = c;
                    true
                }
                None => false,
            }
        }
    }

    fn vam_with(n: i32) -> VarMap {
        let mut vam = VarMap::default();
        for i in 1..=n {
            vam.map_in(i);
        }
        vam
    }

    #[test]
    fn test_export_respects_glue_limit() {
        let mut shr = Sharing::instantiate(&Config::default(), &CNFDescription::default());
        shr.connect(Box::<Recorder>::default());
        let vam = vam_with(3);
        let lits = vec![Lit::from_assign(0, true), Lit::from_assign(2, false)];
        shr.export(&vam, 2, &lits);
        shr.export(&vam, 9, &lits);
        assert_eq!(shr.num_export, 1);
    }

    #[test]
    fn test_production_control_has_a_floor() {
        let mut shr = Sharing::instantiate(&Config::default(), &CNFDescription::default());
        shr.decrease_production();
        shr.decrease_production();
        assert_eq!(shr.export_limit, 2);
        shr.increase_production();
        assert_eq!(shr.export_limit, 3);
    }

    #[test]
    fn test_poll_unit_drains_to_none() {
        let mut shr = Sharing::default();
        assert_eq!(shr.poll_unit(), None);
        shr.connect(Box::new(Recorder {
            units: vec![5],
            ..Recorder::default()
        }));
        assert_eq!(shr.poll_unit(), Some(5));
        assert_eq!(shr.poll_unit(), None);
        assert_eq!(shr.num_import_unit, 1);
    }
}
