//! External-to-internal variable mapping and model extension.
//!
//! External variables are the positive integers of the input. The engine
//! maps them to dense internal indices on first occurrence. When an
//! external simplifier removes a variable, its import record switches to
//! an index into the eliminated-value stack and the reconstruction stack
//! tells `extend` how to give it a consistent value in the final model.
use crate::{
    assign::{AssignIF, AssignStack},
    types::*,
};

/// One entry of the import table, indexed by external magnitude.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImportRecord {
    /// internal literal code while `!eliminated`; an index into the
    /// eliminated-value stack afterwards.
    lit: u32,
    imported: bool,
    eliminated: bool,
}

/// One entry of the reconstruction stack: a clause in external numbering
/// whose first literal is forced when all other literals are false in the
/// partial model being extended.
#[derive(Clone, Debug)]
pub struct ReconstructionEntry {
    pub clause: Vec<i32>,
}

/// The result of mapping an external literal in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MappedLit {
    Ok(Lit),
    /// the variable was removed by a simplifier; no internal slot exists.
    Eliminated,
    OutOfRange,
}

/// API for the variable mapper.
pub trait VarMapIF {
    /// map an external literal in, allocating a fresh internal var on first
    /// sight. The second member is `true` if a var was allocated; the
    /// caller must broadcast `SolverEvent::NewVar` then.
    fn map_in(&mut self, elit: i32) -> (MappedLit, bool);
    /// translate an internal literal back to external numbering.
    fn externalize(&self, l: Lit) -> i32;
    /// record that a simplifier removed `vi`.
    fn set_eliminated(&mut self, vi: VarId, saved_phase: bool);
    /// push a reconstruction clause; `clause[0]` is the witness literal.
    fn push_reconstruction(&mut self, clause: Vec<i32>);
    /// replay the reconstruction stack once per elimination round.
    fn extend_model(&mut self, asg: &AssignStack);
    /// the truth of an external literal: `elit`, `-elit`, or 0.
    fn value_of(&self, asg: &AssignStack, elit: i32) -> i32;
}

#[derive(Clone, Debug, Default)]
pub struct VarMap {
    /// external magnitude -> import record; slot 0 is unused.
    import: Vec<ImportRecord>,
    /// internal var -> external magnitude.
    export: Vec<i32>,
    extend: Vec<ReconstructionEntry>,
    /// values of eliminated external vars, indexed by elimination order.
    eliminated: Vec<bool>,
    extended: bool,
}

impl Instantiate for VarMap {
    fn instantiate(_config: &Config, cnf: &CNFDescription) -> Self {
        let mut vam = VarMap {
            import: Vec::with_capacity(cnf.num_of_variables + 1),
            export: Vec::with_capacity(cnf.num_of_variables),
            ..VarMap::default()
        };
        // pre-map the declared vars so internal indices stay aligned with
        // the slots the other modules allocated up front
        for emag in 1..=cnf.num_of_variables.min(EXTERNAL_MAX_VAR as usize) {
            vam.map_in(emag as i32);
        }
        vam
    }
}

impl VarMapIF for VarMap {
    fn map_in(&mut self, elit: i32) -> (MappedLit, bool) {
        if elit == 0 || EXTERNAL_MAX_VAR < elit.abs() {
            return (MappedLit::OutOfRange, false);
        }
        let emag = elit.unsigned_abs() as usize;
        if self.import.len() <= emag {
            self.import.resize(emag + 1, ImportRecord::default());
        }
        let mut fresh = false;
        if !self.import[emag].imported {
            let vi = self.export.len();
            self.export.push(emag as i32);
            self.import[emag] = ImportRecord {
                lit: usize::from(Lit::from_assign(vi, true)) as u32,
                imported: true,
                eliminated: false,
            };
            fresh = true;
        }
        let record = &self.import[emag];
        if record.eliminated {
            return (MappedLit::Eliminated, fresh);
        }
        let base = Lit::from(record.lit as usize);
        let l = if elit < 0 { !base } else { base };
        (MappedLit::Ok(l), fresh)
    }
    fn externalize(&self, l: Lit) -> i32 {
        let emag = self.export[l.vi()];
        if l.is_positive() {
            emag
        } else {
            -emag
        }
    }
    fn set_eliminated(&mut self, vi: VarId, saved_phase: bool) {
        let emag = self.export[vi] as usize;
        debug_assert!(self.import[emag].imported && !self.import[emag].eliminated);
        self.import[emag] = ImportRecord {
            lit: self.eliminated.len() as u32,
            imported: true,
            eliminated: true,
        };
        self.eliminated.push(saved_phase);
        self.extended = false;
    }
    fn push_reconstruction(&mut self, clause: Vec<i32>) {
        debug_assert!(!clause.is_empty());
        self.extend.push(ReconstructionEntry { clause });
        self.extended = false;
    }
    fn extend_model(&mut self, asg: &AssignStack) {
        if self.extended {
            return;
        }
        // replay from the top of the stack so inner eliminations see the
        // values reconstructed for the outer ones
        for i in (0..self.extend.len()).rev() {
            let witness = self.extend[i].clause[0];
            let satisfied = self.extend[i].clause[1..]
                .iter()
                .any(|l| 0 < self.raw_value(asg, *l));
            if !satisfied {
                let emag = witness.unsigned_abs() as usize;
                let record = &self.import[emag];
                debug_assert!(record.eliminated);
                self.eliminated[record.lit as usize] = 0 < witness;
            }
        }
        self.extended = true;
    }
    fn value_of(&self, asg: &AssignStack, elit: i32) -> i32 {
        let emag = elit.unsigned_abs() as usize;
        if elit == 0 || self.import.len() <= emag || !self.import[emag].imported {
            return 0;
        }
        let tmp = self.raw_value(asg, elit);
        if tmp == 0 {
            0
        } else if 0 < tmp {
            elit
        } else {
            -elit
        }
    }
}

impl VarMap {
    /// `true` if the reconstruction stack has pending entries.
    pub fn needs_extension(&self) -> bool {
        !self.extended && !self.extend.is_empty()
    }
    pub fn num_imported(&self) -> usize {
        self.export.len()
    }
    /// the model over every imported external variable, ordered by
    /// magnitude. Don't-care variables come out positive unless `partial`.
    pub fn model(&self, asg: &AssignStack, partial: bool) -> Vec<i32> {
        let mut vals: Vec<i32> = Vec::with_capacity(self.export.len());
        for emag in 1..self.import.len() {
            if !self.import[emag].imported {
                continue;
            }
            let mut tmp = self.value_of(asg, emag as i32);
            if tmp == 0 && !partial {
                tmp = emag as i32;
            }
            if tmp != 0 {
                vals.push(tmp);
            }
        }
        vals
    }
    /// the truth of `elit` as a sign, without polarity folding: +1, -1, or 0.
    fn raw_value(&self, asg: &AssignStack, elit: i32) -> i32 {
        let emag = elit.unsigned_abs() as usize;
        if self.import.len() <= emag || !self.import[emag].imported {
            return 0;
        }
        let record = &self.import[emag];
        let positive = if record.eliminated {
            self.eliminated[record.lit as usize]
        } else {
            let base = Lit::from(record.lit as usize);
            match asg.assign(base.vi()) {
                None => return 0,
                Some(b) => b == base.is_positive(),
            }
        };
        if positive == (0 < elit) {
            1
        } else {
            -1
        }
    }
}
