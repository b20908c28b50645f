//! Module `types` provides various building blocks, including
//! some common traits.

/// methods on exponential moving averages
pub mod ema;
/// methods on flags used in variables
pub mod flags;
/// methods on literals
pub mod lit;
/// methods on the reluctant-doubling sequence
pub mod luby;

pub use self::{ema::*, flags::*, lit::*, luby::*};

pub use crate::{assign::AssignReason, cdb::ClauseRef, config::Config, solver::SolverEvent};

use std::{
    fmt,
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// Internal variable index, starting with zero.
pub type VarId = usize;

/// Decision level representation.
pub type DecisionLevel = u32;

/// Capture a conflict: the falsified literal and the reason that forced it.
pub type ConflictContext = (Lit, AssignReason);

/// Return type of unit propagation.
pub type PropagationResult = Result<(), ConflictContext>;

/// The largest external variable magnitude we accept. Kept well below the
/// signed 31-bit literal range so that internal encodings have headroom.
pub const EXTERNAL_MAX_VAR: i32 = (1 << 28) - 1;

/// API for object instantiation based on `Config` and `CNFDescription`.
/// This is implemented by all the solver sub-modules.
pub trait Instantiate {
    /// make and return an object from `Config` and `CNFDescription`.
    fn instantiate(conf: &Config, cnf: &CNFDescription) -> Self;
    /// update by a solver event.
    fn handle(&mut self, _e: SolverEvent) {}
}

/// API for reward based activity management.
pub trait ActivityIF<Ix> {
    /// return one's activity.
    fn activity(&self, ix: Ix) -> f64;
    /// set activity
    fn set_activity(&mut self, ix: Ix, val: f64);
    /// modify one's activity at conflict analysis.
    fn reward_at_analysis(&mut self, _ix: Ix) {}
    /// modify one's activity at value un-assignment in `cancel_until`.
    fn reward_at_unassign(&mut self, _ix: Ix) {}
    /// update internal counter.
    fn update_activity_tick(&mut self);
}

/// Internal errors.
#[derive(Debug, Eq, PartialEq)]
pub enum SolverError {
    // A given CNF contains an empty clause or derives one during loading.
    EmptyClause,
    // A clause contains a literal out of the acceptable range; '0' is an example.
    InvalidLiteral,
    // A contract violation like calling `solve` with a non-terminated clause
    // or adding a clause after search started.
    InvalidOperation,
    // Exceptions caused by file operations.
    IOError,
    // UNSAT with some internal context.
    Inconsistent,
    OutOfMemory,
    // UNSAT found at decision level zero.
    RootLevelConflict(ConflictContext),
    SolverBug,
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A return type used by solver functions.
pub type MaybeInconsistent = Result<(), SolverError>;

/// CNF locator
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum CNFIndicator {
    /// not specified
    #[default]
    Void,
    /// from a file
    File(String),
    /// embedded directly
    LitVec(usize),
}

impl fmt::Display for CNFIndicator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CNFIndicator::Void => write!(f, "(no CNF specified)"),
            CNFIndicator::File(file) => write!(f, "CNF file({file})"),
            CNFIndicator::LitVec(n) => write!(f, "a vec({n} clauses)"),
        }
    }
}

/// Data storage about a problem.
#[derive(Clone, Debug, Default)]
pub struct CNFDescription {
    pub num_of_variables: usize,
    pub num_of_clauses: usize,
    pub pathname: CNFIndicator,
}

impl fmt::Display for CNFDescription {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let CNFDescription {
            num_of_variables: nv,
            num_of_clauses: nc,
            pathname: path,
        } = &self;
        write!(f, "CNF({nv}, {nc}, {path})")
    }
}

impl<V: AsRef<[i32]>> From<&[V]> for CNFDescription {
    fn from(vec: &[V]) -> Self {
        let num_of_variables = vec
            .iter()
            .map(|clause| clause.as_ref().iter().map(|l| l.abs()).max().unwrap_or(0))
            .max()
            .unwrap_or(0) as usize;
        CNFDescription {
            num_of_variables,
            num_of_clauses: vec.len(),
            pathname: CNFIndicator::LitVec(vec.len()),
        }
    }
}

/// A wrapper structure to make a CNFDescription from a file.
/// To make CNFDescription clone-able, a BufReader should be separated from it.
#[derive(Debug)]
pub struct CNFReader {
    pub cnf: CNFDescription,
    pub reader: BufReader<File>,
}

impl TryFrom<&Path> for CNFReader {
    type Error = SolverError;
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let pathname = if path.to_string_lossy().is_empty() {
            "--".to_string()
        } else {
            path.file_name()
                .map_or("aStrangeNamed".to_string(), |f| {
                    f.to_string_lossy().into_owned()
                })
        };
        let fs = File::open(path).map_or(Err(SolverError::IOError), Ok)?;
        let mut reader = BufReader::new(fs);
        let mut buf = String::new();
        let mut nv: usize = 0;
        let mut nc: usize = 0;
        let mut found_valid_header = false;
        loop {
            buf.clear();
            match reader.read_line(&mut buf) {
                Ok(0) => break,
                Ok(_k) => {
                    let mut iter = buf.split_whitespace();
                    if iter.next() == Some("p") && iter.next() == Some("cnf") {
                        if let Some(v) = iter.next().and_then(|s| s.parse::<usize>().ok()) {
                            if let Some(c) = iter.next().and_then(|s| s.parse::<usize>().ok()) {
                                nv = v;
                                nc = c;
                                found_valid_header = true;
                                break;
                            }
                        }
                        return Err(SolverError::IOError);
                    }
                    continue;
                }
                Err(_) => return Err(SolverError::IOError),
            }
        }
        if !found_valid_header {
            return Err(SolverError::IOError);
        }
        let cnf = CNFDescription {
            num_of_variables: nv,
            num_of_clauses: nc,
            pathname: CNFIndicator::File(pathname),
        };
        Ok(CNFReader { cnf, reader })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cnf_description_from_vecs() {
        let v: Vec<Vec<i32>> = vec![vec![1, -2, 3], vec![-4, 2]];
        let cnf = CNFDescription::from(v.as_slice());
        assert_eq!(cnf.num_of_variables, 4);
        assert_eq!(cnf.num_of_clauses, 2);
    }
}
