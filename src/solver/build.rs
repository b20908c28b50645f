//! Solver construction and clause ingestion.
use {
    super::Solver,
    crate::{
        assign::{AssignIF, PropagateIF},
        cdb::{ClauseDBIF, RefClause},
        config::Config,
        state::StateIF,
        types::*,
        vam::{MappedLit, VarMapIF},
    },
    std::{io::BufRead, path::Path},
};

/// API for loading a problem into a solver.
pub trait SolverBuildIF {
    /// stream one external literal in; 0 terminates the clause under
    /// construction. Duplicates are absorbed, complementary pairs make the
    /// clause trivial, root-satisfied clauses are dropped, and
    /// root-falsified literals are deleted.
    ///
    /// # Errors
    ///
    /// `InvalidLiteral` for out-of-range literals; `InvalidOperation` once
    /// search has started (this solver is not incremental).
    fn add(&mut self, elit: i32) -> MaybeInconsistent;
    /// add one clause given as a slice of external literals.
    fn add_clause<V: AsRef<[i32]>>(&mut self, vec: V) -> MaybeInconsistent;
    /// preallocate variables up to `max_var`.
    fn reserve(&mut self, max_var: i32) -> MaybeInconsistent;
    /// make a solver and load a CNF file into it.
    ///
    /// # Errors
    ///
    /// IO error by failing to load a CNF file.
    fn build(config: &Config) -> Result<Solver, SolverError>;
}

/// The clause under construction by `add`, with per-literal marks for
/// duplicate and complement detection.
#[derive(Clone, Debug, Default)]
pub struct ClauseComposer {
    lits: Vec<Lit>,
    /// per-literal-code mark: +1 this literal occurs, -1 its negation does.
    marks: Vec<i8>,
    satisfied: bool,
    trivial: bool,
    shrunken: bool,
}

impl Instantiate for ClauseComposer {
    fn instantiate(_config: &Config, cnf: &CNFDescription) -> Self {
        ClauseComposer {
            marks: vec![0; 2 * cnf.num_of_variables],
            ..ClauseComposer::default()
        }
    }
    fn handle(&mut self, e: SolverEvent) {
        if let SolverEvent::NewVar = e {
            self.marks.push(0);
            self.marks.push(0);
        }
    }
}

impl ClauseComposer {
    pub fn in_clause(&self) -> bool {
        !self.lits.is_empty() || self.satisfied || self.trivial || self.shrunken
    }
    fn reset(&mut self) {
        for l in self.lits.drain(..) {
            self.marks[usize::from(l)] = 0;
            self.marks[usize::from(!l)] = 0;
        }
        self.satisfied = false;
        self.trivial = false;
        self.shrunken = false;
    }
}

impl SolverBuildIF for Solver {
    fn add(&mut self, elit: i32) -> MaybeInconsistent {
        if self.searched {
            return Err(SolverError::InvalidOperation);
        }
        if elit == 0 {
            return self.finish_clause();
        }
        let (mapped, fresh) = self.vam.map_in(elit);
        if fresh {
            self.broadcast_new_var();
        }
        let l = match mapped {
            MappedLit::Ok(l) => l,
            MappedLit::Eliminated => return Err(SolverError::InvalidOperation),
            MappedLit::OutOfRange => return Err(SolverError::InvalidLiteral),
        };
        match self.composer.marks[usize::from(l)] {
            0 => match self.asg.assigned(l) {
                Some(true) => {
                    self.composer.satisfied = true;
                }
                Some(false) => {
                    // a root-falsified literal is deleted from the clause
                    self.composer.shrunken = true;
                }
                None => {
                    self.composer.marks[usize::from(l)] = 1;
                    self.composer.marks[usize::from(!l)] = -1;
                    self.composer.lits.push(l);
                }
            },
            mark if mark < 0 => {
                self.composer.trivial = true;
            }
            _ => {
                // a duplicated literal is absorbed
                self.composer.shrunken = true;
            }
        }
        Ok(())
    }
    fn add_clause<V: AsRef<[i32]>>(&mut self, vec: V) -> MaybeInconsistent {
        for elit in vec.as_ref() {
            self.add(*elit)?;
        }
        self.add(0)
    }
    fn reserve(&mut self, max_var: i32) -> MaybeInconsistent {
        if max_var < 0 || EXTERNAL_MAX_VAR < max_var {
            return Err(SolverError::InvalidLiteral);
        }
        for emag in 1..=max_var {
            let (_, fresh) = self.vam.map_in(emag);
            if fresh {
                self.broadcast_new_var();
            }
        }
        Ok(())
    }
    fn build(config: &Config) -> Result<Solver, SolverError> {
        let reader = CNFReader::try_from(config.cnf_file.as_path())?;
        Solver::instantiate(config, &reader.cnf).load(reader)
    }
}

impl Solver {
    fn finish_clause(&mut self) -> MaybeInconsistent {
        if self.inconsistent {
            self.composer.reset();
            return Err(SolverError::Inconsistent);
        }
        if self.composer.satisfied || self.composer.trivial {
            self.composer.reset();
            return Ok(());
        }
        let mut lits = std::mem::take(&mut self.composer.lits);
        for l in lits.iter() {
            self.composer.marks[usize::from(*l)] = 0;
            self.composer.marks[usize::from(!*l)] = 0;
            self.asg.activate_var(l.vi());
        }
        self.composer.reset();
        match lits.len() {
            0 => {
                self.inconsistent = true;
                self.cdb.certification.push_add(std::iter::empty());
                Err(SolverError::EmptyClause)
            }
            1 => {
                self.asg.assign_at_root_level(lits[0])?;
                if self.asg.propagate(&mut self.cdb).is_err() {
                    self.inconsistent = true;
                    return Err(SolverError::Inconsistent);
                }
                Ok(())
            }
            n => {
                let glue = n.min(u16::MAX as usize) as u16;
                match self.cdb.new_clause(&self.asg, &self.vam, &mut lits, false, glue) {
                    RefClause::Clause(_) | RefClause::BiClause => Ok(()),
                    _ => Err(SolverError::SolverBug),
                }
            }
        }
    }
    /// read the body of a DIMACS file.
    fn load(mut self, reader: CNFReader) -> Result<Solver, SolverError> {
        self.reserve(reader.cnf.num_of_variables.min(EXTERNAL_MAX_VAR as usize) as i32)?;
        let mut input = reader.reader;
        let mut buf = String::new();
        loop {
            buf.clear();
            match input.read_line(&mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    if buf.starts_with('c') || buf.starts_with('p') {
                        continue;
                    }
                    for token in buf.split_whitespace() {
                        let elit = token.parse::<i32>().or(Err(SolverError::IOError))?;
                        match self.add(elit) {
                            Ok(_) => (),
                            // an inconsistent input is not a loading error
                            Err(SolverError::EmptyClause) | Err(SolverError::Inconsistent) => (),
                            Err(e) => return Err(e),
                        }
                    }
                }
                Err(_) => return Err(SolverError::IOError),
            }
        }
        self.state.flush(format!("loaded: {}", reader.cnf));
        Ok(self)
    }
}

impl TryFrom<&Path> for Solver {
    type Error = SolverError;
    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let config = Config::from(path.to_path_buf());
        Solver::build(&config)
    }
}

impl TryFrom<Vec<Vec<i32>>> for Solver {
    type Error = SolverError;
    fn try_from(vec: Vec<Vec<i32>>) -> Result<Self, Self::Error> {
        let cnf = CNFDescription::from(vec.as_slice());
        let mut solver = Solver::instantiate(&Config::default(), &cnf);
        solver.reserve(cnf.num_of_variables.min(EXTERNAL_MAX_VAR as usize) as i32)?;
        for clause in vec.iter() {
            match solver.add_clause(clause) {
                Ok(_) => (),
                Err(SolverError::EmptyClause) | Err(SolverError::Inconsistent) => (),
                Err(e) => return Err(e),
            }
        }
        Ok(solver)
    }
}
