/*!
A CDCL SAT solver core built to run under a clause-sharing portfolio
driver. Each solver instance is strictly single-threaded; peers exchange
learnt clauses through the capability in [`share`].

```
use parsat::*;

let mut s = Solver::try_from(vec![vec![1i32, 2, 3], vec![-1, 2], vec![-2, 3]])
    .expect("panic at building a solver");
if let Ok(Certificate::SAT(ans)) = s.solve() {
    println!("s SATISFIABLE: {:?}", ans);
} else {
    println!("s UNSATISFIABLE");
}
```
*/
/// Boolean constraint propagation and decision var selection
pub mod assign;
/// Clause database: arena, watch lists, reduction, certificate
pub mod cdb;
/// Solver configuration
pub mod config;
/// The simplification boundary
pub mod processor;
/// Inter-worker clause exchange
pub mod share;
/// struct Solver
pub mod solver;
/// Misc data holder
pub mod state;
/// Plumbing layer
pub mod types;
/// External-to-internal variable mapping and model extension
pub mod vam;

pub use crate::{
    config::Config,
    solver::{Certificate, Solver, SolverBuildIF, SolverResult, SolverSearchIF},
    types::SolverError,
};
