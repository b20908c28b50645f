//! A scripted simplifier exercising the in-processing boundary and model
//! extension.
use parsat::{
    assign::AssignStack,
    cdb::{ClauseDB, ClauseDBIF},
    processor::SimplifyIF,
    solver::SolverEvent,
    types::*,
    vam::{MappedLit, VarMap, VarMapIF},
    *,
};

/// Eliminates external var 3 by dropping its only clause {3, 4} and
/// recording the reconstruction entry, the way a bounded-variable
/// eliminator hands one resolvent side back.
struct EliminateThree;

impl SimplifyIF for EliminateThree {
    fn simplify(
        &mut self,
        asg: &mut AssignStack,
        cdb: &mut ClauseDB,
        vam: &mut VarMap,
    ) -> MaybeInconsistent {
        let (MappedLit::Ok(l3), _) = vam.map_in(3) else {
            return Ok(());
        };
        let (MappedLit::Ok(l4), _) = vam.map_in(4) else {
            return Ok(());
        };
        cdb.remove_bi_clause(vam, l3, l4);
        asg.handle(SolverEvent::Eliminate(l3.vi()));
        vam.set_eliminated(l3.vi(), false);
        vam.push_reconstruction(vec![3, 4]);
        Ok(())
    }
}

fn solver_with_simplifier(clauses: Vec<Vec<i32>>) -> Solver {
    let config = Config {
        // fire the boundary on the first quiet iteration
        simplify_interval: 0,
        ..Config::default()
    };
    let cnf = CNFDescription::from(clauses.as_slice());
    let mut s = Solver::instantiate(&config, &cnf);
    for c in clauses.iter() {
        match s.add_clause(c) {
            Ok(_) | Err(SolverError::EmptyClause) | Err(SolverError::Inconsistent) => (),
            Err(e) => panic!("failed to load {c:?}: {e}"),
        }
    }
    s.set_simplifier(Box::new(EliminateThree));
    s
}

#[test]
fn eliminated_var_is_reconstructed() {
    let mut s = solver_with_simplifier(vec![vec![1, 2], vec![-1, 2], vec![3, 4]]);
    let Ok(Certificate::SAT(model)) = s.solve() else {
        panic!("expected SAT");
    };
    // the saved-phase default assigns 4 negative, so the reconstruction
    // clause {3, 4} forces 3
    assert_eq!(s.value(4), -4);
    assert_eq!(s.value(3), 3);
    // extension is idempotent
    assert_eq!(s.value(3), 3);
    // and the certificate includes the reconstructed value
    assert!(model.contains(&3));
}

#[test]
fn elimination_does_not_change_satisfiability() {
    let mut s = solver_with_simplifier(vec![vec![1, 2], vec![-1, 2], vec![3, 4], vec![-2]]);
    // {1, 2} and {-1, 2} force 2, contradicting {-2}
    assert_eq!(s.solve(), Ok(Certificate::UNSAT));
}

#[test]
fn eliminated_var_reports_through_value() {
    let mut s = solver_with_simplifier(vec![vec![1, 2], vec![3, 4]]);
    let Ok(Certificate::SAT(_)) = s.solve() else {
        panic!("expected SAT");
    };
    // 3 is eliminated, yet `value` answers through the extension
    assert_ne!(s.value(3), 0);
}
