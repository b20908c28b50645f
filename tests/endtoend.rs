//! End-to-end scenarios over the public API.
use parsat::*;

/// the pigeonhole principle: `pigeons` into `holes`, one var per pair.
fn php(pigeons: usize, holes: usize) -> Vec<Vec<i32>> {
    let var = |p: usize, h: usize| (p * holes + h + 1) as i32;
    let mut clauses = Vec::new();
    for p in 0..pigeons {
        clauses.push((0..holes).map(|h| var(p, h)).collect::<Vec<i32>>());
    }
    for h in 0..holes {
        for p in 0..pigeons {
            for q in p + 1..pigeons {
                clauses.push(vec![-var(p, h), -var(q, h)]);
            }
        }
    }
    clauses
}

fn satisfies(clauses: &[Vec<i32>], model: &[i32]) -> bool {
    clauses
        .iter()
        .all(|c| c.iter().any(|l| model.contains(l)))
}

#[test]
fn empty_clause_is_unsat() {
    let mut s = Solver::try_from(vec![Vec::<i32>::new()]).expect("build");
    assert_eq!(s.solve(), Ok(Certificate::UNSAT));
}

#[test]
fn conflicting_units_are_unsat() {
    let mut s = Solver::try_from(vec![vec![1], vec![-1]]).expect("build");
    assert_eq!(s.solve(), Ok(Certificate::UNSAT));
}

#[test]
fn two_var_contradiction_is_unsat() {
    let mut s =
        Solver::try_from(vec![vec![1, 2], vec![-1, 2], vec![1, -2], vec![-1, -2]]).expect("build");
    assert_eq!(s.solve(), Ok(Certificate::UNSAT));
}

#[test]
fn implication_chain_is_sat() {
    let clauses = vec![vec![1, 2, 3], vec![-1, 2], vec![-2, 3]];
    let mut s = Solver::try_from(clauses.clone()).expect("build");
    let Ok(Certificate::SAT(model)) = s.solve() else {
        panic!("expected SAT");
    };
    assert!(satisfies(&clauses, &model));
    // `value` agrees with the certificate
    for l in model.iter() {
        assert_eq!(s.value(*l), *l);
    }
}

#[test]
fn cyclic_implications_are_sat() {
    let clauses = vec![vec![1, -2], vec![2, -3], vec![3, -1]];
    let mut s = Solver::try_from(clauses.clone()).expect("build");
    let Ok(Certificate::SAT(model)) = s.solve() else {
        panic!("expected SAT");
    };
    assert!(satisfies(&clauses, &model));
    // every model of the cycle assigns all three vars alike
    assert_eq!(model[0].signum(), model[1].signum());
    assert_eq!(model[1].signum(), model[2].signum());
}

#[test]
fn conflict_limit_gives_unknown_then_unsat() {
    let mut s = Solver::try_from(php(4, 3)).expect("build");
    s.set_conflict_limit(0);
    assert_eq!(s.solve(), Ok(Certificate::UNKNOWN));
    s.clear_limits();
    assert_eq!(s.solve(), Ok(Certificate::UNSAT));
}

#[test]
fn decision_limit_gives_unknown() {
    let mut s = Solver::try_from(vec![vec![1, 2]]).expect("build");
    s.set_decision_limit(0);
    assert_eq!(s.solve(), Ok(Certificate::UNKNOWN));
    s.clear_limits();
    assert!(matches!(s.solve(), Ok(Certificate::SAT(_))));
}

#[test]
fn pigeonhole_is_unsat() {
    let mut s = Solver::try_from(php(5, 4)).expect("build");
    assert_eq!(s.solve(), Ok(Certificate::UNSAT));
}

#[test]
fn planted_three_sat_is_sat() {
    // sixty ternary clauses, each holding at least one positive literal,
    // so the all-true assignment is a planted model
    let n = 30i32;
    let mut clauses = Vec::new();
    for i in 0..60i32 {
        clauses.push(vec![
            i % n + 1,
            -((i * 7) % n + 1),
            (i * 13) % n + 1,
        ]);
    }
    let mut s = Solver::try_from(clauses.clone()).expect("build");
    let Ok(Certificate::SAT(model)) = s.solve() else {
        panic!("expected SAT");
    };
    assert!(satisfies(&clauses, &model));
}

#[test]
fn termination_request_gives_unknown_once() {
    let mut s = Solver::try_from(vec![vec![1, 2], vec![-1, 2]]).expect("build");
    s.terminate();
    assert_eq!(s.solve(), Ok(Certificate::UNKNOWN));
    // the request only covers one search
    assert!(matches!(s.solve(), Ok(Certificate::SAT(_))));
}

#[test]
fn terminator_works_across_threads() {
    let mut s = Solver::try_from(php(8, 7)).expect("build");
    let handle = s.terminator();
    let stopper = std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(50));
        handle.store(true, std::sync::atomic::Ordering::Relaxed);
    });
    // either the instance proves UNSAT quickly or the stopper ends it
    let outcome = s.solve();
    stopper.join().expect("stopper panicked");
    assert!(matches!(
        outcome,
        Ok(Certificate::UNSAT) | Ok(Certificate::UNKNOWN)
    ));
}

#[test]
fn resolving_is_stable() {
    let clauses = vec![vec![1, 2, 3], vec![-1, 2], vec![-2, 3]];
    let mut s = Solver::try_from(clauses.clone()).expect("build");
    let first = s.solve().expect("no error");
    let second = s.solve().expect("no error");
    let (Certificate::SAT(a), Certificate::SAT(b)) = (first, second) else {
        panic!("expected SAT twice");
    };
    assert!(satisfies(&clauses, &a));
    assert!(satisfies(&clauses, &b));
}

#[test]
fn value_of_unknown_var_is_zero() {
    let mut s = Solver::try_from(vec![vec![1, 2]]).expect("build");
    let _ = s.solve();
    assert_eq!(s.value(5), 0);
}

#[test]
fn adding_after_solve_is_rejected() {
    let mut s = Solver::try_from(vec![vec![1, 2]]).expect("build");
    let _ = s.solve();
    assert_eq!(s.add_clause([3, 4]), Err(SolverError::InvalidOperation));
}
