// A thin DIMACS front end over the solver library.
use {
    parsat::{Certificate, Config, Solver, SolverBuildIF, SolverSearchIF},
    structopt::StructOpt,
};

fn main() {
    let config = Config::from_args();
    let mut solver = match Solver::build(&config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("c cannot load '{}': {e}", config.cnf_file.display());
            std::process::exit(1);
        }
    };
    let code = match solver.solve() {
        Ok(cert) => {
            match &cert {
                Certificate::SAT(model) => {
                    println!("s SATISFIABLE");
                    print_model(model);
                }
                Certificate::UNSAT => println!("s UNSATISFIABLE"),
                Certificate::UNKNOWN => println!("s UNKNOWN"),
            }
            cert.exit_code()
        }
        Err(e) => {
            eprintln!("c solver error: {e}");
            1
        }
    };
    std::process::exit(code);
}

fn print_model(model: &[i32]) {
    let mut line = String::from("v");
    for l in model.iter().chain(std::iter::once(&0)) {
        if 70 < line.len() {
            println!("{line}");
            line = String::from("v");
        }
        line.push_str(&format!(" {l}"));
    }
    println!("{line}");
}
