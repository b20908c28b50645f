/// Crate `config` provides solver's configuration and CLI.
use {std::path::PathBuf, structopt::StructOpt};

/// Configuration built from command line options
#[derive(Clone, Debug, StructOpt)]
#[structopt(name = "parsat", about, author)]
pub struct Config {
    //
    //## I/O configuration
    //
    /// CNF file in DIMACS format
    #[structopt(parse(from_os_str), default_value = "")]
    pub cnf_file: PathBuf,

    /// Disable any progress message
    #[structopt(long = "quiet", short = "q")]
    pub quiet_mode: bool,

    /// Output directory
    #[structopt(long = "dir", short = "o", default_value = ".", parse(from_os_str))]
    pub output_dir: PathBuf,

    /// Cert. file in DRAT format
    #[structopt(
        long = "proof",
        default_value = "proof.drat",
        short = "p",
        parse(from_os_str)
    )]
    pub proof_file: PathBuf,

    /// Writes a DRAT UNSAT certification file
    #[structopt(long = "certify", short = "c")]
    pub use_certification: bool,

    /// Reports don't-care vars as unassigned in the model
    #[structopt(long = "partial")]
    pub partial_model: bool,

    //
    //## clause DB
    //
    /// Soft limit of #clauses (0 = no limit)
    #[structopt(long = "cl", default_value = "0")]
    pub clause_limit: usize,

    /// Glue bound under which learnts are kept forever
    #[structopt(long = "tier1", default_value = "2")]
    pub tier1_glue: u16,

    /// Glue bound under which learnts age slowly
    #[structopt(long = "tier2", default_value = "6")]
    pub tier2_glue: u16,

    /// #conflicts between reductions
    #[structopt(long = "rdi", default_value = "1000")]
    pub reduce_interval: usize,

    /// Reduction interval increment
    #[structopt(long = "rdg", default_value = "300")]
    pub reduce_interval_inc: usize,

    //
    //## restarter
    //
    /// #conflicts between restarts in focused mode
    #[structopt(long = "rs", default_value = "50")]
    pub rst_step: usize,

    /// Length of LBD fast EMA
    #[structopt(long = "rll", default_value = "50")]
    pub rst_lbd_len: usize,

    /// Length of LBD slow EMA
    #[structopt(long = "rls", default_value = "10000")]
    pub rst_lbd_slw: usize,

    /// Forcing restart threshold over the LBD trend
    #[structopt(long = "rlt", default_value = "1.20")]
    pub rst_lbd_thr: f64,

    /// Base of the reluctant-doubling schedule in stable mode
    #[structopt(long = "rsb", default_value = "1024")]
    pub rst_stb_step: usize,

    /// #conflicts before the first focused/stable mode switch
    #[structopt(long = "mode", default_value = "1000")]
    pub mode_switch_interval: usize,

    //
    //## var rewarding
    //
    /// VSIDS score decay
    #[structopt(long = "vsd", default_value = "0.95")]
    pub vsids_decay: f64,

    /// Initial CHB step size
    #[structopt(long = "chs", default_value = "0.4")]
    pub chb_step: f64,

    /// CHB step size floor
    #[structopt(long = "chm", default_value = "0.06")]
    pub chb_step_min: f64,

    /// CHB step size decrement per conflict
    #[structopt(long = "chd", default_value = "0.000001")]
    pub chb_step_dec: f64,

    /// Disable the bandit layer and stick to VSIDS
    #[structopt(long = "no-mab")]
    pub without_mab: bool,

    /// #conflicts between rephase rounds
    #[structopt(long = "rpi", default_value = "10000")]
    pub rephase_interval: usize,

    //
    //## clause exchange
    //
    /// Glue bound for exporting learnt clauses to peers
    #[structopt(long = "xt", default_value = "2")]
    pub export_glue_limit: u16,

    //
    //## simplification boundary
    //
    /// #conflicts between simplifier invocations
    #[structopt(long = "spi", default_value = "4000")]
    pub simplify_interval: usize,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            cnf_file: PathBuf::new(),
            quiet_mode: true,
            output_dir: PathBuf::from("."),
            proof_file: PathBuf::from("proof.drat"),
            use_certification: false,
            partial_model: false,
            clause_limit: 0,
            tier1_glue: 2,
            tier2_glue: 6,
            reduce_interval: 1000,
            reduce_interval_inc: 300,
            rst_step: 50,
            rst_lbd_len: 50,
            rst_lbd_slw: 10_000,
            rst_lbd_thr: 1.20,
            rst_stb_step: 1024,
            mode_switch_interval: 1000,
            vsids_decay: 0.95,
            chb_step: 0.4,
            chb_step_min: 0.06,
            chb_step_dec: 0.000_001,
            without_mab: false,
            rephase_interval: 10_000,
            export_glue_limit: 2,
            simplify_interval: 4000,
        }
    }
}

impl<T> From<T> for Config
where
    PathBuf: From<T>,
{
    fn from(path: T) -> Config {
        Config {
            cnf_file: PathBuf::from(path),
            ..Config::default()
        }
    }
}
