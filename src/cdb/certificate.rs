//! DRAT certificate side channel.
use {
    crate::types::*,
    std::{
        fmt::Write as _,
        fs::File,
        io::{BufWriter, Write},
    },
};

/// Observes every learned and deleted clause and streams them out in DRAT
/// text format. Literals arrive as an iterator in external numbering, so
/// call sites hand over the arena's literal walk directly instead of
/// building a temporary vector.
#[derive(Debug, Default)]
pub struct CertificationDumper {
    out: Option<BufWriter<File>>,
    /// one record under construction; reused between calls.
    line: String,
}

impl Clone for CertificationDumper {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl Instantiate for CertificationDumper {
    fn instantiate(config: &Config, _cnf: &CNFDescription) -> Self {
        if !config.use_certification {
            return CertificationDumper::default();
        }
        CertificationDumper {
            out: File::create(config.output_dir.join(&config.proof_file))
                .ok()
                .map(BufWriter::new),
            line: String::new(),
        }
    }
}

impl CertificationDumper {
    pub fn is_active(&self) -> bool {
        self.out.is_some()
    }
    /// record a learned (or imported) clause.
    pub fn push_add(&mut self, lits: impl IntoIterator<Item = i32>) {
        self.emit(None, lits);
    }
    /// record a deletion.
    pub fn push_delete(&mut self, lits: impl IntoIterator<Item = i32>) {
        self.emit(Some('d'), lits);
    }
    /// append the empty clause and stop recording; the writer flushes on
    /// drop.
    pub fn close(&mut self) {
        self.emit(None, std::iter::empty());
        self.out = None;
    }
    fn emit(&mut self, tag: Option<char>, lits: impl IntoIterator<Item = i32>) {
        let Some(ref mut out) = self.out else {
            return;
        };
        self.line.clear();
        if let Some(c) = tag {
            self.line.push(c);
            self.line.push(' ');
        }
        for l in lits {
            let _ = write!(self.line, "{l} ");
        }
        self.line.push_str("0\n");
        if out.write_all(self.line.as_bytes()).is_err() {
            // the proof is already broken; stop pretending to record one
            self.out = None;
        }
    }
}
