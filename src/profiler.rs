//! Sampling windows and the per-run profiling database.

use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
    time::{Duration, Instant},
};

use serde::Serialize;
use tracing::warn;

use crate::diagnostics::Result;

/// Thirty-two user controlled flags; flag `n` lives in bit `n - 1`.
#[derive(Debug, Default)]
pub struct SamplingFlags {
    bits: Cell<u32>,
}

impl SamplingFlags {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 32;

    /// Returns false, leaving the set untouched, for flags outside `1..=32`.
    pub fn set(&self, flag: u32) -> bool {
        match Self::mask(flag) {
            Some(mask) => {
                self.bits.set(self.bits.get() | mask);
                true
            }
            None => false,
        }
    }

    pub fn clear(&self, flag: u32) -> bool {
        match Self::mask(flag) {
            Some(mask) => {
                self.bits.set(self.bits.get() & !mask);
                true
            }
            None => false,
        }
    }

    pub fn is_set(&self, flag: u32) -> bool {
        Self::mask(flag).is_some_and(|mask| self.bits.get() & mask != 0)
    }

    pub fn bits(&self) -> u32 {
        self.bits.get()
    }

    fn mask(flag: u32) -> Option<u32> {
        (Self::MIN..=Self::MAX)
            .contains(&flag)
            .then(|| 1 << (flag - 1))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRecord {
    pub script: String,
    pub elapsed_micros: u128,
    pub flags: u32,
}

/// Collects one record per [`SamplingWindow`] while enabled.
#[derive(Debug)]
pub struct Sampler {
    enabled: bool,
    running: Cell<bool>,
    window_open: Cell<bool>,
    records: RefCell<Vec<SampleRecord>>,
}

impl Sampler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            running: Cell::new(false),
            window_open: Cell::new(false),
            records: RefCell::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&self) {
        self.running.set(self.enabled);
    }

    pub fn stop(&self) {
        self.running.set(false);
    }

    /// Opens a window around one script. Inert unless the sampler is
    /// running and no other window is open.
    pub fn window<'a>(&'a self, script: &str, flags: &'a SamplingFlags) -> SamplingWindow<'a> {
        let started = if !self.running.get() {
            None
        } else if self.window_open.replace(true) {
            warn!(script, "sampling window already open; not nesting");
            None
        } else {
            Some(Instant::now())
        };
        SamplingWindow {
            sampler: self,
            flags,
            script: script.to_owned(),
            started,
        }
    }

    pub fn records(&self) -> Vec<SampleRecord> {
        self.records.borrow().clone()
    }

    pub fn dump(&self, out: &mut impl Write) -> io::Result<()> {
        let records = self.records.borrow();
        writeln!(out, "Sampling windows: {}", records.len())?;
        for record in records.iter() {
            writeln!(
                out,
                "  {:>10}us  flags={:#010x}  {}",
                record.elapsed_micros, record.flags, record.script
            )?;
        }
        Ok(())
    }
}

/// Start/stop bracket around a single script; closes on drop.
pub struct SamplingWindow<'a> {
    sampler: &'a Sampler,
    flags: &'a SamplingFlags,
    script: String,
    started: Option<Instant>,
}

impl SamplingWindow<'_> {
    pub fn is_recording(&self) -> bool {
        self.started.is_some()
    }

    pub fn elapsed(&self) -> Option<Duration> {
        self.started.map(|started| started.elapsed())
    }
}

impl Drop for SamplingWindow<'_> {
    fn drop(&mut self) {
        let Some(started) = self.started else {
            return;
        };
        self.sampler.records.borrow_mut().push(SampleRecord {
            script: std::mem::take(&mut self.script),
            elapsed_micros: started.elapsed().as_micros(),
            flags: self.flags.bits(),
        });
        self.sampler.window_open.set(false);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EvaluationKind {
    Evaluate,
    CheckSyntax,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub source: String,
    pub kind: EvaluationKind,
    pub elapsed_ms: f64,
    pub threw: bool,
}

impl ProfileRecord {
    pub fn new(source: &str, kind: EvaluationKind, elapsed: Duration, threw: bool) -> Self {
        Self {
            source: source.to_owned(),
            kind,
            elapsed_ms: elapsed.as_secs_f64() * 1000.0,
            threw,
        }
    }
}

#[derive(Serialize)]
struct ProfileDatabase<'a> {
    version: u32,
    records: &'a [ProfileRecord],
}

/// Every top-level evaluation of a `-p` run, written out at shutdown.
#[derive(Debug, Default)]
pub struct Profiler {
    records: Vec<ProfileRecord>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: ProfileRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ProfileRecord] {
        &self.records
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        let database = ProfileDatabase {
            version: 1,
            records: &self.records,
        };
        serde_json::to_writer_pretty(&mut writer, &database)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
