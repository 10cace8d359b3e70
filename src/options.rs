//! Engine options settable with `--<name>=<value>`.

use std::{
    fmt,
    io::{self, Write},
};

use boa_engine::Context;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Unsigned(u64),
}

impl OptionValue {
    /// Parses `raw` as the same kind of value as `self`.
    fn parse_like(self, raw: &str) -> Option<Self> {
        match self {
            OptionValue::Bool(_) => match raw {
                "true" | "1" => Some(OptionValue::Bool(true)),
                "false" | "0" => Some(OptionValue::Bool(false)),
                _ => None,
            },
            OptionValue::Unsigned(_) => raw.parse().ok().map(OptionValue::Unsigned),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Unsigned(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct OptionEntry {
    value: OptionValue,
    description: &'static str,
}

const DEFINITIONS: &[(&str, OptionValue, &str)] = &[
    (
        "maxLoopIterations",
        OptionValue::Unsigned(u64::MAX),
        "iterations a single loop may run before it throws",
    ),
    (
        "maxRecursionDepth",
        OptionValue::Unsigned(512),
        "nested function calls allowed before a RangeError",
    ),
    (
        "maxStackSize",
        OptionValue::Unsigned(1024),
        "value stack slots available to the interpreter",
    ),
    (
        "strictMode",
        OptionValue::Bool(false),
        "evaluate every script as strict mode code",
    ),
    (
        "useSampling",
        OptionValue::Bool(false),
        "record a sampling window per script and bind the sampling flag natives",
    ),
    (
        "dumpSampleData",
        OptionValue::Bool(true),
        "print collected sampling windows at shutdown",
    ),
];

/// Ordered option table, seeded with the defaults above.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    entries: IndexMap<&'static str, OptionEntry>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        let entries = DEFINITIONS
            .iter()
            .map(|&(name, value, description)| (name, OptionEntry { value, description }))
            .collect();
        Self { entries }
    }
}

impl EngineOptions {
    /// Applies a `name=value` assignment. Returns false when the name is
    /// unknown or the value does not parse; nothing changes in that case.
    pub fn set_option(&mut self, assignment: &str) -> bool {
        let Some((name, raw)) = assignment.split_once('=') else {
            return false;
        };
        let Some(entry) = self.entries.get_mut(name) else {
            return false;
        };
        match entry.value.parse_like(raw) {
            Some(value) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.entries.get(name).map(|entry| entry.value)
    }

    pub fn max_loop_iterations(&self) -> u64 {
        self.unsigned("maxLoopIterations")
    }

    pub fn max_recursion_depth(&self) -> usize {
        usize::try_from(self.unsigned("maxRecursionDepth")).unwrap_or(usize::MAX)
    }

    pub fn max_stack_size(&self) -> usize {
        usize::try_from(self.unsigned("maxStackSize")).unwrap_or(usize::MAX)
    }

    pub fn strict_mode(&self) -> bool {
        self.flag("strictMode")
    }

    pub fn use_sampling(&self) -> bool {
        self.flag("useSampling")
    }

    pub fn dump_sample_data(&self) -> bool {
        self.flag("dumpSampleData")
    }

    /// Pushes the limits and flags onto a freshly built context.
    pub fn apply(&self, context: &mut Context) {
        let limits = context.runtime_limits_mut();
        limits.set_loop_iteration_limit(self.max_loop_iterations());
        limits.set_recursion_limit(self.max_recursion_depth());
        limits.set_stack_size_limit(self.max_stack_size());
        context.strict(self.strict_mode());
    }

    pub fn dump(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "All engine options:")?;
        for (name, entry) in &self.entries {
            writeln!(out, "   {name}={}   ... {}", entry.value, entry.description)?;
        }
        Ok(())
    }

    fn unsigned(&self, name: &str) -> u64 {
        match self.get(name) {
            Some(OptionValue::Unsigned(n)) => n,
            _ => 0,
        }
    }

    fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(OptionValue::Bool(true)))
    }
}
