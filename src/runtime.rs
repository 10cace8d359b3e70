//! The shared engine instance and the only paths into it.

use std::{
    cell::RefCell,
    path::Path,
    rc::Rc,
    time::Instant,
};

use boa_engine::{Context, JsError, JsResult, JsValue, Script, Source, js_string};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::debug;

use crate::{
    diagnostics::{ExceptionInfo, Result},
    options::EngineOptions,
    profiler::{EvaluationKind, ProfileRecord, Profiler, Sampler, SamplingFlags},
};

/// Result of handing source text to the engine.
#[derive(Debug)]
pub enum Evaluated {
    Ok(JsValue),
    Threw { error: JsError, info: ExceptionInfo },
}

impl Evaluated {
    fn from_result(result: JsResult<JsValue>, context: &mut Context) -> Self {
        match result {
            Ok(value) => Evaluated::Ok(value),
            Err(error) => {
                let info = exception_info(&error, context);
                Evaluated::Threw { error, info }
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Evaluated::Ok(_))
    }

    pub fn exception(&self) -> Option<&ExceptionInfo> {
        match self {
            Evaluated::Ok(_) => None,
            Evaluated::Threw { info, .. } => Some(info),
        }
    }

    /// Hands a thrown value back to the engine unchanged.
    pub fn into_result(self) -> JsResult<JsValue> {
        match self {
            Evaluated::Ok(value) => Ok(value),
            Evaluated::Threw { error, .. } => Err(error),
        }
    }
}

/// State shared by the runtime, every host environment and every native.
#[derive(Debug)]
pub struct HostState {
    lock: ReentrantMutex<()>,
    frames: RefCell<Vec<String>>,
    options: EngineOptions,
    sampling_flags: SamplingFlags,
    sampler: Sampler,
    profiler: Option<RefCell<Profiler>>,
}

impl HostState {
    fn new(options: EngineOptions, profile: bool) -> Self {
        let sampler = Sampler::new(options.use_sampling());
        Self {
            lock: ReentrantMutex::new(()),
            frames: RefCell::new(Vec::new()),
            options,
            sampling_flags: SamplingFlags::default(),
            sampler,
            profiler: profile.then(|| RefCell::new(Profiler::new())),
        }
    }

    /// Takes the engine lock and pushes `frame` for the lifetime of the scope.
    pub fn enter(&self, frame: &str) -> ExecutionScope<'_> {
        let guard = self.lock.lock();
        self.frames.borrow_mut().push(frame.to_owned());
        ExecutionScope {
            state: self,
            _guard: guard,
        }
    }

    /// Names of the evaluations in progress, innermost first.
    pub fn frames(&self) -> Vec<String> {
        self.frames.borrow().iter().rev().cloned().collect()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn sampling_flags(&self) -> &SamplingFlags {
        &self.sampling_flags
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    pub fn is_profiling(&self) -> bool {
        self.profiler.is_some()
    }

    pub fn profile_records(&self) -> Vec<ProfileRecord> {
        self.profiler
            .as_ref()
            .map(|profiler| profiler.borrow().records().to_vec())
            .unwrap_or_default()
    }

    /// Writes the profiling database; a no-op when profiling is off.
    pub fn save_profile(&self, path: &Path) -> Result<()> {
        match &self.profiler {
            Some(profiler) => profiler.borrow().save(path),
            None => Ok(()),
        }
    }

    fn record(&self, record: ProfileRecord) {
        if let Some(profiler) = &self.profiler {
            profiler.borrow_mut().record(record);
        }
    }
}

/// Exclusive access to the engine for one (possibly nested) evaluation.
pub struct ExecutionScope<'a> {
    state: &'a HostState,
    _guard: ReentrantMutexGuard<'a, ()>,
}

impl ExecutionScope<'_> {
    pub fn is_outermost(&self) -> bool {
        self.state.frames.borrow().len() == 1
    }
}

impl Drop for ExecutionScope<'_> {
    fn drop(&mut self) {
        self.state.frames.borrow_mut().pop();
    }
}

/// The one engine instance of the process.
pub struct Runtime {
    context: Context,
    host: Rc<HostState>,
}

impl Runtime {
    pub fn new(options: EngineOptions, profile: bool) -> Self {
        let mut context = Context::default();
        options.apply(&mut context);
        debug!(profile, sampling = options.use_sampling(), "engine runtime created");
        Self {
            context,
            host: Rc::new(HostState::new(options, profile)),
        }
    }

    pub fn host(&self) -> &Rc<HostState> {
        &self.host
    }

    pub fn context(&mut self) -> &mut Context {
        &mut self.context
    }

    pub(crate) fn parts(&mut self) -> (&mut Context, &Rc<HostState>) {
        (&mut self.context, &self.host)
    }
}

/// Evaluates `source` in whatever realm is current on `context`.
pub(crate) fn evaluate(
    context: &mut Context,
    host: &HostState,
    source: &str,
    name: &str,
) -> Evaluated {
    let scope = host.enter(name);
    let started = Instant::now();
    let result = context.eval(Source::from_reader(source.as_bytes(), Some(Path::new(name))));
    if scope.is_outermost() {
        // Promise jobs queued by this evaluation settle before the next one starts.
        context.run_jobs();
    }
    host.record(ProfileRecord::new(
        name,
        EvaluationKind::Evaluate,
        started.elapsed(),
        result.is_err(),
    ));
    Evaluated::from_result(result, context)
}

/// Parses `source` without running it.
pub(crate) fn check_syntax(
    context: &mut Context,
    host: &HostState,
    source: &str,
    name: &str,
) -> Evaluated {
    let _scope = host.enter(name);
    let started = Instant::now();
    let result = Script::parse(
        Source::from_reader(source.as_bytes(), Some(Path::new(name))),
        None,
        context,
    )
    .map(|_| JsValue::undefined());
    host.record(ProfileRecord::new(
        name,
        EvaluationKind::CheckSyntax,
        started.elapsed(),
        result.is_err(),
    ));
    Evaluated::from_result(result, context)
}

/// `ToString` of `value`, falling back to the engine's debug rendering for
/// values that refuse conversion (symbols, objects with a throwing `toString`).
pub fn stringify(value: &JsValue, context: &mut Context) -> String {
    match value.to_string(context) {
        Ok(text) => text.to_std_string_escaped(),
        Err(_) => value.display().to_string(),
    }
}

fn exception_info(error: &JsError, context: &mut Context) -> ExceptionInfo {
    // Runtime limit errors have no script-visible value.
    if error.as_native().is_some_and(|native| native.is_runtime_limit()) {
        return ExceptionInfo::new(error.to_string());
    }
    let value = error.to_opaque(context);
    let info = ExceptionInfo::new(stringify(&value, context));
    let stack = value
        .as_object()
        .and_then(|object| object.get(js_string!("stack"), context).ok())
        .filter(|stack| !stack.is_null_or_undefined());
    match stack {
        Some(stack) => info.with_stack(&stringify(&stack, context)),
        None => info,
    }
}
