//! Native functions bound into every host environment.

use std::{
    io::{self, BufRead, Write},
    process,
    rc::Rc,
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use boa_engine::{
    Context, Finalize, JsArgs, JsError, JsNativeError, JsResult, JsString, JsValue,
    NativeFunction, Trace, js_string, object::builtins::JsArray, property::Attribute,
};
use tracing::warn;

use crate::{
    environment::HostEnvironment,
    runtime::{self, HostState},
    source::{self, SourceBuffer},
};

/// Shared host state as a native-function capture.
#[derive(Clone, Trace, Finalize)]
struct HostHandle {
    #[unsafe_ignore_trace]
    state: Rc<HostState>,
}

type HostFn = fn(&JsValue, &[JsValue], &HostHandle, &mut Context) -> JsResult<JsValue>;
type Native = (&'static str, usize, HostFn);

const NATIVES: &[Native] = &[
    ("debug", 1, debug),
    ("describe", 1, describe),
    ("print", 1, print),
    ("quit", 0, quit),
    ("gc", 0, gc),
    ("dumpCallFrame", 0, dump_call_frame),
    ("releaseExecutableMemory", 0, release_executable_memory),
    ("version", 1, version),
    ("run", 1, run),
    ("load", 1, load),
    ("checkSyntax", 1, check_syntax),
    ("jscStack", 1, jsc_stack),
    ("readline", 0, readline),
    ("preciseTime", 0, precise_time),
];

const SAMPLING_NATIVES: &[Native] = &[
    ("setSamplingFlags", 1, set_sampling_flags),
    ("clearSamplingFlags", 1, clear_sampling_flags),
];

const TYPED_ARRAYS: &[&str] = &[
    "Uint8Array",
    "Uint8ClampedArray",
    "Uint16Array",
    "Uint32Array",
    "Int8Array",
    "Int16Array",
    "Int32Array",
    "Float32Array",
    "Float64Array",
];

/// Binds the native surface and `arguments` into the current realm.
pub(crate) fn install(
    context: &mut Context,
    host: &Rc<HostState>,
    arguments: &[String],
) -> JsResult<()> {
    let handle = HostHandle {
        state: Rc::clone(host),
    };
    let sampling: &[Native] = if host.options().use_sampling() {
        SAMPLING_NATIVES
    } else {
        &[]
    };
    for &(name, length, callback) in NATIVES.iter().chain(sampling) {
        context.register_global_builtin_callable(
            JsString::from(name),
            length,
            native(callback, handle.clone()),
        )?;
    }

    for &name in TYPED_ARRAYS {
        rebind_constructor(context, name)?;
    }

    let arguments = JsArray::from_iter(
        arguments
            .iter()
            .map(|argument| JsValue::from(JsString::from(argument.as_str()))),
        context,
    );
    context.register_global_property(js_string!("arguments"), arguments, Attribute::all())?;
    Ok(())
}

fn native(callback: HostFn, handle: HostHandle) -> NativeFunction {
    NativeFunction::from_copy_closure_with_captures(
        move |this, args, handle, context| callback(this, args, handle, context),
        handle,
    )
}

fn rebind_constructor(context: &mut Context, name: &str) -> JsResult<()> {
    let key = JsString::from(name);
    let constructor = context.global_object().get(key.clone(), context)?;
    match constructor.as_object() {
        Some(object) if object.is_constructor() => {
            let object = object.clone();
            context.register_global_property(
                key,
                object,
                Attribute::WRITABLE | Attribute::CONFIGURABLE,
            )?;
        }
        _ => warn!(name, "engine provides no constructor to bind"),
    }
    Ok(())
}

fn io_error(err: io::Error) -> JsError {
    JsNativeError::error().with_message(err.to_string()).into()
}

fn string_argument(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<String> {
    Ok(args
        .get_or_undefined(index)
        .to_string(context)?
        .to_std_string_escaped())
}

fn load_source(path: &str) -> JsResult<SourceBuffer> {
    source::load(path).map_err(|err| JsNativeError::error().with_message(err.to_string()).into())
}

fn elapsed_millis(started: Instant) -> JsValue {
    JsValue::from(started.elapsed().as_secs_f64() * 1000.0)
}

fn print(_: &JsValue, args: &[JsValue], _: &HostHandle, context: &mut Context) -> JsResult<JsValue> {
    let mut line = String::new();
    for (index, arg) in args.iter().enumerate() {
        if index > 0 {
            line.push(' ');
        }
        line.push_str(&arg.to_string(context)?.to_std_string_escaped());
    }
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{line}")
        .and_then(|()| stdout.flush())
        .map_err(io_error)?;
    Ok(JsValue::undefined())
}

fn debug(_: &JsValue, args: &[JsValue], _: &HostHandle, context: &mut Context) -> JsResult<JsValue> {
    let message = string_argument(args, 0, context)?;
    eprintln!("--> {message}");
    Ok(JsValue::undefined())
}

fn describe(
    _: &JsValue,
    args: &[JsValue],
    _: &HostHandle,
    _: &mut Context,
) -> JsResult<JsValue> {
    eprintln!("--> {}", args.get_or_undefined(0).display());
    Ok(JsValue::undefined())
}

fn quit(_: &JsValue, _: &[JsValue], _: &HostHandle, _: &mut Context) -> JsResult<JsValue> {
    io::stdout().flush().ok();
    process::exit(0)
}

fn gc(_: &JsValue, _: &[JsValue], _: &HostHandle, _: &mut Context) -> JsResult<JsValue> {
    boa_gc::force_collect();
    Ok(JsValue::undefined())
}

fn dump_call_frame(
    _: &JsValue,
    _: &[JsValue],
    handle: &HostHandle,
    _: &mut Context,
) -> JsResult<JsValue> {
    if let Some(frame) = handle.state.frames().first() {
        eprintln!("--> Call frame: {frame}");
    }
    Ok(JsValue::undefined())
}

// The interpreter keeps no executable pool; the closest equivalent is a full collection.
fn release_executable_memory(
    _: &JsValue,
    _: &[JsValue],
    _: &HostHandle,
    _: &mut Context,
) -> JsResult<JsValue> {
    boa_gc::force_collect();
    Ok(JsValue::undefined())
}

// Kept for test suites that call `version(n)` before running.
fn version(_: &JsValue, _: &[JsValue], _: &HostHandle, _: &mut Context) -> JsResult<JsValue> {
    Ok(JsValue::undefined())
}

/// Runs a file in a brand new environment and returns the elapsed milliseconds.
fn run(_: &JsValue, args: &[JsValue], handle: &HostHandle, context: &mut Context) -> JsResult<JsValue> {
    let path = string_argument(args, 0, context)?;
    let buffer = load_source(&path)?;
    let environment = HostEnvironment::create_in(context, &handle.state, &[])?;
    let started = Instant::now();
    environment
        .evaluate_in(context, &buffer.text(), &path)
        .into_result()?;
    Ok(elapsed_millis(started))
}

/// Runs a file in the caller's own global scope and returns its completion value.
fn load(_: &JsValue, args: &[JsValue], handle: &HostHandle, context: &mut Context) -> JsResult<JsValue> {
    let path = string_argument(args, 0, context)?;
    let buffer = load_source(&path)?;
    runtime::evaluate(context, &handle.state, &buffer.text(), &path).into_result()
}

fn check_syntax(
    _: &JsValue,
    args: &[JsValue],
    handle: &HostHandle,
    context: &mut Context,
) -> JsResult<JsValue> {
    let path = string_argument(args, 0, context)?;
    let buffer = load_source(&path)?;
    let started = Instant::now();
    runtime::check_syntax(context, &handle.state, &buffer.text(), &path).into_result()?;
    Ok(elapsed_millis(started))
}

fn jsc_stack(
    _: &JsValue,
    _: &[JsValue],
    handle: &HostHandle,
    _: &mut Context,
) -> JsResult<JsValue> {
    let mut trace = String::from("--> Stack trace:\n");
    for (index, frame) in handle.state.frames().iter().enumerate() {
        trace.push_str(&format!("    {index}   {frame}\n"));
    }
    eprint!("{trace}");
    Ok(JsValue::undefined())
}

fn readline(_: &JsValue, _: &[JsValue], _: &HostHandle, _: &mut Context) -> JsResult<JsValue> {
    let mut line = Vec::new();
    io::stdin()
        .lock()
        .read_until(b'\n', &mut line)
        .map_err(io_error)?;
    if line.last() == Some(&b'\n') {
        line.pop();
    }
    let text = source::decode(&line);
    Ok(JsString::from(&*text).into())
}

fn precise_time(_: &JsValue, _: &[JsValue], _: &HostHandle, _: &mut Context) -> JsResult<JsValue> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).map_err(|_| {
        JsError::from(JsNativeError::error().with_message("system clock went backwards"))
    })?;
    Ok(JsValue::from(now.as_secs_f64()))
}

fn set_sampling_flags(
    _: &JsValue,
    args: &[JsValue],
    handle: &HostHandle,
    context: &mut Context,
) -> JsResult<JsValue> {
    for arg in args {
        if let Some(flag) = sampling_flag(arg, context)? {
            handle.state.sampling_flags().set(flag);
        }
    }
    Ok(JsValue::null())
}

fn clear_sampling_flags(
    _: &JsValue,
    args: &[JsValue],
    handle: &HostHandle,
    context: &mut Context,
) -> JsResult<JsValue> {
    for arg in args {
        if let Some(flag) = sampling_flag(arg, context)? {
            handle.state.sampling_flags().clear(flag);
        }
    }
    Ok(JsValue::null())
}

/// Truncates to an unsigned flag number; anything that cannot be one is dropped.
fn sampling_flag(arg: &JsValue, context: &mut Context) -> JsResult<Option<u32>> {
    let number = arg.to_number(context)?;
    if number.is_finite() && number >= 1.0 && number < 33.0 {
        Ok(Some(number as u32))
    } else {
        Ok(None)
    }
}
