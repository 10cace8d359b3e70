use std::rc::Rc;

use boa_engine::{Context, JsResult, JsValue, realm::Realm};
use tracing::debug;

use crate::{
    diagnostics::Result,
    runtime::{self, Evaluated, HostState, Runtime},
    stdlib,
};

/// One global scope, populated with the host natives and `arguments`.
///
/// Every environment is a separate engine realm; they all share the
/// [`Runtime`] that created them.
pub struct HostEnvironment {
    realm: Realm,
    host: Rc<HostState>,
}

impl HostEnvironment {
    pub fn create(runtime: &mut Runtime, arguments: &[String]) -> Result<Self> {
        let (context, host) = runtime.parts();
        Ok(Self::create_in(context, host, arguments)?)
    }

    pub(crate) fn create_in(
        context: &mut Context,
        host: &Rc<HostState>,
        arguments: &[String],
    ) -> JsResult<Self> {
        let realm = context.create_realm()?;
        let previous = context.enter_realm(realm.clone());
        let installed = stdlib::install(context, host, arguments);
        context.enter_realm(previous);
        installed?;
        debug!(arguments = arguments.len(), "host environment created");
        Ok(Self {
            realm,
            host: Rc::clone(host),
        })
    }

    pub fn evaluate(&self, runtime: &mut Runtime, source: &str, name: &str) -> Evaluated {
        self.evaluate_in(runtime.context(), source, name)
    }

    pub fn check_syntax(&self, runtime: &mut Runtime, source: &str, name: &str) -> Evaluated {
        self.within(runtime.context(), |context, host| {
            runtime::check_syntax(context, host, source, name)
        })
    }

    /// `ToString` of a value produced in this environment.
    pub fn stringify(&self, runtime: &mut Runtime, value: &JsValue) -> String {
        self.within(runtime.context(), |context, _| runtime::stringify(value, context))
    }

    pub(crate) fn evaluate_in(&self, context: &mut Context, source: &str, name: &str) -> Evaluated {
        self.within(context, |context, host| {
            runtime::evaluate(context, host, source, name)
        })
    }

    fn within<T>(&self, context: &mut Context, f: impl FnOnce(&mut Context, &HostState) -> T) -> T {
        let previous = context.enter_realm(self.realm.clone());
        let output = f(context, &self.host);
        context.enter_realm(previous);
        output
    }
}
