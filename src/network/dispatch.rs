//! Service dispatch
//!
//! Server-side name → service → method tables. Generated server code builds
//! one `ServiceDispatch` per service; the server looks requests up here.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::protocol::{split_method_key, ErrorCode, RpcError};
use crate::wire::AnyObject;

/// Type-erased method handler
pub type MethodFn =
    Box<dyn Fn(Option<AnyObject>) -> Result<Option<AnyObject>, RpcError> + Send + Sync>;

/// Methods of one service
pub struct ServiceDispatch {
    name: String,
    methods: HashMap<String, MethodFn>,
}

impl ServiceDispatch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
        }
    }

    /// Register a typed handler.
    ///
    /// The decoded request must be a `Req`; anything else (including null)
    /// is answered with `BadRequest` without calling `handler`.
    pub fn method<Req, Resp, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        Req: Any + Send,
        Resp: Any + Send,
        F: Fn(Req) -> Result<Resp, RpcError> + Send + Sync + 'static,
    {
        let name = name.into();
        let expected = std::any::type_name::<Req>();
        let method: MethodFn = Box::new(move |request: Option<AnyObject>| {
            let request = request
                .ok_or_else(|| RpcError::bad_request(format!("expected {}, got null", expected)))?
                .downcast::<Req>()
                .map_err(|_| {
                    RpcError::bad_request(format!("expected {}, got another type", expected))
                })?;
            let response = handler(*request)?;
            Ok(Some(Box::new(response) as AnyObject))
        });
        self.methods.insert(name, method);
        self
    }

    /// Register an untyped handler
    pub fn raw_method(mut self, name: impl Into<String>, handler: MethodFn) -> Self {
        self.methods.insert(name.into(), handler);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registered method names, sorted
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// All services served by one server
#[derive(Default)]
pub struct Dispatcher {
    services: HashMap<String, ServiceDispatch>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service; a later service with the same name replaces it
    pub fn register(&mut self, service: ServiceDispatch) {
        tracing::debug!(
            "Registered service {} ({} methods)",
            service.name,
            service.methods.len()
        );
        self.services.insert(service.name.clone(), service);
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Route a request to its handler.
    ///
    /// Panicking handlers are reported as `HandlerFailed`.
    pub fn dispatch(
        &self,
        method_key: &str,
        request: Option<AnyObject>,
    ) -> Result<Option<AnyObject>, RpcError> {
        let (service_name, method_name) = split_method_key(method_key).ok_or_else(|| {
            RpcError::bad_request(format!("malformed method key `{}`", method_key))
        })?;

        let service = self.services.get(service_name).ok_or_else(|| {
            RpcError::new(
                ErrorCode::UnknownService,
                format!("unknown service `{}`", service_name),
            )
        })?;

        let method = service.methods.get(method_name).ok_or_else(|| {
            RpcError::new(
                ErrorCode::UnknownMethod,
                format!("service `{}` has no method `{}`", service_name, method_name),
            )
        })?;

        match catch_unwind(AssertUnwindSafe(|| method(request))) {
            Ok(result) => result,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string());
                Err(RpcError::handler(reason))
            }
        }
    }
}
