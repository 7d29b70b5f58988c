// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Runs a declared action and hands the outcome to the dispatcher.

use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::sync::Arc;

use super::config::{ActionConfiguration, Guard};
use super::dispatcher::Dispatcher;
use super::registry::ActionRegistry;
use crate::config::{self, Configuration};
use crate::error::{ActionError, BetterControllerError, Result};
use crate::page::{merge_locals, ComponentRegistry, PageContext, TemplateRenderer};
use crate::params::build_params;
use crate::request::ActionRequest;
use crate::response::ControllerResponse;
use crate::result::{ExecutionResult, PageConfig};
use crate::service::ServiceContext;
use crate::turbo::ContentResolver;

/// What running the pipeline produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
    /// The normalized result; `{}` when no service ran.
    pub result: ExecutionResult,
    /// The resolved page config.
    pub page_config: Option<PageConfig>,
    /// The error that aborted the pipeline, if any.
    pub error: Option<ActionError>,
}

impl Execution {
    /// `success != false` and no error.
    pub fn is_successful(&self) -> bool {
        self.error.is_none() && self.result.is_success_flag()
    }
}

/// A named set of actions plus what they need to render.
///
/// # Example
///
/// ```rust
/// use better_controller::actions::{ActionRegistry, Controller};
/// use better_controller::{ActionRequest, ExecutionResult, ResponseFormat, ServiceContext};
///
/// let mut registry = ActionRegistry::new();
/// registry.define("show", |a| {
///     a.service(|_: &ServiceContext| Ok(ExecutionResult::success().with_resource(serde_json::json!({ "id": 1 }))));
/// });
///
/// let controller = Controller::new("users", registry);
/// let request = ActionRequest::new("GET", "/users/1").with_format(ResponseFormat::Json);
/// let response = controller.execute("show", &request).unwrap();
/// assert_eq!(response.status(), 200);
/// ```
#[derive(Clone)]
pub struct Controller {
    name: String,
    registry: Arc<ActionRegistry>,
    components: Arc<ComponentRegistry>,
    templates: Option<Arc<dyn TemplateRenderer>>,
    authenticate: Option<Guard>,
    authorize: Option<Guard>,
    configuration: Option<Configuration>,
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("name", &self.name)
            .field("actions", &self.registry.names())
            .field("components", &self.components)
            .field("templates", &self.templates.is_some())
            .field("authenticate", &self.authenticate.is_some())
            .field("authorize", &self.authorize.is_some())
            .field("configuration", &self.configuration)
            .finish()
    }
}

impl Controller {
    /// Creates a controller. `name` prefixes default template names
    /// (`users` → `users/index`).
    pub fn new(name: impl Into<String>, registry: ActionRegistry) -> Self {
        Self {
            name: name.into(),
            registry: Arc::new(registry),
            components: Arc::new(ComponentRegistry::new()),
            templates: None,
            authenticate: None,
            authorize: None,
            configuration: None,
        }
    }

    /// Sets the component registry.
    pub fn with_components(mut self, components: ComponentRegistry) -> Self {
        self.components = Arc::new(components);
        self
    }

    /// Sets the renderer for Turbo Stream partials.
    pub fn with_template_renderer(mut self, renderer: impl TemplateRenderer + 'static) -> Self {
        self.templates = Some(Arc::new(renderer));
        self
    }

    /// Installs the authentication guard.
    pub fn with_authentication<F>(mut self, guard: F) -> Self
    where
        F: Fn(&ActionRequest) -> std::result::Result<(), ActionError> + Send + Sync + 'static,
    {
        self.authenticate = Some(Arc::new(guard));
        self
    }

    /// Installs the authorization guard.
    pub fn with_authorization<F>(mut self, guard: F) -> Self
    where
        F: Fn(&ActionRequest) -> std::result::Result<(), ActionError> + Send + Sync + 'static,
    {
        self.authorize = Some(Arc::new(guard));
        self
    }

    /// Uses this configuration instead of the global one.
    pub fn with_configuration(mut self, configuration: Configuration) -> Self {
        self.configuration = Some(configuration);
        self
    }

    /// Controller name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The action registry.
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// The component registry.
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The configuration in effect for the next request.
    pub fn settings(&self) -> Configuration {
        self.configuration.clone().unwrap_or_else(config::current)
    }

    /// Executes a registered action.
    ///
    /// Everything that goes wrong inside the action becomes a failure
    /// response. The only error returned is
    /// [`BetterControllerError::ActionNotRegistered`].
    pub fn execute(&self, name: &str, request: &ActionRequest) -> Result<ControllerResponse> {
        let action = self
            .registry
            .get(name)
            .ok_or_else(|| BetterControllerError::ActionNotRegistered(name.to_string()))?;
        Ok(self.run(&action, request))
    }

    /// Executes a registered action with a per-request copy of its
    /// configuration adjusted by `modify`.
    pub fn execute_with(
        &self,
        name: &str,
        request: &ActionRequest,
        modify: impl FnOnce(&mut ActionConfiguration),
    ) -> Result<ControllerResponse> {
        let action = self
            .registry
            .with_modified(name, modify)
            .ok_or_else(|| BetterControllerError::ActionNotRegistered(name.to_string()))?;
        Ok(self.run(&action, request))
    }

    /// Runs the pipeline without dispatching.
    pub fn interpret(&self, action: &ActionConfiguration, request: &ActionRequest, settings: &Configuration) -> Execution {
        let mut execution = Execution::default();
        if let Err(err) = self.run_pipeline(action, request, &mut execution) {
            if settings.log_errors {
                tracing::warn!(
                    controller = %self.name,
                    action = %action.name,
                    kind = %crate::error::HasErrorKind::error_kind(&err),
                    "action failed: {}",
                    err
                );
            }
            execution.error = Some(err);
        }
        execution
    }

    fn run(&self, action: &ActionConfiguration, request: &ActionRequest) -> ControllerResponse {
        let settings = self.settings();
        tracing::debug!(
            controller = %self.name,
            action = %action.name,
            format = %request.format,
            "executing action"
        );

        let execution = self.interpret(action, request, &settings);
        let content = ActionContent {
            components: &self.components,
            templates: self.templates.as_deref(),
            result: &execution.result,
        };
        Dispatcher {
            controller: &self.name,
            action,
            request,
            settings: &settings,
            components: &self.components,
            content: &content,
        }
        .dispatch(&execution)
    }

    fn run_pipeline(
        &self,
        action: &ActionConfiguration,
        request: &ActionRequest,
        execution: &mut Execution,
    ) -> std::result::Result<(), ActionError> {
        if !action.skip_authentication {
            if let Some(guard) = &self.authenticate {
                guard(request)?;
            }
        }
        if !action.skip_authorization {
            if let Some(guard) = &self.authorize {
                guard(request)?;
            }
        }

        for callback in &action.before {
            callback(request)?;
        }

        if let Some(service) = &action.service {
            let params = build_params(&request.params, action.params_key.as_deref(), &action.permitted)?;
            let ctx = ServiceContext {
                action: action.name.clone(),
                params,
                current_user: request.current_user.clone(),
            };
            execution.result = service.call(&ctx)?;
        }

        execution.page_config = match &action.page {
            Some(page) => {
                let ctx = PageContext {
                    action: &action.name,
                    result: &execution.result,
                    current_user: request.current_user.as_ref(),
                };
                Some(page.build(&ctx)?)
            }
            None => execution.result.page_config().cloned().map(PageConfig::from),
        };
        if let Some(modifier) = &action.page_config_modifier {
            modifier(execution.page_config.get_or_insert_with(PageConfig::new), request);
        }

        for callback in &action.after {
            callback(request, &mut execution.result)?;
        }

        Ok(())
    }
}

/// Resolves stream content against the controller's components and
/// templates, injecting the result into component locals.
struct ActionContent<'a> {
    components: &'a ComponentRegistry,
    templates: Option<&'a dyn TemplateRenderer>,
    result: &'a ExecutionResult,
}

impl ContentResolver for ActionContent<'_> {
    fn render_partial(&self, name: &str, locals: &JsonValue) -> std::result::Result<String, ActionError> {
        match self.templates {
            Some(templates) => templates.render_partial(name, locals),
            None => Err(ActionError::message(format!(
                "cannot render partial '{}': no template renderer",
                name
            ))),
        }
    }

    fn render_component(&self, name: &str, locals: &Map<String, JsonValue>) -> std::result::Result<String, ActionError> {
        let props = merge_locals(self.result, locals, &Map::new());
        self.components.render(name, &props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::request::ResponseFormat;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn controller(registry: ActionRegistry) -> Controller {
        Controller::new("users", registry).with_configuration(Configuration::default())
    }

    fn run(controller: &Controller, name: &str, request: &ActionRequest) -> Execution {
        let action = controller.registry().get(name).unwrap();
        controller.interpret(&action, request, &Configuration::default())
    }

    #[test]
    fn test_unregistered_action() {
        let controller = controller(ActionRegistry::new());
        let err = controller.execute("missing", &ActionRequest::default()).unwrap_err();
        assert!(matches!(err, BetterControllerError::ActionNotRegistered(name) if name == "missing"));
    }

    #[test]
    fn test_no_service_is_successful_with_empty_result() {
        let mut registry = ActionRegistry::new();
        registry.define("index", |_| {});
        let execution = run(&controller(registry), "index", &ActionRequest::default());
        assert!(execution.is_successful());
        assert_eq!(execution.result, ExecutionResult::new());
        assert_eq!(execution.page_config, None);
    }

    #[test]
    fn test_pipeline_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (before_log, service_log, page_log, after_log) = (log.clone(), log.clone(), log.clone(), log.clone());

        let mut registry = ActionRegistry::new();
        registry.define("index", move |a| {
            a.before(move |_| {
                before_log.lock().unwrap().push("before");
                Ok(())
            })
            .service(move |_: &ServiceContext| {
                service_log.lock().unwrap().push("service");
                Ok(ExecutionResult::success())
            })
            .page(move |_: &PageContext<'_>| {
                page_log.lock().unwrap().push("page");
                Ok(PageConfig::new().with("type", json!("index")))
            })
            .after(move |_, result: &mut ExecutionResult| {
                after_log.lock().unwrap().push("after");
                result.insert("touched", json!(true));
                Ok(())
            });
        });

        let execution = run(&controller(registry), "index", &ActionRequest::default());
        assert_eq!(*log.lock().unwrap(), vec!["before", "service", "page", "after"]);
        assert_eq!(execution.result.get("touched"), Some(&json!(true)));
        assert_eq!(execution.page_config.unwrap().page_type(), Some("index"));
    }

    #[test]
    fn test_service_receives_params_and_user() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.params_key("user").permit(["name"]).service(|ctx: &ServiceContext| {
                Ok(ExecutionResult::success()
                    .with("params", ctx.params.clone())
                    .with("user", ctx.current_user.clone().unwrap_or_default())
                    .with("action", json!(ctx.action)))
            });
        });
        let request = ActionRequest::new("POST", "/users")
            .with_params(json!({ "id": 3, "user": { "name": "Ada", "admin": true } }))
            .with_current_user(json!({ "id": 9 }));

        let execution = run(&controller(registry), "create", &request);
        assert_eq!(execution.result.get("params"), Some(&json!({ "id": 3, "name": "Ada" })));
        assert_eq!(execution.result.get("user"), Some(&json!({ "id": 9 })));
        assert_eq!(execution.result.get("action"), Some(&json!("create")));
    }

    #[test]
    fn test_missing_params_key_fails_as_validation() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.params_key("user")
                .service(|_: &ServiceContext| Ok(ExecutionResult::success()));
        });
        let execution = run(&controller(registry), "create", &ActionRequest::default());
        assert!(!execution.is_successful());
        assert_eq!(
            execution.error.as_ref().map(crate::error::HasErrorKind::error_kind),
            Some(ErrorKind::Validation)
        );
    }

    #[test]
    fn test_before_error_stops_pipeline() {
        let calls = Arc::new(AtomicUsize::new(0));
        let service_calls = calls.clone();
        let mut registry = ActionRegistry::new();
        registry.define("index", move |a| {
            a.before(|_| Err(ActionError::message("halt")))
                .service(move |_: &ServiceContext| {
                    service_calls.fetch_add(1, Ordering::SeqCst);
                    Ok(ExecutionResult::success())
                });
        });
        let execution = run(&controller(registry), "index", &ActionRequest::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(execution.error, Some(ActionError::message("halt")));
    }

    #[test]
    fn test_success_false_is_failure() {
        let mut registry = ActionRegistry::new();
        registry.define("update", |a| {
            a.service(|_: &ServiceContext| Ok(ExecutionResult::failure()));
        });
        let execution = run(&controller(registry), "update", &ActionRequest::default());
        assert!(execution.error.is_none());
        assert!(!execution.is_successful());
    }

    #[test]
    fn test_page_config_from_result_and_modifier() {
        let mut registry = ActionRegistry::new();
        registry.define("index", |a| {
            a.service(|_: &ServiceContext| {
                Ok(ExecutionResult::success().with_page_config(json!({ "type": "index" })))
            })
            .page_config(|config, request| {
                config.set("path", json!(request.path));
            });
        });
        let request = ActionRequest::new("GET", "/users");
        let execution = run(&controller(registry), "index", &request);
        let page_config = execution.page_config.unwrap();
        assert_eq!(page_config.page_type(), Some("index"));
        assert_eq!(page_config.get("path"), Some(&json!("/users")));
    }

    #[test]
    fn test_guards_and_skips() {
        let mut registry = ActionRegistry::new();
        registry.define("index", |_| {});
        registry.define("public", |a| {
            a.skip_authentication();
        });
        let controller = controller(registry).with_authentication(|request: &ActionRequest| {
            match request.current_user {
                Some(_) => Ok(()),
                None => Err(ActionError::unauthorized("sign in first")),
            }
        });

        let anonymous = ActionRequest::default();
        assert_eq!(
            run(&controller, "index", &anonymous).error,
            Some(ActionError::unauthorized("sign in first"))
        );
        assert!(run(&controller, "public", &anonymous).is_successful());
        assert!(run(&controller, "index", &anonymous.clone().with_current_user(json!({ "id": 1 }))).is_successful());
    }

    #[test]
    fn test_authorization_guard_skipped() {
        let mut registry = ActionRegistry::new();
        registry.define("index", |a| {
            a.skip_authorization();
        });
        let controller = controller(registry).with_authorization(|_: &ActionRequest| Err(ActionError::unauthorized("no")));
        assert!(run(&controller, "index", &ActionRequest::default()).is_successful());
    }

    #[test]
    fn test_execute_with_modified_copy() {
        let mut registry = ActionRegistry::new();
        registry.define("show", |a| {
            a.service(|_: &ServiceContext| Ok(ExecutionResult::failure()));
        });
        let controller = controller(registry);
        let request = ActionRequest::default().with_format(ResponseFormat::Json);

        let response = controller
            .execute_with("show", &request, |config| {
                config.service = Some(Arc::new(|_: &ServiceContext| Ok::<_, ActionError>(ExecutionResult::success())));
            })
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(controller.execute("show", &request).unwrap().status(), 500);
    }

    #[test]
    fn test_action_content_injects_result() {
        let mut components = ComponentRegistry::new();
        components.register("Row", |props: &JsonValue| Ok(format!("<tr>{}</tr>", props["resource"]["name"].as_str().unwrap_or(""))));
        let result = ExecutionResult::success().with_resource(json!({ "name": "Ada" }));
        let content = ActionContent {
            components: &components,
            templates: None,
            result: &result,
        };
        assert_eq!(content.render_component("Row", &Map::new()).unwrap(), "<tr>Ada</tr>");
        assert!(content.render_partial("users/row", &json!({})).is_err());
    }
}
