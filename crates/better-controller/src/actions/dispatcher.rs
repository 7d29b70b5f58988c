// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Picks and runs the handler for an execution outcome.
//!
//! Success: explicit handler for the format, else the format's default.
//! Failure: explicit handler for `(kind, format)`, then `(any, format)`,
//! else the format's default. A handler that fails falls back to the
//! format's failure default classified as `any`.
//! Frame requests without their own handler use the `html` one.

use serde_json::{Map, Value as JsonValue};

use super::config::{ActionConfiguration, HandlerDescriptor};
use super::executor::Execution;
use super::HandlerContext;
use crate::config::Configuration;
use crate::envelope;
use crate::error::{classify, ActionError, ErrorKind};
use crate::page::{self, merge_locals, ComponentRegistry, RenderRequest};
use crate::request::{ActionRequest, ResponseFormat};
use crate::response::ControllerResponse;
use crate::result::ExecutionResult;
use crate::turbo::{self, ContentResolver, NoContent, TurboStreamBuilder};

pub(crate) struct Dispatcher<'a> {
    pub(crate) controller: &'a str,
    pub(crate) action: &'a ActionConfiguration,
    pub(crate) request: &'a ActionRequest,
    pub(crate) settings: &'a Configuration,
    pub(crate) components: &'a ComponentRegistry,
    pub(crate) content: &'a dyn ContentResolver,
}

impl Dispatcher<'_> {
    pub(crate) fn dispatch(&self, execution: &Execution) -> ControllerResponse {
        if execution.is_successful() {
            self.success(execution)
        } else {
            self.failure(execution)
        }
    }

    fn success(&self, execution: &Execution) -> ControllerResponse {
        let format = self.request.format;
        match self.action.success_handler(format) {
            Some(handler) => {
                tracing::debug!(action = %self.action.name, %format, "running success handler");
                let ctx = self.context(execution, None, 200);
                self.run_handler(handler, &ctx, execution)
                    .unwrap_or_else(|err| self.handler_failed(execution, err))
            }
            None => self.default_success(execution),
        }
    }

    fn failure(&self, execution: &Execution) -> ControllerResponse {
        let format = self.request.format;
        let kind = classify(execution.error.as_ref(), &execution.result);
        match self.action.error_handler(kind, format) {
            Some(handler) => {
                tracing::debug!(action = %self.action.name, %format, %kind, "running error handler");
                let ctx = self.context(execution, Some(kind), kind.status());
                self.run_handler(handler, &ctx, execution)
                    .unwrap_or_else(|err| self.handler_failed(execution, err))
            }
            None => self.default_failure(execution, execution.error.as_ref(), kind),
        }
    }

    fn handler_failed(&self, execution: &Execution, err: ActionError) -> ControllerResponse {
        tracing::error!(
            controller = %self.controller,
            action = %self.action.name,
            "handler failed: {}",
            err
        );
        self.default_failure(execution, Some(&err), ErrorKind::Any)
    }

    fn context<'b>(&'b self, execution: &'b Execution, kind: Option<ErrorKind>, status: u16) -> HandlerContext<'b> {
        HandlerContext {
            action: &self.action.name,
            controller: self.controller,
            request: self.request,
            result: &execution.result,
            page_config: execution.page_config.as_ref(),
            error: execution.error.as_ref(),
            error_kind: kind,
            status,
            settings: self.settings,
            content: self.content,
        }
    }

    fn run_handler(
        &self,
        handler: &HandlerDescriptor,
        ctx: &HandlerContext<'_>,
        execution: &Execution,
    ) -> Result<ControllerResponse, ActionError> {
        match handler {
            HandlerDescriptor::Redirect { path, options } => {
                let location = path.resolve(ctx.result);
                Ok(ControllerResponse::redirect_with(
                    options.status.unwrap_or(302),
                    location,
                    options.flash(),
                ))
            }
            HandlerDescriptor::RenderPage { status } => self.render_page(execution, status.unwrap_or(ctx.status)),
            HandlerDescriptor::RenderComponent {
                component,
                locals,
                status,
            } => {
                let base = self
                    .action
                    .component
                    .as_ref()
                    .filter(|source| &source.name == component)
                    .map(|source| source.locals.clone())
                    .unwrap_or_default();
                let props = merge_locals(ctx.result, &base, locals);
                let body = self.components.render(component, &props)?;
                Ok(ControllerResponse::html(status.unwrap_or(ctx.status), body))
            }
            HandlerDescriptor::Block(block) => block(ctx),
            HandlerDescriptor::TurboStreamList(operations) => {
                let body = operations
                    .iter()
                    .map(|op| turbo::render_operation(op, self.content))
                    .collect::<Result<String, _>>()?;
                Ok(ControllerResponse::turbo_stream(ctx.status, body))
            }
        }
    }

    fn default_success(&self, execution: &Execution) -> ControllerResponse {
        match self.request.format {
            ResponseFormat::Json => envelope::respond_with_success(
                execution.result.without_page_config().into_value(),
                200,
                None,
                &self.settings.api_version,
            ),
            ResponseFormat::Html | ResponseFormat::TurboFrame => self
                .render_page(execution, 200)
                .unwrap_or_else(|err| self.handler_failed(execution, err)),
            ResponseFormat::TurboStream if self.action.has_page_source() || execution.page_config.is_some() => self
                .render_page(execution, 200)
                .unwrap_or_else(|err| self.handler_failed(execution, err)),
            ResponseFormat::TurboStream => ControllerResponse::empty(200),
            ResponseFormat::Csv | ResponseFormat::Xml => ControllerResponse::empty(204),
        }
    }

    /// Never fails: every fallback ends in a response.
    fn default_failure(&self, execution: &Execution, error: Option<&ActionError>, kind: ErrorKind) -> ControllerResponse {
        let status = kind.status();
        let message = failure_message(error, &execution.result, kind);
        let errors = error
            .and_then(ActionError::field_errors)
            .or_else(|| execution.result.errors())
            .cloned();

        match self.request.format {
            ResponseFormat::Json => {
                let mut data = Map::new();
                data.insert("success".to_string(), JsonValue::Bool(false));
                data.insert("error".to_string(), JsonValue::String(message));
                if let Some(errors) = errors {
                    data.insert("errors".to_string(), errors);
                }
                if let (true, Some(err)) = (self.settings.include_backtrace, error) {
                    data.insert("type".to_string(), JsonValue::String(err.type_name().to_string()));
                    data.insert(
                        "backtrace".to_string(),
                        JsonValue::Array(err.backtrace().iter().cloned().map(JsonValue::String).collect()),
                    );
                }
                envelope::respond_with_success(JsonValue::Object(data), status, None, &self.settings.api_version)
            }
            ResponseFormat::Html | ResponseFormat::TurboFrame => {
                self.render_page(execution, status).unwrap_or_else(|err| {
                    tracing::warn!(action = %self.action.name, "failure render fell back to template: {}", err);
                    ControllerResponse::template(
                        status,
                        self.template_name(),
                        ResponseFormat::Html,
                        merge_locals(&execution.result, &Map::new(), &Map::new()),
                    )
                })
            }
            ResponseFormat::TurboStream => {
                let mut builder = TurboStreamBuilder::new().flash(self.settings.flash_target.as_str(), "alert", &message);
                if let Some(errors) = &errors {
                    builder = builder.form_errors(self.settings.form_errors_target.as_str(), errors);
                }
                match builder.render(&NoContent) {
                    Ok(body) => ControllerResponse::turbo_stream(status, body),
                    Err(_) => ControllerResponse::empty(status),
                }
            }
            ResponseFormat::Csv | ResponseFormat::Xml => ControllerResponse::empty(status),
        }
    }

    fn render_page(&self, execution: &Execution, status: u16) -> Result<ControllerResponse, ActionError> {
        let format = self.request.format;
        let request = RenderRequest {
            namespace: &self.settings.page_component_namespace,
            frame_request: format == ResponseFormat::TurboFrame
                || self.request.is_turbo_frame_request(&self.settings.frame_header),
            component: self.action.component.as_ref(),
            page_config: execution.page_config.as_ref(),
            result: &execution.result,
            template: self.template_name(),
            format: match format {
                ResponseFormat::TurboFrame => ResponseFormat::Html,
                other => other,
            },
            status,
        };
        page::render_html_default(self.components, &request)
    }

    fn template_name(&self) -> String {
        format!("{}/{}", self.controller, self.action.name)
    }
}

/// The error message shown to the user.
///
/// The error's own message, then the result's `error` or `message`
/// string, then a generic message for the kind.
fn failure_message(error: Option<&ActionError>, result: &ExecutionResult, kind: ErrorKind) -> String {
    if let Some(err) = error {
        return err.to_string();
    }
    ["error", "message"]
        .iter()
        .find_map(|key| result.get(key).and_then(JsonValue::as_str).filter(|s| !s.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| default_message(kind).to_string())
}

fn default_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "Validation failed",
        ErrorKind::NotFound => "Resource not found",
        ErrorKind::Authorization => "You are not authorized to perform this action",
        ErrorKind::Any => "An error occurred",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionRegistry, Controller};
    use crate::response::{Flash, Layout};
    use crate::result::PageConfig;
    use crate::service::ServiceContext;
    use crate::turbo::StreamContent;
    use serde_json::json;

    fn controller(registry: ActionRegistry) -> Controller {
        Controller::new("users", registry).with_configuration(Configuration::default())
    }

    fn request(format: ResponseFormat) -> ActionRequest {
        ActionRequest::new("POST", "/users").with_format(format)
    }

    fn invalid_user() -> ExecutionResult {
        ExecutionResult::failure().with_errors(json!({ "name": ["can't be blank"] }))
    }

    #[test]
    fn test_failure_message_precedence() {
        let result = ExecutionResult::failure().with("error", json!("Out of stock"));
        assert_eq!(
            failure_message(Some(&ActionError::message("boom")), &result, ErrorKind::Any),
            "boom"
        );
        assert_eq!(failure_message(None, &result, ErrorKind::Any), "Out of stock");
        assert_eq!(
            failure_message(None, &ExecutionResult::failure().with("message", json!("Nope")), ErrorKind::Any),
            "Nope"
        );
        assert_eq!(failure_message(None, &ExecutionResult::failure(), ErrorKind::NotFound), "Resource not found");
    }

    #[test]
    fn test_default_json_failure_envelope() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.service(|_: &ServiceContext| Ok(invalid_user()));
        });
        let response = controller(registry).execute("create", &request(ResponseFormat::Json)).unwrap();
        assert_eq!(response.status(), 422);
        assert_eq!(
            response.json_body().unwrap(),
            &json!({
                "data": {
                    "success": false,
                    "error": "Validation failed",
                    "errors": { "name": ["can't be blank"] }
                },
                "meta": { "version": "v1" }
            })
        );
    }

    #[test]
    fn test_default_json_failure_with_backtrace() {
        let mut registry = ActionRegistry::new();
        registry.define("show", |a| {
            a.service(|_: &ServiceContext| -> Result<ExecutionResult, ActionError> {
                Err(ActionError::raised("ActiveRecord::RecordNotFound", "Couldn't find User")
                    .with_backtrace(vec!["app/services/find_user.rb:3".to_string()]))
            });
        });
        let settings = Configuration {
            include_backtrace: true,
            ..Configuration::default()
        };
        let controller = Controller::new("users", registry).with_configuration(settings);
        let response = controller.execute("show", &request(ResponseFormat::Json)).unwrap();

        assert_eq!(response.status(), 404);
        let data = &response.json_body().unwrap()["data"];
        assert_eq!(data["error"], "Couldn't find User");
        assert_eq!(data["type"], "ActiveRecord::RecordNotFound");
        assert_eq!(data["backtrace"], json!(["app/services/find_user.rb:3"]));
    }

    #[test]
    fn test_default_turbo_stream_failure() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.service(|_: &ServiceContext| Ok(invalid_user()));
        });
        let response = controller(registry)
            .execute("create", &request(ResponseFormat::TurboStream))
            .unwrap();

        match response {
            ControllerResponse::TurboStream { status, body, .. } => {
                assert_eq!(status, 422);
                let flash = body.find("target=\"flash\"").unwrap();
                let errors = body.find("target=\"form_errors\"").unwrap();
                assert!(flash < errors);
                assert!(body.contains("Validation failed"));
                assert!(body.contains("<li>Name can&#39;t be blank</li>"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_default_html_failure_rerenders_template() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.service(|_: &ServiceContext| Ok(invalid_user()));
        });
        let response = controller(registry).execute("create", &request(ResponseFormat::Html)).unwrap();
        match response {
            ControllerResponse::Template { status, template, locals, .. } => {
                assert_eq!(status, 422);
                assert_eq!(template, "users/create");
                assert_eq!(locals["result"]["errors"]["name"][0], "can't be blank");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_csv_and_xml_without_handler() {
        let mut registry = ActionRegistry::new();
        registry.define("index", |_| {});
        registry.define("broken", |a| {
            a.service(|_: &ServiceContext| Ok(ExecutionResult::failure()));
        });
        let controller = controller(registry);
        assert_eq!(
            controller.execute("index", &request(ResponseFormat::Csv)).unwrap(),
            ControllerResponse::empty(204)
        );
        assert_eq!(
            controller.execute("index", &request(ResponseFormat::Xml)).unwrap(),
            ControllerResponse::empty(204)
        );
        assert_eq!(
            controller.execute("broken", &request(ResponseFormat::Csv)).unwrap(),
            ControllerResponse::empty(500)
        );
    }

    #[test]
    fn test_redirect_handler_with_flash() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.service(|_: &ServiceContext| Ok(ExecutionResult::success().with_resource(json!({ "id": 5 }))))
                .on_success(|f| {
                    f.html(HandlerDescriptor::redirect_to("/users/:id").with_notice("User created"));
                });
        });
        let response = controller(registry).execute("create", &request(ResponseFormat::Html)).unwrap();
        assert_eq!(
            response,
            ControllerResponse::redirect_with(302, "/users/5", Flash::notice("User created"))
        );
    }

    #[test]
    fn test_error_handler_gets_kind_and_status() {
        let mut registry = ActionRegistry::new();
        registry.define("show", |a| {
            a.service(|_: &ServiceContext| -> Result<ExecutionResult, ActionError> {
                Err(ActionError::not_found("no such user"))
            })
            .on_any_error(|f| {
                f.json_with(|ctx| {
                    assert_eq!(ctx.error_kind, Some(ErrorKind::NotFound));
                    let message = ctx.error.map(ToString::to_string).unwrap_or_default();
                    Ok(ctx.respond_with_error(&message.as_str().into()))
                });
            });
        });
        let response = controller(registry).execute("show", &request(ResponseFormat::Json)).unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(response.json_body().unwrap()["data"]["error"]["message"], "no such user");
    }

    #[test]
    fn test_failing_handler_falls_back_to_default_failure() {
        let mut registry = ActionRegistry::new();
        registry.define("index", |a| {
            a.on_success(|f| {
                f.json_with(|_| Err(ActionError::message("handler exploded")));
            });
        });
        let response = controller(registry).execute("index", &request(ResponseFormat::Json)).unwrap();
        assert_eq!(response.status(), 500);
        assert_eq!(response.json_body().unwrap()["data"]["error"], "handler exploded");
        assert_eq!(response.json_body().unwrap()["data"]["success"], false);
    }

    #[test]
    fn test_stream_handler_renders_in_order() {
        let mut components = ComponentRegistry::new();
        components.register("UserRow", |props: &JsonValue| {
            Ok(format!("<li>{}</li>", props["resource"]["name"].as_str().unwrap_or("")))
        });
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.service(|_: &ServiceContext| Ok(ExecutionResult::success().with_resource(json!({ "id": 1, "name": "Ada" }))))
                .on_success(|f| {
                    f.streams(
                        TurboStreamBuilder::new()
                            .append("users", StreamContent::component("UserRow"))
                            .update("flash", StreamContent::html("Saved"))
                            .remove("empty_state"),
                    );
                });
        });
        let controller = controller(registry).with_components(components);
        let response = controller.execute("create", &request(ResponseFormat::TurboStream)).unwrap();
        assert_eq!(
            response,
            ControllerResponse::turbo_stream(
                200,
                concat!(
                    "<turbo-stream action=\"append\" target=\"users\"><template><li>Ada</li></template></turbo-stream>",
                    "<turbo-stream action=\"update\" target=\"flash\"><template>Saved</template></turbo-stream>",
                    "<turbo-stream action=\"remove\" target=\"empty_state\"></turbo-stream>",
                )
            )
        );
    }

    #[test]
    fn test_render_component_handler_merges_locals() {
        let mut components = ComponentRegistry::new();
        components.register("UserCard", |props: &JsonValue| {
            Ok(format!("{}:{}", props["title"].as_str().unwrap_or(""), props["resource"]["id"]))
        });
        let mut registry = ActionRegistry::new();
        registry.define("show", |a| {
            a.service(|_: &ServiceContext| Ok(ExecutionResult::success().with_resource(json!({ "id": 4 }))))
                .on_success(|f| {
                    f.html(
                        HandlerDescriptor::render_component("UserCard")
                            .with_local("title", json!("Profile"))
                            .with_status(201),
                    );
                });
        });
        let response = controller(registry)
            .with_components(components)
            .execute("show", &request(ResponseFormat::Html))
            .unwrap();
        assert_eq!(response, ControllerResponse::html(201, "Profile:4"));
    }

    #[test]
    fn test_explicit_turbo_frame_handler_wins() {
        let mut components = ComponentRegistry::new();
        components.register("Users::Frame", |_: &JsonValue| Ok("frame".to_string()));
        let mut registry = ActionRegistry::new();
        registry.define("edit", |a| {
            a.page(|_: &crate::page::PageContext<'_>| Ok(PageConfig::new().with("klass", json!("Users::Frame"))))
                .on_success(|f| {
                    f.turbo_frame_with(|_| Ok(ControllerResponse::html(200, "explicit")));
                });
        });
        let controller = controller(registry).with_components(components);
        let response = controller.execute("edit", &request(ResponseFormat::TurboFrame)).unwrap();
        assert_eq!(response, ControllerResponse::html(200, "explicit"));
    }

    #[test]
    fn test_frame_klass_component_without_layout() {
        let mut components = ComponentRegistry::new();
        components.register("Users::Frame", |_: &JsonValue| Ok("frame".to_string()));
        let mut registry = ActionRegistry::new();
        registry.define("edit", |a| {
            a.page(|_: &crate::page::PageContext<'_>| Ok(PageConfig::new().with("klass", json!("Users::Frame"))));
        });
        let controller = controller(registry).with_components(components);

        let framed = controller.execute("edit", &request(ResponseFormat::TurboFrame)).unwrap();
        assert_eq!(framed, ControllerResponse::html(200, "frame").with_layout(Layout::Disabled));

        let plain = controller.execute("edit", &request(ResponseFormat::Html)).unwrap();
        assert!(matches!(plain, ControllerResponse::Template { layout: Layout::Default, .. }));
    }

    #[test]
    fn test_frame_request_uses_html_success_handler() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.service(|_: &ServiceContext| Ok(ExecutionResult::success().with_resource(json!({ "id": 7 }))))
                .on_success(|f| {
                    f.html(HandlerDescriptor::redirect_to("/users/:id"));
                });
        });
        let request = ActionRequest::new("POST", "/users").with_format(ResponseFormat::negotiate(None, Some("text/html"), true));
        let response = controller(registry).execute("create", &request).unwrap();
        assert!(matches!(response, ControllerResponse::Redirect { .. }));
        assert_eq!(response.status(), 302);
    }

    #[test]
    fn test_frame_request_uses_html_error_handler() {
        let mut registry = ActionRegistry::new();
        registry.define("create", |a| {
            a.service(|_: &ServiceContext| Ok(invalid_user()))
                .on_any_error(|f| {
                    f.html(HandlerDescriptor::redirect_to("/users/new").with_alert("Try again"));
                });
        });
        let response = controller(registry)
            .execute("create", &request(ResponseFormat::TurboFrame))
            .unwrap();
        assert!(matches!(response, ControllerResponse::Redirect { .. }));
    }

    #[test]
    fn test_turbo_stream_renders_result_page_config() {
        let mut components = ComponentRegistry::new();
        components.register("Pages::Index::PageComponent", |props: &JsonValue| {
            Ok(format!("<main>{}</main>", props["title"].as_str().unwrap_or("")))
        });
        let mut registry = ActionRegistry::new();
        registry.define("index", |a| {
            a.service(|_: &ServiceContext| {
                Ok(ExecutionResult::success().with_page_config(json!({ "type": "index", "title": "Users" })))
            });
        });
        let response = controller(registry)
            .with_components(components)
            .execute("index", &request(ResponseFormat::TurboStream))
            .unwrap();
        assert_eq!(response, ControllerResponse::html(200, "<main>Users</main>"));
    }
}
