// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! A small articles controller served by `better-controller serve`.
//!
//! Articles live in memory. Every format is available on every route:
//! use `?format=json`, `?format=csv`, an `Accept` header, or a `.json`
//! suffix on member routes.

use std::sync::{Arc, Mutex};

use better_controller::actions::HandlerDescriptor;
use better_controller::csv_export::CsvOptions;
use better_controller::pagination::{page_params, paginate};
use better_controller::turbo::escape_html;
use better_controller::{
    config, ActionError, ActionRegistry, ActionRequest, ComponentRegistry, Controller, ErrorKind, ExecutionResult,
    PageConfig, PageContext, ServiceContext, StreamContent, StreamTarget, TurboStreamBuilder,
};
use chrono::Utc;
use serde_json::{json, Value as JsonValue};

use crate::server::ActionRoutes;

/// Header carrying the signed-in user id.
pub const USER_HEADER: &str = "x-user-id";

#[derive(Debug, Default)]
struct Articles {
    items: Vec<JsonValue>,
    next_id: u64,
}

impl Articles {
    fn insert(&mut self, title: &str, body: &str) -> JsonValue {
        self.next_id += 1;
        let article = json!({
            "id": self.next_id,
            "title": title,
            "body": body,
            "created_at": Utc::now().to_rfc3339(),
        });
        self.items.push(article.clone());
        article
    }
}

/// In-memory article storage shared by the demo actions.
#[derive(Debug, Clone, Default)]
pub struct ArticleStore {
    inner: Arc<Mutex<Articles>>,
}

impl ArticleStore {
    /// Creates a store with a couple of articles.
    pub fn seeded() -> Self {
        let mut articles = Articles::default();
        articles.insert("Hello, world", "The first article.");
        articles.insert("Streams", "Turbo Streams update parts of a page.");
        Self {
            inner: Arc::new(Mutex::new(articles)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Articles>, ActionError> {
        self.inner
            .lock()
            .map_err(|_| ActionError::message("article store is unavailable"))
    }

    /// All articles, oldest first.
    pub fn all(&self) -> Result<Vec<JsonValue>, ActionError> {
        Ok(self.lock()?.items.clone())
    }

    /// Finds an article by id.
    pub fn find(&self, id: u64) -> Result<JsonValue, ActionError> {
        self.lock()?
            .items
            .iter()
            .find(|a| a["id"] == id)
            .cloned()
            .ok_or_else(|| ActionError::not_found(format!("Couldn't find Article with 'id'={}", id)))
    }

    /// Stores a new article.
    pub fn create(&self, title: &str, body: &str) -> Result<JsonValue, ActionError> {
        Ok(self.lock()?.insert(title, body))
    }

    /// Removes an article, returning it.
    pub fn delete(&self, id: u64) -> Result<JsonValue, ActionError> {
        let mut articles = self.lock()?;
        let index = articles
            .items
            .iter()
            .position(|a| a["id"] == id)
            .ok_or_else(|| ActionError::not_found(format!("Couldn't find Article with 'id'={}", id)))?;
        Ok(articles.items.remove(index))
    }
}

fn id_param(ctx: &ServiceContext) -> Result<u64, ActionError> {
    ctx.params
        .get("id")
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| ActionError::not_found("Article not found"))
}

/// Declares the articles actions.
pub fn article_actions(store: &ArticleStore) -> ActionRegistry {
    let mut registry = ActionRegistry::new();

    let index_store = store.clone();
    registry.define("index", move |a| {
        a.skip_authentication()
            .service(move |ctx: &ServiceContext| -> Result<ExecutionResult, ActionError> {
                let articles = index_store.all()?;
                let (page, per_page) = page_params(&ctx.params);
                let (slice, pagination) = paginate(&articles, page, per_page, &config::current());
                Ok(ExecutionResult::success()
                    .with_collection(JsonValue::Array(slice.to_vec()))
                    .with_meta(pagination.meta()))
            })
            .page(|ctx: &PageContext<'_>| -> Result<PageConfig, ActionError> {
                Ok(PageConfig::new()
                    .with("type", json!("article_list"))
                    .with("title", json!("Articles"))
                    .with("articles", ctx.result.collection().cloned().unwrap_or_else(|| json!([]))))
            })
            .on_success(|f| {
                f.json_with(|ctx| {
                    let data = ctx.result.collection().cloned().unwrap_or_else(|| json!([]));
                    Ok(ctx.respond_with_success(data, ctx.result.meta()))
                })
                .csv_with(|ctx| {
                    let collection = ctx
                        .result
                        .collection()
                        .and_then(JsonValue::as_array)
                        .cloned()
                        .unwrap_or_default();
                    ctx.send_csv(
                        &collection,
                        &CsvOptions::new("articles.csv")
                            .with_columns(["id", "title", "created_at"])
                            .with_headers(["ID", "Title", "Created"]),
                    )
                });
            });
    });

    let show_store = store.clone();
    registry.define("show", move |a| {
        a.skip_authentication()
            .component("ArticleCard")
            .service(move |ctx: &ServiceContext| -> Result<ExecutionResult, ActionError> {
                let article = show_store.find(id_param(ctx)?)?;
                Ok(ExecutionResult::success().with_resource(article))
            })
            .on_error(ErrorKind::NotFound, |f| {
                f.html(HandlerDescriptor::redirect_to("/articles").with_alert("Article not found"));
            });
    });

    let create_store = store.clone();
    registry.define("create", move |a| {
        a.skip_authentication()
            .params_key("article")
            .permit(["title", "body"])
            .service(move |ctx: &ServiceContext| -> Result<ExecutionResult, ActionError> {
                let title = ctx.params["title"].as_str().unwrap_or_default().trim();
                let body = ctx.params["body"].as_str().unwrap_or_default();
                if title.is_empty() {
                    return Ok(ExecutionResult::failure()
                        .with("resource", ctx.params.clone())
                        .with_errors(json!({ "title": ["can't be blank"] })));
                }
                let article = create_store.create(title, body)?;
                Ok(ExecutionResult::success().with_resource(article))
            })
            .on_success(|f| {
                f.html(HandlerDescriptor::redirect_to("/articles/:id").with_notice("Article created"))
                    .streams(
                        TurboStreamBuilder::new()
                            .prepend("articles", StreamContent::component("ArticleRow"))
                            .flash("flash", "notice", "Article created"),
                    );
            })
            .on_error(ErrorKind::Validation, |f| {
                f.html(HandlerDescriptor::render_component("ArticleForm").with_status(422));
            });
    });

    let destroy_store = store.clone();
    registry.define("destroy", move |a| {
        a.service(move |ctx: &ServiceContext| -> Result<ExecutionResult, ActionError> {
            let article = destroy_store.delete(id_param(ctx)?)?;
            tracing::info!(id = %article["id"], "article deleted");
            Ok(ExecutionResult::success().with_resource(article))
        })
        .on_success(|f| {
            f.html(HandlerDescriptor::redirect_to("/articles").with_notice("Article deleted"))
                .turbo_stream_with(|ctx| {
                    let id = ctx.resource()["id"].clone();
                    ctx.render_stream(
                        &TurboStreamBuilder::new()
                            .remove(StreamTarget::record("article", id))
                            .flash("flash", "notice", "Article deleted"),
                    )
                });
        })
        .on_error(ErrorKind::NotFound, |f| {
            f.html(HandlerDescriptor::redirect_to("/articles").with_alert("Article not found"));
        });
    });

    registry
}

/// Components rendered by the articles actions.
pub fn article_components() -> ComponentRegistry {
    let mut components = ComponentRegistry::new();
    components
        .register("Pages::ArticleList::PageComponent", |props: &JsonValue| {
            let rows: String = props["articles"]
                .as_array()
                .map(|items| items.iter().map(article_row).collect())
                .unwrap_or_default();
            Ok(format!(
                "<h1>{}</h1>\n<ul id=\"articles\">{}</ul>",
                escape_html(props["title"].as_str().unwrap_or("Articles")),
                rows
            ))
        })
        .register("ArticleRow", |props: &JsonValue| Ok(article_row(&props["resource"])))
        .register("ArticleCard", |props: &JsonValue| {
            let article = &props["resource"];
            Ok(format!(
                "<article id=\"article_{}\"><h1>{}</h1><p>{}</p></article>",
                article["id"],
                escape_html(article["title"].as_str().unwrap_or_default()),
                escape_html(article["body"].as_str().unwrap_or_default())
            ))
        })
        .register("ArticleForm", |props: &JsonValue| {
            let errors: String = better_controller::turbo::error_messages(&props["result"]["errors"])
                .iter()
                .map(|m| format!("<li>{}</li>", escape_html(m)))
                .collect();
            Ok(format!(
                "<form action=\"/articles\" method=\"post\"><ul class=\"errors\">{}</ul>\
                 <input name=\"article[title]\" value=\"{}\"><textarea name=\"article[body]\">{}</textarea></form>",
                errors,
                escape_html(props["resource"]["title"].as_str().unwrap_or_default()),
                escape_html(props["resource"]["body"].as_str().unwrap_or_default())
            ))
        });
    components
}

fn article_row(article: &JsonValue) -> String {
    format!(
        "<li id=\"article_{}\"><a href=\"/articles/{}\">{}</a></li>",
        article["id"],
        article["id"],
        escape_html(article["title"].as_str().unwrap_or_default())
    )
}

fn require_user(request: &ActionRequest) -> Result<(), ActionError> {
    match request.current_user {
        Some(_) => Ok(()),
        None => Err(ActionError::unauthorized("You need to sign in first")),
    }
}

/// The articles controller over `store`.
pub fn article_controller(store: &ArticleStore) -> Controller {
    Controller::new("articles", article_actions(store))
        .with_components(article_components())
        .with_authentication(require_user)
}

/// Routes for the articles controller.
pub fn article_routes(store: &ArticleStore) -> ActionRoutes {
    ActionRoutes::new(article_controller(store))
        .get("/articles", "index")
        .post("/articles", "create")
        .get("/articles/:id", "show")
        .delete("/articles/:id", "destroy")
        .with_current_user(|request| {
            request
                .header(USER_HEADER)
                .filter(|id| !id.is_empty())
                .map(|id| json!({ "id": id }))
        })
}

/// The demo router with seeded articles.
pub fn router() -> axum::Router {
    article_routes(&ArticleStore::seeded()).into_router()
}
