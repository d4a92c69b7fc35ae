//! HTTP host for the server: owns the listener, the shared middleware stack
//! and the documentation endpoints. Modules register their operations through
//! [`OpenApiRegistry`]; this crate collects them and serves the result.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use dashmap::{mapref::entry::Entry, DashMap};
use modkit::api::{BodySchema, OpenApiRegistry, OperationSpec, SchemaCollection};
use modkit::http::request_id::{create_trace_layer, header, push_req_id_to_extensions, MakeReqId};
use modkit::RestfulModule;
use serde_json::{json, Map, Value};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::{util::option_layer, ServiceBuilder};
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
};
use utoipa::openapi::{schema::Schema, RefOr};
use utoipa::OpenApi;

mod config;
mod web;

pub use config::ApiIngressConfig;

#[derive(OpenApi)]
#[openapi(
    info(title = "holo_member API", description = "CRUD service for holo members"),
    paths(web::health_check),
    components(schemas(modkit::Problem, modkit::ValidationError))
)]
struct IngressApiDoc;

/// Collects module routes, operation specs and component schemas, then
/// serves them behind one middleware stack.
pub struct ApiIngress {
    config: ApiIngressConfig,
    routes: Router,
    /// "METHOD path" -> spec
    operation_specs: DashMap<String, OperationSpec>,
    schemas: DashMap<String, RefOr<Schema>>,
}

impl ApiIngress {
    pub fn new(config: ApiIngressConfig) -> Self {
        Self {
            config,
            routes: Router::new(),
            operation_specs: DashMap::new(),
            schemas: DashMap::new(),
        }
    }

    pub fn config(&self) -> &ApiIngressConfig {
        &self.config
    }

    /// Mount a module's routes; its operations land in this registry.
    pub fn register(&mut self, module: &dyn RestfulModule) -> Result<()> {
        let routes = std::mem::take(&mut self.routes);
        let routes = module.register_rest(routes, &*self)?;
        self.routes = routes;
        Ok(())
    }

    fn make_schema(&self, schema: &BodySchema) -> Value {
        let component = |name: &str| {
            if self.schemas.contains_key(name) {
                json!({ "$ref": format!("#/components/schemas/{name}") })
            } else {
                json!({ "type": "object" })
            }
        };
        match schema {
            BodySchema::Component(name) => component(name),
            BodySchema::ListOf(name) => json!({ "type": "array", "items": component(name) }),
            BodySchema::Scalar(json_type) => json!({ "type": json_type }),
        }
    }

    fn make_content(&self, content_type: &str, schema: Option<&BodySchema>) -> Value {
        let schema = schema.map_or_else(|| json!({}), |s| self.make_schema(s));
        let mut content = Map::new();
        content.insert(content_type.to_string(), json!({ "schema": schema }));
        Value::Object(content)
    }

    fn make_operation(&self, spec: &OperationSpec) -> Value {
        let mut operation = Map::new();
        let op_id = spec
            .operation_id
            .clone()
            .unwrap_or_else(|| spec.handler_id.clone());
        operation.insert("operationId".into(), Value::String(op_id));
        if let Some(summary) = &spec.summary {
            operation.insert("summary".into(), Value::String(summary.clone()));
        }
        if let Some(description) = &spec.description {
            operation.insert("description".into(), Value::String(description.clone()));
        }
        if !spec.tags.is_empty() {
            operation.insert("tags".into(), json!(spec.tags));
        }

        if !spec.params.is_empty() {
            let params: Vec<Value> = spec
                .params
                .iter()
                .map(|p| {
                    json!({
                        "name": p.name,
                        "in": "path",
                        "required": true,
                        "description": p.description,
                        "schema": { "type": p.param_type },
                    })
                })
                .collect();
            operation.insert("parameters".into(), Value::Array(params));
        }

        if let Some(req) = &spec.request_body {
            let mut body = Map::new();
            if let Some(desc) = &req.description {
                body.insert("description".into(), Value::String(desc.clone()));
            }
            body.insert("required".into(), Value::Bool(req.required));
            body.insert(
                "content".into(),
                self.make_content(req.content_type, Some(&req.schema)),
            );
            operation.insert("requestBody".into(), Value::Object(body));
        }

        let mut responses = Map::new();
        for resp in &spec.responses {
            responses.insert(
                resp.status.to_string(),
                json!({
                    "description": resp.description,
                    "content": self.make_content(resp.content_type, resp.schema.as_ref()),
                }),
            );
        }
        operation.insert("responses".into(), Value::Object(responses));

        Value::Object(operation)
    }

    /// The OpenAPI document as it will be served: system endpoints plus every
    /// registered operation and component schema.
    pub fn openapi(&self) -> Result<Value> {
        let mut doc =
            serde_json::to_value(IngressApiDoc::openapi()).context("failed to serialize OpenAPI")?;

        tracing::debug!(
            operations = self.operation_specs.len(),
            schemas = self.schemas.len(),
            "Building OpenAPI document"
        );

        for entry in self.operation_specs.iter() {
            let spec = entry.value();
            let method = spec.method.as_str().to_lowercase();
            doc["paths"][spec.path.as_str()][method.as_str()] = self.make_operation(spec);
        }
        for entry in self.schemas.iter() {
            doc["components"]["schemas"][entry.key().as_str()] =
                serde_json::to_value(entry.value()).context("failed to serialize schema")?;
        }
        Ok(doc)
    }

    /// Final router: system endpoints plus module routes, wrapped in the
    /// middleware stack.
    pub fn build_router(&self) -> Result<Router> {
        let mut router = self
            .routes
            .clone()
            .route("/health", get(web::health_check));

        if self.config.enable_docs {
            let doc = self.openapi()?;
            router = router
                .route(
                    "/openapi.json",
                    get(move || {
                        let doc = doc.clone();
                        async move { Json(doc) }
                    }),
                )
                .route("/docs", get(web::serve_docs));
        }

        let x_request_id = header();
        let cors = self.config.cors_enabled.then(CorsLayer::permissive);

        // Outermost first: the id must exist before it is propagated, pushed
        // into extensions or put on the trace span.
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeReqId))
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(from_fn(push_req_id_to_extensions))
            .layer(create_trace_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(
                self.config.request_timeout_sec,
            )))
            .layer(option_layer(cors))
            // limit::ResponseBody is not `Default`, which Cors and Timeout need
            .map_response(IntoResponse::into_response)
            .layer(RequestBodyLimitLayer::new(self.config.body_limit_bytes))
            .layer(DefaultBodyLimit::disable());

        Ok(router.layer(middleware))
    }
}

impl OpenApiRegistry for ApiIngress {
    fn register_operation(&self, spec: &OperationSpec) {
        let key = format!("{} {}", spec.method.as_str(), spec.path);
        match self.operation_specs.entry(key) {
            Entry::Occupied(_) => {
                // first registration wins; a second one is a wiring bug
                tracing::error!(
                    method = %spec.method.as_str(),
                    path = %spec.path,
                    "Duplicate (method, path) detected; ignoring subsequent registration"
                );
            }
            Entry::Vacant(slot) => {
                tracing::debug!(
                    handler_id = %spec.handler_id,
                    method = %spec.method.as_str(),
                    path = %spec.path,
                    "Registered API operation"
                );
                slot.insert(spec.clone());
            }
        }
    }

    fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String {
        for (key, schema) in schemas {
            self.schemas.entry(key).or_insert(schema);
        }
        name.to_string()
    }
}

/// Bind the listener; use port 0 to let the OS choose.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server bound");
    Ok(listener)
}

/// Serve until `cancel` fires, then finish in-flight requests and return.
pub async fn serve(listener: TcpListener, router: Router, cancel: CancellationToken) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .context("HTTP server failed")?;
    tracing::info!("HTTP server stopped");
    Ok(())
}
