//! Type-safe operation builder: one chain per route that mounts the handler
//! and describes the operation for OpenAPI.
//!
//! The type-state parameters make sure `register()` is only callable once a
//! handler and at least one response are set. Descriptive methods stay
//! available at any stage.

use std::marker::PhantomData;

use axum::{handler::Handler, http::Method, routing::MethodRouter, Router};

use crate::api::problem;

/// Component schemas collected for a type and its dependencies.
pub type SchemaCollection = Vec<(
    String,
    utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
)>;

/// Type-state markers
pub mod state {
    #[derive(Debug, Clone, Copy)]
    pub struct Missing;

    #[derive(Debug, Clone, Copy)]
    pub struct Present;
}

pub use state::{Missing, Present};

mod sealed {
    pub trait Sealed {}
}

/// Maps the handler state to the router slot: nothing while `Missing`,
/// a `MethodRouter<S>` once `Present`.
pub trait HandlerSlot<S>: sealed::Sealed {
    type Slot;
}

impl sealed::Sealed for Missing {}
impl sealed::Sealed for Present {}

impl<S> HandlerSlot<S> for Missing {
    type Slot = ();
}
impl<S> HandlerSlot<S> for Present {
    type Slot = MethodRouter<S>;
}

/// Path parameter of an operation.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub name: String,
    pub description: Option<String>,
    /// JSON Schema type (string, integer, ...)
    pub param_type: String,
}

/// What a request or response body holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BodySchema {
    /// A registered component schema, referenced by name.
    Component(String),
    /// A JSON array whose items are a registered component.
    ListOf(String),
    /// A bare JSON value of the given type, e.g. `integer`.
    Scalar(&'static str),
}

#[derive(Clone, Debug)]
pub struct RequestBodySpec {
    pub content_type: &'static str,
    pub description: Option<String>,
    pub schema: BodySchema,
    pub required: bool,
}

#[derive(Clone, Debug)]
pub struct ResponseSpec {
    pub status: u16,
    pub content_type: &'static str,
    pub description: String,
    pub schema: Option<BodySchema>,
}

/// Everything the OpenAPI generator needs to know about one route.
#[derive(Clone, Debug)]
pub struct OperationSpec {
    pub method: Method,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub params: Vec<ParamSpec>,
    pub request_body: Option<RequestBodySpec>,
    pub responses: Vec<ResponseSpec>,
    /// Derived from method and path; stands in when `operation_id` is unset.
    pub handler_id: String,
}

/// Sink for operations and component schemas; implemented by the HTTP host.
pub trait OpenApiRegistry {
    fn register_operation(&self, spec: &OperationSpec);

    /// Register `schemas` under components and return the canonical name
    /// for `$ref`. Type-erased so the trait stays dyn compatible.
    fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String;
}

/// Register `T` (and every schema it references) and return its component name.
pub fn ensure_schema<T: utoipa::ToSchema + 'static>(registry: &dyn OpenApiRegistry) -> String {
    use utoipa::PartialSchema;

    let root_name = T::name().to_string();
    // T's own schema goes first so the component is the object itself, not a ref
    let mut collected: SchemaCollection = vec![(root_name.clone(), <T as PartialSchema>::schema())];
    T::schemas(&mut collected);
    registry.ensure_schema_raw(&root_name, collected)
}

/// Type-safe operation builder.
///
/// - `H`: handler state (`Missing` | `Present`)
/// - `R`: response state (`Missing` | `Present`)
/// - `S`: router state type
pub struct OperationBuilder<H, R, S>
where
    H: HandlerSlot<S>,
{
    spec: OperationSpec,
    aliases: Vec<String>,
    method_router: <H as HandlerSlot<S>>::Slot,
    _has_handler: PhantomData<H>,
    _has_response: PhantomData<R>,
    _state: PhantomData<fn() -> S>,
}

impl<S> OperationBuilder<Missing, Missing, S> {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        let path = path.into();
        let handler_id = format!(
            "{}:{}",
            method.as_str().to_lowercase(),
            path.replace(['/', '{', '}'], "_")
        );

        Self {
            spec: OperationSpec {
                method,
                path,
                operation_id: None,
                summary: None,
                description: None,
                tags: Vec::new(),
                params: Vec::new(),
                request_body: None,
                responses: Vec::new(),
                handler_id,
            },
            aliases: Vec::new(),
            method_router: (),
            _has_handler: PhantomData,
            _has_response: PhantomData,
            _state: PhantomData,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }
}

impl<H, R, S> OperationBuilder<H, R, S>
where
    H: HandlerSlot<S>,
{
    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    pub fn operation_id(mut self, id: impl Into<String>) -> Self {
        self.spec.operation_id = Some(id.into());
        self
    }

    pub fn summary(mut self, text: impl Into<String>) -> Self {
        self.spec.summary = Some(text.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.spec.description = Some(text.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.spec.tags.push(tag.into());
        self
    }

    /// Add a path parameter with an explicit JSON Schema type.
    pub fn path_param_typed(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        param_type: impl Into<String>,
    ) -> Self {
        self.spec.params.push(ParamSpec {
            name: name.into(),
            description: Some(description.into()),
            param_type: param_type.into(),
        });
        self
    }

    /// Also serve the handler at `path`. Aliases are routed but not documented.
    pub fn alias(mut self, path: impl Into<String>) -> Self {
        self.aliases.push(path.into());
        self
    }

    /// Attach a required JSON request body and register its schema.
    pub fn json_request<T>(mut self, registry: &dyn OpenApiRegistry, desc: impl Into<String>) -> Self
    where
        T: utoipa::ToSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.spec.request_body = Some(RequestBodySpec {
            content_type: "application/json",
            description: Some(desc.into()),
            schema: BodySchema::Component(name),
            required: true,
        });
        self
    }

    fn push_response(mut self, resp: ResponseSpec) -> OperationBuilder<H, Present, S> {
        self.spec.responses.push(resp);
        OperationBuilder {
            spec: self.spec,
            aliases: self.aliases,
            method_router: self.method_router,
            _has_handler: self._has_handler,
            _has_response: PhantomData::<Present>,
            _state: self._state,
        }
    }

    /// JSON response whose body is the registered schema of `T`.
    pub fn json_response_with_schema<T>(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S>
    where
        T: utoipa::ToSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.push_response(ResponseSpec {
            status,
            content_type: "application/json",
            description: description.into(),
            schema: Some(BodySchema::Component(name)),
        })
    }

    /// JSON response whose body is an array of `T`.
    pub fn json_list_response<T>(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S>
    where
        T: utoipa::ToSchema + 'static,
    {
        let name = ensure_schema::<T>(registry);
        self.push_response(ResponseSpec {
            status,
            content_type: "application/json",
            description: description.into(),
            schema: Some(BodySchema::ListOf(name)),
        })
    }

    /// JSON response carrying a single scalar of `json_type`.
    pub fn json_scalar_response(
        self,
        status: u16,
        json_type: &'static str,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S> {
        self.push_response(ResponseSpec {
            status,
            content_type: "application/json",
            description: description.into(),
            schema: Some(BodySchema::Scalar(json_type)),
        })
    }

    /// RFC 9457 `application/problem+json` response.
    pub fn problem_response(
        self,
        registry: &dyn OpenApiRegistry,
        status: u16,
        description: impl Into<String>,
    ) -> OperationBuilder<H, Present, S> {
        let name = ensure_schema::<problem::Problem>(registry);
        self.push_response(ResponseSpec {
            status,
            content_type: problem::APPLICATION_PROBLEM_JSON,
            description: description.into(),
            schema: Some(BodySchema::Component(name)),
        })
    }
}

impl<R, S> OperationBuilder<Missing, R, S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn handler<F, T>(self, h: F) -> OperationBuilder<Present, R, S>
    where
        F: Handler<T, S> + Clone + Send + 'static,
        T: 'static,
    {
        let method_router = match self.spec.method {
            Method::GET => axum::routing::get(h),
            Method::POST => axum::routing::post(h),
            Method::PUT => axum::routing::put(h),
            Method::DELETE => axum::routing::delete(h),
            _ => axum::routing::any(|| async { axum::http::StatusCode::METHOD_NOT_ALLOWED }),
        };

        OperationBuilder {
            spec: self.spec,
            aliases: self.aliases,
            method_router,
            _has_handler: PhantomData::<Present>,
            _has_response: self._has_response,
            _state: self._state,
        }
    }
}

impl<S> OperationBuilder<Present, Present, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Hand the spec to the registry and mount the handler at its path and aliases.
    pub fn register(self, router: Router<S>, openapi: &dyn OpenApiRegistry) -> Router<S> {
        openapi.register_operation(&self.spec);

        let mut router = router.route(&self.spec.path, self.method_router.clone());
        for alias in &self.aliases {
            router = router.route(alias, self.method_router.clone());
        }
        router
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, Json};
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct MockRegistry {
        operations: Mutex<Vec<OperationSpec>>,
        schemas: Mutex<Vec<String>>,
    }

    impl MockRegistry {
        fn new() -> Self {
            Self {
                operations: Mutex::new(Vec::new()),
                schemas: Mutex::new(Vec::new()),
            }
        }
    }

    impl OpenApiRegistry for MockRegistry {
        fn register_operation(&self, spec: &OperationSpec) {
            self.operations.lock().unwrap().push(spec.clone());
        }

        fn ensure_schema_raw(&self, name: &str, schemas: SchemaCollection) -> String {
            let mut seen = self.schemas.lock().unwrap();
            seen.extend(schemas.into_iter().map(|(n, _)| n));
            name.to_string()
        }
    }

    #[derive(serde::Serialize, utoipa::ToSchema)]
    struct Widget {
        id: i32,
    }

    async fn list_widgets() -> Json<Vec<i32>> {
        Json(vec![1])
    }

    #[test]
    fn descriptive_methods_fill_the_spec() {
        let builder = OperationBuilder::<Missing, Missing, ()>::get("/widgets/{id}")
            .operation_id("widgets.get")
            .summary("Get widget")
            .description("Fetch one widget")
            .tag("widgets")
            .path_param_typed("id", "Widget id", "integer");

        let spec = builder.spec();
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.path, "/widgets/{id}");
        assert_eq!(spec.operation_id.as_deref(), Some("widgets.get"));
        assert_eq!(spec.summary.as_deref(), Some("Get widget"));
        assert_eq!(spec.tags, vec!["widgets"]);
        assert_eq!(spec.params[0].param_type, "integer");
        assert_eq!(spec.handler_id, "get:_widgets__id_");
    }

    #[test]
    fn responses_record_their_body_shape() {
        let registry = MockRegistry::new();
        let builder = OperationBuilder::<Missing, Missing, ()>::delete("/widgets/{id}")
            .handler(list_widgets)
            .json_scalar_response(200, "integer", "Deleted id")
            .json_list_response::<Widget>(&registry, 207, "Leftovers")
            .problem_response(&registry, 404, "Not Found");

        let responses = &builder.spec().responses;
        assert_eq!(responses[0].schema, Some(BodySchema::Scalar("integer")));
        assert_eq!(
            responses[1].schema,
            Some(BodySchema::ListOf("Widget".to_string()))
        );
        assert_eq!(responses[2].content_type, problem::APPLICATION_PROBLEM_JSON);
        assert_eq!(
            responses[2].schema,
            Some(BodySchema::Component("Problem".to_string()))
        );

        let schemas = registry.schemas.lock().unwrap();
        assert!(schemas.contains(&"Widget".to_string()));
        assert!(schemas.contains(&"Problem".to_string()));
    }

    #[tokio::test]
    async fn register_mounts_path_and_aliases() {
        let registry = MockRegistry::new();
        let router = OperationBuilder::<Missing, Missing, ()>::post("/widgets/")
            .alias("/widgets")
            .json_request::<Widget>(&registry, "New widget")
            .handler(list_widgets)
            .json_response_with_schema::<Widget>(&registry, 201, "Created")
            .register(Router::new(), &registry);

        let ops = registry.operations.lock().unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].path, "/widgets/");
        let body = ops[0].request_body.as_ref().unwrap();
        assert!(body.required);
        assert_eq!(body.schema, BodySchema::Component("Widget".to_string()));

        for uri in ["/widgets/", "/widgets"] {
            let resp = router
                .clone()
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri(uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(resp.status(), axum::http::StatusCode::OK, "{uri}");
        }
    }
}
