//! HTTP-facing building blocks shared by REST modules: problem documents,
//! problem-mapped extractors, response shorthands and the operation builder.

pub mod extract;
pub mod operation_builder;
pub mod problem;
pub mod response;

pub use extract::{extract_trace_id, PositiveId, ProblemCtx, ValidJson};
pub use operation_builder::{
    BodySchema, Missing, OpenApiRegistry, OperationBuilder, OperationSpec, SchemaCollection,
};
pub use problem::{Problem, ProblemResponse, ValidationError};
