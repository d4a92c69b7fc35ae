//! # ModKit
//!
//! Shared kit for module crates: the module contracts the server wires
//! together, RFC 9457 problem responses, problem-aware extractors and the
//! request-id middleware used by the HTTP ingress. Routes are declared with
//! [`api::OperationBuilder`], which feeds the host's [`api::OpenApiRegistry`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use modkit::{DbModule, RestfulModule};
//!
//! let module = HoloMemberModule::new(db.sea());
//! module.migrate(db.seaorm()).await?;
//! let router = module.register_rest(axum::Router::new(), &ingress)?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod api;
pub mod contracts;
pub mod http;

pub use api::problem::{Problem, ProblemResponse, ValidationError};
pub use api::{PositiveId, ProblemCtx, ValidJson};
pub use contracts::{DbModule, RestfulModule};
