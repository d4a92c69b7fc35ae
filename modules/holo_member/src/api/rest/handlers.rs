use std::sync::Arc;

use axum::{response::IntoResponse, Extension, Json};
use modkit::api::response::{created_json, ok_json};
use modkit::{PositiveId, ProblemCtx, ProblemResponse, ValidJson};
use tracing::{error, info};

use crate::api::rest::dto::{CreateHoloMemberBody, HoloMemberDto, UpdateHoloMemberBody};
use crate::api::rest::error::{map_domain_error, not_found};
use crate::domain::service::Service;

/// List every holo member
pub async fn list_holo_members(
    ctx: ProblemCtx,
    Extension(svc): Extension<Arc<Service>>,
) -> Result<impl IntoResponse, ProblemResponse> {
    info!("Listing holo members");

    match svc.list().await {
        Ok(members) => Ok(ok_json(
            members.into_iter().map(HoloMemberDto::from).collect::<Vec<_>>(),
        )),
        Err(e) => {
            error!("Failed to list holo members: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Create a holo member
pub async fn create_holo_member(
    ctx: ProblemCtx,
    Extension(svc): Extension<Arc<Service>>,
    ValidJson(body): ValidJson<CreateHoloMemberBody>,
) -> Result<impl IntoResponse, ProblemResponse> {
    info!("Creating holo member: {:?}", body.new_holo_member);

    let new = body
        .new_holo_member
        .into_new()
        .map_err(|errors| ctx.validation("Invalid new_holo_member payload", errors))?;

    match svc.create(new).await {
        Ok(member) => Ok(created_json(HoloMemberDto::from(member))),
        Err(e) => {
            error!("Failed to create holo member: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Get a holo member by id
pub async fn get_holo_member(
    ctx: ProblemCtx,
    Extension(svc): Extension<Arc<Service>>,
    path_id: PositiveId,
) -> Result<impl IntoResponse, ProblemResponse> {
    info!("Getting holo member with id: {}", path_id.0);
    let Some(id) = path_id.as_i32() else {
        return Err(not_found(&ctx));
    };

    match svc.get(id).await {
        Ok(Some(member)) => Ok(ok_json(HoloMemberDto::from(member))),
        Ok(None) => Err(not_found(&ctx)),
        Err(e) => {
            error!("Failed to get holo member {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Partially update a holo member
pub async fn update_holo_member(
    ctx: ProblemCtx,
    Extension(svc): Extension<Arc<Service>>,
    path_id: PositiveId,
    ValidJson(body): ValidJson<UpdateHoloMemberBody>,
) -> Result<impl IntoResponse, ProblemResponse> {
    info!("Updating holo member with id: {}", path_id.0);

    let patch = body
        .holo_member_update
        .into_patch()
        .map_err(|errors| ctx.validation("Invalid holo_member_update payload", errors))?;
    let Some(id) = path_id.as_i32() else {
        return Err(not_found(&ctx));
    };

    match svc.update(id, patch).await {
        Ok(Some(member)) => Ok(ok_json(HoloMemberDto::from(member))),
        Ok(None) => Err(not_found(&ctx)),
        Err(e) => {
            error!("Failed to update holo member {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Delete a holo member, returning its id
pub async fn delete_holo_member(
    ctx: ProblemCtx,
    Extension(svc): Extension<Arc<Service>>,
    path_id: PositiveId,
) -> Result<Json<i32>, ProblemResponse> {
    info!("Deleting holo member with id: {}", path_id.0);
    let Some(id) = path_id.as_i32() else {
        return Err(not_found(&ctx));
    };

    match svc.delete(id).await {
        Ok(Some(deleted)) => Ok(Json(deleted)),
        Ok(None) => Err(not_found(&ctx)),
        Err(e) => {
            error!("Failed to delete holo member {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}
