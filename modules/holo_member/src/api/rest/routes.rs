use std::sync::Arc;

use axum::{Extension, Router};
use modkit::api::{Missing, OpenApiRegistry, OperationBuilder};

use crate::api::rest::{dto, handlers};
use crate::domain::service::Service;

pub const BASE_PATH: &str = "/api/v1/holo_member";

const TAG: &str = "holo_member";

/// Mount the five CRUD operations under [`BASE_PATH`]. Documented paths carry
/// the trailing slash; the bare form is served as an alias.
pub fn register_routes(
    mut router: Router,
    openapi: &dyn OpenApiRegistry,
    service: Arc<Service>,
) -> anyhow::Result<Router> {
    let collection = format!("{BASE_PATH}/");
    let item = format!("{BASE_PATH}/{{id}}/");
    let item_alias = format!("{BASE_PATH}/{{id}}");

    // GET /api/v1/holo_member/
    router = OperationBuilder::<Missing, Missing, ()>::get(&collection)
        .alias(BASE_PATH)
        .operation_id("holo_member.list")
        .summary("List every holo member")
        .tag(TAG)
        .handler(handlers::list_holo_members)
        .json_list_response::<dto::HoloMemberDto>(openapi, 200, "All members, possibly empty")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    // POST /api/v1/holo_member/
    router = OperationBuilder::<Missing, Missing, ()>::post(&collection)
        .alias(BASE_PATH)
        .operation_id("holo_member.create")
        .summary("Create a holo member")
        .tag(TAG)
        .json_request::<dto::CreateHoloMemberBody>(openapi, "Member to create")
        .handler(handlers::create_holo_member)
        .json_response_with_schema::<dto::HoloMemberDto>(openapi, 201, "Created member")
        .problem_response(openapi, 422, "Invalid payload")
        .problem_response(openapi, 500, "Internal Server Error")
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::get(&item)
        .alias(&item_alias)
        .operation_id("holo_member.get")
        .summary("Get a holo member by id")
        .tag(TAG)
        .path_param_typed("id", "Member id, at least 1", "integer")
        .handler(handlers::get_holo_member)
        .json_response_with_schema::<dto::HoloMemberDto>(openapi, 200, "Member found")
        .problem_response(openapi, 404, "No member with that id")
        .problem_response(openapi, 422, "Invalid id")
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::put(&item)
        .alias(&item_alias)
        .operation_id("holo_member.update")
        .summary("Partially update a holo member")
        .description("Omitted fields keep their stored value; an explicit null clears a nullable field.")
        .tag(TAG)
        .path_param_typed("id", "Member id, at least 1", "integer")
        .json_request::<dto::UpdateHoloMemberBody>(openapi, "Fields to change")
        .handler(handlers::update_holo_member)
        .json_response_with_schema::<dto::HoloMemberDto>(openapi, 200, "Updated member")
        .problem_response(openapi, 400, "Type cleared or update rejected by storage")
        .problem_response(openapi, 404, "No member with that id")
        .problem_response(openapi, 422, "Invalid id or payload")
        .register(router, openapi);

    router = OperationBuilder::<Missing, Missing, ()>::delete(&item)
        .alias(&item_alias)
        .operation_id("holo_member.delete")
        .summary("Delete a holo member, returning its id")
        .tag(TAG)
        .path_param_typed("id", "Member id, at least 1", "integer")
        .handler(handlers::delete_holo_member)
        .json_scalar_response(200, "integer", "Id of the deleted member")
        .problem_response(openapi, 404, "No member with that id")
        .problem_response(openapi, 422, "Invalid id")
        .register(router, openapi);

    Ok(router.layer(Extension(service)))
}
