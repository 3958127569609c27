use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LicenseDoc { pub id: u64, pub name: String, pub no_wa: String }

/// `payload` is `{id, name, no_wa}` for `add` and `{id}` for `delete`.
#[derive(ToSchema)]
pub struct MutationRequestDoc {
    pub password: String,
    #[schema(example = "add")]
    pub action: String,
    pub payload: LicenseDoc,
}

#[derive(ToSchema)]
pub struct MutationResponseDoc {
    pub success: bool,
    pub data: Vec<LicenseDoc>,
    pub error: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::licenses::list,
        crate::licenses::mutate,
    ),
    components(
        schemas(
            HealthResponse,
            LicenseDoc,
            MutationRequestDoc,
            MutationResponseDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "licenses")
    )
)]
pub struct ApiDoc;
