use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(image_routes(config))
        .routes(routes!(handlers::storage::get_storage_usage))
}

fn image_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::image::list_images))
        .routes(routes!(
            handlers::image::get_image,
            handlers::image::delete_image
        ))
        .routes(routes!(handlers::image::transform_image))
        .routes(routes!(handlers::image::download_image))
        .routes(routes!(handlers::image::view_image));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::image::upload_image))
        .layer(handlers::image::upload_body_limit(config.upload.max_bytes));

    crud.merge(upload)
}
