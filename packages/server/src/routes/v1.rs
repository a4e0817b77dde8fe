use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers::{self, agreement, artisan, item, listing, operator, sale};
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload_limit = config.storage.max_upload_size;
    OpenApiRouter::new()
        .nest("/operators", operator_routes(upload_limit))
        .nest("/artisans", artisan_routes(upload_limit))
        .nest("/items", item_routes())
        .nest("/sales", sale_routes())
        .nest("/listings", listing_routes())
        .nest("/agreements", agreement_routes(upload_limit))
}

fn operator_routes(upload_limit: u64) -> OpenApiRouter<AppState> {
    let accounts = OpenApiRouter::new()
        .routes(routes!(operator::register))
        .routes(routes!(operator::login))
        .routes(routes!(operator::logout))
        .routes(routes!(operator::refresh_token))
        .routes(routes!(operator::list_operators))
        .routes(routes!(operator::me, operator::update_account));

    let avatar = OpenApiRouter::new()
        .routes(routes!(operator::update_avatar))
        .layer(handlers::upload_body_limit(upload_limit));

    accounts.merge(avatar)
}

fn artisan_routes(upload_limit: u64) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(artisan::list_artisans, artisan::create_artisan))
        .routes(routes!(
            artisan::get_artisan,
            artisan::update_artisan,
            artisan::delete_artisan
        ))
        .routes(routes!(artisan::delete_artisan_avatar));

    let avatar = OpenApiRouter::new()
        .routes(routes!(artisan::update_artisan_avatar))
        .layer(handlers::upload_body_limit(upload_limit));

    crud.merge(avatar)
}

fn item_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(item::list_items, item::create_item))
        .routes(routes!(item::get_item, item::update_item, item::delete_item))
}

fn sale_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(sale::list_sales, sale::create_sale))
        .routes(routes!(sale::get_sale, sale::delete_sale))
}

fn listing_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(listing::list_listings, listing::create_listing))
        .routes(routes!(listing::update_listing, listing::delete_listing))
}

fn agreement_routes(upload_limit: u64) -> OpenApiRouter<AppState> {
    let read = OpenApiRouter::new()
        .routes(routes!(agreement::list_agreements))
        .routes(routes!(agreement::get_agreement, agreement::delete_agreement));

    let upload = OpenApiRouter::new()
        .routes(routes!(agreement::create_agreement))
        .layer(handlers::upload_body_limit(upload_limit));

    read.merge(upload)
}
