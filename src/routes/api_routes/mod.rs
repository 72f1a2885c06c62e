use crate::models::AppState;
use axum::routing::get;
use axum::Router;

mod conversion;

pub fn init(state: AppState) -> Router {
    Router::new()
        .route(
            "/conversiones",
            get(conversion::list)
                .post(conversion::create)
                .delete(conversion::clear),
        )
        .with_state(state)
}
