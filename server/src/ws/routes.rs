use actix_web::web;

use crate::ws::index::ws_index;

/// `/ws/?token=<jwt>`: the player's event feed and match input in one socket.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/ws/")
            .name("player_socket")
            .route(web::get().to(ws_index)),
    );
}
