mod request;
mod response;

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::route::stats::request::{TopRequest, Transformer};
use crate::route::stats::response::Presenter;
use application::service::GetStatsService;
use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;

pub trait StatsRouter {
    fn route_stats(self) -> Self;
}

impl StatsRouter for Router<AppModule> {
    fn route_stats(self) -> Self {
        self.route(
            "/stats",
            get(|State(handler): State<AppModule>| async move {
                Controller::new((), Presenter)
                    .bypass(|| handler.pgpool().get_stats())
                    .await
                    .map_err(ErrorStatus::from)
            }),
        )
        .route(
            "/stats/top-items",
            get(
                |State(handler): State<AppModule>, Query(req): Query<TopRequest>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(req)
                        .handle(|dto| handler.pgpool().get_top_items(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/stats/top-borrowers",
            get(
                |State(handler): State<AppModule>, Query(req): Query<TopRequest>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(req)
                        .handle(|dto| handler.pgpool().get_top_borrowers(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
