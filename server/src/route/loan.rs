mod request;
mod response;

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use crate::identity::Caller;
use crate::route::loan::request::{BorrowRequest, ReturnByIdRequest, ReturnRequest, Transformer};
use crate::route::loan::response::Presenter;
use application::service::{BorrowService, GetLoanService, ReturnService};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use uuid::Uuid;

pub trait LoanRouter {
    fn route_loan(self) -> Self;
}

impl LoanRouter for Router<AppModule> {
    fn route_loan(self) -> Self {
        self.route(
            "/loans",
            get(|State(handler): State<AppModule>| async move {
                Controller::new((), Presenter)
                    .bypass(|| handler.pgpool().list_all())
                    .await
                    .map_err(ErrorStatus::from)
            })
            .post(
                |State(handler): State<AppModule>,
                 caller: Caller,
                 Json(req): Json<BorrowRequest>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake((caller, req))
                        .handle(|dto| handler.pgpool().borrow_item(dto))
                        .await
                        .map_err(ErrorStatus::from)
                        .map(|res| (StatusCode::CREATED, res))
                },
            )
            .delete(
                |State(handler): State<AppModule>,
                 caller: Caller,
                 Query(req): Query<ReturnRequest>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake((caller, req))
                        .handle(|dto| handler.pgpool().return_by_borrower(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/loans/active",
            get(|State(handler): State<AppModule>| async move {
                Controller::new((), Presenter)
                    .bypass(|| handler.pgpool().list_active())
                    .await
                    .map_err(ErrorStatus::from)
            }),
        )
        .route(
            "/loans/mine",
            get(|State(handler): State<AppModule>, caller: Caller| async move {
                Controller::new(Transformer, Presenter)
                    .intake(caller)
                    .handle(|dto| handler.pgpool().list_for_borrower(dto))
                    .await
                    .map_err(ErrorStatus::from)
            }),
        )
        .route(
            "/loans/:id/return",
            post(
                |State(handler): State<AppModule>, Path(id): Path<Uuid>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(ReturnByIdRequest::new(id))
                        .handle(|dto| handler.pgpool().return_by_loan_id(dto))
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
