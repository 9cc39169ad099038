use crate::dropdown::TrainDropdown;
use crate::locator::{LocateError, Locator};
use crate::map::WebMap;
use crate::source::TrainSource;
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::{Filter, Reply};

const INDEX_HTML: &str = include_str!("../static/index.html");

pub struct ServerState<S> {
    pub map: Arc<WebMap>,
    pub dropdown: Arc<TrainDropdown>,
    pub locator: Locator<S, WebMap>,
}

#[derive(Serialize)]
struct Message {
    message: String,
}

pub fn routes<S>(
    state: Arc<ServerState<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone
where
    S: TrainSource + 'static,
{
    let state_filter = warp::any().map(move || state.clone());

    // GET /
    let index_route = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    // GET /markers
    let markers_route = warp::path("markers")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<ServerState<S>>| warp::reply::json(&state.map.markers()));

    // GET /view
    let view_route = warp::path("view")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<ServerState<S>>| warp::reply::json(&state.map.view_state()));

    // GET /trains
    let trains_route = warp::path("trains")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: Arc<ServerState<S>>| warp::reply::json(&state.dropdown.options()));

    // GET /locate/{trainNumber}
    let locate_route = warp::path!("locate" / String)
        .and(warp::get())
        .and(state_filter)
        .and_then(handle_locate::<S>);

    index_route
        .or(markers_route)
        .or(view_route)
        .or(trains_route)
        .or(locate_route)
}

async fn handle_locate<S: TrainSource>(
    train_number: String,
    state: Arc<ServerState<S>>,
) -> Result<warp::reply::Response, Infallible> {
    let response = match state.locator.locate(&train_number).await {
        Ok(found) => warp::reply::json(&found).into_response(),
        Err(e) => {
            let status = match e {
                LocateError::NotFound(_) => StatusCode::NOT_FOUND,
                LocateError::Fetch(_) => StatusCode::BAD_GATEWAY,
            };
            let body = warp::reply::json(&Message {
                message: e.to_string(),
            });
            warp::reply::with_status(body, status).into_response()
        }
    };
    Ok(response)
}
