use crate::errors::{AppError, StatsError};
use crate::models::{BranchesResponse, Dataset, EnrichedEntity, ReloadResponse, StatsQuery, StatsResponse};
use crate::sort::{sort, SortOrder};
use crate::state::AppState;
use crate::stats::compute;
use crate::storage;
use crate::ui::{render_index, DashboardView};
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};

pub async fn index(State(state): State<AppState>, Query(query): Query<StatsQuery>) -> Html<String> {
    let branch = non_empty(query.branch.as_deref());
    let (order, sort_error) = match non_empty(query.sort.as_deref()).map(str::parse::<SortOrder>) {
        Some(Ok(order)) => (order, None),
        Some(Err(err)) => (SortOrder::default(), Some(err.to_string())),
        None => (SortOrder::default(), None),
    };

    let Some(dataset) = state.snapshot().await else {
        return Html(render_index(&DashboardView {
            branches: &[],
            selected_branch: None,
            sort: order,
            show_sort: false,
            last_updated: None,
            entities: &[],
            error: Some("Failed to load data."),
        }));
    };

    let branches = dataset.branch_names();
    let awaiting_branch = dataset.has_branches() && branch.is_none();
    let (entities, error, show_sort) = if awaiting_branch {
        (Vec::new(), sort_error, false)
    } else {
        match ranked(&dataset, branch, order, &state) {
            Ok(entities) => (entities, sort_error, true),
            Err(StatsError::UnknownBranch(_)) => (Vec::new(), Some("Branch data not found.".to_string()), false),
            Err(err) => (Vec::new(), Some(err.to_string()), false),
        }
    };

    Html(render_index(&DashboardView {
        branches: &branches,
        selected_branch: branch,
        sort: order,
        show_sort,
        last_updated: Some(dataset.last_updated.as_str()),
        entities: &entities,
        error: error.as_deref(),
    }))
}

pub async fn get_branches(State(state): State<AppState>) -> Result<Json<BranchesResponse>, AppError> {
    let dataset = loaded(&state).await?;
    Ok(Json(BranchesResponse {
        branches: dataset.branch_names(),
        last_updated: dataset.last_updated.clone(),
    }))
}

pub async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, AppError> {
    let order = match non_empty(query.sort.as_deref()) {
        Some(value) => value.parse::<SortOrder>()?,
        None => SortOrder::default(),
    };
    let branch = non_empty(query.branch.as_deref());

    let dataset = loaded(&state).await?;
    if dataset.has_branches() && branch.is_none() {
        return Err(AppError::bad_request("branch is required for this dataset"));
    }
    let entities = ranked(&dataset, branch, order, &state)?;

    Ok(Json(StatsResponse {
        branch: branch.map(str::to_string),
        sort: order.to_string(),
        last_updated: dataset.last_updated.clone(),
        target: dataset.target,
        entities,
    }))
}

pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    Ok(Json(storage::reload(&state).await?))
}

fn ranked(
    dataset: &Dataset,
    branch: Option<&str>,
    order: SortOrder,
    state: &AppState,
) -> Result<Vec<EnrichedEntity>, StatsError> {
    let entities = dataset.select(branch)?;
    let stats = compute(entities, dataset.target, &dataset.day_weights, state.config.day_window)?;
    Ok(sort(&stats, order))
}

async fn loaded(state: &AppState) -> Result<std::sync::Arc<Dataset>, AppError> {
    state
        .snapshot()
        .await
        .ok_or_else(|| AppError::unavailable("dataset not loaded"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
