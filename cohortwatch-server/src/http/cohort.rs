//! Cohort selection endpoint

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::Response;
use cohortwatch_bus::CohortName;
use tracing::{error, info};

use super::static_files::index_page;
use crate::{AppState, ServerError};

/// Switch the relay to `cohort` and serve the viewer page.
///
/// The switch runs in the background; its outcome reaches viewers as a
/// `cohort` or `unknown_cohort` message, not through this response.
pub async fn select(
    State(state): State<Arc<AppState>>,
    Path(cohort): Path<String>,
) -> Result<Response, ServerError> {
    let cohort = CohortName::new(cohort)?;
    info!(%cohort, "Cohort selected");

    let relay = Arc::clone(&state.relay);
    tokio::spawn(async move {
        if let Err(e) = relay.select_cohort(cohort).await {
            error!("{}", e);
        }
    });

    Ok(index_page())
}
