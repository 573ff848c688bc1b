//! Archive download for finished projects.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use tracing::{instrument, warn};

use maker_core::domain::{DomainError, ProjectName};

use crate::state::AppState;

/// `GET /download/{project_name}`: the project's output directory as a zip.
///
/// 400 for a name that could escape the output root, 404 when nothing was
/// generated under that name.
#[instrument(skip_all, fields(project = %project_name))]
pub async fn download(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let name: ProjectName = project_name
        .parse()
        .map_err(|e: DomainError| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let dir = state.output_root.join(name.as_str());
    if !dir.is_dir() {
        return Err((StatusCode::NOT_FOUND, format!("project '{name}' not found")));
    }

    let packager = Arc::clone(&state.packager);
    let extension = packager.extension();
    let bytes = tokio::task::spawn_blocking(move || packager.package(&dir))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| {
            warn!(error = %e, "packaging failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, format!("application/{extension}")),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}.{extension}\""),
            ),
        ],
        bytes,
    ))
}
