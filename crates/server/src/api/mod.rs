pub mod files;

use axum::Router;

use crate::workspace::WorkspaceStore;

/// All `/api` routes, bound to the shared workspace store.
pub fn router(store: WorkspaceStore) -> Router {
    Router::new().merge(files::router(store))
}
