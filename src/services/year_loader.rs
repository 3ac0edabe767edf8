use crate::{
    error::{AppError, AppResult},
    services::ledger_client::ClientError,
    state::AppState,
};

/// Make `year` available in the store, fetching it from the upstream API when
/// one is configured. Returns whether the year is present afterwards.
///
/// A year already loaded, or already being fetched by another request, is
/// never fetched again.
pub async fn ensure_year_loaded(state: &AppState, year: &str) -> AppResult<bool> {
    let Some(client) = state.upstream.as_ref() else {
        return Ok(state.store.read().await.has_year(year));
    };

    {
        let mut store = state.store.write().await;
        if store.has_year(year) {
            return Ok(true);
        }
        if !store.begin_year_load(year) {
            return Ok(false);
        }
    }

    match client.get_year(year).await {
        Ok(year_data) => {
            tracing::info!(year, shops = year_data.shops.len(), "Loaded year from upstream");
            state
                .store
                .write()
                .await
                .finish_year_load(year, Some(year_data));
            state.persist().await?;
            Ok(true)
        }
        Err(ClientError::Api { status: 404, .. }) => {
            state.store.write().await.finish_year_load(year, None);
            Ok(false)
        }
        Err(error) => {
            state.store.write().await.finish_year_load(year, None);
            tracing::error!(year, error = %error, "Upstream year fetch failed");
            Err(AppError::Dependency(format!(
                "Could not load rent ledger for {year}: {error}"
            )))
        }
    }
}
