use crate::app::SharedState;

pub async fn graceful_shutdown(state: &SharedState) {
    tracing::info!("Shutdown sequence started");

    state.polling().stop();
    state.shutdown_token().cancel();
    tracing::info!("Shutdown: polling cancelled");

    state.notifications().close().await;
    tracing::info!("Shutdown: notification queue closed");

    tracing::info!("Shutdown sequence completed");
}
