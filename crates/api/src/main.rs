#[tokio::main]
async fn main() {
    stockroom_observability::init();

    let app = match stockroom_api::app::build_app().await {
        Ok(app) => app,
        Err(err) => {
            tracing::error!("failed to build application: {err:#}");
            std::process::exit(1);
        }
    };

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|err| panic!("failed to bind {bind_addr}: {err}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
