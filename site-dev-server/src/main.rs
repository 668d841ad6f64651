use ::std::net::SocketAddr;

use common_types_forms::Constants::SITE_ADDR;

#[tokio::main]
async fn main() -> Result<(), common_types_forms::E> {
    tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .without_time()
            .init();

    let appstate = common_types_forms::State::make_admin_state().await?;
    let router = common_types_forms::Routes::site_router(appstate);

    let addr: SocketAddr = SITE_ADDR.parse()?;
    tracing::info!("Serving the site on http://{addr}");
    axum::Server::bind(&addr)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}
