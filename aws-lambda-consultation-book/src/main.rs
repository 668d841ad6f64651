use axum::{
    routing,
    Router,
    middleware as axum_middleware,
};

#[tokio::main]
async fn main() -> Result<(), common_types_forms::E> {
    ::std::env::set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .without_time()
            .init();

    let appstate = common_types_forms::State::make_state().await?;
    let router = Router::new()
                    .route("/book-free-consultation", routing::post(common_types_forms::Routes::consultation::request))
                    .route_layer(axum_middleware::from_fn(common_types_forms::Middleware::set_cors_headers::middleware))
                    .with_state(appstate);

    lambda_web::run_hyper_on_lambda(router).await
}
