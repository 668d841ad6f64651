use axum::{
    routing,
    Router,
};

#[tokio::main]
async fn main() -> Result<(), common_types_forms::E> {
    ::std::env::set_var("AWS_LAMBDA_HTTP_IGNORE_STAGE_IN_PATH", "true");

    tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_target(false)
            .without_time()
            .init();

    let router = Router::new()
                    .route("/", routing::get(common_types_forms::Routes::pages::home))
                    .route("/about-us", routing::get(common_types_forms::Routes::pages::about_us))
                    .route("/services", routing::get(common_types_forms::Routes::pages::services))
                    .route("/contact-us", routing::get(common_types_forms::Routes::pages::contact_us))
                    .route("/book-free-consultation", routing::get(common_types_forms::Routes::pages::book_free_consultation))
                    .route("/login", routing::get(common_types_forms::Routes::pages::login));

    lambda_web::run_hyper_on_lambda(router).await
}
