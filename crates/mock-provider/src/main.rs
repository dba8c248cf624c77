use mock_provider::{MockState, router};

#[tokio::main]
async fn main() {
    let state = MockState::default();
    let app = router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:5150")
        .await
        .expect("can bind mock provider port");
    println!("mock provider listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("mock provider runs");
}
