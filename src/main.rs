#[tokio::main]
async fn main() {
    if let Err(e) = imgdiff_lib::run().await {
        tracing::error!("{e}");
        eprintln!("imgdiff: {e}");
        std::process::exit(1);
    }
}
