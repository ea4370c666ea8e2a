#[tokio::main]
async fn main() -> std::process::ExitCode {
    maker::start(std::env::args()).await
}
