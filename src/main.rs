#[tokio::main]
async fn main() -> std::io::Result<()> {
    tetris_battle_server::run_with_config().await
}
