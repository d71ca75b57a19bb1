mod agent;
mod cli;
mod config;
mod logging;
mod shell;
mod store;

use tracing::info;

use shell::Shell;

#[tokio::main]
async fn main() {
    // .env ファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // ログシステムの初期化（_guard は main 終了まで保持する必要がある）
    let _guard = logging::init_logging();
    info!("userdesk started");

    let mut shell = match Shell::new() {
        Ok(shell) => shell,
        Err(e) => {
            eprintln!("userdesk: error: {e:#}");
            std::process::exit(1);
        }
    };

    shell.run().await;

    info!("userdesk shutting down");
}
