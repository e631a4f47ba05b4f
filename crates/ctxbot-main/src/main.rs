use std::process::ExitCode;

use ctxbot_lib::output::StdIO;
use ctxbot_lib::runtime::Runtime;
use ctxbot_lib::settings::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is fine; real environment variables still apply.
    dotenvy::dotenv().ok();
    ctxbot_cli::logging::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast::<clap::Error>() {
            // Help and version output also arrive here.
            Ok(clap_err) => clap_err.exit(),
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
    }
}

async fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let mut io = StdIO::new();
    ctxbot_cli::try_run_with_loader(&args, || Ok(Runtime::live(Settings::from_env()?)), &mut io)
        .await
}
