use desk_cli::{build_cli, format_error, run, tracing_setup, CliConfig};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    let debug = matches.get_flag("debug");
    tracing_setup::init_subscriber(debug);

    let config = CliConfig::from_env().with_debug(debug);
    let mut stdout = std::io::stdout().lock();
    match run(&matches, &config, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", format_error(&err, config.debug));
            ExitCode::FAILURE
        }
    }
}
