use cspbypass::app::App;
use cspbypass::cli::Cli;
use cspbypass::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::from_args();
    logging::init(cli.verbose);

    let code = match App::run(&cli).await {
        Ok(code) => code,
        Err(e) => {
            if cli.error_enabled() {
                eprintln!("Error: {e}");
            }
            e.exit_code()
        }
    };
    std::process::exit(code);
}
