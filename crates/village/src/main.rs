mod bootstrap;

use std::process::ExitCode;

use engine::run_app;
use tracing::error;

fn main() -> ExitCode {
    let wiring = match bootstrap::build_app() {
        Ok(wiring) => wiring,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = run_app(wiring.config, wiring.setup) {
        error!(error = %err, "app_failed");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
