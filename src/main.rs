use jd_mover::OrganizeError;
use jd_mover::output as out;
use std::process::ExitCode;

mod app;
mod logging;

fn main() -> ExitCode {
    let args = jd_mover::cli::parse();
    match app::run(args) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            let code = e
                .downcast_ref::<OrganizeError>()
                .map(|oe| oe.code())
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
