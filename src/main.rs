use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    if let Err(e) = log4rs::init_file("log4rs.yml", Default::default()) {
        eprintln!("WARN: logging not initialized from log4rs.yml: {e}");
    }
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    match azure_vm_sample::run().await {
        Ok(report) => {
            log::info!("#End main() created={:?}", report.created);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            azure_vm_sample::output::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
