use family_onboarding_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("onboarding service error: {err}");
        std::process::exit(1);
    }
}
