#[actix_web::main]
async fn main() {
    if let Err(e) = chemstat_lib::run().await {
        eprintln!("chemstat: {}", e);
        std::process::exit(1);
    }
}
