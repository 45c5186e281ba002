use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = filmgrabctl::Cli::parse();
    if let Err(err) = filmgrabctl::run(cli).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
