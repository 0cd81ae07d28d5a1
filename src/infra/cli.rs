use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Boutique storefront cart and checkout server")]
pub struct Cli {
    /// Apply pending database migrations before the server starts.
    #[arg(long)]
    pub migrate: bool,
}
