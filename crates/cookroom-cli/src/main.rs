// Cooking Room CLI entry point

use cookroom_cli::{logging, output, router::CommandRouter};

#[tokio::main]
async fn main() {
    if let Err(e) = CommandRouter::route().await {
        output::print_error(&e.user_message());
        logging::debug(&e.technical_details());
        std::process::exit(1);
    }
}
