use clap::Parser;
use dotenv::dotenv;
use fixit_agent::ui::render::{ render_cards, render_message, THINKING };
use fixit_agent::ui::{ ChatApiClient, ChatSession, SendOutcome };
use log::info;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };

/// Terminal chat widget for the home-repair concierge.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct ChatArgs {
    /// Base URL of a running fixit-agent server.
    #[arg(long, env = "CHAT_ENDPOINT", default_value = "http://127.0.0.1:4000")]
    endpoint: String,
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = ChatArgs::parse();

    let client = ChatApiClient::new(&args.endpoint)?;
    info!("Talking to {}", client.chat_url());
    let mut session = ChatSession::new(Arc::new(client));

    println!("Fix Your Problem Now (Ctrl-D to quit)\n");
    for message in session.messages() {
        println!("{}", render_message(message));
    }
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(history) = session.submit(&line) else {
            prompt()?;
            continue;
        };
        println!("{}", THINKING);
        let result = session.transport().send(&history).await;
        let outcome = session.finish(result);

        if let Some(reply) = session.messages().last() {
            println!("{}", render_message(reply));
        }
        if outcome == SendOutcome::Replied {
            if let Some(cards) = render_cards(session.businesses()) {
                println!("\n{}", cards);
            }
        }
        println!();
        prompt()?;
    }

    Ok(())
}
