//! Interactive console front-end: one call session per run, transcript
//! written on hang-up.

use dotenv::dotenv;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use telesim::config::Config;
use telesim::provider;
use telesim::session::CallSession;
use telesim::store::PromptStore;
use telesim::turn::{TurnProcessor, CUSTOMER_GREETING};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let provider = provider::initialize(&config, provider::prompt_for_openai_key)
        .expect("failed to initialize any language model provider");
    let prompts = PromptStore::from_csv_path(&config.prompts_file)
        .expect("failed to load the prompts CSV");
    let turns = TurnProcessor::new(provider);

    let scenario_input = read_line_with_prompt("Enter scenario (e.g., busy_customer): ");
    let scenario_input = if scenario_input.is_empty() {
        "busy_customer".to_string()
    } else {
        scenario_input
    };

    let record = match prompts.resolve(&scenario_input) {
        Ok(record) => record,
        Err(_) => {
            println!("No prompt found for scenario '{}'. Exiting.", scenario_input);
            return;
        }
    };

    let mut session = CallSession::new("default", record.render_context(), None);

    println!("Phone is ringing...");
    tokio::time::sleep(Duration::from_secs(2)).await;

    println!("Call session started. You (the agent) can now start chatting. Type 'exit' to end the call.");
    println!("Customer: {}", CUSTOMER_GREETING);
    session.record_greeting();

    loop {
        let message = read_line_with_prompt("Agent: ");
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        match turns
            .process_turn(
                &session.context,
                session.behavior.as_deref(),
                &session.chat_history,
                &message,
            )
            .await
        {
            Ok(reply) => {
                println!("Customer: {}", reply);
                session.record_exchange(&message, &reply);
            }
            // A failed turn does not end the call; the history so far stays valid.
            Err(e) => println!("Error during chat: {}", e),
        }
    }

    match session.save_transcript(Path::new(".")) {
        Ok(path) => println!("Call ended and transcript saved to {}", path.display()),
        Err(e) => eprintln!("Call ended but the transcript could not be saved: {}", e),
    }
}

fn read_line_with_prompt(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        // EOF hangs up like an explicit exit.
        Ok(0) | Err(_) => "exit".to_string(),
        Ok(_) => line.trim().to_string(),
    }
}
