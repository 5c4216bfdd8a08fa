use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::{Client, Response};
use serde_json::json;

#[derive(Parser)]
#[command(name = "concierge-cli")]
#[command(about = "Tour concierge CLI", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CONCIERGE_ENDPOINT", default_value = "http://localhost:8080")]
    endpoint: String,

    /// Visitor id used for tour and chat commands
    #[arg(short, long, default_value = "cli-user")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health
    Health,

    /// Ask the concierge a question
    Ask {
        #[arg(value_name = "MESSAGE")]
        message: String,

        #[arg(short, long, default_value = "home")]
        page: String,
    },

    /// Show the detailed answer to the last question
    More,

    /// Guided tour commands
    Tour {
        #[command(subcommand)]
        action: TourCommand,
    },

    /// Show ranked content for a query
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Show quiz points
    Points,
}

#[derive(Subcommand)]
enum TourCommand {
    Start,
    Next,
    Previous,
    /// Jump to the step with this order
    Goto {
        order: i32,
    },
    /// Move to the first step on a page
    Navigate {
        page: String,
    },
    Progress,
    Steps,
    Analytics,
    /// Answer a quiz question
    Quiz {
        quiz_id: u64,
        answer: String,
    },
}

async fn print_json(response: Response) -> Result<()> {
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .context("server returned a non-JSON body")?;
    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        bail!("request failed with status {}", status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let endpoint = cli.endpoint.trim_end_matches('/').to_string();
    let user = cli.user;

    let response = match cli.command {
        Commands::Health => client.get(format!("{}/health", endpoint)).send().await?,

        Commands::Ask { message, page } => {
            client
                .post(format!("{}/v1/chat", endpoint))
                .json(&json!({
                    "user_id": user,
                    "message": message,
                    "current_page": page,
                }))
                .send()
                .await?
        }

        Commands::More => {
            client
                .post(format!("{}/v1/chat/more", endpoint))
                .json(&json!({ "user_id": user }))
                .send()
                .await?
        }

        Commands::Search { query } => {
            client
                .get(format!("{}/v1/search", endpoint))
                .query(&[("q", query)])
                .send()
                .await?
        }

        Commands::Points => {
            client
                .get(format!("{}/v1/user/points", endpoint))
                .query(&[("user_id", &user)])
                .send()
                .await?
        }

        Commands::Tour { action } => {
            let user_body = json!({ "user_id": user });
            match action {
                TourCommand::Start => {
                    client
                        .post(format!("{}/v1/tour/start", endpoint))
                        .json(&user_body)
                        .send()
                        .await?
                }
                TourCommand::Next => {
                    client
                        .post(format!("{}/v1/tour/next", endpoint))
                        .json(&user_body)
                        .send()
                        .await?
                }
                TourCommand::Previous => {
                    client
                        .post(format!("{}/v1/tour/previous", endpoint))
                        .json(&user_body)
                        .send()
                        .await?
                }
                TourCommand::Goto { order } => {
                    client
                        .post(format!("{}/v1/tour/go-to-step", endpoint))
                        .json(&json!({ "user_id": user, "step_order": order }))
                        .send()
                        .await?
                }
                TourCommand::Navigate { page } => {
                    client
                        .post(format!("{}/v1/tour/navigate", endpoint))
                        .json(&json!({ "user_id": user, "page_name": page }))
                        .send()
                        .await?
                }
                TourCommand::Progress => {
                    client
                        .get(format!("{}/v1/tour/progress", endpoint))
                        .query(&[("user_id", &user)])
                        .send()
                        .await?
                }
                TourCommand::Steps => client.get(format!("{}/v1/tour/steps", endpoint)).send().await?,
                TourCommand::Analytics => {
                    client
                        .get(format!("{}/v1/tour/analytics", endpoint))
                        .send()
                        .await?
                }
                TourCommand::Quiz { quiz_id, answer } => {
                    client
                        .post(format!("{}/v1/tour/quiz-answer", endpoint))
                        .json(&json!({ "user_id": user, "quiz_id": quiz_id, "answer": answer }))
                        .send()
                        .await?
                }
            }
        }
    };

    print_json(response).await
}
