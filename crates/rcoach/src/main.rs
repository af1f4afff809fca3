use crate::prelude::*;
use clap::Parser;

mod analyze;
mod error;
mod gemini;
mod prelude;
mod serve;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Suggest a statistical method and an R snippet from questionnaire answers"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "RCOACH_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Run the HTTP service (POST /analyze)
    Serve(crate::serve::ServeOptions),

    /// Analyze one set of answers and print the result
    Analyze(crate::analyze::AnalyzeOptions),

    /// Print the prompt that would be sent for a set of answers
    Prompt(crate::analyze::PromptOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; the key can come from the environment.
    dotenvy::dotenv().ok();
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::serve::run_serve(options, app.global).await,
        SubCommands::Analyze(options) => crate::analyze::run_analyze(options, app.global).await,
        SubCommands::Prompt(options) => crate::analyze::run_prompt(options, app.global).await,
    }
}
