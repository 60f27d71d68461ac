use crate::process::render;
use anyhow::{anyhow, Result};
use clap::Parser;
use mealforge::{
    generate_record_with_retry, prompts::default_prompts, providers::factory::create_provider,
    render_prompt, OperationKind, ProviderConfig,
};
use tracing::info;

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// The task to run (meal_generation, food_analysis or fridge_analysis)
    #[arg(long, default_value = "meal_generation")]
    kind: String,
    /// The user's request, food description or comma-separated fridge items
    #[arg(required = true)]
    input: String,
    /// "local" or "gemini"
    #[arg(long, env = "AI_PROVIDER", default_value = "local")]
    provider: String,
    #[arg(long, env = "AI_API_URL")]
    api_url: Option<String>,
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, env = "AI_MODEL", default_value = "gemini-2.0-flash")]
    model: String,
    /// Model calls made while the answer is unusable
    #[arg(long, default_value_t = 2)]
    max_attempts: usize,
    #[arg(long)]
    debug: bool,
}

pub async fn handle_generate(args: &GenerateArgs) -> Result<()> {
    let prompts = default_prompts(&args.kind)
        .ok_or_else(|| anyhow!("No prompts are defined for task '{}'", args.kind))?;
    let config = ProviderConfig {
        provider: args.provider.clone(),
        api_url: args.api_url.clone(),
        api_key: args.api_key.clone(),
        model_name: args.model.clone(),
    };
    let provider = create_provider("cli", &config)?;

    let user_prompt = render_prompt(
        prompts.user,
        &[
            ("prompt", args.input.as_str()),
            ("description", args.input.as_str()),
            ("items", args.input.as_str()),
        ],
    );
    let kind = OperationKind::from(args.kind.as_str());
    info!("Generating {} with the {} provider", kind, args.provider);

    let processed = generate_record_with_retry(
        provider.as_ref(),
        &kind,
        prompts.system,
        &user_prompt,
        args.max_attempts,
    )
    .await;
    println!("{}", render(processed, args.debug)?);
    Ok(())
}
