use crate::{
    parse_tools, AnthropicCaller, AnthropicConfig, BedrockCaller, BedrockConfig, ChatMessage, ModelCaller,
    OpenAICompatibleCaller, ToolCaller, ToolOutcome, ToolRequest, Validator,
};
use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, time::Duration};
use tracing::{error, info, Level};

const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
const DEFAULT_OPENAI_MODEL: &str = "openai/gpt-4.1-mini";
const DEFAULT_BEDROCK_MODEL: &str = "anthropic.claude-3-haiku-20240307-v1:0";

fn command() -> Command {
    Command::new("claude-tools")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Prompt-driven function calling against Anthropic, Bedrock or OpenAI-compatible models")
        .arg(
            Arg::new("prompt")
                .help("The user message to send")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("tools")
                .long("tools")
                .value_name("FILE")
                .help("JSON file holding an array of {name, description, parameters} schemas")
                .required(true),
        )
        .arg(
            Arg::new("provider")
                .short('p')
                .long("provider")
                .value_name("PROVIDER")
                .help("Model provider")
                .value_parser(["anthropic", "openai", "bedrock"])
                .default_value("anthropic"),
        )
        .arg(
            Arg::new("model")
                .short('m')
                .long("model")
                .value_name("MODEL")
                .help("Model name (defaults depend on the provider)"),
        )
        .arg(
            Arg::new("tool-choice")
                .long("tool-choice")
                .value_name("NAME")
                .help("Require a call to this tool (single-tool mode only)"),
        )
        .arg(
            Arg::new("multiple")
                .long("multiple")
                .help("Allow several calls in one response")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("task")
                .long("task")
                .value_name("TEXT")
                .help("Task directive appended to the system prompt"),
        )
        .arg(
            Arg::new("max-attempts")
                .short('a')
                .long("max-attempts")
                .value_name("COUNT")
                .help("Maximum model calls per invocation")
                .value_parser(clap::value_parser!(u32))
                .default_value("3"),
        )
        .arg(
            Arg::new("no-force")
                .long("no-force")
                .help("Return plain text when the model answers without a call")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-validate")
                .long("no-validate")
                .help("Skip parameter validation")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Validate parameters against the full JSON Schema")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("max-tokens")
                .long("max-tokens")
                .value_name("COUNT")
                .help("Maximum tokens to generate")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("api-key")
                .short('k')
                .long("api-key")
                .value_name("KEY")
                .help("API key (or set ANTHROPIC_API_KEY / OPENAI_API_KEY)"),
        )
        .arg(
            Arg::new("base-url")
                .short('u')
                .long("base-url")
                .value_name("URL")
                .help("Provider base URL (or set ANTHROPIC_BASE_URL / OPENAI_BASE_URL; Bedrock endpoint override)"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("HTTP timeout per model call")
                .value_parser(clap::value_parser!(u64))
                .default_value("600"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log raw model responses and amended prompts")
                .action(ArgAction::SetTrue),
        )
}

/// CLI entry point for the claude-tools driver
pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let matches = command().get_matches();
    let verbose = matches.get_flag("verbose");

    tracing_subscriber::fmt()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let provider = string_arg(&matches, "provider").unwrap_or("anthropic");
    let caller = build_caller(&matches, provider)?;

    let request = build_request(&matches, provider)?;
    let validator = if matches.get_flag("strict") {
        Validator::Strict
    } else {
        Validator::Structural
    };

    let tool_caller = ToolCaller::new(caller)
        .with_validator(validator)
        .with_verbose(verbose);

    info!("Using provider {} with model {}", provider, request.model);

    match tool_caller.invoke(&request).await {
        Ok(ToolOutcome::Text(text)) => println!("{}", text),
        Ok(outcome) => println!("{}", serde_json::to_string_pretty(&outcome.to_json())?),
        Err(err) => {
            error!("Invocation failed: {}", err);
            eprintln!("{}", serde_json::to_string_pretty(&err.to_error_payload())?);
            return Err(err.into());
        }
    }

    Ok(())
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches.get_one::<String>(id).map(String::as_str)
}

fn build_caller(matches: &ArgMatches, provider: &str) -> anyhow::Result<Box<dyn ModelCaller>> {
    let timeout = Duration::from_secs(matches.get_one::<u64>("timeout").copied().unwrap_or(600));
    let base_url = string_arg(matches, "base-url");

    match provider {
        "anthropic" => {
            let mut config = match string_arg(matches, "api-key") {
                Some(key) => AnthropicConfig::new(key),
                None => AnthropicConfig::from_env()
                    .context("Anthropic API key is required. Set ANTHROPIC_API_KEY or use --api-key")?,
            };
            if let Some(url) = base_url {
                config = config.with_base_url(url);
            }
            Ok(Box::new(AnthropicCaller::new(config.with_timeout(timeout))?))
        }
        "openai" => {
            let api_key = string_arg(matches, "api-key")
                .map(str::to_string)
                .or_else(|| env::var("OPENAI_API_KEY").ok())
                .context("API key is required. Set OPENAI_API_KEY or use --api-key")?;

            let mut caller = OpenAICompatibleCaller::with_timeout(api_key, timeout)?;
            if let Some(url) = base_url
                .map(str::to_string)
                .or_else(|| env::var("OPENAI_BASE_URL").ok())
                .or_else(|| env::var("OPENROUTER_BASE_URL").ok())
            {
                caller.set_base_url(url);
            }
            Ok(Box::new(caller))
        }
        "bedrock" => {
            let mut config = BedrockConfig::from_env().context(
                "AWS credentials are required. Set AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY and AWS_REGION",
            )?;
            if let Some(url) = base_url {
                config = config.with_endpoint_url(url);
            }
            Ok(Box::new(BedrockCaller::new(config.with_timeout(timeout))?))
        }
        other => bail!("unsupported provider `{}`", other),
    }
}

fn build_request(matches: &ArgMatches, provider: &str) -> anyhow::Result<ToolRequest> {
    let tools_path = string_arg(matches, "tools").context("--tools is required")?;
    let tools_json = std::fs::read_to_string(tools_path)
        .with_context(|| format!("Failed to read tool schemas from {}", tools_path))?;
    let tools = parse_tools(
        serde_json::from_str(&tools_json)
            .with_context(|| format!("{} is not valid JSON", tools_path))?,
    )?;

    let prompt = string_arg(matches, "prompt").context("a prompt is required")?;
    let model = string_arg(matches, "model").unwrap_or(match provider {
        "openai" => DEFAULT_OPENAI_MODEL,
        "bedrock" => DEFAULT_BEDROCK_MODEL,
        _ => DEFAULT_ANTHROPIC_MODEL,
    });

    let mut request = ToolRequest::new(model, vec![ChatMessage::user(prompt)], tools)
        .with_multiple_tools(matches.get_flag("multiple"))
        .with_force_tool_call(!matches.get_flag("no-force"))
        .with_validate_params(!matches.get_flag("no-validate"))
        .with_max_attempts(matches.get_one::<u32>("max-attempts").copied().unwrap_or(3));

    if let Some(choice) = string_arg(matches, "tool-choice") {
        request = request.with_tool_choice(choice);
    }
    if let Some(task) = string_arg(matches, "task") {
        request = request.with_task(task);
    }
    if let Some(max_tokens) = matches.get_one::<u32>("max-tokens") {
        request = request.with_max_tokens(*max_tokens);
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn test_flags_parse() {
        let matches = command()
            .try_get_matches_from([
                "claude-tools",
                "Add laundry to my todos",
                "--tools",
                "tools.json",
                "--multiple",
                "--no-force",
                "--max-attempts",
                "5",
            ])
            .unwrap();

        assert!(matches.get_flag("multiple"));
        assert!(matches.get_flag("no-force"));
        assert!(!matches.get_flag("strict"));
        assert_eq!(matches.get_one::<u32>("max-attempts"), Some(&5));
        assert_eq!(string_arg(&matches, "provider"), Some("anthropic"));
    }

    #[test]
    fn test_bedrock_provider_is_accepted() {
        let matches = command()
            .try_get_matches_from([
                "claude-tools",
                "hello",
                "--tools",
                "tools.json",
                "--provider",
                "bedrock",
            ])
            .unwrap();
        assert_eq!(string_arg(&matches, "provider"), Some("bedrock"));

        assert!(command()
            .try_get_matches_from(["claude-tools", "hello", "--provider", "vertex"])
            .is_err());
    }
}
