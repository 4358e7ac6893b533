use clap::{command, Parser};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = r###"
llmgql puts a small GraphQL API in front of hosted chat-completion providers.

- deepseekChat: forwards a message list to DeepSeek's chat completions endpoint.
- openaiResponse: sends a single prompt to OpenAI and normalizes the reply.

Provider failures are returned in the `error` field of each response rather
than as GraphQL errors. API keys come from DEEPSEEK_API_KEY and OPENAI_API_KEY.
"###
)]
pub struct Args {
    #[command(subcommand)]
    pub subcmd: Option<SubCommands>,
}

#[derive(Parser, Debug)]
pub enum SubCommands {
    /// Set or get configuration values in llmgql.toml.
    Config(ConfigSubCommand),
    Start(StartSubCommand),
    /// Print the GraphQL schema (SDL)
    Schema,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Start the GraphQL server", long_about = None)]
pub struct StartSubCommand {}

#[derive(Parser, Debug)]
#[command(author, version, about = "Set or get configuration values", long_about = None)]
pub struct ConfigSubCommand {
    /// Set a configuration value. Use the format key=value.
    /// `llmgql config --set port=8080`
    #[arg(short, long)]
    pub set: Option<String>,

    /// Get the effective value of a key, after environment overrides.
    /// `llmgql config --get openai_base_url`
    #[arg(short, long)]
    pub get: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_set() {
        let args = Args::parse_from(["llmgql", "config", "--set", "port=8080"]);
        match args.subcmd {
            Some(SubCommands::Config(cmd)) => {
                assert_eq!(cmd.set.as_deref(), Some("port=8080"));
                assert_eq!(cmd.get, None);
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn test_parse_start_and_schema() {
        assert!(matches!(
            Args::parse_from(["llmgql", "start"]).subcmd,
            Some(SubCommands::Start(_))
        ));
        assert!(matches!(
            Args::parse_from(["llmgql", "schema"]).subcmd,
            Some(SubCommands::Schema)
        ));
        assert!(Args::parse_from(["llmgql"]).subcmd.is_none());
    }
}
