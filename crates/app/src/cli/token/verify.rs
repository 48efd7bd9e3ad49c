use clap::Args;

use super::VaultArgs;

#[derive(Debug, Args)]
pub(crate) struct VerifyTokenArgs {
    /// Session token to check
    #[arg(long, env = "AMOSS_TOKEN", hide_env_values = true)]
    token: String,

    #[command(flatten)]
    vault: VaultArgs,
}

pub(crate) async fn run(args: VerifyTokenArgs) -> Result<(), String> {
    let tokens = args.vault.token_authority().await?;

    let claims = tokens
        .verify(&args.token)
        .map_err(|error| format!("token rejected: {error}"))?;

    let rendered = serde_json::to_string_pretty(&claims)
        .map_err(|error| format!("failed to render claims: {error}"))?;

    println!("{rendered}");

    Ok(())
}
