use amoss_app::auth::{SecretStore, SigningKeys, TokenAuthority, VaultClient, VaultConfig};
use clap::{Args, Subcommand};

mod issue;
mod verify;

#[derive(Debug, Args)]
pub(crate) struct TokenCommand {
    #[command(subcommand)]
    command: TokenSubcommand,
}

#[derive(Debug, Subcommand)]
enum TokenSubcommand {
    Issue(issue::IssueTokenArgs),
    Verify(verify::VerifyTokenArgs),
}

/// Vault connection shared by the token subcommands.
#[derive(Debug, Args)]
pub(crate) struct VaultArgs {
    /// Vault server address
    #[arg(long, env = "VAULT_ADDR")]
    vault_addr: String,

    /// Vault authentication token
    #[arg(long, env = "VAULT_TOKEN", hide_env_values = true)]
    vault_token: String,

    /// KV path holding JWT_SECRET
    #[arg(long, env = "VAULT_SECRET_PATH", default_value = "secret/amoss")]
    vault_secret_path: String,
}

impl VaultArgs {
    async fn token_authority(self) -> Result<TokenAuthority, String> {
        let vault = VaultClient::new(VaultConfig {
            addr: self.vault_addr,
            token: self.vault_token,
            secret_path: self.vault_secret_path,
        });

        let key = vault
            .signing_secret()
            .await
            .map_err(|error| format!("failed to read signing secret: {error}"))?;

        Ok(TokenAuthority::new(SigningKeys::new(key)))
    }
}

pub(crate) async fn run(command: TokenCommand) -> Result<(), String> {
    match command.command {
        TokenSubcommand::Issue(args) => issue::run(args).await,
        TokenSubcommand::Verify(args) => verify::run(args).await,
    }
}
