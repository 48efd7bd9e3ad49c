use amoss_app::auth::{Capacity, ParticipantId};
use clap::Args;

use super::VaultArgs;

#[derive(Debug, Args)]
pub(crate) struct IssueTokenArgs {
    /// Participant ID; padded to ten digits
    #[arg(long)]
    participant_id: i64,

    /// admin, coordinator or patient
    #[arg(long)]
    capacity: Capacity,

    /// Study, required unless the capacity is admin
    #[arg(long)]
    study: Option<String>,

    #[command(flatten)]
    vault: VaultArgs,
}

pub(crate) async fn run(args: IssueTokenArgs) -> Result<(), String> {
    let participant_id = ParticipantId::normalize(args.participant_id)
        .map_err(|error| format!("invalid participant id: {error}"))?;

    let tokens = args.vault.token_authority().await?;

    let issued = tokens
        .issue(args.capacity, args.study.as_deref(), participant_id)
        .map_err(|error| format!("failed to issue token: {error}"))?;

    println!("participant_id: {}", issued.claims.participant_id);
    println!("capacity: {}", issued.claims.capacity);
    if let Some(study) = issued.claims.study() {
        println!("study: {study}");
    }
    println!("expires_at: {}", issued.claims.exp);
    println!("token: {}", issued.token);

    Ok(())
}
