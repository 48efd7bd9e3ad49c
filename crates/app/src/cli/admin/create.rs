use amoss_app::{
    auth::{SigningKey, SigningKeys, TokenAuthority},
    database,
    participants::{ParticipantsService, PgParticipantsService, data::NewAdmin},
};
use clap::Args;

#[derive(Debug, Args)]
pub(crate) struct CreateAdminArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Participant ID; padded to ten digits before storing
    #[arg(long)]
    participant_id: i64,

    /// Admin password
    #[arg(long, env = "AMOSS_ADMIN_PASSWORD", hide_env_values = true)]
    password: String,
}

pub(crate) async fn run(args: CreateAdminArgs) -> Result<(), String> {
    if args.password.trim().is_empty() {
        return Err("password cannot be empty".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    // Creating an account never signs a token, so no real key is needed.
    let tokens = TokenAuthority::new(SigningKeys::new(SigningKey::new(Vec::new())));
    let service = PgParticipantsService::new(pool, tokens);

    let admin = service
        .create_admin(NewAdmin {
            participant_id: args.participant_id,
            password: args.password,
        })
        .await
        .map_err(|error| format!("failed to create admin: {error}"))?;

    println!("participant_id: {}", admin.participant_id);
    println!("capacity: {}", admin.capacity);

    Ok(())
}
