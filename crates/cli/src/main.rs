// Operator utility around the credential kernel

use std::io::BufRead;

use anyhow::Context;
use clap::{Parser, Subcommand};

use tollgate_auth::config::{ENV_HASH_COST, ENV_HASH_MEMORY, ENV_LEEWAY, ENV_SECRET, ENV_TTL};
use tollgate_auth::{
    Action, AuthConfig, AuthError, Authorizer, HashParams, PasswordHasher, PermissionTable, Principal, PrincipalId,
    Role, TokenService,
};

#[derive(Parser)]
#[command(name = "tollgate")]
#[command(about = "Hash secrets, mint and inspect tokens, check permissions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// HS256 signing secret
    #[arg(long, env = ENV_SECRET, hide_env_values = true, global = true)]
    secret: Option<String>,

    /// Token lifetime ("3600", "45s", "30m", "1h", "7d")
    #[arg(long, env = ENV_TTL, global = true)]
    expires_in: Option<String>,

    /// Clock-skew allowance on expiry
    #[arg(long, env = ENV_LEEWAY, global = true)]
    leeway: Option<String>,

    /// Argon2id time cost
    #[arg(long, env = ENV_HASH_COST, global = true)]
    hash_cost: Option<u32>,

    /// Argon2id memory in KiB
    #[arg(long, env = ENV_HASH_MEMORY, global = true)]
    hash_memory_kib: Option<u32>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an Argon2id digest for a secret (read from stdin if omitted)
    HashSecret { secret: Option<String> },

    /// Mint a token for a principal
    IssueToken {
        #[arg(long)]
        id: PrincipalId,

        #[arg(long)]
        identifier: String,

        /// admin or user
        #[arg(long)]
        role: Role,
    },

    /// Verify a token and print its claims as JSON
    VerifyToken { token: String },

    /// Run the authorization check for a token
    Check {
        #[arg(long)]
        token: String,

        /// create, read, update or delete
        #[arg(long)]
        action: Action,

        /// Owner of the target resource; omit for collections
        #[arg(long)]
        owner: Option<PrincipalId>,
    },
}

impl Cli {
    fn auth_config(&self) -> anyhow::Result<AuthConfig> {
        let config = AuthConfig::from_lookup(|key| match key {
            ENV_SECRET => self.secret.clone(),
            ENV_TTL => self.expires_in.clone(),
            ENV_LEEWAY => self.leeway.clone(),
            ENV_HASH_COST => self.hash_cost.map(|v| v.to_string()),
            ENV_HASH_MEMORY => self.hash_memory_kib.map(|v| v.to_string()),
            _ => None,
        })
        .map_err(AuthError::from)?;
        Ok(config)
    }

    fn hash_params(&self) -> HashParams {
        let mut params = HashParams::default();
        if let Some(cost) = self.hash_cost {
            params.cost = cost;
        }
        if let Some(memory_kib) = self.hash_memory_kib {
            params.memory_kib = memory_kib;
        }
        params
    }

    fn token_service(&self) -> anyhow::Result<TokenService> {
        let config = self.auth_config()?;
        Ok(TokenService::new(&config).map_err(AuthError::from)?)
    }

    fn run(&self) -> anyhow::Result<String> {
        match &self.command {
            Commands::HashSecret { secret } => {
                let secret = match secret {
                    Some(s) => s.clone(),
                    None => read_secret_from_stdin()?,
                };
                let hasher = PasswordHasher::new(self.hash_params()).map_err(AuthError::from)?;
                Ok(hasher.hash(&secret).map_err(AuthError::from)?)
            }

            Commands::IssueToken { id, identifier, role } => {
                let tokens = self.token_service()?;
                let principal = Principal::new(id.clone(), identifier.as_str(), "", identifier.as_str(), *role);
                let token = tokens.issue(&principal).map_err(AuthError::from)?;
                tracing::info!(principal_id = %id, role = %role, "token issued");
                Ok(token)
            }

            Commands::VerifyToken { token } => {
                let tokens = self.token_service()?;
                let claims = tokens.verify(token).map_err(AuthError::from)?;
                serde_json::to_string_pretty(&claims).context("failed to render claims")
            }

            Commands::Check { token, action, owner } => {
                let authorizer = Authorizer::new(self.token_service()?, PermissionTable::canonical());
                let claims = authorizer
                    .authorize(Some(token), *action, owner.as_ref())
                    .map_err(AuthError::from)?;
                Ok(format!("allowed: {} may {} as {}", claims.subject_id, action, claims.role))
            }
        }
    }
}

fn read_secret_from_stdin() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read secret from stdin")?;
    let secret = line.trim_end_matches(['\r', '\n']).to_string();
    anyhow::ensure!(!secret.is_empty(), "no secret given");
    Ok(secret)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tollgate_observability::init_with_filter(if cli.verbose { "debug" } else { "warn" });

    let output = cli.run()?;
    println!("{output}");
    Ok(())
}
