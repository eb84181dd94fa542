use clap::{Parser, Subcommand};
use subpanel::{
    config::Settings,
    db,
    models::CreateCampaignRequest,
    services::{admin_auth_service::hash_password, SecretsManager},
    AppState,
};

#[derive(Parser)]
#[command(name = "subpanel-cli")]
#[command(about = "Operator CLI for the subscription panel", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Login link commands
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },
    /// User inspection commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Campaign commands
    Campaign {
        #[command(subcommand)]
        command: CampaignCommands,
    },
    /// Admin account helpers
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum LinkCommands {
    /// Issue a new login link
    Generate {
        /// Issue a reusable master link
        #[arg(long)]
        master: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List users, most recent login first
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[arg(short, long, default_value_t = 20)]
        limit: i64,

        /// Filter by name, email or channel id
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand)]
enum CampaignCommands {
    /// Create a campaign for a channel URL
    Create {
        #[arg(short, long)]
        url: String,

        #[arg(short, long, default_value_t = 0)]
        target: i64,
    },
    /// List campaigns, newest first
    List {
        #[arg(short, long, default_value_t = 1)]
        page: i64,

        #[arg(short, long, default_value_t = 10)]
        limit: i64,
    },
    /// Subscribe every authorized user to the campaign channel
    Execute {
        #[arg(short, long)]
        id: i64,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Print an argon2 hash for ADMIN_PASSWORD_HASH
    HashPassword {
        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Print a random CREDENTIAL_MASTER_KEY
    GenerateKey,
}

fn get_password(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Admin helpers need neither the database nor provider settings
    let command = match cli.command {
        Commands::Admin { command } => {
            match command {
                AdminCommands::HashPassword { password } => {
                    let password = match password {
                        Some(pw) => pw,
                        None => {
                            let pw = get_password("Password")?;
                            if pw != get_password("Confirm password")? {
                                eprintln!("❌ Passwords do not match");
                                std::process::exit(1);
                            }
                            pw
                        }
                    };
                    println!("{}", hash_password(&password)?);
                }
                AdminCommands::GenerateKey => {
                    println!("{}", SecretsManager::generate_master_key());
                }
            }
            return Ok(());
        }
        other => other,
    };

    let settings = Settings::from_env()?;
    let pool = db::create_pool(&settings.database_url).await?;
    db::run_migrations(&pool).await?;
    let base_url = settings
        .public_base_url
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", settings.host, settings.port));
    let app = AppState::new(pool, settings, SecretsManager::new()?)?;

    match command {
        Commands::Link { command } => match command {
            LinkCommands::Generate { master } => {
                let link = if master {
                    app.login_links.generate_master_link(&base_url).await?
                } else {
                    app.login_links.generate_link(&base_url).await?
                };
                println!("✅ Login link issued");
                println!("  ID:   {}", link.login_id);
                println!("  Link: {}", link.login_link);
            }
        },
        Commands::User { command } => match command {
            UserCommands::List {
                page,
                limit,
                search,
            } => {
                let result = app.users.list(page, limit, search).await?;
                if result.users.is_empty() {
                    println!("No users found");
                } else {
                    println!(
                        "{:<6} {:<44} {:<12} {:<30} Name",
                        "ID", "Login ID", "Authorized", "Email"
                    );
                    println!("{}", "-".repeat(110));
                    for user in result.users {
                        println!(
                            "{:<6} {:<44} {:<12} {:<30} {}",
                            user.id,
                            user.login_id,
                            if user.is_authorized { "yes" } else { "no" },
                            user.email.as_deref().unwrap_or("-"),
                            user.name.as_deref().unwrap_or("-"),
                        );
                    }
                    println!(
                        "\nPage {}/{} ({} users)",
                        result.page, result.total_pages, result.total
                    );
                }
            }
        },
        Commands::Campaign { command } => match command {
            CampaignCommands::Create { url, target } => {
                let campaign = app
                    .campaigns
                    .create(
                        CreateCampaignRequest {
                            channel_url: url,
                            target_subscribers: target,
                        },
                        Some("cli".to_string()),
                    )
                    .await?;
                println!("✅ Campaign {} created", campaign.id);
                println!("  Channel: {} ({})", campaign.channel_name, campaign.channel_id);
                println!("  Subscribers: {}", campaign.subscriber_count);
            }
            CampaignCommands::List { page, limit } => {
                let result = app.campaigns.list(page, limit).await?;
                if result.campaigns.is_empty() {
                    println!("No campaigns found");
                } else {
                    println!("{:<6} {:<12} {:<10} {:<10} Channel", "ID", "Status", "Target", "Actual");
                    println!("{}", "-".repeat(80));
                    for campaign in result.campaigns {
                        println!(
                            "{:<6} {:<12} {:<10} {:<10} {}",
                            campaign.id,
                            campaign.status.as_str(),
                            campaign.target_subscribers,
                            campaign.actual_subscribers,
                            campaign.channel_name,
                        );
                    }
                }
            }
            CampaignCommands::Execute { id } => {
                let summary = app.campaigns.execute(id).await?;
                println!("✅ Campaign {} executed", id);
                println!("  Succeeded: {}", summary.success_count);
                println!("  Failed:    {}", summary.fail_count);
            }
        },
        Commands::Admin { .. } => {}
    }

    Ok(())
}
