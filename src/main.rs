use clap::{Parser, Subcommand};
use phonebook_client::api::models::ContactId;
use phonebook_client::guard::Route;
use phonebook_client::session::LogoutOutcome;
use phonebook_client::{Config, Error, Phonebook};

#[derive(Parser, Debug)]
#[command(name = "phonebook", about = "Personal contacts over the connections API")]
struct Args {
    /// Overrides the configured service URL for this run.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Shows who the stored token belongs to.
    Whoami,
    List {
        /// Only contacts whose name contains this, ignoring case.
        #[arg(long, default_value = "")]
        filter: String,
    },
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        number: String,
    },
    Delete {
        id: String,
    },
    /// Saves the service URL to config.toml.
    SetUrl {
        url: String,
    },
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Command::Register { .. } => Route::Register,
            Command::Login { .. } => Route::Login,
            Command::List { .. } | Command::Add { .. } | Command::Delete { .. } => Route::Contacts,
            Command::Logout | Command::Whoami | Command::SetUrl { .. } => Route::Home,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let mut config = Config::load();
    if let Some(url) = args.base_url {
        config.base_url = phonebook_client::utils::normalize_url(&url);
    }

    if let Command::SetUrl { url } = &args.command {
        config.base_url = phonebook_client::utils::normalize_url(url);
        config.save()?;
        println!("Service URL set to {}", config.base_url);
        return Ok(());
    }

    let app = Phonebook::from_config(&config)?;
    app.start().await;

    let wanted = args.command.route();
    let landed = app.resolve(wanted);
    if landed != wanted {
        match landed {
            Route::Login => println!("Not logged in. Run `phonebook login` first."),
            _ => println!("Already logged in. Run `phonebook logout` first."),
        }
        return Ok(());
    }

    match args.command {
        Command::Register { name, email, password } => {
            let user = app.register(&name, &email, &password).await?;
            println!("Welcome, {}", user.name.unwrap_or(email));
        }
        Command::Login { email, password } => {
            let user = app.login(&email, &password).await?;
            println!("Welcome back, {}", user.name.unwrap_or(email));
        }
        Command::Logout => match app.logout().await {
            LogoutOutcome::Confirmed => println!("Logged out."),
            LogoutOutcome::LocalOnly(e) => println!("Logged out locally ({e})."),
        },
        Command::Whoami => {
            if app.session.is_logged_in() {
                let user = app.session.user();
                println!(
                    "{} <{}>",
                    user.name.unwrap_or_default(),
                    user.email.unwrap_or_default()
                );
            } else {
                println!("Not logged in.");
            }
        }
        Command::List { filter } => {
            app.fetch_contacts().await?;
            app.filter.set_name(filter);
            let visible = app.visible_contacts();
            if visible.is_empty() {
                println!("No contacts.");
            }
            for c in visible.iter() {
                println!("{}\t{}\t{}", c.id, c.name, c.number);
            }
        }
        Command::Add { name, number } => {
            // The duplicate check needs the current list.
            app.fetch_contacts().await?;
            let created = app.add_contact(&name, &number).await?;
            println!("Added {} ({})", created.name, created.id);
        }
        Command::Delete { id } => {
            let deleted = app.delete_contact(&ContactId::new(id)).await?;
            println!("Deleted {}", deleted.name);
        }
        Command::SetUrl { .. } => {}
    }
    Ok(())
}
