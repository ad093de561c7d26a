use std::path::{Path, PathBuf};
use std::process::ExitCode;

use adtools::filetime::parse_filetime;
use adtools::messages::{self, MessageCatalog};
use adtools::{
    AccountControl, AdTools, DirectoryEntry, Domains, ObjectType, QueryOptions,
    QueryResult, decode_account_control, field_label,
};
use clap::{Parser, Subcommand};

/// Attributes holding an AD FILETIME.
const FILETIME_FIELDS: [&str; 5] = [
    "accountexpires",
    "lastlogon",
    "lastlogontimestamp",
    "lockouttime",
    "pwdlastset",
];

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Domains file.
    #[arg(long, short, default_value = adtools::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Domain key inside the domains file.
    #[arg(long, short, default_value = "default")]
    domain: String,
    /// Message catalog used to print errors.
    #[arg(long)]
    messages: Option<PathBuf>,
    /// Print attribute names and values as stored in the directory.
    #[arg(long)]
    raw: bool,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Type {
    User,
    Upn,
    Username,
    Computer,
}

impl From<Type> for ObjectType {
    fn from(kind: Type) -> Self {
        match kind {
            Type::User => ObjectType::User,
            Type::Upn => ObjectType::Upn,
            Type::Username => ObjectType::Username,
            Type::Computer => ObjectType::Computer,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Run a raw LDAP search.
    Query {
        filter: String,
        #[arg(long)]
        base_dn: Option<String>,
        /// Only search the immediate children of the base.
        #[arg(long)]
        one_level: bool,
        /// Accept more than one result.
        #[arg(long)]
        all: bool,
        /// Attribute to return. Repeat for more.
        #[arg(long = "attr", short)]
        attributes: Vec<String>,
    },
    /// Find a user or computer by name.
    Find {
        name: String,
        #[arg(long, short, value_enum, default_value_t = Type::User)]
        r#type: Type,
        #[arg(long)]
        base_dn: Option<String>,
        #[arg(long = "attr", short)]
        attributes: Vec<String>,
    },
    /// Move an object to another OU.
    Move { dn: String, new_parent: String },
    /// Reset the password of a user.
    Password {
        dn: String,
        #[arg(long, env = "ADTOOLS_NEW_PASSWORD", hide_env_values = true)]
        password: String,
        /// Force a change at next logon.
        #[arg(long)]
        must_change: bool,
    },
    /// Manage security groups.
    Group {
        #[command(subcommand)]
        cmd: GroupCommands,
    },
    /// Decode a userAccountControl value.
    Flags { value: u32 },
}

#[derive(Subcommand, Debug, Clone)]
enum GroupCommands {
    /// Create a security group.
    Create { name: String, dn: String },
    /// Add a member.
    Add { member: String, group: String },
    /// Remove a member, or every member when none is given.
    Del {
        group: String,
        #[arg(long)]
        member: Option<String>,
    },
}

/// Readable form of a stored value: dates for FILETIME attributes and flag
/// names for userAccountControl.
fn render_value(name: &str, value: &str) -> String {
    if FILETIME_FIELDS.contains(&name) {
        return match parse_filetime(value) {
            Some(date) => date.to_rfc3339(),
            None => "never".to_owned(),
        };
    }

    match value.parse::<u32>() {
        Ok(bits) if name == "useraccountcontrol" => {
            AccountControl::from_bits(bits).to_string()
        },
        _ => value.to_owned(),
    }
}

fn print_entry(entry: &DirectoryEntry, raw: bool) {
    println!("dn: {}", entry.dn);
    for (name, values) in entry.attributes() {
        for value in values {
            if raw {
                println!("{name}: {value}");
            } else {
                let label = field_label(name).unwrap_or(name);
                println!("{label}: {}", render_value(name, value));
            }
        }
    }
}

fn connect(config: &Path, domain: &str) -> adtools::Result<AdTools> {
    let domains = Domains::read(Some(config))?;
    AdTools::connect(domain, &domains)
}

fn run(args: Args) -> adtools::Result<()> {
    let Args {
        config,
        domain,
        raw,
        cmd,
        ..
    } = args;
    let session = || connect(&config, &domain);

    match cmd {
        Commands::Flags { value } => {
            for (bit, name) in decode_account_control(value) {
                println!("{bit}\t{name}");
            }
        },
        Commands::Query {
            filter,
            base_dn,
            one_level,
            all,
            attributes,
        } => {
            let mut options = QueryOptions::default()
                .subtree(!one_level)
                .single_result(!all);
            if !attributes.is_empty() {
                options = options.attributes(attributes);
            }
            if let Some(dn) = base_dn {
                options = options.base_dn(dn);
            }

            match session()?.ldap_query(&filter, &options)? {
                QueryResult::Value(value) => println!("{value}"),
                QueryResult::Entry(entry) => print_entry(&entry, raw),
                QueryResult::Entries(entries) => {
                    for entry in &entries {
                        print_entry(entry, raw);
                        println!();
                    }
                },
            }
        },
        Commands::Find {
            name,
            r#type,
            base_dn,
            attributes,
        } => {
            let attributes: Vec<&str> =
                attributes.iter().map(String::as_str).collect();
            let entry = session()?.find_object(
                &name,
                base_dn.as_deref(),
                r#type.into(),
                (!attributes.is_empty()).then_some(attributes.as_slice()),
            )?;
            print_entry(&entry, raw);
        },
        Commands::Move { dn, new_parent } => {
            println!("{}", session()?.move_object(&dn, &new_parent)?);
        },
        Commands::Password {
            dn,
            password,
            must_change,
        } => session()?.change_password(&dn, &password, must_change)?,
        Commands::Group { cmd } => {
            let mut tools = session()?;
            match cmd {
                GroupCommands::Create { name, dn } => {
                    tools.create_group(&name, &dn)?
                },
                GroupCommands::Add { member, group } => {
                    tools.member_add(&member, &group)?
                },
                GroupCommands::Del { group, member } => {
                    if !tools.member_del(member.as_deref(), &group)? {
                        println!("nothing removed from {group}");
                    }
                },
            }
        },
    }

    Ok(())
}

fn main() -> ExitCode {
    adtools::telemetry::init();
    let args = Args::parse();

    if let Some(path) = &args.messages {
        match MessageCatalog::read(path) {
            Ok(catalog) => {
                messages::install(catalog);
            },
            Err(err) => tracing::warn!(error = %err, "message catalog ignored"),
        }
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", messages::describe(&err));
            ExitCode::FAILURE
        },
    }
}
