use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::LevelFilter;
use std::time::Duration;

use smtp_config::email::{
    build_transport, sender_mailbox, with_auth_method, with_from, with_from_name, with_host, with_insecure_skip_verify,
    with_keep_alive, with_password, with_port, with_timeout, with_username,
};
use smtp_config::utils::io::{is_valid_email, prompt_with_confirmation, prompt_with_default};
use smtp_config::utils::logging::initialize_logging;
use smtp_config::{ConfigError, ConfigOption, ConfigStore, SmtpConfig};

// Flags that map one-to-one onto configuration options
fn field_args() -> Vec<Arg> {
    vec![
        Arg::new("host").long("host").value_name("HOST").help("SMTP server hostname"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .help("SMTP server port")
            .value_parser(value_parser!(u16)),
        Arg::new("username").long("username").value_name("USERNAME"),
        Arg::new("password").long("password").value_name("PASSWORD"),
        Arg::new("from").long("from").value_name("ADDRESS").help("Sender address"),
        Arg::new("from-name").long("from-name").value_name("NAME").help("Sender display name"),
        Arg::new("insecure-skip-verify")
            .long("insecure-skip-verify")
            .value_name("BOOL")
            .help("Accept invalid TLS certificates (true/false)")
            .value_parser(value_parser!(bool)),
        Arg::new("timeout")
            .long("timeout")
            .value_name("SECONDS")
            .help("Command timeout in seconds")
            .value_parser(value_parser!(u64)),
        Arg::new("keep-alive")
            .long("keep-alive")
            .value_name("BOOL")
            .help("Keep idle connections open (true/false)")
            .value_parser(value_parser!(bool)),
        Arg::new("auth-method")
            .long("auth-method")
            .value_name("METHOD")
            .help("SASL mechanism, e.g. PLAIN or LOGIN"),
        Arg::new("stored")
            .long("stored")
            .help("Start from the stored configuration instead of the defaults")
            .action(ArgAction::SetTrue),
    ]
}

/// Turn the field flags into options, ordered as they appeared on the command line
fn options_from_matches(matches: &ArgMatches) -> Vec<ConfigOption> {
    let mut indexed: Vec<(usize, ConfigOption)> = Vec::new();
    let mut push = |id: &str, option: ConfigOption| {
        let index = matches.index_of(id).unwrap_or(0);
        indexed.push((index, option));
    };

    if let Some(v) = matches.get_one::<String>("host") {
        push("host", with_host(v.as_str()));
    }
    if let Some(v) = matches.get_one::<u16>("port") {
        push("port", with_port(*v));
    }
    if let Some(v) = matches.get_one::<String>("username") {
        push("username", with_username(v.as_str()));
    }
    if let Some(v) = matches.get_one::<String>("password") {
        push("password", with_password(v.as_str()));
    }
    if let Some(v) = matches.get_one::<String>("from") {
        push("from", with_from(v.as_str()));
    }
    if let Some(v) = matches.get_one::<String>("from-name") {
        push("from-name", with_from_name(v.as_str()));
    }
    if let Some(v) = matches.get_one::<bool>("insecure-skip-verify") {
        push("insecure-skip-verify", with_insecure_skip_verify(*v));
    }
    if let Some(v) = matches.get_one::<u64>("timeout") {
        push("timeout", with_timeout(Duration::from_secs(*v)));
    }
    if let Some(v) = matches.get_one::<bool>("keep-alive") {
        push("keep-alive", with_keep_alive(*v));
    }
    if let Some(v) = matches.get_one::<String>("auth-method") {
        push("auth-method", with_auth_method(v.as_str()));
    }

    indexed.sort_by_key(|(index, _)| *index);
    indexed.into_iter().map(|(_, option)| option).collect()
}

fn resolve_config(matches: &ArgMatches) -> Result<SmtpConfig, ConfigError> {
    let mut config = if matches.get_flag("stored") {
        ConfigStore::new()?.load()?
    } else {
        SmtpConfig::default()
    };
    config.apply(options_from_matches(matches));
    Ok(config)
}

fn print_config(config: &SmtpConfig) {
    println!("Host: {}", config.host);
    println!("Port: {}", config.port);
    let password = if config.password.is_empty() { "(empty)" } else { "********" };
    println!("Username: {}", config.username);
    println!("Password: {}", password);
    println!("From: {}", config.from);
    println!("From name: {}", config.from_name);
    println!("Insecure skip verify: {}", config.insecure_skip_verify);
    println!("Timeout: {}s", config.timeout.as_secs());
    println!("Keep alive: {}", config.keep_alive);
    println!("Auth method: {}", config.auth_method);
}

fn setup() -> Result<(), ConfigError> {
    let store = ConfigStore::new()?;
    let current = store.load().unwrap_or_default();

    println!("\n=== SMTP Configuration Setup ===");

    let host = prompt_with_default("SMTP server", &current.host)?;
    let port = loop {
        let input = prompt_with_default("SMTP port", &current.port.to_string())?;
        match input.parse::<u16>() {
            Ok(p) => break p,
            Err(_) => println!("Invalid port number. Please enter a number between 0 and 65535."),
        }
    };
    let username = prompt_with_default("Username", &current.username)?;
    let password = rpassword::prompt_password("Password: ")?;
    let from = prompt_with_default("Sender address (empty: use username)", &current.from)?;
    if !from.is_empty() && !is_valid_email(&from) {
        println!("Warning: '{}' does not look like an email address.", from);
    }
    let from_name = prompt_with_default("Sender name", &current.from_name)?;
    let auth_method = prompt_with_default("Auth method", &current.auth_method)?;

    let config = SmtpConfig::new_validated(vec![
        with_host(host),
        with_port(port),
        with_username(username),
        with_password(password),
        with_from(from),
        with_from_name(from_name),
        with_insecure_skip_verify(current.insecure_skip_verify),
        with_timeout(current.timeout),
        with_keep_alive(current.keep_alive),
        with_auth_method(auth_method),
    ])?;

    store.save(&config)?;
    println!("\nSMTP configuration saved securely.");
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<bool, ConfigError> {
    match matches.subcommand() {
        Some(("show", sub)) => {
            print_config(&resolve_config(sub)?);
            Ok(true)
        }
        Some(("validate", sub)) => {
            let config = resolve_config(sub)?;
            match config.validate() {
                Ok(()) => {
                    println!("Configuration is valid");
                    Ok(true)
                }
                Err(e) => {
                    println!("Configuration is invalid: {}", e);
                    Ok(false)
                }
            }
        }
        Some(("check", sub)) => {
            let config = resolve_config(sub)?;
            build_transport(&config)?;
            let sender = sender_mailbox(&config)?;
            println!(
                "Transport settings are usable: {}:{} as {}",
                config.host, config.port, sender
            );
            Ok(true)
        }
        Some(("setup", _)) => setup().map(|_| true),
        Some(("delete", _)) => {
            if prompt_with_confirmation(
                "This removes the stored SMTP configuration.",
                "Continue?",
            )? {
                ConfigStore::new()?.delete()?;
                println!("Stored configuration deleted.");
            }
            Ok(true)
        }
        _ => Ok(true),
    }
}

fn main() {
    let matches = Command::new("smtp-config")
        .about("Inspect, validate and store SMTP client settings")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("show")
                .about("Print the resolved configuration")
                .args(field_args()),
        )
        .subcommand(
            Command::new("validate")
                .about("Check that the configuration has credentials")
                .args(field_args()),
        )
        .subcommand(
            Command::new("check")
                .about("Build an SMTP transport from the configuration without connecting")
                .args(field_args()),
        )
        .subcommand(Command::new("setup").about("Interactively store a configuration"))
        .subcommand(Command::new("delete").about("Remove the stored configuration"))
        .get_matches();

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    initialize_logging(level);

    match run(&matches) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
