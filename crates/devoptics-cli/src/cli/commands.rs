use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        PossibleValuesParser,
    },
    Arg, ArgAction, ColorChoice, Command,
};

/// Role names accepted on the command line.
const ROLE_NAMES: [&str; 4] = ["admin", "manager", "analyst", "viewer"];

fn email_arg() -> Arg {
    Arg::new("email")
        .short('e')
        .long("email")
        .help("Account email")
        .env("DEVOPTICS_EMAIL")
        .required(true)
}

fn password_arg() -> Arg {
    Arg::new("password")
        .long("password")
        .help("Account password; prompted for when omitted")
        .env("DEVOPTICS_PASSWORD")
        .hide_env_values(true)
}

fn full_name_arg() -> Arg {
    Arg::new("full-name")
        .short('n')
        .long("full-name")
        .help("Full name")
        .required(true)
}

fn role_arg() -> Arg {
    Arg::new("role")
        .short('r')
        .long("role")
        .help("Account role")
        .default_value("viewer")
        .value_parser(PossibleValuesParser::new(ROLE_NAMES))
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("devoptics")
        .about("FBIS DevOptics session and access")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("api-url")
                .long("api-url")
                .help("API base URL, example: https://devoptics.tld/api/v1")
                .env("DEVOPTICS_API_URL")
                .global(true),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in and save the session")
                .arg(email_arg())
                .arg(password_arg()),
        )
        .subcommand(
            Command::new("signup")
                .about("Create an account and sign in")
                .arg(full_name_arg())
                .arg(email_arg())
                .arg(password_arg())
                .arg(role_arg()),
        )
        .subcommand(Command::new("logout").about("Forget the saved session"))
        .subcommand(Command::new("whoami").about("Show the signed-in user"))
        .subcommand(
            Command::new("access")
                .about("Show what the signed-in role may do")
                .arg(
                    Arg::new("all")
                        .short('a')
                        .long("all")
                        .help("Show the capabilities of every role")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("users")
                .about("Manage accounts")
                .subcommand_required(true)
                .subcommand(Command::new("list").about("List all accounts"))
                .subcommand(
                    Command::new("create")
                        .about("Create an account")
                        .arg(full_name_arg())
                        .arg(
                            Arg::new("email")
                                .short('e')
                                .long("email")
                                .help("Account email")
                                .required(true),
                        )
                        .arg(
                            Arg::new("password")
                                .long("password")
                                .help("Initial password; prompted for when omitted"),
                        )
                        .arg(role_arg()),
                )
                .subcommand(
                    Command::new("set-role")
                        .about("Change the role of an account")
                        .arg(Arg::new("user-id").help("Account id").required(true))
                        .arg(
                            Arg::new("role")
                                .help("New role")
                                .required(true)
                                .value_parser(PossibleValuesParser::new(ROLE_NAMES)),
                        ),
                ),
        )
        .subcommand(Command::new("overview").about("Show the administrative overview"))
        .subcommand(
            Command::new("cluster")
                .about("Show Kubernetes cluster health")
                .arg(Arg::new("name").help("Cluster name").required(true)),
        )
}
