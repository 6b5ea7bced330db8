//-
// Copyright (c) 2026, Freemail Developers
//
// This file is part of Freemail.
//
// Freemail is free software: you can  redistribute it and/or modify it under
// the terms of the GNU General Public  License as published by the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Freemail is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or FITNESS
// FOR  A PARTICULAR  PURPOSE.  See the  GNU General  Public  License for  more
// details.
//
// You should have received a copy of the GNU General Public License along with
// Freemail. If not, see <http://www.gnu.org/licenses/>.

use std::path::PathBuf;
use std::sync::Arc;

use structopt::StructOpt;

use crate::account::identity::IdentityManager;
use crate::node::{AliasRegistrar, KeyPairGenerator, LoopbackNode};
use crate::support::log_prefix::LogPrefix;
use crate::support::sysexits::*;
use crate::support::system_config::{NodeMode, SystemConfig};

#[derive(StructOpt)]
#[structopt(max_term_width = 80)]
struct Options {
    /// The directory containing `freemail.toml` and `logging.toml`.
    #[structopt(long, parse(from_os_str), default_value = ".")]
    root: PathBuf,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt)]
enum Command {
    /// Manage user accounts.
    User(UserSubcommand),
}

#[derive(StructOpt)]
pub(super) enum UserSubcommand {
    /// Create a new account.
    ///
    /// This generates the account's keys, which can take several minutes.
    /// If the node cannot be reached or key generation runs out of time, the
    /// account is still created; run `user provision` later to finish it.
    Add(UserAddSubcommand),
    /// Set the password of an account.
    Passwd(UserNameArg),
    /// Register a short alias address for an account.
    Alias(UserAliasSubcommand),
    /// Print the address of an account.
    Address(UserNameArg),
    /// Generate whatever keys an account is still missing.
    Provision(UserNameArg),
    /// Check a password against an account.
    Login(UserNameArg),
}

#[derive(StructOpt)]
pub(super) struct UserAddSubcommand {
    /// Prompt for the password instead of generating one.
    #[structopt(long)]
    pub(super) prompt_password: bool,

    /// Name of the account to create.
    pub(super) name: String,
}

#[derive(StructOpt)]
pub(super) struct UserNameArg {
    /// Name of the account.
    pub(super) name: String,
}

#[derive(StructOpt)]
pub(super) struct UserAliasSubcommand {
    /// Name of the account.
    pub(super) name: String,

    /// The alias, which becomes the address `anything@<alias>.freemail`.
    pub(super) alias: String,
}

pub fn main() {
    // Clap exits with status 1 instead of EX_USAGE if we use the more concise
    // API
    let options = Options::from_clap(&match Options::clap().get_matches_safe()
    {
        Ok(matches) => matches,
        Err(
            e @ clap::Error {
                kind: clap::ErrorKind::HelpDisplayed,
                ..
            },
        )
        | Err(
            e @ clap::Error {
                kind: clap::ErrorKind::VersionDisplayed,
                ..
            },
        ) => {
            println!("{}", e.message);
            return;
        },
        Err(e) => {
            eprintln!("{}", e.message);
            EX_USAGE.exit()
        },
    });

    let root = options.root;
    let system_config = match SystemConfig::load(&root) {
        Ok(config) => config,
        Err(e) => die!(
            EX_CONFIG,
            "Error in config file at '{}': {}",
            root.join("freemail.toml").display(),
            e
        ),
    };

    init_logging(&root);

    let node = match system_config.node.mode {
        NodeMode::Loopback => Arc::new(LoopbackNode::new()),
    };
    let identity = IdentityManager::new(
        LogPrefix::new("admin".to_owned()),
        system_config.accounts_root(&root),
        system_config.keygen.clone(),
        Arc::clone(&node) as Arc<dyn KeyPairGenerator>,
        node as Arc<dyn AliasRegistrar>,
    );

    match options.cmd {
        Command::User(cmd) => super::user::main(cmd, &system_config, identity),
    }
}

fn init_logging(root: &std::path::Path) {
    if Ok(true) == nix::unistd::isatty(2) {
        // Running interactively; ignore logging configuration and just write
        // to stderr.
        crate::init_simple_log();
        return;
    }

    let log_config_file = root.join("logging.toml");
    if log_config_file.is_file() {
        if let Err(e) = log4rs::init_file(
            &log_config_file,
            log4rs::file::Deserializers::default(),
        ) {
            die!(
                EX_CONFIG,
                "Failed to initialise logging from '{}': {}",
                log_config_file.display(),
                e
            );
        }
    } else {
        let formatter = syslog::Formatter3164 {
            facility: syslog::Facility::LOG_MAIL,
            hostname: None,
            process: env!("CARGO_PKG_NAME").to_owned(),
            pid: nix::unistd::getpid().as_raw(),
        };
        let logger = match syslog::unix(formatter) {
            Ok(logger) => logger,
            Err(e) => die!(EX_UNAVAILABLE, "Failed to connect to syslog: {}", e),
        };
        if let Err(e) =
            log::set_boxed_logger(Box::new(syslog::BasicLogger::new(logger)))
        {
            die!(EX_SOFTWARE, "Failed to initialise logging: {}", e);
        }
        log::set_max_level(log::LevelFilter::Info);
    }
}
