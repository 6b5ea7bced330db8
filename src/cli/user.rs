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

use rand::{rngs::OsRng, Rng};

use super::main::{UserAddSubcommand, UserAliasSubcommand, UserSubcommand};
use crate::account::identity::{IdentityManager, ProvisionState};
use crate::support::error::Error;
use crate::support::sysexits::*;
use crate::support::system_config::SystemConfig;

pub(super) fn main(
    cmd: UserSubcommand,
    system_config: &SystemConfig,
    identity: IdentityManager,
) {
    match cmd {
        UserSubcommand::Add(cmd) => add(cmd, &identity),
        UserSubcommand::Passwd(cmd) => passwd(&cmd.name, &identity),
        UserSubcommand::Alias(cmd) => alias(cmd, system_config, &identity),
        UserSubcommand::Address(cmd) => address(&cmd.name, &identity),
        UserSubcommand::Provision(cmd) => provision(&cmd.name, &identity),
        UserSubcommand::Login(cmd) => login(&cmd.name, &identity),
    }
}

fn add(cmd: UserAddSubcommand, identity: &IdentityManager) {
    // Ask for the password before spending minutes on key generation
    let password = if cmd.prompt_password {
        read_new_password()
    } else {
        let data: [u8; 8] = OsRng.gen();
        base64::encode(data)
    };

    let state = match identity.create_account(&cmd.name) {
        Ok(state) => state,
        Err(e) => die_with(&cmd.name, e),
    };

    if let Err(e) = identity.change_password(&cmd.name, &password) {
        die!(EX_SOFTWARE, "Error setting password: {}", e);
    }

    if !cmd.prompt_password {
        println!("Password: {}", password);
    }

    report_state(&cmd.name, state);
}

fn passwd(name: &str, identity: &IdentityManager) {
    let password = read_new_password();
    if let Err(e) = identity.change_password(name, &password) {
        die_with(name, e);
    }
}

fn alias(
    cmd: UserAliasSubcommand,
    system_config: &SystemConfig,
    identity: &IdentityManager,
) {
    if !system_config.node.alias_registration {
        die!(EX_CONFIG, "Alias registration is disabled");
    }

    match identity.add_short_address(&cmd.name, &cmd.alias) {
        Ok(()) => address(&cmd.name, identity),
        Err(e) => die_with(&cmd.name, e),
    }
}

fn address(name: &str, identity: &IdentityManager) {
    match identity.derive_address(name) {
        Ok(Some(address)) => println!("{}", address),
        Ok(None) => die!(
            EX_TEMPFAIL,
            "'{}' has no address yet; try `user provision {}`",
            name,
            name
        ),
        Err(e) => die_with(name, e),
    }
}

fn provision(name: &str, identity: &IdentityManager) {
    if let Err(e) = identity.provision(name) {
        die_with(name, e);
    }

    match identity.provision_state(name) {
        Ok(state) => report_state(name, state),
        Err(e) => die_with(name, e),
    }
}

fn login(name: &str, identity: &IdentityManager) {
    let password = match rpassword::read_password_from_tty(Some("Password: "))
    {
        Ok(password) => password,
        Err(e) => die!(EX_NOINPUT, "Failed to read password: {}", e),
    };

    if identity.authenticate(name, &password) {
        println!("Login OK");
    } else {
        die!(EX_NOPERM, "Login failed");
    }
}

fn read_new_password() -> String {
    match rpassword::read_password_from_tty(Some("Password: ")).and_then(|a| {
        rpassword::read_password_from_tty(Some("Confirm: ")).map(|b| (a, b))
    }) {
        Err(e) => die!(EX_NOINPUT, "Failed to read password: {}", e),
        Ok((a, b)) if a != b => die!(EX_DATAERR, "Passwords don't match"),
        Ok((a, _)) if a.is_empty() => die!(EX_NOINPUT, "No password given"),
        Ok((a, _)) => a,
    }
}

fn report_state(name: &str, state: ProvisionState) {
    match state {
        ProvisionState::Complete => {
            println!("Account '{}' is fully provisioned", name)
        },
        ProvisionState::NeedsMailsite => println!(
            "Account '{}' still needs mailsite keys; the node was \
             unreachable. Run `user provision {}` to retry.",
            name, name
        ),
        ProvisionState::NeedsAsymmetricKey => println!(
            "Account '{}' still needs its asymmetric key pair. Run \
             `user provision {}` to retry.",
            name, name
        ),
        ProvisionState::Fresh => println!(
            "Account '{}' has no keys yet. Run `user provision {}` to retry.",
            name, name
        ),
    }
}

fn die_with(name: &str, e: Error) -> ! {
    match e {
        Error::UnsafeName => die!(EX_USAGE, "Invalid name: {}", e),
        Error::AccountExists => {
            die!(EX_CANTCREAT, "User '{}' already exists", name)
        },
        Error::NxAccount => die!(EX_NOUSER, "No such user '{}'", name),
        Error::AliasRejected => {
            die!(EX_UNAVAILABLE, "The network refused the alias")
        },
        Error::NetworkUnavailable | Error::KeyGenerationIncomplete => {
            die!(EX_TEMPFAIL, "{}; try again later", e)
        },
        Error::CorruptAccount(..) => {
            die!(EX_DATAERR, "Account '{}' is damaged: {}", name, e)
        },
        e => die!(EX_SOFTWARE, "Unexpected error: {}", e),
    }
}
