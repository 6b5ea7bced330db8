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

use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unsafe account, folder, or alias name")]
    UnsafeName,
    #[error("Account already exists")]
    AccountExists,
    #[error("No such account")]
    NxAccount,
    #[error("Account file corrupt: {0}")]
    CorruptAccount(&'static str),
    #[error("Mailbox already exists")]
    MailboxExists,
    #[error("No such mailbox")]
    NxMailbox,
    #[error("Mailbox has inferiors")]
    MailboxHasInferiors,
    #[error("No unused message UIDs left in mailbox")]
    UidsExhausted,
    #[error("Operation not allowed on INBOX")]
    BadOperationOnInbox,
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Unable to reach the network node")]
    NetworkUnavailable,
    #[error("Alias registration rejected")]
    AliasRejected,
    #[error("Key generation did not complete")]
    KeyGenerationIncomplete,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Ssl(#[from] openssl::error::ErrorStack),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}
