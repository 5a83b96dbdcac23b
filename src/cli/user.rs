//! Commands for managing users.

use structopt::StructOpt;

use crate::{
    Config,
    Result,
    db,
    models::User,
    permissions::PermissionBits,
};
use super::util::{parse_permissions, permission_names, print_table};

#[derive(StructOpt)]
pub struct Opts {
    #[structopt(subcommand)]
    command: Command,
}

#[derive(StructOpt)]
pub enum Command {
    /// Add a new user
    #[structopt(name = "add")]
    Add(AddOpts),
    /// List all users
    #[structopt(name = "list")]
    List,
}

pub fn main(cfg: &Config, opts: Opts) -> Result<()> {
    match opts.command {
        Command::Add(opts) => add_user(cfg, opts),
        Command::List => list_users(cfg),
    }
}

#[derive(StructOpt)]
pub struct AddOpts {
    /// User's name
    name: String,
    /// User's email address. Accounts without one never receive
    /// notifications
    #[structopt(long = "email", short = "e")]
    email: Option<String>,
    /// User's password
    #[structopt(long = "password", short = "p")]
    password: String,
    /// Comma-separated list of permissions, e.g.
    /// "edit-edition,publish-edition"
    #[structopt(long = "permissions", parse(try_from_str = "parse_permissions"))]
    permissions: Option<PermissionBits>,
}

pub fn add_user(cfg: &Config, opts: AddOpts) -> Result<()> {
    let db = db::connect(cfg)?;
    let user = User::create(
        &db,
        opts.email.as_ref().map(String::as_str),
        &opts.name,
        &opts.password,
        opts.permissions.unwrap_or_else(PermissionBits::empty),
    )?;

    println!("Created user {}", user.id);

    Ok(())
}

pub fn list_users(cfg: &Config) -> Result<()> {
    let db = db::connect(cfg)?;
    let users = User::all(&db)?;

    let rows = users.iter()
        .map(|user| (
            user.id.to_string(),
            user.name.clone(),
            user.email.clone().unwrap_or_default(),
            permission_names(user.permissions()),
        ))
        .collect::<Vec<_>>();

    print_table(("ID", "Name", "Email", "Permissions"), &rows);

    Ok(())
}
