use miette::{Result, miette};
use ode_core::author::{
    AuthorStore, NewAuthor, promote_by_secret_key, register_author, require_author,
};
use ode_core::db::Db;
use ode_server::auth::hash_password;
use owo_colors::OwoColorize;

use crate::output::Output;

pub struct CreateArgs {
    pub username: String,
    pub password: String,
    pub bio: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub staff: bool,
}

/// Register an author and print the token they were issued
pub async fn create(db: &Db, args: CreateArgs) -> Result<()> {
    let output = Output::new();

    let author = NewAuthor {
        password_hash: hash_password(&args.password)?,
        first_name: args.first_name,
        last_name: args.last_name,
        email: args.email,
        is_staff: args.staff,
        bio: args.bio,
        ..NewAuthor::new(args.username, "")
    };

    let (author, token) = register_author(db, author).await?;

    output.success(&format!(
        "Created author {}",
        author.username.bright_cyan()
    ));
    output.kv("Id", &author.id.value().to_string());
    output.kv("Staff", &author.is_staff.to_string());
    output.kv("Token", &token.key.bright_yellow().to_string());
    output.kv(
        "Promotion link",
        &format!("/api/authors/authenticate/{}/", author.secret_key),
    );

    Ok(())
}

/// Mark an author as authenticated, as if they had followed their link
pub async fn promote(db: &Db, username: &str) -> Result<()> {
    let output = Output::new();
    let author = require_author(db, username).await?;

    if author.authenticated {
        output.status(&format!("{} is already authenticated", author.username));
        return Ok(());
    }

    let author = promote_by_secret_key(db, author.secret_key).await?;
    output.success(&format!(
        "{} is now authenticated",
        author.username.bright_cyan()
    ));
    Ok(())
}

/// Print an author's token, bare, so it can be piped
pub async fn token(db: &Db, username: &str) -> Result<()> {
    let author = require_author(db, username).await?;
    let token = db
        .token_for_author(author.id)
        .await?
        .ok_or_else(|| miette!("{} has no token", author.username))?;

    println!("{}", token.key);
    Ok(())
}
