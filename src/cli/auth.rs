//! Authentication CLI command handlers

use std::io::{self, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use secrecy::SecretString;

use crate::cli::commands::{AccountArgs, AuthCommand, PagingArgs};
use crate::cli::context::Context;
use crate::core::credentials::CredentialStore;
use crate::error::{GistError, Result};
use crate::github::authorizations::{Authorization, AuthorizationHandler};
use crate::github::client::GitHubClient;

/// Handle authentication commands
pub async fn handle_auth(ctx: &Context, command: AuthCommand) -> Result<()> {
    match command {
        AuthCommand::Login {
            account,
            note,
            name,
            default,
            force,
        } => handle_login(ctx, account, note, name, default, force).await,
        AuthCommand::List { ids, account } => handle_list(ctx, ids, account).await,
        AuthCommand::Delete { ids, account } => handle_delete(ctx, ids, account).await,
        AuthCommand::Status => handle_status(ctx),
        AuthCommand::Logout { name } => handle_logout(ctx, name),
    }
}

/// Handle the login command: create a token and store it
async fn handle_login(
    ctx: &Context,
    account: AccountArgs,
    note: Option<String>,
    name: String,
    default: bool,
    force: bool,
) -> Result<()> {
    // A default entry always replaces one of the same name
    let replace = force || default;

    // Fail before creating a token that could not be stored
    if !replace && ctx.store().vault()?.contains(&name) {
        return Err(GistError::VaultConflict(name));
    }

    let client = ctx.client()?;
    let (username, password) = prompt_account(&account)?;
    let handler = authorizations(&client, &username, password, account.otp);

    println!("Creating a gist-scoped token for {}...", username);
    let authorization = handler.create(note.as_deref().unwrap_or("")).await?;

    let credentials = authorization.to_credentials(&username);
    ctx.store().store(&name, credentials, default, replace)?;

    println!();
    println!(
        "✓ Created token {} ({}).",
        authorization.id,
        authorization.note.as_deref().unwrap_or("gist-shell")
    );
    println!(
        "  Stored as '{}' in {}{}",
        name,
        ctx.store().vault_path().display(),
        if default { " (default)" } else { "" }
    );
    Ok(())
}

/// Handle listing gist-shell tokens
async fn handle_list(ctx: &Context, ids: Vec<u64>, account: AccountArgs) -> Result<()> {
    let client = ctx.client()?;
    let (username, password) = prompt_account(&account)?;
    let handler = authorizations(&client, &username, password, account.otp)
        .with_cursor(ctx.cursor(&PagingArgs::default()));

    let found = handler.list(&ids).await?;

    if found.is_empty() {
        println!("No gist-shell tokens found.");
        return Ok(());
    }

    println!("gist-shell tokens for {}:\n", username);
    for authorization in &found {
        print_authorization(authorization);
    }
    Ok(())
}

/// Handle revoking gist-shell tokens
async fn handle_delete(ctx: &Context, ids: Vec<u64>, account: AccountArgs) -> Result<()> {
    let client = ctx.client()?;
    let (username, password) = prompt_account(&account)?;
    let handler = authorizations(&client, &username, password, account.otp)
        .with_cursor(ctx.cursor(&PagingArgs::default()));

    if handler.delete(&ids).await? {
        println!("✓ Revoked the selected gist-shell tokens.");
        Ok(())
    } else {
        Err(GistError::InvalidInput(
            "Some tokens could not be revoked. Run 'gist auth list' to see what is left.".into(),
        ))
    }
}

/// Handle the status command
fn handle_status(ctx: &Context) -> Result<()> {
    if std::env::var("GITHUB_TOKEN").map(|t| !t.is_empty()).unwrap_or(false) {
        println!("Using the token from GITHUB_TOKEN (vault is bypassed).");
        println!();
    }

    let vault = ctx.store().vault()?;
    println!("Vault: {}", ctx.store().vault_path().display());

    if vault.is_empty() {
        println!("  No stored credentials.");
        println!();
        println!("  Run 'gist auth login' to create a token.");
        return Ok(());
    }

    for name in vault.names() {
        let Some(entry) = vault.entry(name)? else {
            continue;
        };
        let credentials = &entry.credentials;
        println!(
            "  {}{}",
            name,
            if entry.default { " (default)" } else { "" }
        );
        if let Some(username) = &credentials.username {
            println!("    User:    {}", username);
        }
        let masked = CredentialStore::mask_token(&credentials.secret_token());
        match credentials.id {
            Some(id) => println!("    Token:   {} (id {})", masked, id),
            None => println!("    Token:   {}", masked),
        }
        if let Some(created_at) = &credentials.created_at {
            println!("    Created: {}", created_at);
        }
    }
    Ok(())
}

/// Handle the logout command
fn handle_logout(ctx: &Context, name: Option<String>) -> Result<()> {
    let name = match name.or_else(|| ctx.credential().map(String::from)) {
        Some(name) => name,
        None => ctx
            .store()
            .vault()?
            .default_name()
            .map(String::from)
            .ok_or_else(|| GistError::NotFound("Default credentials".into()))?,
    };

    ctx.store().forget(&name)?;

    println!("✓ Removed '{}' from the vault.", name);
    println!("  The token itself is still valid; revoke it with 'gist auth delete'.");
    Ok(())
}

fn authorizations<'a>(
    client: &'a GitHubClient,
    username: &str,
    password: SecretString,
    otp: Option<String>,
) -> AuthorizationHandler<'a> {
    AuthorizationHandler::new(client, username, password).with_otp(otp)
}

fn print_authorization(authorization: &Authorization) {
    println!(
        "  {}  {}",
        authorization.id,
        authorization.note.as_deref().unwrap_or("")
    );
    if let Some(created_at) = &authorization.created_at {
        println!("    Created: {}", created_at);
    }
    if let Some(fingerprint) = &authorization.fingerprint {
        println!("    Fingerprint: {}", fingerprint);
    }
}

/// Username from the flags (or prompt) and password from a prompt
fn prompt_account(account: &AccountArgs) -> Result<(String, SecretString)> {
    let username = match &account.username {
        Some(username) => username.clone(),
        None => prompt("GitHub username: ")?,
    };
    let password = prompt_hidden("GitHub password: ")?;
    Ok((username, SecretString::from(password)))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    require_input(label, input.trim().to_string())
}

/// Prompt without echoing the typed characters
fn prompt_hidden(label: &str) -> Result<String> {
    // Piped input has nothing to hide
    if !io::stdin().is_terminal() {
        return prompt(label);
    }

    print!("{}", label);
    io::stdout().flush()?;

    enable_raw_mode()?;
    let input = read_hidden();
    disable_raw_mode()?;
    println!();

    require_input(label, input?)
}

fn read_hidden() -> Result<String> {
    let mut input = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            if let Some(done) = hidden_key(&mut input, key) {
                return done;
            }
        }
    }
}

/// Apply one key press to hidden input; `Some` once the input is finished
fn hidden_key(input: &mut String, key: KeyEvent) -> Option<Result<String>> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Enter => Some(Ok(std::mem::take(input))),
        KeyCode::Esc => Some(Err(GistError::InvalidInput("Prompt cancelled".into()))),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Err(GistError::InvalidInput("Prompt cancelled".into())))
        }
        KeyCode::Char(c) => {
            input.push(c);
            None
        }
        KeyCode::Backspace => {
            input.pop();
            None
        }
        _ => None,
    }
}

fn require_input(label: &str, input: String) -> Result<String> {
    if input.is_empty() {
        return Err(GistError::InvalidInput(format!(
            "No {} provided",
            label.trim_end_matches(": ").to_lowercase()
        )));
    }
    Ok(input)
}
