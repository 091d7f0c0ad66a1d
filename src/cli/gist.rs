//! Gist CLI command handlers

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tracing::warn;

use crate::cli::commands::{GistCommand, PagingArgs};
use crate::cli::context::Context;
use crate::core::git::{self, GistRepository, GitIdentity};
use crate::core::identity;
use crate::error::{GistError, Result};
use crate::github::gists::{FileChange, FileChanges, Gist, GistHandler, ListOptions};
use crate::github::GitHubClient;

/// Files read from disk, split by whether the API can carry them
#[derive(Debug, Default)]
struct LocalFiles {
    text: BTreeMap<String, String>,
    binary: Vec<PathBuf>,
}

impl LocalFiles {
    /// Read `paths`; gist files are flat, so two paths may not share a file name
    fn read(paths: &[PathBuf]) -> Result<Self> {
        let mut files = Self::default();
        let mut names = BTreeSet::new();
        for path in paths {
            let name = file_name(path)?;
            if !names.insert(name.clone()) {
                return Err(GistError::InvalidInput(format!(
                    "More than one file is named '{}'.",
                    name
                )));
            }
            match String::from_utf8(fs::read(path)?) {
                Ok(content) => {
                    files.text.insert(name, content);
                }
                Err(_) => files.binary.push(path.clone()),
            }
        }
        Ok(files)
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(String::from)
        .ok_or_else(|| GistError::InvalidInput(format!("Not a file: {}", path.display())))
}

/// Handle gist commands
pub async fn handle_gist(ctx: &Context, command: GistCommand) -> Result<()> {
    let client = ctx.client()?;

    match command {
        GistCommand::List {
            user,
            starred,
            since,
            paging,
        } => {
            let options = ListOptions {
                user,
                starred,
                since,
            };
            handle_list(ctx, &client, &options, &paging).await
        }
        GistCommand::Get { id, revision } => {
            handle_get(ctx, &client, &id, revision.as_deref()).await
        }
        GistCommand::Create {
            files,
            description,
            public,
        } => handle_create(ctx, &client, &files, description.as_deref(), public).await,
        GistCommand::Update {
            id,
            files,
            description,
            remove,
        } => handle_update(ctx, &client, &id, &files, description.as_deref(), &remove).await,
        GistCommand::Delete { id } => {
            handler(ctx, &client)?.delete(&id).await?;
            println!("✓ Deleted gist {}", id);
            Ok(())
        }
        GistCommand::Star { id } => {
            handler(ctx, &client)?.star(&id).await?;
            println!("✓ Starred gist {}", id);
            Ok(())
        }
        GistCommand::Unstar { id } => {
            handler(ctx, &client)?.unstar(&id).await?;
            println!("✓ Unstarred gist {}", id);
            Ok(())
        }
        GistCommand::Starred { id } => {
            if handler(ctx, &client)?.is_starred(&id).await? {
                println!("Gist {} is starred.", id);
            } else {
                println!("Gist {} is not starred.", id);
            }
            Ok(())
        }
        GistCommand::Fork { id } => {
            let fork = handler(ctx, &client)?.fork(&id).await?;
            println!("✓ Forked gist {} as {}", id, fork.id);
            println!("  {}", fork.html_url);
            Ok(())
        }
        GistCommand::Commits { id, paging } => handle_commits(ctx, &client, &id, &paging).await,
        GistCommand::Forks { id, paging } => handle_forks(ctx, &client, &id, &paging).await,
    }
}

fn handler<'a>(ctx: &Context, client: &'a GitHubClient) -> Result<GistHandler<'a>> {
    Ok(GistHandler::new(client, ctx.token()?))
}

async fn handle_list(
    ctx: &Context,
    client: &GitHubClient,
    options: &ListOptions,
    paging: &PagingArgs,
) -> Result<()> {
    let gists = handler(ctx, client)?
        .with_cursor(ctx.cursor(paging))
        .list(options)
        .await?;

    if gists.is_empty() {
        println!("No gists found.");
        return Ok(());
    }

    for gist in &gists {
        print_summary(gist);
    }
    Ok(())
}

async fn handle_get(
    ctx: &Context,
    client: &GitHubClient,
    id: &str,
    revision: Option<&str>,
) -> Result<()> {
    let gist = handler(ctx, client)?.get(id, revision).await?;

    print_summary(&gist);
    println!("  {}", gist.html_url);
    println!("  Updated: {}", gist.updated_at.format("%Y-%m-%d %H:%M"));

    for file in gist.files.values() {
        println!();
        println!(
            "── {} ({}, {} bytes) ──",
            file.filename,
            file.language.as_deref().unwrap_or("text"),
            file.size
        );
        match &file.content {
            Some(content) => println!("{}", content),
            None => println!("(content not included)"),
        }
        if file.truncated {
            if let Some(raw_url) = &file.raw_url {
                println!("(truncated; full file at {})", raw_url);
            }
        }
    }
    Ok(())
}

async fn handle_create(
    ctx: &Context,
    client: &GitHubClient,
    paths: &[PathBuf],
    description: Option<&str>,
    public: bool,
) -> Result<()> {
    let token = ctx.require_token()?;
    let handler = GistHandler::new(client, Some(token.clone()));
    let mut files = LocalFiles::read(paths)?;

    // Binary content goes through git; the API needs at least one text file
    let stub = if files.binary.is_empty() {
        None
    } else {
        let (name, content) = git::stub_file();
        files.text.insert(name.clone(), content);
        Some(name)
    };

    let gist = handler.create(&files.text, description, public).await?;

    if !files.binary.is_empty() {
        if let Err(e) = push_binaries(&handler, &gist, &files.binary, stub.as_deref(), &token).await
        {
            // Do not leave a gist holding only the placeholder behind
            if let Err(cleanup) = handler.delete(&gist.id).await {
                warn!(id = %gist.id, error = %cleanup, "could not delete placeholder gist");
            }
            return Err(e);
        }
    }

    println!("✓ Created gist {}", gist.id);
    println!("  {}", gist.html_url);
    Ok(())
}

async fn handle_update(
    ctx: &Context,
    client: &GitHubClient,
    id: &str,
    paths: &[PathBuf],
    description: Option<&str>,
    remove: &[String],
) -> Result<()> {
    let token = ctx.require_token()?;
    let handler = GistHandler::new(client, Some(token.clone()));
    let files = LocalFiles::read(paths)?;

    let mut changes = FileChanges::new();
    for (name, content) in files.text {
        changes.insert(
            name,
            Some(FileChange {
                content: Some(content),
                filename: None,
            }),
        );
    }
    for name in remove {
        changes.insert(name.clone(), None);
    }

    if changes.is_empty() && description.is_none() && files.binary.is_empty() {
        return Err(GistError::InvalidInput(
            "Nothing to update: pass files, --remove or --description.".into(),
        ));
    }

    let gist = if changes.is_empty() && description.is_none() {
        handler.get(id, None).await?
    } else {
        handler.update(id, &changes, description).await?
    };

    if !files.binary.is_empty() {
        push_binaries(&handler, &gist, &files.binary, None, &token).await?;
    }

    println!("✓ Updated gist {}", gist.id);
    println!("  {}", gist.html_url);
    Ok(())
}

/// Push files the API cannot carry through the gist's git repository
async fn push_binaries(
    handler: &GistHandler<'_>,
    gist: &Gist,
    files: &[PathBuf],
    stub: Option<&str>,
    token: &SecretString,
) -> Result<()> {
    let email = match handler.primary_email().await {
        Ok(email) => email,
        Err(e) => {
            warn!(error = %e, "primary email lookup failed, committing with a noreply address");
            None
        }
    };
    let identity = GitIdentity::new(identity::user_name(), email);

    println!("Pushing {} binary file(s) through git...", files.len());
    let repository = GistRepository::checkout(&gist.git_pull_url)?;
    repository.upload(files, stub, &identity, &gist.git_push_url, token)
}

async fn handle_commits(
    ctx: &Context,
    client: &GitHubClient,
    id: &str,
    paging: &PagingArgs,
) -> Result<()> {
    let commits = handler(ctx, client)?
        .with_cursor(ctx.cursor(paging))
        .commits(id)
        .await?;

    for commit in &commits {
        let version = &commit.version[..7.min(commit.version.len())];
        println!(
            "  {}  {}  +{} -{}  {}",
            version,
            commit.committed_at.format("%Y-%m-%d %H:%M"),
            commit.change_status.additions,
            commit.change_status.deletions,
            commit
                .user
                .as_ref()
                .map(|user| user.login.as_str())
                .unwrap_or("unknown")
        );
    }
    Ok(())
}

async fn handle_forks(
    ctx: &Context,
    client: &GitHubClient,
    id: &str,
    paging: &PagingArgs,
) -> Result<()> {
    let forks = handler(ctx, client)?
        .with_cursor(ctx.cursor(paging))
        .forks(id)
        .await?;

    if forks.is_empty() {
        println!("Gist {} has no forks.", id);
        return Ok(());
    }

    for fork in &forks {
        println!(
            "  {}  {}  {}",
            fork.id,
            fork.user
                .as_ref()
                .map(|user| user.login.as_str())
                .unwrap_or("unknown"),
            fork.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

fn print_summary(gist: &Gist) {
    let visibility = if gist.public { "public" } else { "secret" };
    let files: Vec<&str> = gist.files.keys().map(String::as_str).collect();
    println!(
        "{}  [{}]  {}",
        gist.id,
        visibility,
        gist.description.as_deref().filter(|d| !d.is_empty()).unwrap_or("(no description)")
    );
    println!("  {}", files.join(", "));
}
