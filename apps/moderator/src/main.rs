use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use moderation_core::{
    config::{load_settings, Settings},
    controller_for,
    dashboard::{fetch_dashboard_stats, stat_cards, Trend},
    ActionOutcome, ModerationListController, Notification, NotificationLevel,
};
use shared::domain::{EntityId, ModerationDomain, Role};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "moderator", about = "Review marketplace listings, users and interests")]
struct Cli {
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    /// Use the admin listing endpoints.
    #[arg(long)]
    admin: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Listings {
        #[command(subcommand)]
        action: ListAction,
    },
    Users {
        #[command(subcommand)]
        action: ListAction,
    },
    Interests {
        #[command(subcommand)]
        action: ListAction,
    },
    Dashboard,
}

#[derive(Subcommand, Debug)]
enum ListAction {
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    Approve {
        id: String,
    },
    Reject {
        id: String,
    },
    BulkApprove(BulkTargets),
    BulkReject(BulkTargets),
}

#[derive(Args, Debug)]
struct BulkTargets {
    #[arg(required_unless_present = "all")]
    ids: Vec<String>,
    /// Select everything the backend reports for the current filters.
    #[arg(long, conflicts_with = "ids")]
    all: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(token) = cli.token {
        settings.token = Some(token);
    }
    if cli.admin {
        settings.role = Role::Admin;
    }
    info!(base_url = %settings.base_url, role = ?settings.role, "moderator: settings loaded");

    match cli.command {
        Command::Listings { action } => run(ModerationDomain::Listings, action, &settings).await,
        Command::Users { action } => run(ModerationDomain::Users, action, &settings).await,
        Command::Interests { action } => run(ModerationDomain::Interests, action, &settings).await,
        Command::Dashboard => dashboard(&settings).await,
    }
}

async fn run(domain: ModerationDomain, action: ListAction, settings: &Settings) -> Result<()> {
    let controller = controller_for(domain, settings.api_client()?, settings);
    let mut events = controller.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(notification) => print_notification(&notification),
                Err(RecvError::Lagged(skipped)) => eprintln!("({skipped} notifications dropped)"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let result = dispatch(&controller, action).await;

    // Closing the channel lets the printer finish.
    drop(controller);
    let _ = printer.await;
    result
}

async fn dispatch(controller: &ModerationListController, action: ListAction) -> Result<()> {
    match action {
        ListAction::List { page, kind, status } => {
            let overrides: Vec<(&str, &str)> =
                [("type", kind.as_deref()), ("status", status.as_deref())]
                    .into_iter()
                    .filter_map(|(name, value)| value.map(|value| (name, value)))
                    .collect();
            let filters = controller.filters_with(&overrides).await?;
            controller.load_page(page, filters).await?;
            print_page(controller).await;
        }
        ListAction::Approve { id } => {
            report(controller.approve(&EntityId::new(id)).await?);
        }
        ListAction::Reject { id } => {
            report(controller.reject(&EntityId::new(id)).await?);
        }
        ListAction::BulkApprove(targets) => {
            select_targets(controller, targets).await?;
            report(controller.bulk_approve().await?);
        }
        ListAction::BulkReject(targets) => {
            select_targets(controller, targets).await?;
            report(controller.bulk_reject().await?);
        }
    }
    Ok(())
}

async fn select_targets(controller: &ModerationListController, targets: BulkTargets) -> Result<()> {
    if targets.all {
        controller.load_page(1, controller.filters().await).await?;
        controller.select_all().await?;
    } else {
        for id in targets.ids {
            controller.toggle_select(&EntityId::new(id)).await;
        }
    }
    Ok(())
}

async fn print_page(controller: &ModerationListController) {
    let page = controller.page().await;
    println!(
        "{} page {} of {}",
        controller.domain().plural(),
        page.page_number,
        page.total_pages
    );
    if page.items.is_empty() {
        println!("  (nothing to review)");
    }
    for entity in &page.items {
        let label = ["title", "name", "email", "listingType"]
            .iter()
            .find_map(|key| entity.attribute_str(key))
            .unwrap_or("-");
        let created = entity
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".into());
        print!("  {:<26} {:<9} {:<17} {label}", entity.id, entity.status, created);
        match entity.listing_detail_path() {
            Some(path) => println!("  {path}"),
            None => println!(),
        }
    }
}

fn report(outcome: ActionOutcome) {
    if outcome == ActionOutcome::Skipped {
        println!("nothing to do");
    }
}

fn print_notification(notification: &Notification) {
    let tag = match notification.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Info => "info",
        NotificationLevel::Warning => "warn",
        NotificationLevel::Error => "error",
    };
    eprintln!("[{tag}] {}", notification.message);
}

async fn dashboard(settings: &Settings) -> Result<()> {
    let api = settings.api_client()?;
    let stats = fetch_dashboard_stats(&api).await?;
    for card in stat_cards(&stats) {
        let arrow = match card.trend() {
            Trend::Increase => "+",
            Trend::Decrease => "-",
            Trend::Flat => " ",
        };
        let verdict = match card.is_favourable() {
            Some(true) => "good",
            Some(false) => "bad",
            None => "",
        };
        println!(
            "{:<32} {:>8}  {arrow}{:<6} {verdict}",
            card.title,
            card.value,
            card.change.abs()
        );
    }
    Ok(())
}
