//! Prints a collection's moderation queue and optionally moderates one item

use ao3_collections::networking::{Ao3Session, ClientConfig, Session};
use ao3_collections::utils::collection_id_from_url;
use ao3_collections::{Ao3ApiError, Collection, ModerationAction, QueueFilter};
use clap::Parser;
use log::info;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "ao3-collections", version, about = "Browse and moderate AO3 collections")]
struct Cli {
    /// Collection url or id, e.g. https://archiveofourown.org/collections/L_GSTest
    collection: String,

    /// Login file: username on the first line, password on the second
    #[arg(short, long)]
    login: Option<String>,

    /// Queue to show: awaiting_approval, invited, rejected or approved
    #[arg(short, long, default_value = "awaiting_approval")]
    filter: String,

    /// Logical item number to moderate
    #[arg(short, long)]
    item: Option<usize>,

    /// Action for --item: approve, reject, remove or unreview
    #[arg(short, long)]
    action: Option<String>,

    /// Seconds to wait after each page fetch
    #[arg(long, default_value_t = 0)]
    delay: u64,
}

fn main() -> Result<(), Ao3ApiError> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = ClientConfig {
        request_delay: Duration::from_secs(cli.delay),
        ..ClientConfig::default()
    };
    let session: Arc<dyn Session> = match &cli.login {
        Some(path) => Arc::new(Ao3Session::from_login_file(config, path)?),
        None => Arc::new(Ao3Session::guest(config)?),
    };

    let id = collection_id_from_url(&cli.collection).unwrap_or_else(|| cli.collection.clone());
    let mut collection = Collection::new(id, session, true)?;
    info!("Collection ID: {}", collection.id());
    println!("{}", collection.name()?);

    let filter: QueueFilter = cli.filter.parse()?;
    let action = cli
        .action
        .as_deref()
        .map(str::parse::<ModerationAction>)
        .transpose()?;
    if let Some(receipt) = collection.moderate(cli.item, action, filter)? {
        println!(
            "{} item {}: {}",
            receipt.action, receipt.entry.index, receipt.entry.item
        );
    }

    collection.print_management_list(filter)
}
