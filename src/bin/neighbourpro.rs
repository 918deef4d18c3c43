//! neighbourpro CLI: operator interface to the marketplace core.

use std::sync::Arc;
use std::time::Duration;

use clap::{ArgGroup, Parser, Subcommand};
use neighbourpro::config::{Config, ExposeSecret};
use neighbourpro::db::Db;
use neighbourpro::engine::{Engine, ExpirySweeper};
use neighbourpro::model::{Coordinates, Identity, ProfessionId, Role, UserId, WorkOrderId};
use neighbourpro::telemetry::{TelemetryConfig, init_telemetry};

#[derive(Parser)]
#[command(name = "neighbourpro", about = "Neighbourhood services marketplace core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Rank workers for a profession around a location
    Rank {
        /// Profession id
        #[arg(long)]
        profession: i64,
        /// Requester latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Requester longitude
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        /// Rank on behalf of this user (their own profile is left out)
        #[arg(long)]
        as_user: Option<i64>,
        /// Maximum workers to show
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Work order operations
    Work {
        #[command(subcommand)]
        action: WorkAction,
    },
    /// Expire past-due pending work orders
    Sweep {
        /// Seconds between sweeps (defaults to EXPIRY_SWEEP_SECS)
        #[arg(long)]
        interval: Option<u64>,
        /// Sweep once and exit
        #[arg(long)]
        once: bool,
    },
}

#[derive(Subcommand)]
enum WorkAction {
    /// List work orders booked by or assigned to a user
    #[command(group(ArgGroup::new("party").required(true)))]
    List {
        /// Client user id
        #[arg(long, group = "party")]
        client: Option<i64>,
        /// Worker user id
        #[arg(long, group = "party")]
        worker: Option<i64>,
        /// Maximum orders to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show a work order
    Show {
        /// Work order id
        id: i64,
    },
}

/// The operator acts with admin rights.
fn operator() -> Identity {
    Identity::new(UserId(0), Role::Admin)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig::from_config("neighbourpro", &config))?;

    let db = Db::connect(config.database_url.expose_secret()).await?;
    if let Command::Migrate = cli.command {
        db.migrate().await?;
        println!("Migrations applied.");
        return Ok(());
    }
    db.health_check().await?;

    let sweep_interval = config.sweep_interval;
    let engine = Engine::new(db, config.weights)?;

    match cli.command {
        Command::Migrate => Ok(()),
        Command::Rank {
            profession,
            lat,
            lon,
            as_user,
            limit,
            json,
        } => cmd_rank(&engine, profession, lat, lon, as_user, limit, json).await,
        Command::Work { action } => match action {
            WorkAction::List {
                client,
                worker,
                limit,
            } => cmd_work_list(&engine, client, worker, limit).await,
            WorkAction::Show { id } => cmd_work_show(&engine, id).await,
        },
        Command::Sweep { interval, once } => {
            let interval = interval.map(Duration::from_secs).unwrap_or(sweep_interval);
            cmd_sweep(engine, interval, once).await
        }
    }
}

async fn cmd_rank(
    engine: &Engine<Db>,
    profession: i64,
    lat: f64,
    lon: f64,
    as_user: Option<i64>,
    limit: usize,
    json: bool,
) -> anyhow::Result<()> {
    let who = match as_user {
        Some(id) => Identity::new(UserId(id), Role::User),
        None => operator(),
    };
    let origin = Coordinates::new(lat, lon)?;
    let mut ranked = engine
        .rank_workers(&who, ProfessionId(profession), origin)
        .await?;
    ranked.truncate(limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }
    if ranked.is_empty() {
        println!("No workers found.");
        return Ok(());
    }

    println!(
        "{:<4}  {:<8}  {:>9}  {:>6}  {:>7}  {:>9}  {:>8}",
        "#", "WORKER", "RATE", "RATING", "REVIEWS", "DIST_KM", "SCORE"
    );
    println!("{}", "-".repeat(64));
    for (i, w) in ranked.iter().enumerate() {
        println!(
            "{:<4}  {:<8}  {:>9.2}  {:>6.2}  {:>7}  {:>9.2}  {:>8.3}",
            i + 1,
            w.worker_id,
            w.hourly_rate,
            w.avg_rating,
            w.review_count,
            w.distance_km,
            w.score
        );
    }
    Ok(())
}

async fn cmd_work_list(
    engine: &Engine<Db>,
    client: Option<i64>,
    worker: Option<i64>,
    limit: usize,
) -> anyhow::Result<()> {
    let who = operator();
    let mut orders = match (client, worker) {
        (Some(id), _) => engine.list_booked(&who, UserId(id)).await?,
        (None, Some(id)) => engine.list_assigned(&who, UserId(id)).await?,
        (None, None) => anyhow::bail!("one of --client or --worker is required"),
    };
    let total = orders.len();
    orders.truncate(limit);

    if orders.is_empty() {
        println!("No work orders found.");
        return Ok(());
    }

    println!(
        "{:<8}  {:<6}  {:<6}  {:<6}  {:<10}  {:<9}  {:<16}  {:>10}",
        "ID", "PROF", "CLIENT", "WORKER", "STATUS", "PAYMENT", "SCHEDULED", "EST_COST"
    );
    println!("{}", "-".repeat(86));
    for o in &orders {
        println!(
            "{:<8}  {:<6}  {:<6}  {:<6}  {:<10}  {:<9}  {:<16}  {:>10.2}",
            o.id,
            o.profession_id,
            o.booked_by,
            o.assigned_to,
            o.status,
            o.payment_status,
            o.scheduled_at().format("%Y-%m-%d %H:%M"),
            o.estimated_cost
        );
    }

    println!("\n{} of {total} work order(s)", orders.len());
    Ok(())
}

async fn cmd_work_show(engine: &Engine<Db>, id: i64) -> anyhow::Result<()> {
    let order = engine.get_work_order(&operator(), WorkOrderId(id)).await?;

    println!("ID:          {}", order.id);
    println!("Profession:  {}", order.profession_id);
    println!("Client:      {}", order.booked_by);
    println!("Worker:      {}", order.assigned_to);
    println!("Status:      {}", order.status);
    println!("Payment:     {}", order.payment_status);
    println!("Scheduled:   {}", order.scheduled_at());
    println!("Est. Cost:   {:.2}", order.estimated_cost);
    println!(
        "Final Cost:  {}",
        order
            .final_cost
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".to_string())
    );
    if !order.tags.is_empty() {
        println!("Tags:        {}", order.tags.join(", "));
    }
    if let Some(ref description) = order.description {
        println!("Description: {description}");
    }
    println!("Created:     {}", order.created_at);
    println!("Modified:    {}", order.modified_at);
    Ok(())
}

async fn cmd_sweep(engine: Engine<Db>, interval: Duration, once: bool) -> anyhow::Result<()> {
    if once {
        let expired = engine.expire_overdue().await?;
        println!("Expired {} work order(s).", expired.len());
        return Ok(());
    }

    let sweeper = ExpirySweeper::new(Arc::new(engine), interval);
    let handle = sweeper.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        handle.shutdown();
    });

    sweeper.run().await?;
    Ok(())
}
