//! Command-line front end for the Staybook client.
//!
//! Configuration comes from `STAYBOOK_*` environment variables; logs go to
//! stderr and are filtered by `RUST_LOG`.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use staybook_client::guard::Decision;
use staybook_client::types::wire_date;
use staybook_client::{BookingId, CancelOutcome, ClientConfig, ReqwestTransport, SearchQuery, StayClient, View};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "staybook")]
#[command(about = "Search hotels, manage reservations and administer inventory", long_about = None)]
struct Cli {
    /// Override the API base URL from the environment
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and remember the session
    Login {
        /// Account email
        email: String,
        /// Account password
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Search availability
    Search {
        /// City or region
        destination: String,
        /// Arrival date (YYYY-MM-DD)
        #[arg(value_parser = wire_date::parse)]
        check_in: NaiveDate,
        /// Departure date (YYYY-MM-DD)
        #[arg(value_parser = wire_date::parse)]
        check_out: NaiveDate,
    },
    /// List your bookings
    Bookings,
    /// Cancel one of your bookings
    Cancel {
        /// Booking id
        booking_id: BookingId,
    },
    /// List hotels (admin only)
    Hotels,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = cli.api_url {
        config = config.with_api_base_url(url);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let client = StayClient::from_config(config).context("invalid configuration")?;
    let result = run(&client, cli.command).await;
    client.shutdown().await.ok();
    result
}

async fn run(client: &StayClient<ReqwestTransport>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let identity = client.login(&email, &password).await?;
            println!("Signed in as {} ({})", identity.display_name, identity.role);
        },
        Command::Logout => {
            client.logout().await;
            println!("Signed out");
        },
        Command::Whoami => match client.session().identity() {
            Some(identity) => println!("{} ({})", identity.display_name, identity.role),
            None => println!("Not signed in"),
        },
        Command::Search {
            destination,
            check_in,
            check_out,
        } => {
            require(client, View::Results)?;
            let query = SearchQuery::new(destination, check_in, check_out);
            let hotels = client.bookings().search(&query).await?;
            if hotels.is_empty() {
                println!("No availability");
            }
            for hotel in hotels {
                println!("{:>6}  {:<32} {}/night", hotel.id, hotel.name, hotel.price_per_night);
            }
        },
        Command::Bookings => {
            require(client, View::MyBookings)?;
            for booking in client.bookings().list().await? {
                println!(
                    "{:>6}  {:<10} {:<24} {} to {}  {}  {}",
                    booking.id,
                    booking.status,
                    booking.hotel_name,
                    booking.check_in,
                    booking.check_out,
                    booking.total_price,
                    booking.confirmation_code
                );
            }
        },
        Command::Cancel { booking_id } => {
            require(client, View::MyBookings)?;
            client.bookings().list().await?;
            match client.bookings().cancel(booking_id).await? {
                CancelOutcome::Cancelled { message } => {
                    println!("{}", message.unwrap_or_else(|| format!("Booking {booking_id} cancelled")));
                },
                CancelOutcome::AlreadyCancelled => println!("Booking {booking_id} was already cancelled"),
            }
        },
        Command::Hotels => {
            require(client, View::InventoryManagement)?;
            for hotel in client.inventory().load_hotels().await? {
                println!("{:>6}  {:<32} {:<16} {:?}", hotel.id, hotel.name, hotel.city, hotel.status);
            }
        },
    }
    Ok(())
}

fn require(client: &StayClient<ReqwestTransport>, view: View) -> anyhow::Result<()> {
    match client.can_enter(view) {
        Decision::Allow => Ok(()),
        Decision::Redirect(View::Login) => {
            anyhow::bail!("Not signed in. Run `staybook login <email> <password>` first.")
        },
        Decision::Redirect(_) => anyhow::bail!("Your account cannot access {view}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn search_dates_are_parsed() {
        let cli = Cli::try_parse_from(["staybook", "search", "Cancún", "2025-11-19", "2025-11-22"]);
        let Ok(Cli {
            command: Command::Search {
                destination,
                check_in,
                check_out,
            },
            ..
        }) = cli
        else {
            unreachable!("search must parse");
        };
        assert_eq!(destination, "Cancún");
        assert_eq!(Some(check_in), NaiveDate::from_ymd_opt(2025, 11, 19));
        assert_eq!((check_out - check_in).num_days(), 3);
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        assert!(Cli::try_parse_from(["staybook", "search", "Lima", "19/11/2025", "2025-11-22"]).is_err());
        assert!(Cli::try_parse_from(["staybook", "cancel", "abc"]).is_err());
        assert!(Cli::try_parse_from(["staybook", "login", "a@b.com"]).is_err());
        assert!(Cli::try_parse_from(["staybook", "teleport"]).is_err());
    }

    #[test]
    fn cancel_takes_a_booking_id_and_global_url() {
        let cli = Cli::try_parse_from(["staybook", "cancel", "42", "--api-url", "http://localhost:3000/api"]);
        let Ok(Cli {
            api_url,
            command: Command::Cancel { booking_id },
        }) = cli
        else {
            unreachable!("cancel must parse");
        };
        assert_eq!(booking_id, BookingId::new(42));
        assert_eq!(api_url.as_deref(), Some("http://localhost:3000/api"));
    }
}
